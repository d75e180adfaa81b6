//! Term-frequency / inverse-document-frequency vectorizer.
//!
//! Vocabulary = the `max_features` most frequent terms by document frequency
//! (ties broken alphabetically), after lower-casing, `\b\w\w+\b` tokenisation
//! and English stop-word removal. Document vectors use smooth IDF,
//! `ln((1 + n) / (1 + df)) + 1`, and are L2-normalised.

use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use super::ExtractionError;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"));

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "also", "an", "and", "any", "are", "as", "at",
    "be", "been", "before", "being", "between", "both", "but", "by", "can", "could", "did", "do",
    "does", "during", "each", "for", "from", "further", "had", "has", "have", "he", "her", "here",
    "his", "how", "if", "in", "into", "is", "it", "its", "itself", "may", "more", "most", "no",
    "nor", "not", "of", "off", "on", "once", "only", "or", "other", "our", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "would", "you", "your",
];

static STOP_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// Lower-cased tokens with stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !STOP_SET.contains(t))
        .map(str::to_string)
        .collect()
}

/// A fitted TF-IDF vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfVectorizer {
    vocabulary: Vec<String>,
    idf: Vec<f64>,
    index: HashMap<String, usize>,
}

impl TfidfVectorizer {
    /// Fit the vocabulary and IDF weights on a corpus.
    pub fn fit<S: AsRef<str>>(corpus: &[S], max_features: usize) -> Result<Self, ExtractionError> {
        if corpus.is_empty() {
            return Err(ExtractionError::EmptyCorpus);
        }
        if max_features == 0 {
            return Err(ExtractionError::EmptyVocabulary);
        }

        let mut df: BTreeMap<String, usize> = BTreeMap::new();
        for doc in corpus {
            let unique: HashSet<String> = tokenize(doc.as_ref()).into_iter().collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }
        if df.is_empty() {
            return Err(ExtractionError::EmptyVocabulary);
        }

        // BTreeMap iteration is alphabetical; a stable sort by descending df
        // keeps alphabetical order among ties.
        let mut terms: Vec<(String, usize)> = df.into_iter().collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1));
        terms.truncate(max_features);

        let n = corpus.len() as f64;
        let vocabulary: Vec<String> = terms.iter().map(|(t, _)| t.clone()).collect();
        let idf: Vec<f64> = terms
            .iter()
            .map(|(_, d)| ((1.0 + n) / (1.0 + *d as f64)).ln() + 1.0)
            .collect();

        Ok(Self::from_parts(vocabulary, idf))
    }

    fn from_parts(vocabulary: Vec<String>, idf: Vec<f64>) -> Self {
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self {
            vocabulary,
            idf,
            index,
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// L2-normalised TF-IDF vector of length `len()`. All zeros if no
    /// vocabulary term occurs in `text`.
    pub fn transform(&self, text: &str) -> Vec<f64> {
        let mut v = vec![0.0; self.vocabulary.len()];
        for token in tokenize(text) {
            if let Some(&i) = self.index.get(&token) {
                v[i] += 1.0;
            }
        }
        for (x, idf) in v.iter_mut().zip(&self.idf) {
            *x *= idf;
        }
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "tariff on steel imports",
            "tariff on aluminum imports",
            "export controls on semiconductors",
        ]
    }

    #[test]
    fn tokenizer_drops_stop_words_and_short_tokens() {
        assert_eq!(tokenize("The tariff on a steel bar"), vec!["tariff", "steel", "bar"]);
    }

    #[test]
    fn vocabulary_ordered_by_df_then_alpha() {
        let v = TfidfVectorizer::fit(&corpus(), 3).unwrap();
        // "imports" and "tariff" appear in 2 docs each; alphabetical tiebreak.
        assert_eq!(v.vocabulary()[0], "imports");
        assert_eq!(v.vocabulary()[1], "tariff");
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn transform_is_unit_norm() {
        let v = TfidfVectorizer::fit(&corpus(), 10).unwrap();
        let x = v.transform("steel tariff");
        let norm: f64 = x.iter().map(|a| a * a).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_text_is_zero_vector() {
        let v = TfidfVectorizer::fit(&corpus(), 10).unwrap();
        assert!(v.transform("bananas").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn empty_corpus_rejected() {
        let empty: Vec<&str> = vec![];
        assert!(matches!(
            TfidfVectorizer::fit(&empty, 10),
            Err(ExtractionError::EmptyCorpus)
        ));
        assert!(matches!(
            TfidfVectorizer::fit(&["the a of"], 10),
            Err(ExtractionError::EmptyVocabulary)
        ));
    }
}
