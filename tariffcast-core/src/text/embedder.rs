//! Text embedding — three interchangeable strategies behind one interface.
//!
//! - Encoder: a caller-supplied learned sentence encoder.
//! - Frequency: a fitted TF-IDF vocabulary.
//! - Statistical: hand-crafted text statistics, always available.
//!
//! Which strategies exist is resolved once, when the `Embedder` is built.
//! `embed` walks the chain in preference order and silently degrades to the
//! next strategy on failure; the statistical strategy never fails, so `embed`
//! never fails either. Every output is zero-padded or truncated to the
//! configured dimension.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use super::patterns::{extract_hs_codes, extract_rates, urgency_score};
use super::tfidf::TfidfVectorizer;
use crate::countries::find_countries;

/// Failure of a learned encoder.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EncoderError {
    #[error("encoder unavailable: {0}")]
    Unavailable(String),
    #[error("encoding failed: {0}")]
    Failed(String),
}

/// A learned sentence encoder, supplied by the caller.
///
/// The engine ships no model weights; callers that have one plug it in here.
pub trait SentenceEncoder: Send + Sync {
    fn name(&self) -> &str;
    fn encode(&self, text: &str) -> Result<Vec<f64>, EncoderError>;
}

/// Which strategy produced an embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStrategy {
    Encoder,
    Frequency,
    Statistical,
}

impl fmt::Display for EmbeddingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Encoder => "encoder",
            Self::Frequency => "frequency",
            Self::Statistical => "statistical",
        };
        f.write_str(s)
    }
}

/// A fixed-length embedding plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f64>,
    pub strategy: EmbeddingStrategy,
}

/// One embedding strategy.
pub trait TextEmbedder: Send + Sync {
    fn strategy(&self) -> EmbeddingStrategy;

    /// Raw vector of any length, or `None` if this strategy cannot embed `text`.
    fn try_embed(&self, text: &str) -> Option<Vec<f64>>;
}

// ─── Strategies ──────────────────────────────────────────────────────

pub struct EncoderEmbedder {
    encoder: Arc<dyn SentenceEncoder>,
}

impl EncoderEmbedder {
    pub fn new(encoder: Arc<dyn SentenceEncoder>) -> Self {
        Self { encoder }
    }
}

impl TextEmbedder for EncoderEmbedder {
    fn strategy(&self) -> EmbeddingStrategy {
        EmbeddingStrategy::Encoder
    }

    fn try_embed(&self, text: &str) -> Option<Vec<f64>> {
        match self.encoder.encode(text) {
            Ok(v) if !v.is_empty() && v.iter().all(|x| x.is_finite()) => Some(v),
            Ok(_) => {
                warn!(encoder = self.encoder.name(), "encoder returned an unusable vector");
                None
            }
            Err(e) => {
                warn!(encoder = self.encoder.name(), error = %e, "encoder failed, degrading");
                None
            }
        }
    }
}

pub struct FrequencyEmbedder {
    vectorizer: TfidfVectorizer,
}

impl FrequencyEmbedder {
    pub fn new(vectorizer: TfidfVectorizer) -> Self {
        Self { vectorizer }
    }
}

impl TextEmbedder for FrequencyEmbedder {
    fn strategy(&self) -> EmbeddingStrategy {
        EmbeddingStrategy::Frequency
    }

    fn try_embed(&self, text: &str) -> Option<Vec<f64>> {
        if self.vectorizer.is_empty() || text.trim().is_empty() {
            return None;
        }
        Some(self.vectorizer.transform(text))
    }
}

/// Hand-crafted statistics: text length, word count, punctuation counts,
/// extracted-entity counts and urgency score.
pub struct StatisticalEmbedder;

impl StatisticalEmbedder {
    pub fn features(text: &str) -> Vec<f64> {
        let count = |c: char| text.chars().filter(|x| *x == c).count() as f64;
        let digits = text.chars().filter(|c| c.is_ascii_digit()).count() as f64;
        let upper = text.chars().filter(|c| c.is_uppercase()).count() as f64;
        let letters = text.chars().filter(|c| c.is_alphabetic()).count().max(1) as f64;

        vec![
            text.chars().count() as f64,
            text.split_whitespace().count() as f64,
            count('.'),
            count(','),
            count('%'),
            count(';'),
            count(':'),
            count('!') + count('?'),
            digits,
            upper / letters,
            extract_hs_codes(text).len() as f64,
            extract_rates(text).rates.len() as f64,
            find_countries(text).len() as f64,
            urgency_score(text),
        ]
    }
}

impl TextEmbedder for StatisticalEmbedder {
    fn strategy(&self) -> EmbeddingStrategy {
        EmbeddingStrategy::Statistical
    }

    fn try_embed(&self, text: &str) -> Option<Vec<f64>> {
        Some(Self::features(text))
    }
}

// ─── Embedder (strategy chain) ───────────────────────────────────────

/// Strategy chain resolved once at construction.
pub struct Embedder {
    dimension: usize,
    capability: EmbeddingStrategy,
    chain: Vec<Box<dyn TextEmbedder>>,
}

impl fmt::Debug for Embedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Embedder")
            .field("dimension", &self.dimension)
            .field("capability", &self.capability)
            .field(
                "chain",
                &self.chain.iter().map(|s| s.strategy()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Embedder {
    /// Resolve the available strategies: encoder → frequency → statistical.
    pub fn resolve(
        dimension: usize,
        encoder: Option<Arc<dyn SentenceEncoder>>,
        vectorizer: Option<TfidfVectorizer>,
    ) -> Self {
        let mut chain: Vec<Box<dyn TextEmbedder>> = Vec::new();
        if let Some(encoder) = encoder {
            chain.push(Box::new(EncoderEmbedder::new(encoder)));
        }
        if let Some(vectorizer) = vectorizer.filter(|v| !v.is_empty()) {
            chain.push(Box::new(FrequencyEmbedder::new(vectorizer)));
        }
        chain.push(Box::new(StatisticalEmbedder));
        let capability = chain[0].strategy();
        Self {
            dimension,
            capability,
            chain,
        }
    }

    /// Statistical-only embedder.
    pub fn statistical(dimension: usize) -> Self {
        Self::resolve(dimension, None, None)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The preferred strategy selected at construction.
    pub fn capability(&self) -> EmbeddingStrategy {
        self.capability
    }

    /// Embed `text` with the first strategy that succeeds.
    pub fn embed(&self, text: &str) -> Embedding {
        for strategy in &self.chain {
            if let Some(raw) = strategy.try_embed(text) {
                return Embedding {
                    values: fit_dimension(raw, self.dimension),
                    strategy: strategy.strategy(),
                };
            }
        }
        // Unreachable in practice: the chain always ends in StatisticalEmbedder.
        Embedding {
            values: vec![0.0; self.dimension],
            strategy: EmbeddingStrategy::Statistical,
        }
    }
}

/// Zero-pad or truncate to `dimension`.
pub fn fit_dimension(mut v: Vec<f64>, dimension: usize) -> Vec<f64> {
    v.resize(dimension, 0.0);
    v
}
