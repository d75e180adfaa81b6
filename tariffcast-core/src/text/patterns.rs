//! Regex and keyword tables for policy text extraction.
//!
//! All patterns are compiled once. Each `extract_*` function applies its
//! pattern list in order and deduplicates while preserving first appearance,
//! so "the first extracted rate" is well defined.

use regex::Regex;
use std::sync::LazyLock;

// ─── HS codes ────────────────────────────────────────────────────────

static HS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bHS\s*(\d{2,10})\b",
        r"(?i)\bHS\s+codes?\s*:?\s*(\d{4}\.\d{2}(?:\.\d{2,4})?|\d{2,10})\b",
        r"(?i)\bheading\s*(\d{2,4})\b",
        r"(?i)\bsubheading\s*(\d{4}\.\d{2}|\d{4,8})\b",
        r"(?i)\bchapter\s*(\d{2})\b",
        r"(?i)\btariff\s+(?:line|item)\s*(\d{4,10})\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static HS pattern"))
    .collect()
});

/// "HS codes 8517, 8471 and 8473" — the capture is split into individual codes.
static HS_LIST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bHS\s+codes\s*:?\s*((?:\d{2,10}(?:\.\d{2,4})*(?:\s*,\s*|\s*;\s*|\s+and\s+|\s+or\s+)?)+)")
        .expect("static HS list pattern")
});

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)*").expect("static digit pattern"));

/// Normalise a raw HS capture: strip separators, keep 2–10 digit strings.
pub fn normalize_hs_code(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if (2..=10).contains(&digits.len()) && digits.len() == raw.chars().filter(|c| *c != '.').count() {
        Some(digits)
    } else {
        None
    }
}

/// Extract HS codes in order of first appearance, deduplicated.
pub fn extract_hs_codes(text: &str) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    let mut push = |code: String| {
        if !codes.contains(&code) {
            codes.push(code);
        }
    };

    for pattern in HS_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            if let Some(code) = caps.get(1).and_then(|m| normalize_hs_code(m.as_str())) {
                push(code);
            }
        }
    }
    for caps in HS_LIST_PATTERN.captures_iter(text) {
        if let Some(list) = caps.get(1) {
            for m in DIGIT_RUN.find_iter(list.as_str()) {
                if let Some(code) = normalize_hs_code(m.as_str()) {
                    push(code);
                }
            }
        }
    }
    codes
}

// ─── Tariff rates ────────────────────────────────────────────────────

pub const MIN_RATE: f64 = 0.0;
pub const MAX_RATE: f64 = 200.0;

static RATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(\d+(?:\.\d+)?)\s*%",
        r"(?i)(\d+(?:\.\d+)?)\s*(?:percent|per\s+cent)\b",
        r"(?i)\brate\s+of\s+(\d+(?:\.\d+)?)\b",
        r"(?i)\b(?:tariffs?|dut(?:y|ies)|levy)\s+(?:of|at)\s+(\d+(?:\.\d+)?)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static rate pattern"))
    .collect()
});

/// Rates found in text, split by whether they passed the [0, 200] range check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateExtraction {
    pub rates: Vec<f64>,
    /// Values parsed but outside [0, 200].
    pub rejected: Vec<f64>,
}

/// Extract tariff rates (percent) in order of first appearance, deduplicated.
pub fn extract_rates(text: &str) -> RateExtraction {
    let mut out = RateExtraction::default();
    for pattern in RATE_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
                continue;
            };
            if !(MIN_RATE..=MAX_RATE).contains(&value) {
                if !out.rejected.contains(&value) {
                    out.rejected.push(value);
                }
                continue;
            }
            if !out.rates.contains(&value) {
                out.rates.push(value);
            }
        }
    }
    out
}

// ─── Urgency ─────────────────────────────────────────────────────────

/// Weighted urgency keywords, matched as lower-case substrings.
pub const URGENCY_KEYWORDS: &[(&str, f64)] = &[
    ("immediate", 1.0),
    ("urgent", 1.0),
    ("emergency", 1.0),
    ("crisis", 0.9),
    ("national security", 0.8),
    ("retaliat", 0.8),
    ("escalat", 0.7),
    ("within days", 0.7),
    ("deadline", 0.6),
    ("as soon as", 0.6),
    ("sanction", 0.6),
    ("threat", 0.5),
    ("effective", 0.5),
];

/// Weighted keyword sum normalised by the maximum possible sum, in [0, 1].
pub fn urgency_score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let max: f64 = URGENCY_KEYWORDS.iter().map(|(_, w)| w).sum();
    let hit: f64 = URGENCY_KEYWORDS
        .iter()
        .filter(|(kw, _)| lower.contains(kw))
        .map(|(_, w)| w)
        .sum();
    if max > 0.0 {
        (hit / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// ─── Policy type ─────────────────────────────────────────────────────

/// Keywords that force a multilateral classification regardless of country count.
pub const MULTILATERAL_KEYWORDS: &[&str] = &[
    "wto",
    "world trade organization",
    "treaty",
    "bloc",
    "multilateral",
];

pub fn has_multilateral_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    MULTILATERAL_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str =
        "The United States will impose a 25% tariff on imports from China under HS code 8517";

    #[test]
    fn hs_code_from_scenario() {
        assert_eq!(extract_hs_codes(SCENARIO), vec!["8517".to_string()]);
    }

    #[test]
    fn hs_code_variants() {
        let codes = extract_hs_codes("HS8471, heading 72 and subheading 8517.12 (chapter 85)");
        assert!(codes.contains(&"8471".to_string()));
        assert!(codes.contains(&"72".to_string()));
        assert!(codes.contains(&"851712".to_string()));
        assert!(codes.contains(&"85".to_string()));
    }

    #[test]
    fn hs_code_list() {
        let codes = extract_hs_codes("covering HS codes 8517, 8471 and 8473");
        assert_eq!(codes, vec!["8517", "8471", "8473"]);
    }

    #[test]
    fn hs_codes_deduplicated() {
        let codes = extract_hs_codes("HS 8517 ... HS code 8517 ... HS8517");
        assert_eq!(codes, vec!["8517"]);
    }

    #[test]
    fn rate_from_scenario() {
        let r = extract_rates(SCENARIO);
        assert_eq!(r.rates, vec![25.0]);
        assert!(r.rejected.is_empty());
    }

    #[test]
    fn rate_variants_and_range() {
        let r = extract_rates("a 10 percent duty, a rate of 7.5, and a 250% surcharge");
        assert!(r.rates.contains(&10.0));
        assert!(r.rates.contains(&7.5));
        assert!(!r.rates.contains(&250.0));
        assert_eq!(r.rejected, vec![250.0]);
    }

    #[test]
    fn urgency_bounded() {
        assert_eq!(urgency_score("routine notice"), 0.0);
        let all: String = URGENCY_KEYWORDS.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(" ");
        assert!((urgency_score(&all) - 1.0).abs() < 1e-12);
        let s = urgency_score("Immediate retaliation");
        assert!(s > 0.0 && s < 1.0);
    }

    #[test]
    fn multilateral_keywords() {
        assert!(has_multilateral_keyword("Under WTO rules"));
        assert!(has_multilateral_keyword("the trading bloc agreed"));
        assert!(!has_multilateral_keyword(SCENARIO));
    }
}
