//! Structured policy features — the POLICY stage output.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::embedder::Embedding;

/// Classification of a tariff action by number of parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    Unilateral,
    Bilateral,
    Multilateral,
}

impl PolicyType {
    /// `unilateral` for ≤1 country, `bilateral` for 2, otherwise
    /// `multilateral`. A multilateral keyword overrides the count.
    pub fn classify(country_count: usize, multilateral_keyword: bool) -> Self {
        if multilateral_keyword {
            return Self::Multilateral;
        }
        match country_count {
            0 | 1 => Self::Unilateral,
            2 => Self::Bilateral,
            _ => Self::Multilateral,
        }
    }
}

/// Calendar features of the effective date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalFeatures {
    pub month: u32,
    pub quarter: u32,
    pub year: i32,
    /// 0 = Monday … 6 = Sunday.
    pub day_of_week: u32,
    /// Days from announcement to effect; 0 when the announcement date is unknown.
    pub days_until_effective: i64,
}

impl TemporalFeatures {
    pub fn from_dates(effective: NaiveDate, announced: Option<NaiveDate>) -> Self {
        Self {
            month: effective.month(),
            quarter: (effective.month() - 1) / 3 + 1,
            year: effective.year(),
            day_of_week: effective.weekday().num_days_from_monday(),
            days_until_effective: announced
                .map(|a| (effective - a).num_days())
                .unwrap_or(0),
        }
    }
}

/// Whether the parser ran cleanly or degraded.
///
/// `Complete` with empty feature sets means "nothing found";
/// `PartialExtraction` means the parser itself degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Complete,
    PartialExtraction { reason: String },
}

impl ExtractionOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    pub(crate) fn from_reasons(reasons: Vec<String>) -> Self {
        if reasons.is_empty() {
            Self::Complete
        } else {
            Self::PartialExtraction {
                reason: reasons.join("; "),
            }
        }
    }
}

/// Structured signals extracted from one tariff shock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyFeatures {
    pub hs_codes: BTreeSet<String>,
    /// Tariff rates in percent, [0, 200], in order of first appearance.
    pub tariff_rates: Vec<f64>,
    /// Canonical country names.
    pub affected_countries: BTreeSet<String>,
    /// Per-country tariff rate in percent.
    pub country_tariff_map: BTreeMap<String, f64>,
    pub policy_type: PolicyType,
    pub urgency_score: f64,
    pub embedding: Embedding,
    pub temporal: TemporalFeatures,
    pub extraction_confidence: f64,
    /// Scaled `[#hs, #rates, #countries, urgency, mean rate, max rate]`.
    pub numeric_summary: Vec<f64>,
    pub outcome: ExtractionOutcome,
    /// True if the extractor fitted itself on synthetic text before producing this.
    pub auto_fitted: bool,
}

impl PolicyFeatures {
    /// Tariff rate for `country` as a fraction (25% → 0.25).
    ///
    /// Falls back to the first extracted rate, then to 0.
    pub fn tariff_fraction_for(&self, country: &str) -> f64 {
        self.country_tariff_map
            .get(country)
            .or_else(|| self.tariff_rates.first())
            .map(|r| r / 100.0)
            .unwrap_or(0.0)
    }

    /// Empty, zero-confidence features used when the POLICY stage degrades.
    pub fn degraded(embedding: Embedding, temporal: TemporalFeatures, reason: &str) -> Self {
        Self {
            hs_codes: BTreeSet::new(),
            tariff_rates: Vec::new(),
            affected_countries: BTreeSet::new(),
            country_tariff_map: BTreeMap::new(),
            policy_type: PolicyType::Unilateral,
            urgency_score: 0.0,
            embedding,
            temporal,
            extraction_confidence: 0.0,
            numeric_summary: Vec::new(),
            outcome: ExtractionOutcome::PartialExtraction {
                reason: reason.to_string(),
            },
            auto_fitted: false,
        }
    }
}

/// Mean of `min(#hs/3,1)`, `min(#rates/2,1)`, `min(#countries/2,1)` and urgency.
pub fn extraction_confidence(hs: usize, rates: usize, countries: usize, urgency: f64) -> f64 {
    let parts = [
        (hs as f64 / 3.0).min(1.0),
        (rates as f64 / 2.0).min(1.0),
        (countries as f64 / 2.0).min(1.0),
        urgency.clamp(0.0, 1.0),
    ];
    parts.iter().sum::<f64>() / parts.len() as f64
}
