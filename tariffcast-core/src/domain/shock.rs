//! Tariff shock — the single policy event pushed through the pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::ShockId;

/// An immutable tariff policy event.
///
/// Created per request and discarded once the pipeline has answered.
/// Optional fields carry structured facts the caller already knows; they are
/// merged with whatever the extractor finds in `policy_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffShock {
    pub tariff_id: ShockId,
    pub policy_text: String,
    pub origin_country: String,
    pub destination_country: String,
    pub effective_date: NaiveDate,
    /// Date the policy was announced. Temporal features are measured from here.
    #[serde(default)]
    pub announced_on: Option<NaiveDate>,
    /// Explicit tariff rate change in percent (e.g. 25.0).
    #[serde(default)]
    pub rate_change: Option<f64>,
    #[serde(default)]
    pub hs_codes: Option<Vec<String>>,
    /// Explicit per-country tariff rates in percent.
    #[serde(default)]
    pub country_tariff_map: Option<BTreeMap<String, f64>>,
}

impl TariffShock {
    pub fn new(
        tariff_id: impl Into<String>,
        policy_text: impl Into<String>,
        origin_country: impl Into<String>,
        destination_country: impl Into<String>,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            tariff_id: ShockId::new(tariff_id),
            policy_text: policy_text.into(),
            origin_country: origin_country.into(),
            destination_country: destination_country.into(),
            effective_date,
            announced_on: None,
            rate_change: None,
            hs_codes: None,
            country_tariff_map: None,
        }
    }

    pub fn with_rate(mut self, rate_change: f64) -> Self {
        self.rate_change = Some(rate_change);
        self
    }

    pub fn with_hs_codes(mut self, codes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.hs_codes = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_country_tariffs(mut self, map: BTreeMap<String, f64>) -> Self {
        self.country_tariff_map = Some(map);
        self
    }

    pub fn announced(mut self, date: NaiveDate) -> Self {
        self.announced_on = Some(date);
        self
    }
}
