//! TRADE_FLOW stage output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::GraphVersion;

/// Chapter key used when a route carries no HS code.
pub const UNSPECIFIED_CHAPTER: &str = "00";

/// Two-digit chapter key for grouping, `"00"` when absent.
pub fn chapter_key(hs_code: Option<&str>) -> String {
    match hs_code.and_then(|c| c.get(..2)) {
        Some(ch) if ch.chars().all(|c| c.is_ascii_digit()) => ch.to_string(),
        _ => UNSPECIFIED_CHAPTER.to_string(),
    }
}

pub fn route_key(origin: &str, destination: &str) -> String {
    format!("{origin}->{destination}")
}

/// One (origin, destination, HS code) route hit by the shock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedRoute {
    pub origin: String,
    pub destination: String,
    pub hs_code: Option<String>,
    /// Edge trade volume before the shock.
    pub baseline_volume: f64,
    pub transport_cost: f64,
    pub lead_time: f64,
    /// Tariff applied to this route, as a fraction.
    pub tariff_rate: f64,
    /// Unscaled regressor output (relative flow change).
    pub base_flow_change: f64,
    /// `base_flow_change · (1 + 2·tariff_rate)`.
    pub flow_change: f64,
    /// `flow_change · baseline_volume`.
    pub volume_change: f64,
    /// `tariff_rate · 0.8`.
    pub cost_change: f64,
    pub alternative_sources: Vec<String>,
}

impl AffectedRoute {
    pub fn key(&self) -> String {
        route_key(&self.origin, &self.destination)
    }

    pub fn chapter(&self) -> String {
        chapter_key(self.hs_code.as_deref())
    }
}

/// Square country × country matrix in graph node order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReallocationMatrix {
    pub countries: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl ReallocationMatrix {
    pub fn zeros(countries: Vec<String>) -> Self {
        let n = countries.len();
        Self {
            countries,
            values: vec![vec![0.0; n]; n],
        }
    }

    pub fn dimension(&self) -> usize {
        self.countries.len()
    }

    /// Add to an off-diagonal cell. Diagonal writes are ignored.
    pub(crate) fn add(&mut self, row: usize, col: usize, value: f64) {
        if row != col {
            if let Some(cell) = self.values.get_mut(row).and_then(|r| r.get_mut(col)) {
                *cell += value;
            }
        }
    }

    pub fn get(&self, origin: &str, destination: &str) -> Option<f64> {
        let i = self.countries.iter().position(|c| c == origin)?;
        let j = self.countries.iter().position(|c| c == destination)?;
        Some(self.values[i][j])
    }

    pub fn is_square(&self) -> bool {
        self.values.len() == self.dimension()
            && self.values.iter().all(|r| r.len() == self.dimension())
    }

    pub fn diagonal_is_zero(&self) -> bool {
        self.values
            .iter()
            .enumerate()
            .all(|(i, row)| row.get(i).map_or(true, |v| *v == 0.0))
    }

    pub fn non_zero_cells(&self) -> usize {
        self.values.iter().flatten().filter(|v| **v != 0.0).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeFlowPrediction {
    pub affected_routes: Vec<AffectedRoute>,
    pub reallocation_matrix: ReallocationMatrix,
    /// Disruption per two-digit HS chapter, in [0, 1].
    pub disruption_scores: BTreeMap<String, f64>,
    /// Cost change per route key.
    pub cost_increases: BTreeMap<String, f64>,
    /// Added lead time (days) per route key.
    pub time_delays: BTreeMap<String, f64>,
    /// Countries the routes were enumerated for.
    pub affected_countries: Vec<String>,
    /// How many of them exist in the graph.
    pub matched_countries: usize,
    /// True when no affected countries were extracted and the demo pair was used.
    pub used_demo_pair: bool,
    pub graph_version: GraphVersion,
}

impl TradeFlowPrediction {
    pub fn empty(countries: Vec<String>, graph_version: GraphVersion) -> Self {
        Self {
            affected_routes: Vec::new(),
            reallocation_matrix: ReallocationMatrix::zeros(countries),
            disruption_scores: BTreeMap::new(),
            cost_increases: BTreeMap::new(),
            time_delays: BTreeMap::new(),
            affected_countries: Vec::new(),
            matched_countries: 0,
            used_demo_pair: false,
            graph_version,
        }
    }
}
