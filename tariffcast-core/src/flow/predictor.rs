//! TRADE_FLOW stage: policy features + trade network → route disruption.
//!
//! Two ridge regressors (relative flow change, cost change) are trained on
//! route features sampled from the graph. No labelled historical shocks
//! exist, so the training targets are seeded synthetic perturbations.
//!
//! At prediction time the cost regressor is bypassed: cost change is
//! `tariff_rate · 0.8`, and the base flow change is scaled by
//! `(1 + 2·tariff_rate)`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::regressor::{RegressorError, RidgeRegressor};
use super::types::{route_key, AffectedRoute, ReallocationMatrix, TradeFlowPrediction};
use crate::domain::{GraphVersion, TradeRecord};
use crate::graph::{
    route_features, GraphError, GraphSnapshot, GraphStore, TradeNetworkGraph, ROUTE_FEATURE_WIDTH,
};
use crate::rng::RngHierarchy;
use crate::stage::{LayerState, Stage, StageError, StageKind};
use crate::text::PolicyFeatures;

const COST_PASS_THROUGH: f64 = 0.8;
const DELAY_FACTOR: f64 = 0.5;
const DEFAULT_FLOW_CHANGE: f64 = -0.1;
const DEFAULT_COST_CHANGE: f64 = 0.1;

#[derive(Debug, Error)]
enum TrainError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Regressor(#[from] RegressorError),
}

/// `base · (1 + 2·tariff_rate)`.
pub fn scale_flow_change(base: f64, tariff_rate: f64) -> f64 {
    base * (1.0 + 2.0 * tariff_rate)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeFlowConfig {
    pub ridge_lambda: f64,
    pub max_training_routes: usize,
    pub seed: u64,
    pub max_alternative_sources: usize,
    /// Used when the policy names no countries.
    pub demo_pair: [String; 2],
}

impl Default for TradeFlowConfig {
    fn default() -> Self {
        Self {
            ridge_lambda: 1.0,
            max_training_routes: 5000,
            seed: 42,
            max_alternative_sources: 5,
            demo_pair: ["United States".to_string(), "China".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
struct FlowModels {
    flow: RidgeRegressor,
    cost: RidgeRegressor,
    trained_on: GraphVersion,
}

impl FlowModels {
    fn defaults(version: GraphVersion) -> Self {
        Self {
            flow: RidgeRegressor::constant(DEFAULT_FLOW_CHANGE, ROUTE_FEATURE_WIDTH),
            cost: RidgeRegressor::constant(DEFAULT_COST_CHANGE, ROUTE_FEATURE_WIDTH),
            trained_on: version,
        }
    }
}

pub struct TradeFlowPredictor {
    config: TradeFlowConfig,
    store: Arc<GraphStore>,
    models: Option<FlowModels>,
    state: LayerState,
}

impl TradeFlowPredictor {
    pub fn new(config: TradeFlowConfig, store: Arc<GraphStore>) -> Self {
        Self {
            config,
            store,
            models: None,
            state: LayerState::NotFitted,
        }
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    /// Graph version the regressors were last trained against.
    pub fn trained_on(&self) -> Option<GraphVersion> {
        self.models.as_ref().map(|m| m.trained_on)
    }

    /// Intercept of the cost regressor. Reported only; predictions use the
    /// tariff-proportional cost change.
    pub fn base_cost_change(&self) -> Option<f64> {
        self.models.as_ref().map(|m| m.cost.intercept())
    }

    fn train(&self, snapshot: &GraphSnapshot) -> Result<FlowModels, RegressorError> {
        let graph = &snapshot.graph;
        let rng = RngHierarchy::new(self.config.seed);

        let mut routes: Vec<_> = graph.routes().collect();
        if routes.len() > self.config.max_training_routes {
            routes.shuffle(&mut rng.rng_for("route_sampling", 0));
            routes.truncate(self.config.max_training_routes);
        }

        let rows: Vec<Vec<f64>> = routes
            .iter()
            .map(|r| {
                let edge = graph.edge_at(*r);
                route_features(
                    graph,
                    graph.node_name(r.origin),
                    graph.node_name(r.destination),
                    edge.hs_codes.first().map(String::as_str),
                )
                .to_vec()
            })
            .collect();

        let mut targets = rng.rng_for("synthetic_flow_targets", 0);
        let flow_y: Vec<f64> = rows.iter().map(|_| targets.gen_range(-0.3..0.1)).collect();
        let cost_y: Vec<f64> = rows.iter().map(|_| targets.gen_range(0.0..0.2)).collect();

        let models = FlowModels {
            flow: RidgeRegressor::fit(&rows, &flow_y, self.config.ridge_lambda)?,
            cost: RidgeRegressor::fit(&rows, &cost_y, self.config.ridge_lambda)?,
            trained_on: snapshot.version,
        };
        info!(
            routes = rows.len(),
            version = %snapshot.version,
            "trade flow regressors trained"
        );
        Ok(models)
    }

    /// Rebuild the shared graph from `records` and retrain the regressors.
    ///
    /// The regressors are trained against the candidate graph before it is
    /// published. Unlike `fit`, a failure leaves the stage state alone: the
    /// previous graph and regressors stay in service.
    pub fn retrain(&mut self, records: &[TradeRecord]) -> Result<GraphVersion, StageError> {
        let (snapshot, models) = self
            .rebuild_and_train(records)
            .map_err(|e| StageError::Fit {
                stage: StageKind::TradeFlow,
                reason: e.to_string(),
            })?;
        self.models = Some(models);
        self.state = LayerState::Fitted;
        Ok(snapshot.version)
    }

    fn rebuild_and_train(
        &self,
        records: &[TradeRecord],
    ) -> Result<(GraphSnapshot, FlowModels), TrainError> {
        self.store
            .rebuild_then(records, |candidate| Ok(self.train(candidate)?))
    }

    fn fit_error(&mut self, reason: String) -> StageError {
        self.state = LayerState::Failed;
        StageError::Fit {
            stage: StageKind::TradeFlow,
            reason,
        }
    }

    /// Predict against a fixed snapshot.
    pub fn predict_with(
        &self,
        snapshot: &GraphSnapshot,
        features: &PolicyFeatures,
    ) -> Result<TradeFlowPrediction, StageError> {
        self.ensure_fitted()?;
        let models = self.models.as_ref().ok_or(StageError::NotFitted {
            stage: StageKind::TradeFlow,
            state: self.state,
        })?;
        let graph: &TradeNetworkGraph = &snapshot.graph;

        let (affected, used_demo_pair) = if features.affected_countries.is_empty() {
            warn!(
                pair = ?self.config.demo_pair,
                "no affected countries extracted, using demo pair"
            );
            (self.config.demo_pair.iter().cloned().collect::<BTreeSet<_>>(), true)
        } else {
            (features.affected_countries.clone(), false)
        };
        let matched = affected.iter().filter(|c| graph.contains(c)).count();

        let hs_codes: Vec<Option<&str>> = if features.hs_codes.is_empty() {
            vec![None]
        } else {
            features.hs_codes.iter().map(|c| Some(c.as_str())).collect()
        };

        let countries: Vec<String> = graph.countries().into_iter().map(str::to_string).collect();
        let mut out = TradeFlowPrediction::empty(countries, snapshot.version);
        out.affected_countries = affected.iter().cloned().collect();
        out.matched_countries = matched;
        out.used_demo_pair = used_demo_pair;

        let mut chapter_totals: BTreeMap<String, (f64, f64)> = BTreeMap::new();
        for route in graph.routes_touching(&affected) {
            let origin = graph.node_name(route.origin);
            let destination = graph.node_name(route.destination);
            let edge = graph.edge_at(route);
            let tariff_rate = tariff_fraction(features, origin, destination);
            let alternatives =
                graph.alternative_sources(origin, destination, self.config.max_alternative_sources);

            for hs in &hs_codes {
                let row = route_features(graph, origin, destination, *hs);
                let base = models.flow.predict(&row);
                let relative = scale_flow_change(base, tariff_rate);
                let affected_route = AffectedRoute {
                    origin: origin.to_string(),
                    destination: destination.to_string(),
                    hs_code: hs.map(str::to_string),
                    baseline_volume: edge.trade_volume,
                    transport_cost: edge.transport_cost,
                    lead_time: edge.lead_time,
                    tariff_rate,
                    base_flow_change: base,
                    flow_change: relative,
                    volume_change: relative * edge.trade_volume,
                    cost_change: tariff_rate * COST_PASS_THROUGH,
                    alternative_sources: alternatives.clone(),
                };

                let totals = chapter_totals.entry(affected_route.chapter()).or_default();
                totals.0 += affected_route.volume_change.abs();
                totals.1 += affected_route.baseline_volume;

                out.reallocation_matrix.add(
                    route.origin.index(),
                    route.destination.index(),
                    affected_route.volume_change,
                );
                out.affected_routes.push(affected_route);
            }

            let key = route_key(origin, destination);
            out.cost_increases.insert(key.clone(), tariff_rate * COST_PASS_THROUGH);
            out.time_delays
                .insert(key, edge.lead_time * tariff_rate * DELAY_FACTOR);
        }

        out.disruption_scores = chapter_totals
            .into_iter()
            .map(|(chapter, (flow, baseline))| {
                let score = if baseline > 0.0 {
                    (flow / baseline).min(1.0)
                } else {
                    0.0
                };
                (chapter, score)
            })
            .collect();

        debug!(
            routes = out.affected_routes.len(),
            matched,
            version = %snapshot.version,
            "trade flow predicted"
        );
        Ok(out)
    }
}

/// Origin rate, then destination rate, then the first extracted rate, as a fraction.
fn tariff_fraction(features: &PolicyFeatures, origin: &str, destination: &str) -> f64 {
    let map = &features.country_tariff_map;
    map.get(origin)
        .or_else(|| map.get(destination))
        .or_else(|| features.tariff_rates.first())
        .map(|r| r / 100.0)
        .unwrap_or(0.0)
}

impl Stage for TradeFlowPredictor {
    type Input = PolicyFeatures;
    type Output = TradeFlowPrediction;
    type TrainingData = [TradeRecord];

    fn kind(&self) -> StageKind {
        StageKind::TradeFlow
    }

    fn state(&self) -> LayerState {
        self.state
    }

    /// `Some(records)` rebuilds the shared graph first; `None` trains on the
    /// graph currently in the store.
    fn fit(&mut self, data: Option<&[TradeRecord]>) -> Result<(), StageError> {
        let trained = match data {
            Some(records) => self.rebuild_and_train(records).map(|(_, models)| models),
            None => self.train(&self.store.snapshot()).map_err(TrainError::from),
        };
        match trained {
            Ok(models) => {
                self.models = Some(models);
                self.state = LayerState::Fitted;
                Ok(())
            }
            Err(e) => Err(self.fit_error(e.to_string())),
        }
    }

    fn force_fitted(&mut self) {
        warn!("trade flow stage forced to fitted with constant regressors");
        self.models = Some(FlowModels::defaults(self.store.version()));
        self.state = LayerState::Fitted;
    }

    fn predict(&self, input: &PolicyFeatures) -> Result<TradeFlowPrediction, StageError> {
        self.predict_with(&self.store.snapshot(), input)
    }

    fn confidence(&self, output: &TradeFlowPrediction) -> f64 {
        if output.affected_routes.is_empty() || output.affected_countries.is_empty() {
            return 0.2;
        }
        let share = output.matched_countries as f64 / output.affected_countries.len() as f64;
        (0.4 + 0.6 * share).clamp(0.0, 1.0)
    }

    fn fallback_output(&self, _input: &PolicyFeatures) -> TradeFlowPrediction {
        let snapshot = self.store.snapshot();
        let countries = snapshot
            .graph
            .countries()
            .into_iter()
            .map(str::to_string)
            .collect();
        TradeFlowPrediction::empty(countries, snapshot.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TariffShock;
    use crate::graph::GraphSettings;
    use crate::text::{ExtractorConfig, PolicyFeatureExtractor};
    use chrono::NaiveDate;

    fn rec(o: &str, d: &str, hs: &str, value: f64) -> TradeRecord {
        TradeRecord {
            origin: o.into(),
            destination: d.into(),
            hs_code: hs.into(),
            trade_value: value,
            transport_cost: 0.1,
            lead_time: 20.0,
            year: 2023,
        }
    }

    fn records() -> Vec<TradeRecord> {
        vec![
            rec("China", "United States", "8517", 500.0),
            rec("United States", "China", "1201", 200.0),
            rec("Vietnam", "United States", "8517", 80.0),
            rec("Mexico", "United States", "8703", 300.0),
            rec("Japan", "Germany", "8703", 150.0),
            rec("Germany", "France", "3004", 90.0),
        ]
    }

    fn fitted() -> TradeFlowPredictor {
        let store = Arc::new(GraphStore::new(GraphSettings::default()));
        let mut p = TradeFlowPredictor::new(TradeFlowConfig::default(), store);
        p.fit(Some(records().as_slice())).unwrap();
        p
    }

    fn features(text: &str) -> PolicyFeatures {
        let mut ex = PolicyFeatureExtractor::new(ExtractorConfig {
            embedding_dimension: 8,
            max_vocabulary: 8,
            synthetic_corpus_size: 10,
            seed: 1,
        });
        ex.fit(None).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        ex.transform(&TariffShock::new("t", text, "CN", "US", date))
    }

    #[test]
    fn predict_before_fit_is_not_fitted() {
        let store = Arc::new(GraphStore::new(GraphSettings::default()));
        let p = TradeFlowPredictor::new(TradeFlowConfig::default(), store);
        let err = p.predict(&features("tariff")).unwrap_err();
        assert!(matches!(err, StageError::NotFitted { stage: StageKind::TradeFlow, .. }));
    }

    #[test]
    fn scaling_formula() {
        assert!((scale_flow_change(-0.2, 0.25) - (-0.3)).abs() < 1e-12);
        assert_eq!(scale_flow_change(0.5, 0.0), 0.5);
    }

    #[test]
    fn routes_touch_affected_countries() {
        let p = fitted();
        let f = features(
            "The United States will impose a 25% tariff on imports from China under HS code 8517",
        );
        let out = p.predict(&f).unwrap();
        // Every edge touching US or China; Japan->Germany and Germany->France excluded.
        assert_eq!(out.affected_routes.len(), 4);
        for r in &out.affected_routes {
            assert_eq!(r.tariff_rate, 0.25);
            assert!((r.flow_change - scale_flow_change(r.base_flow_change, 0.25)).abs() < 1e-12);
            assert!((r.volume_change - r.flow_change * r.baseline_volume).abs() < 1e-9);
            assert!((r.cost_change - 0.2).abs() < 1e-12);
            assert!(r.alternative_sources.len() <= 5);
        }
        let score = out.disruption_scores["85"];
        assert!((0.0..=1.0).contains(&score));
        assert!((out.time_delays["China->United States"] - 20.0 * 0.25 * 0.5).abs() < 1e-12);
        assert_eq!(p.confidence(&out), 1.0);
    }

    #[test]
    fn reallocation_matrix_is_square_with_zero_diagonal() {
        let p = fitted();
        let out = p.predict(&features("25% tariff on China")).unwrap();
        let m = &out.reallocation_matrix;
        assert_eq!(m.dimension(), 7);
        assert!(m.is_square());
        assert!(m.diagonal_is_zero());
        assert_eq!(m.get("Japan", "Germany"), Some(0.0));
    }

    #[test]
    fn alternatives_exclude_origin() {
        let p = fitted();
        let out = p.predict(&features("25% tariff on China")).unwrap();
        let cn_us = out
            .affected_routes
            .iter()
            .find(|r| r.key() == "China->United States")
            .unwrap();
        assert_eq!(cn_us.alternative_sources, vec!["Vietnam".to_string(), "Mexico".to_string()]);
    }

    #[test]
    fn empty_countries_fall_back_to_demo_pair() {
        let p = fitted();
        let out = p.predict(&features("New duties announced")).unwrap();
        assert!(out.used_demo_pair);
        assert!(!out.affected_routes.is_empty());
        assert_eq!(out.affected_countries, vec!["China".to_string(), "United States".to_string()]);
    }

    #[test]
    fn unknown_countries_give_low_confidence() {
        let p = fitted();
        let out = p.predict(&features("A 10% tariff on goods from Brazil")).unwrap();
        assert!(out.affected_routes.is_empty());
        assert_eq!(p.confidence(&out), 0.2);
    }

    #[test]
    fn failed_rebuild_marks_stage_failed() {
        let store = Arc::new(GraphStore::new(GraphSettings::default()));
        let mut p = TradeFlowPredictor::new(TradeFlowConfig::default(), store);
        assert!(p.fit(Some(&[][..])).is_err());
        assert_eq!(p.state(), LayerState::Failed);
        p.force_fitted();
        assert_eq!(p.state(), LayerState::Fitted);
        let out = p.predict(&features("25% tariff on China")).unwrap();
        assert!(out.affected_routes.is_empty());
    }

    #[test]
    fn failed_retrain_keeps_previous_models() {
        let mut p = fitted();
        let before = p.trained_on();
        assert!(p.retrain(&[]).is_err());
        assert_eq!(p.state(), LayerState::Fitted);
        assert_eq!(p.trained_on(), before);

        let version = p.retrain(&records()[..3]).unwrap();
        assert_eq!(version, GraphVersion(2));
        assert_eq!(p.trained_on(), Some(GraphVersion(2)));
    }

    #[test]
    fn failed_training_does_not_publish_graph() {
        let p = fitted();
        let store = Arc::clone(p.store());
        let config = TradeFlowConfig {
            ridge_lambda: -1.0,
            ..TradeFlowConfig::default()
        };
        let mut bad = TradeFlowPredictor::new(config, Arc::clone(&store));

        assert!(bad.retrain(&records()).is_err());
        assert_eq!(store.version(), GraphVersion(1));

        assert!(bad.fit(Some(records().as_slice())).is_err());
        assert_eq!(bad.state(), LayerState::Failed);
        assert_eq!(store.version(), GraphVersion(1));
        assert_eq!(p.trained_on(), Some(store.version()));
    }

    #[test]
    fn prediction_is_repeatable() {
        let p = fitted();
        let f = features("25% tariff on China under HS 8517");
        assert_eq!(p.predict(&f).unwrap(), p.predict(&f).unwrap());
    }
}
