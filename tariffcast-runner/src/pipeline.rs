//! Six-stage pipeline orchestrator.
//!
//! POLICY → TRADE_FLOW → INDUSTRY → FIRM → CONSUMER → GEOPOLITICAL
//!
//! - `fit` fits every stage in order. A stage whose fit fails is forced to
//!   `Fitted` with default parameters and reported in the `FitReport`.
//! - `predict` runs the stages strictly in order, each on its predecessor's
//!   output. `NotFitted` is the only error that reaches the caller. Any other
//!   stage failure is replaced by the stage's default output with confidence
//!   0 and listed in `degraded_stages`. A panic inside a stage counts as a
//!   stage failure.
//! - One graph snapshot is taken per `predict`, so a concurrent retrain
//!   never changes the graph under a running prediction.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use tariffcast_core::domain::{GraphVersion, TariffShock, TradeRecord};
use tariffcast_core::flow::TradeFlowPredictor;
use tariffcast_core::graph::GraphStore;
use tariffcast_core::layers::{ConsumerLayer, FirmLayer, GeopoliticalLayer, IndustryLayer};
use tariffcast_core::stage::{LayerState, Stage, StageError, StageKind};
use tariffcast_core::text::{PolicyFeatureExtractor, SentenceEncoder};

use crate::config::{ConfigError, PipelineConfig};
use crate::data_loader::LoadedTradeData;
use crate::result::{ConfidenceScores, FitReport, PipelinePrediction, StageFitOutcome};

#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("stage '{stage}' is not fitted (state {state:?}); call fit() first")]
    NotFitted { stage: StageKind, state: LayerState },

    #[error("graph retrain failed: {0}")]
    Retrain(#[source] StageError),
}

/// Training inputs for `PipelineOrchestrator::fit`.
///
/// Missing parts fall back to each stage's own defaults: a synthetic policy
/// corpus for POLICY, the graph already in the store for TRADE_FLOW.
#[derive(Debug, Clone, Default)]
pub struct PipelineTrainingData {
    pub policy_corpus: Option<Vec<String>>,
    pub trade_records: Option<Vec<TradeRecord>>,
    pub has_synthetic: bool,
}

impl PipelineTrainingData {
    pub fn from_loaded(policy_corpus: Option<Vec<String>>, trade: LoadedTradeData) -> Self {
        Self {
            policy_corpus,
            trade_records: Some(trade.records),
            has_synthetic: trade.has_synthetic,
        }
    }
}

pub struct PipelineOrchestrator {
    config: PipelineConfig,
    store: Arc<GraphStore>,
    policy: PolicyFeatureExtractor,
    trade_flow: TradeFlowPredictor,
    industry: IndustryLayer,
    firm: FirmLayer,
    consumer: ConsumerLayer,
    geopolitical: GeopoliticalLayer,
    has_synthetic: bool,
}

impl PipelineOrchestrator {
    /// Build all six stages around one shared graph store.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let store = Arc::new(GraphStore::new(config.graph.clone()));
        Ok(Self {
            policy: PolicyFeatureExtractor::new(config.extractor_config()),
            trade_flow: TradeFlowPredictor::new(config.trade_flow_config(), Arc::clone(&store)),
            industry: IndustryLayer::new(),
            firm: FirmLayer::new(),
            consumer: ConsumerLayer::new(),
            geopolitical: GeopoliticalLayer::new(),
            store,
            config,
            has_synthetic: false,
        })
    }

    /// Register a learned sentence encoder for the POLICY embedder.
    ///
    /// Ignored when `embedding.prefer_encoder` is false. Takes effect at the
    /// next fit.
    pub fn with_encoder(mut self, encoder: Arc<dyn SentenceEncoder>) -> Self {
        if self.config.embedding.prefer_encoder {
            self.policy = PolicyFeatureExtractor::new(self.config.extractor_config())
                .with_encoder(encoder);
        } else {
            warn!(encoder = encoder.name(), "encoder ignored, prefer_encoder is false");
        }
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn graph_store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    pub fn stage_states(&self) -> [(StageKind, LayerState); 6] {
        [
            (StageKind::Policy, self.policy.state()),
            (StageKind::TradeFlow, self.trade_flow.state()),
            (StageKind::Industry, self.industry.state()),
            (StageKind::Firm, self.firm.state()),
            (StageKind::Consumer, self.consumer.state()),
            (StageKind::Geopolitical, self.geopolitical.state()),
        ]
    }

    pub fn is_fitted(&self) -> bool {
        self.stage_states().iter().all(|(_, s)| s.is_fitted())
    }

    /// Fit every stage in order. Never aborts.
    pub fn fit(&mut self, data: &PipelineTrainingData) -> FitReport {
        let stages = vec![
            fit_stage(&mut self.policy, data.policy_corpus.as_deref()),
            fit_stage(&mut self.trade_flow, data.trade_records.as_deref()),
            fit_stage(&mut self.industry, None),
            fit_stage(&mut self.firm, None),
            fit_stage(&mut self.consumer, None),
            fit_stage(&mut self.geopolitical, None),
        ];
        self.has_synthetic = data.has_synthetic;

        let snapshot = self.store.snapshot();
        let report = FitReport {
            stages,
            graph_version: snapshot.version,
            dataset_hash: snapshot.graph.dataset_hash().clone(),
            config_hash: self.config.config_hash(),
        };
        info!(
            graph_version = %report.graph_version,
            forced = ?report.forced(),
            "pipeline fitted"
        );
        report
    }

    /// Rebuild the trade graph and retrain the trade-flow regressors.
    ///
    /// On failure the previous graph stays in service.
    pub fn retrain_graph(
        &mut self,
        records: &[TradeRecord],
        has_synthetic: bool,
    ) -> Result<GraphVersion, PipelineError> {
        let version = self
            .trade_flow
            .retrain(records)
            .map_err(PipelineError::Retrain)?;
        self.has_synthetic = has_synthetic;
        Ok(version)
    }

    /// Push one shock through all six stages.
    pub fn predict(&self, shock: &TariffShock) -> Result<PipelinePrediction, PipelineError> {
        let snapshot = self.store.snapshot();
        let mut degraded = Vec::new();

        let (policy_features, policy_c) =
            settle(&self.policy, shock, || self.policy.predict(shock), &mut degraded)?;
        let (trade_flow_impact, flow_c) = settle(
            &self.trade_flow,
            &policy_features,
            || self.trade_flow.predict_with(&snapshot, &policy_features),
            &mut degraded,
        )?;
        let (industry_response, industry_c) = settle(
            &self.industry,
            &trade_flow_impact,
            || self.industry.predict(&trade_flow_impact),
            &mut degraded,
        )?;
        let (firm_impact, firm_c) = settle(
            &self.firm,
            &industry_response,
            || self.firm.predict(&industry_response),
            &mut degraded,
        )?;
        let (consumer_impact, consumer_c) = settle(
            &self.consumer,
            &firm_impact,
            || self.consumer.predict(&firm_impact),
            &mut degraded,
        )?;
        let (geopolitical_impact, geo_c) = settle(
            &self.geopolitical,
            &consumer_impact,
            || self.geopolitical.predict(&consumer_impact),
            &mut degraded,
        )?;

        let confidence_scores = ConfidenceScores::from_stages([
            policy_c, flow_c, industry_c, firm_c, consumer_c, geo_c,
        ]);
        debug!(
            shock = %shock.tariff_id,
            overall = confidence_scores.overall_confidence,
            degraded = degraded.len(),
            "pipeline prediction complete"
        );

        Ok(PipelinePrediction {
            shock_id: shock.tariff_id.clone(),
            policy_features,
            trade_flow_impact,
            industry_response,
            firm_impact,
            consumer_impact,
            geopolitical_impact,
            confidence_scores,
            degraded_stages: degraded,
            graph_version: snapshot.version,
            dataset_hash: snapshot.graph.dataset_hash().clone(),
            has_synthetic: self.has_synthetic,
        })
    }
}

fn fit_stage<S: Stage>(stage: &mut S, data: Option<&S::TrainingData>) -> (StageKind, StageFitOutcome) {
    let kind = stage.kind();
    match stage.fit(data) {
        Ok(()) => (kind, StageFitOutcome::Fitted),
        Err(e) => {
            warn!(stage = %kind, error = %e, "stage fit failed, forcing fitted with defaults");
            stage.force_fitted();
            (
                kind,
                StageFitOutcome::ForcedFitted {
                    reason: e.to_string(),
                },
            )
        }
    }
}

/// Run one stage and turn its result into output + confidence.
///
/// `NotFitted` is surfaced. Any other error, or a panic inside the stage
/// (e.g. from a caller-supplied encoder), degrades to the stage's default
/// output with confidence 0.
fn settle<S: Stage>(
    stage: &S,
    input: &S::Input,
    run: impl FnOnce() -> Result<S::Output, StageError>,
    degraded: &mut Vec<StageKind>,
) -> Result<(S::Output, f64), PipelineError> {
    let kind = stage.kind();
    let result = panic::catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
        Err(StageError::Predict {
            stage: kind,
            reason: panic_message(payload.as_ref()),
        })
    });
    match result {
        Ok(output) => {
            let confidence = stage.confidence(&output);
            debug!(stage = %kind, confidence, "stage complete");
            Ok((output, confidence))
        }
        Err(StageError::NotFitted { stage, state }) => Err(PipelineError::NotFitted { stage, state }),
        Err(e) => {
            warn!(stage = %kind, error = %e, "stage failed, substituting default output");
            degraded.push(kind);
            Ok((stage.fallback_output(input), 0.0))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
