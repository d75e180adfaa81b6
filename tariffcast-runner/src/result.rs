//! Pipeline output types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tariffcast_core::domain::{DatasetHash, GraphVersion, ShockId};
use tariffcast_core::flow::TradeFlowPrediction;
use tariffcast_core::layers::{ConsumerImpact, FirmImpact, GeopoliticalImpact, IndustryResponse};
use tariffcast_core::stage::StageKind;
use tariffcast_core::text::PolicyFeatures;

/// Per-stage confidence plus their unweighted mean.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScores {
    pub policy_confidence: f64,
    pub trade_flow_confidence: f64,
    pub industry_confidence: f64,
    pub firm_confidence: f64,
    pub consumer_confidence: f64,
    pub geopolitical_confidence: f64,
    pub overall_confidence: f64,
}

impl ConfidenceScores {
    /// Build from stage confidences in `StageKind::ALL` order. Each is clamped to [0, 1].
    pub fn from_stages(scores: [f64; 6]) -> Self {
        let c = scores.map(|s| if s.is_finite() { s.clamp(0.0, 1.0) } else { 0.0 });
        Self {
            policy_confidence: c[0],
            trade_flow_confidence: c[1],
            industry_confidence: c[2],
            firm_confidence: c[3],
            consumer_confidence: c[4],
            geopolitical_confidence: c[5],
            overall_confidence: c.iter().sum::<f64>() / c.len() as f64,
        }
    }

    pub fn get(&self, stage: StageKind) -> f64 {
        match stage {
            StageKind::Policy => self.policy_confidence,
            StageKind::TradeFlow => self.trade_flow_confidence,
            StageKind::Industry => self.industry_confidence,
            StageKind::Firm => self.firm_confidence,
            StageKind::Consumer => self.consumer_confidence,
            StageKind::Geopolitical => self.geopolitical_confidence,
        }
    }

    /// Scores keyed by stage confidence name, plus `overall_confidence`.
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        let mut map: BTreeMap<&'static str, f64> = StageKind::ALL
            .iter()
            .map(|s| (s.confidence_key(), self.get(*s)))
            .collect();
        map.insert("overall_confidence", self.overall_confidence);
        map
    }
}

/// Everything one `predict` call produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelinePrediction {
    pub shock_id: ShockId,
    pub policy_features: PolicyFeatures,
    pub trade_flow_impact: TradeFlowPrediction,
    pub industry_response: IndustryResponse,
    pub firm_impact: FirmImpact,
    pub consumer_impact: ConsumerImpact,
    pub geopolitical_impact: GeopoliticalImpact,
    pub confidence_scores: ConfidenceScores,
    /// Stages whose `predict` failed and were replaced by their default output.
    pub degraded_stages: Vec<StageKind>,
    /// Graph the trade-flow stage read from.
    pub graph_version: GraphVersion,
    pub dataset_hash: DatasetHash,
    /// True if the pipeline was fitted on synthetic trade data.
    pub has_synthetic: bool,
}

impl PipelinePrediction {
    pub fn is_degraded(&self) -> bool {
        !self.degraded_stages.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// How one stage came out of `fit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageFitOutcome {
    Fitted,
    /// Fit failed; the stage was marked fitted with default parameters.
    ForcedFitted { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub stages: Vec<(StageKind, StageFitOutcome)>,
    pub graph_version: GraphVersion,
    pub dataset_hash: DatasetHash,
    pub config_hash: String,
}

impl FitReport {
    pub fn all_fitted_cleanly(&self) -> bool {
        self.stages
            .iter()
            .all(|(_, o)| matches!(o, StageFitOutcome::Fitted))
    }

    pub fn forced(&self) -> Vec<StageKind> {
        self.stages
            .iter()
            .filter(|(_, o)| matches!(o, StageFitOutcome::ForcedFitted { .. }))
            .map(|(k, _)| *k)
            .collect()
    }
}
