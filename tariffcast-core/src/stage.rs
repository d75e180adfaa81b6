//! Stage trait — the contract every pipeline layer implements.
//!
//! The six layers form a strict chain:
//! POLICY → TRADE_FLOW → INDUSTRY → FIRM → CONSUMER → GEOPOLITICAL.
//!
//! Each stage names its input as an associated type, so a stage can only ever
//! be fed the structured output of its immediate predecessor. Earlier
//! ancestors are not reachable through the trait.
//!
//! Lifecycle per stage: `NotFitted --fit()--> Fitted`, `fit()` failure moves
//! to `Failed`, and `force_fitted()` moves any state to `Fitted` with default
//! parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fit state of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerState {
    NotFitted,
    Fitted,
    Failed,
}

impl LayerState {
    pub fn is_fitted(self) -> bool {
        matches!(self, Self::Fitted)
    }
}

/// The six pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageKind {
    Policy,
    TradeFlow,
    Industry,
    Firm,
    Consumer,
    Geopolitical,
}

impl StageKind {
    pub const ALL: [StageKind; 6] = [
        StageKind::Policy,
        StageKind::TradeFlow,
        StageKind::Industry,
        StageKind::Firm,
        StageKind::Consumer,
        StageKind::Geopolitical,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::TradeFlow => "trade_flow",
            Self::Industry => "industry",
            Self::Firm => "firm",
            Self::Consumer => "consumer",
            Self::Geopolitical => "geopolitical",
        }
    }

    /// Key under which this stage's confidence is reported.
    pub fn confidence_key(self) -> &'static str {
        match self {
            Self::Policy => "policy_confidence",
            Self::TradeFlow => "trade_flow_confidence",
            Self::Industry => "industry_confidence",
            Self::Firm => "firm_confidence",
            Self::Consumer => "consumer_confidence",
            Self::Geopolitical => "geopolitical_confidence",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by a stage.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StageError {
    #[error("stage '{stage}' is not fitted (state {state:?})")]
    NotFitted { stage: StageKind, state: LayerState },
    #[error("stage '{stage}' failed to fit: {reason}")]
    Fit { stage: StageKind, reason: String },
    #[error("stage '{stage}' failed to predict: {reason}")]
    Predict { stage: StageKind, reason: String },
}

impl StageError {
    pub fn stage(&self) -> StageKind {
        match self {
            Self::NotFitted { stage, .. } | Self::Fit { stage, .. } | Self::Predict { stage, .. } => {
                *stage
            }
        }
    }
}

/// A single pipeline layer.
///
/// # Architecture invariant
/// `predict` receives only `Self::Input`, the predecessor's output type.
/// The orchestrator wires `Stage<Output = X>` into `Stage<Input = X>`, so a
/// layer that wants to peek at an earlier ancestor does not type-check.
pub trait Stage: Send + Sync {
    type Input;
    type Output;
    /// Training data accepted by `fit`. Deterministic layers use `()`.
    type TrainingData: ?Sized;

    fn kind(&self) -> StageKind;

    fn state(&self) -> LayerState;

    /// Fit the stage. `None` asks the stage to fit from its own defaults.
    ///
    /// On error the stage must be left in `LayerState::Failed`.
    fn fit(&mut self, data: Option<&Self::TrainingData>) -> Result<(), StageError>;

    /// Mark the stage fitted with default parameters after a failed fit.
    fn force_fitted(&mut self);

    /// Run the stage. Must fail with `StageError::NotFitted` unless fitted,
    /// except where a stage documents an auto-fit fallback.
    fn predict(&self, input: &Self::Input) -> Result<Self::Output, StageError>;

    /// Stage-specific confidence heuristic in [0, 1].
    fn confidence(&self, output: &Self::Output) -> f64;

    /// Degraded output substituted when `predict` fails unexpectedly.
    fn fallback_output(&self, input: &Self::Input) -> Self::Output;

    /// Shared NotFitted guard for `predict` implementations.
    fn ensure_fitted(&self) -> Result<(), StageError> {
        let state = self.state();
        if state.is_fitted() {
            Ok(())
        } else {
            Err(StageError::NotFitted {
                stage: self.kind(),
                state,
            })
        }
    }
}
