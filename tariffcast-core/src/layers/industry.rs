//! INDUSTRY stage: per-sector response to trade disruption.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::sectors::{mean, Sector};
use crate::flow::TradeFlowPrediction;
use crate::stage::{LayerState, Stage, StageError, StageKind};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorResponse {
    /// Highest chapter disruption within the sector.
    pub disruption: f64,
    pub output_change: f64,
    pub employment_effect: f64,
    pub capacity_utilization_change: f64,
    pub input_cost_change: f64,
    pub supply_chain_shift: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndustryResponse {
    pub sectors: BTreeMap<Sector, SectorResponse>,
}

#[derive(Debug)]
pub struct IndustryLayer {
    state: LayerState,
}

impl Default for IndustryLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl IndustryLayer {
    pub fn new() -> Self {
        Self {
            state: LayerState::NotFitted,
        }
    }

    pub fn respond(flow: &TradeFlowPrediction) -> IndustryResponse {
        let mut sectors: BTreeMap<Sector, SectorResponse> = BTreeMap::new();
        for (chapter, score) in &flow.disruption_scores {
            let entry = sectors.entry(Sector::from_chapter(chapter)).or_default();
            entry.disruption = entry.disruption.max(*score);
        }
        for (sector, r) in sectors.iter_mut() {
            let d = r.disruption;
            r.output_change = -0.6 * d;
            r.employment_effect = -0.4 * d;
            r.capacity_utilization_change = -0.3 * d;
            r.supply_chain_shift = 0.5 * d;
            r.input_cost_change = mean(
                flow.affected_routes
                    .iter()
                    .filter(|route| Sector::from_chapter(&route.chapter()) == *sector)
                    .map(|route| route.cost_change),
            );
        }
        IndustryResponse { sectors }
    }
}

impl Stage for IndustryLayer {
    type Input = TradeFlowPrediction;
    type Output = IndustryResponse;
    type TrainingData = ();

    fn kind(&self) -> StageKind {
        StageKind::Industry
    }

    fn state(&self) -> LayerState {
        self.state
    }

    fn fit(&mut self, _data: Option<&()>) -> Result<(), StageError> {
        self.state = LayerState::Fitted;
        Ok(())
    }

    fn force_fitted(&mut self) {
        self.state = LayerState::Fitted;
    }

    fn predict(&self, input: &TradeFlowPrediction) -> Result<IndustryResponse, StageError> {
        self.ensure_fitted()?;
        Ok(Self::respond(input))
    }

    fn confidence(&self, output: &IndustryResponse) -> f64 {
        if output.sectors.is_empty() {
            0.3
        } else {
            0.75
        }
    }

    fn fallback_output(&self, _input: &TradeFlowPrediction) -> IndustryResponse {
        IndustryResponse::default()
    }
}
