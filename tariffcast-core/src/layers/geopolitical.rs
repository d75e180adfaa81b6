//! GEOPOLITICAL stage: retaliation and alliance strain from consumer impacts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::consumer::ConsumerImpact;
use super::sectors::{mean, Sector};
use crate::stage::{LayerState, Stage, StageError, StageKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationLevel {
    #[default]
    Low,
    Moderate,
    High,
    Severe,
}

impl EscalationLevel {
    pub fn from_tension(tension: f64) -> Self {
        if tension < 0.1 {
            Self::Low
        } else if tension < 0.3 {
            Self::Moderate
        } else if tension < 0.6 {
            Self::High
        } else {
            Self::Severe
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeopoliticalSectorImpact {
    pub retaliation_risk: f64,
    pub alliance_strain: f64,
    pub trade_diversion: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeopoliticalImpact {
    pub sectors: BTreeMap<Sector, GeopoliticalSectorImpact>,
    /// Mean retaliation risk.
    pub tension_index: f64,
    pub escalation_level: EscalationLevel,
}

#[derive(Debug)]
pub struct GeopoliticalLayer {
    state: LayerState,
}

impl Default for GeopoliticalLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl GeopoliticalLayer {
    pub fn new() -> Self {
        Self {
            state: LayerState::NotFitted,
        }
    }

    pub fn respond(consumer: &ConsumerImpact) -> GeopoliticalImpact {
        let sectors: BTreeMap<Sector, GeopoliticalSectorImpact> = consumer
            .sectors
            .iter()
            .map(|(sector, c)| {
                let retaliation_risk = (2.0 * c.demand_change.abs() + c.welfare_loss).min(1.0);
                let alliance_strain = (c.availability_risk * 0.6).min(1.0);
                let impact = GeopoliticalSectorImpact {
                    retaliation_risk,
                    alliance_strain,
                    trade_diversion: (0.5 * retaliation_risk + 0.5 * alliance_strain).min(1.0),
                };
                (*sector, impact)
            })
            .collect();
        let tension_index = mean(sectors.values().map(|s| s.retaliation_risk));
        GeopoliticalImpact {
            sectors,
            tension_index,
            escalation_level: EscalationLevel::from_tension(tension_index),
        }
    }
}

impl Stage for GeopoliticalLayer {
    type Input = ConsumerImpact;
    type Output = GeopoliticalImpact;
    type TrainingData = ();

    fn kind(&self) -> StageKind {
        StageKind::Geopolitical
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

    fn predict(&self, input: &ConsumerImpact) -> Result<GeopoliticalImpact, StageError> {
        self.ensure_fitted()?;
        Ok(Self::respond(input))
    }

    fn confidence(&self, output: &GeopoliticalImpact) -> f64 {
        if output.sectors.is_empty() {
            0.3
        } else {
            0.6
        }
    }

    fn fallback_output(&self, _input: &ConsumerImpact) -> GeopoliticalImpact {
        GeopoliticalImpact::default()
    }
}
