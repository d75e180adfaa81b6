//! FIRM stage: layoffs, margins and pricing from the industry response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::industry::IndustryResponse;
use super::sectors::Sector;
use crate::stage::{LayerState, Stage, StageError, StageKind};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirmSectorImpact {
    pub layoff_risk: f64,
    pub revenue_impact: f64,
    pub margin_pressure: f64,
    /// Capped at 15% of layoff risk.
    pub price_increase: f64,
    pub relocation_probability: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirmImpact {
    pub sectors: BTreeMap<Sector, FirmSectorImpact>,
}

#[derive(Debug)]
pub struct FirmLayer {
    state: LayerState,
}

impl Default for FirmLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl FirmLayer {
    pub fn new() -> Self {
        Self {
            state: LayerState::NotFitted,
        }
    }

    pub fn respond(industry: &IndustryResponse) -> FirmImpact {
        let sectors = industry
            .sectors
            .iter()
            .map(|(sector, r)| {
                let layoff_risk = (r.employment_effect.abs() * 1.5).min(1.0);
                let impact = FirmSectorImpact {
                    layoff_risk,
                    revenue_impact: 0.8 * r.output_change,
                    margin_pressure: 0.6 * r.input_cost_change + 0.2 * r.disruption,
                    price_increase: (0.5 * r.input_cost_change).min(0.15 * layoff_risk),
                    relocation_probability: (r.supply_chain_shift * 0.7).min(1.0),
                };
                (*sector, impact)
            })
            .collect();
        FirmImpact { sectors }
    }
}

impl Stage for FirmLayer {
    type Input = IndustryResponse;
    type Output = FirmImpact;
    type TrainingData = ();

    fn kind(&self) -> StageKind {
        StageKind::Firm
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

    fn predict(&self, input: &IndustryResponse) -> Result<FirmImpact, StageError> {
        self.ensure_fitted()?;
        Ok(Self::respond(input))
    }

    fn confidence(&self, output: &FirmImpact) -> f64 {
        if output.sectors.is_empty() {
            0.3
        } else {
            0.7
        }
    }

    fn fallback_output(&self, _input: &IndustryResponse) -> FirmImpact {
        FirmImpact::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::industry::SectorResponse;

    #[test]
    fn price_increase_is_capped_by_layoff_risk() {
        let mut industry = IndustryResponse::default();
        industry.sectors.insert(
            Sector::Metals,
            SectorResponse {
                disruption: 0.5,
                output_change: -0.3,
                employment_effect: -0.2,
                capacity_utilization_change: -0.15,
                input_cost_change: 0.4,
                supply_chain_shift: 0.25,
            },
        );
        let firm = FirmLayer::respond(&industry);
        let m = &firm.sectors[&Sector::Metals];
        assert!((m.layoff_risk - 0.3).abs() < 1e-12);
        assert!((m.revenue_impact + 0.24).abs() < 1e-12);
        assert!((m.margin_pressure - 0.34).abs() < 1e-12);
        // min(0.2, 0.045)
        assert!((m.price_increase - 0.045).abs() < 1e-12);
        assert!((m.relocation_probability - 0.175).abs() < 1e-12);
    }

    #[test]
    fn layoff_risk_saturates() {
        let mut industry = IndustryResponse::default();
        industry.sectors.insert(
            Sector::Metals,
            SectorResponse {
                employment_effect: -0.9,
                ..SectorResponse::default()
            },
        );
        assert_eq!(FirmLayer::respond(&industry).sectors[&Sector::Metals].layoff_risk, 1.0);
    }
}
