//! CONSUMER stage: prices, demand and welfare from firm impacts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::firm::FirmImpact;
use super::sectors::{mean, Sector};
use crate::stage::{LayerState, Stage, StageError, StageKind};

/// Median annual household spending (USD) used to express CPI impact.
pub const HOUSEHOLD_SPENDING: f64 = 63_000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumerSectorImpact {
    pub price_change: f64,
    pub demand_change: f64,
    pub welfare_loss: f64,
    pub availability_risk: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumerImpact {
    pub sectors: BTreeMap<Sector, ConsumerSectorImpact>,
    /// Mean sector price change.
    pub cpi_impact: f64,
    pub household_cost_increase: f64,
}

#[derive(Debug)]
pub struct ConsumerLayer {
    state: LayerState,
}

impl Default for ConsumerLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsumerLayer {
    pub fn new() -> Self {
        Self {
            state: LayerState::NotFitted,
        }
    }

    pub fn respond(firm: &FirmImpact) -> ConsumerImpact {
        let sectors: BTreeMap<Sector, ConsumerSectorImpact> = firm
            .sectors
            .iter()
            .map(|(sector, f)| {
                let price_change = 0.9 * f.price_increase;
                let demand_change = -1.2 * price_change;
                let impact = ConsumerSectorImpact {
                    price_change,
                    demand_change,
                    welfare_loss: price_change * (1.0 + 0.5 * demand_change.abs()),
                    availability_risk: (f.layoff_risk * 0.5 + f.relocation_probability * 0.3)
                        .min(1.0),
                };
                (*sector, impact)
            })
            .collect();
        let cpi_impact = mean(sectors.values().map(|s| s.price_change));
        ConsumerImpact {
            sectors,
            cpi_impact,
            household_cost_increase: cpi_impact * HOUSEHOLD_SPENDING,
        }
    }
}

impl Stage for ConsumerLayer {
    type Input = FirmImpact;
    type Output = ConsumerImpact;
    type TrainingData = ();

    fn kind(&self) -> StageKind {
        StageKind::Consumer
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

    fn predict(&self, input: &FirmImpact) -> Result<ConsumerImpact, StageError> {
        self.ensure_fitted()?;
        Ok(Self::respond(input))
    }

    fn confidence(&self, output: &ConsumerImpact) -> f64 {
        if output.sectors.is_empty() {
            0.3
        } else {
            0.65
        }
    }

    fn fallback_output(&self, _input: &FirmImpact) -> ConsumerImpact {
        ConsumerImpact::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::firm::FirmSectorImpact;

    #[test]
    fn consumer_coefficients() {
        let mut firm = FirmImpact::default();
        firm.sectors.insert(
            Sector::MachineryElectronics,
            FirmSectorImpact {
                layoff_risk: 0.4,
                revenue_impact: -0.2,
                margin_pressure: 0.1,
                price_increase: 0.1,
                relocation_probability: 0.5,
            },
        );
        firm.sectors.insert(Sector::Metals, FirmSectorImpact::default());

        let c = ConsumerLayer::respond(&firm);
        let m = &c.sectors[&Sector::MachineryElectronics];
        assert!((m.price_change - 0.09).abs() < 1e-12);
        assert!((m.demand_change + 0.108).abs() < 1e-12);
        assert!((m.welfare_loss - 0.09 * 1.054).abs() < 1e-12);
        assert!((m.availability_risk - 0.35).abs() < 1e-12);
        assert!((c.cpi_impact - 0.045).abs() < 1e-12);
        assert!((c.household_cost_increase - 0.045 * 63_000.0).abs() < 1e-9);
    }

    #[test]
    fn empty_firm_impact_is_neutral() {
        let c = ConsumerLayer::respond(&FirmImpact::default());
        assert_eq!(c.cpi_impact, 0.0);
        assert_eq!(c.household_cost_increase, 0.0);
    }
}
