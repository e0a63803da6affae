use serde::{Deserialize, Serialize};

/// Biological stock model behind the expected per-unit-effort catch.
///
/// `Fixed` keeps abundance constant for regulation and market experiments.
/// `Logistic` tracks biomass per species: landings deplete it and a daily
/// logistic increment regrows it toward carrying capacity.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stock {
    Fixed {
        cpue: Vec<f64>,
    },
    Logistic {
        biomass: Vec<f64>,
        capacity: Vec<f64>,
        /// Per-day intrinsic growth rate (yearly rate over days per year).
        growth: Vec<f64>,
    },
}

impl Stock {
    /// Catch a fisher with unit catchability would expect today.
    pub fn expected_catch(&self, species: usize) -> f64 {
        match self {
            Self::Fixed { cpue } => cpue[species],
            Self::Logistic { biomass, .. } => biomass[species].max(0.0),
        }
    }

    /// Remove a landed quantity. Only what was actually landed leaves the
    /// water; catch rejected by a regulation stays in the stock.
    pub fn deplete(&mut self, species: usize, landed: f64) {
        if let Self::Logistic { biomass, .. } = self {
            biomass[species] = (biomass[species] - landed).max(0.0);
        }
    }

    /// One day of regrowth.
    pub fn grow(&mut self) {
        if let Self::Logistic { biomass, capacity, growth } = self {
            for s in 0..biomass.len() {
                let b = biomass[s];
                if capacity[s] > 0.0 {
                    biomass[s] = (b + growth[s] * b * (1.0 - b / capacity[s])).max(0.0);
                }
            }
        }
    }

    /// Current biomass, when the model tracks one.
    pub fn biomass(&self, species: usize) -> Option<f64> {
        match self {
            Self::Fixed { .. } => None,
            Self::Logistic { biomass, .. } => Some(biomass[species]),
        }
    }
}
