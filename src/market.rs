use serde::{Deserialize, Serialize};

/// Fish market a landed catch is sold into.
///
/// `sell` is a pure pricing function; the aggregate landings that drive the
/// congested price live in the fishery's daily counters and are passed in by
/// the caller.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Market {
    /// Constant exogenous price per unit of each species.
    Fixed { prices: Vec<f64> },
    /// Price falls linearly with what the fleet already landed today,
    /// floored at zero. Fishers selling early in the day get the better
    /// price, matching the sequential harvest pass.
    Congested { choke: Vec<f64>, slope: Vec<f64> },
}

impl Market {
    /// Revenue for `quantity` of `species`, given the aggregate quantity
    /// already landed today before this sale.
    pub fn sell(&self, species: usize, quantity: f64, landed_today: f64) -> f64 {
        match self {
            Self::Fixed { prices } => prices[species] * quantity,
            Self::Congested { choke, slope } => {
                let price = (choke[species] - slope[species] * landed_today).max(0.0);
                price * quantity
            }
        }
    }

    /// Marginal price currently quoted for a species.
    pub fn price(&self, species: usize, landed_today: f64) -> f64 {
        match self {
            Self::Fixed { prices } => prices[species],
            Self::Congested { choke, slope } => {
                (choke[species] - slope[species] * landed_today).max(0.0)
            }
        }
    }
}
