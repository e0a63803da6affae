//! Harvest regulation: what part of a potential catch may be landed, and the
//! daily clearing session that moves individual quota between fishers.

use crate::model::Fisher;
use serde::{Deserialize, Serialize};

/// Lifecycle of a quota over a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaState {
    Open,
    Depleting,
    Closed,
}

/// Fleet-wide yearly allowance for one species.
#[derive(Clone, Serialize, Deserialize)]
pub struct QuotaLedger {
    allocated: f64,
    remaining: f64,
}

impl QuotaLedger {
    pub fn new(allocated: f64) -> Self {
        Self { allocated, remaining: allocated }
    }

    pub fn allocated(&self) -> f64 {
        self.allocated
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn state(&self) -> QuotaState {
        if self.remaining <= 0.0 {
            QuotaState::Closed
        } else if self.remaining < self.allocated {
            QuotaState::Depleting
        } else {
            QuotaState::Open
        }
    }

    /// Clip a potential catch to the remaining allowance and book it.
    /// Landing exactly the remainder closes the ledger; further bookings
    /// return zero until the yearly reset.
    pub fn book(&mut self, potential: f64) -> f64 {
        let landed = potential.min(self.remaining);
        self.remaining -= landed;
        landed
    }

    pub fn reset(&mut self) {
        self.remaining = self.allocated;
    }
}

/// How the ITQ closing price moves after each session.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuotaPriceRule {
    Additive { step: f64 },
    Multiplicative { rate: f64 },
}

/// Closing price of quota for one species.
///
/// The price moves one rule step toward scarcity after every session: up
/// when demand exceeded supply, down when supply exceeded demand, and is
/// always clamped to `[floor, cap]`. It persists across year boundaries.
#[derive(Clone, Serialize, Deserialize)]
pub struct QuotaPrice {
    price: f64,
    floor: f64,
    cap: f64,
    rule: QuotaPriceRule,
}

impl QuotaPrice {
    pub fn new(initial: f64, floor: f64, cap: f64, rule: QuotaPriceRule) -> Self {
        Self { price: initial.clamp(floor, cap), floor, cap, rule }
    }

    pub fn closing(&self) -> f64 {
        self.price
    }

    pub fn update(&mut self, demand: f64, supply: f64) {
        let next = match self.rule {
            QuotaPriceRule::Additive { step } => {
                if demand > supply {
                    self.price + step
                } else if demand < supply {
                    self.price - step
                } else {
                    self.price
                }
            }
            QuotaPriceRule::Multiplicative { rate } => {
                if demand > supply {
                    self.price * (1.0 + rate)
                } else if demand < supply {
                    self.price * (1.0 - rate)
                } else {
                    self.price
                }
            }
        };
        self.price = next.clamp(self.floor, self.cap);
    }
}

/// Harvest regime for the whole fishery.
///
/// Regulation is advisory through `book`: harvesting asks how much of a
/// potential catch may be landed and records the rejected remainder on the
/// fisher, where the ITQ session reads it back as quota demand.
#[derive(Clone, Serialize, Deserialize)]
pub enum Regulation {
    /// No restriction; everything caught is landed.
    OpenAccess,
    /// One fleet-wide total allowable catch ledger per species.
    Tac { ledgers: Vec<QuotaLedger> },
    /// Individual transferable quotas: each fisher holds a private balance
    /// per species, re-allocated yearly and traded daily at a closing price.
    Itq { allocation: Vec<f64>, prices: Vec<QuotaPrice> },
}

impl Regulation {
    /// Clip a fisher's potential catch of one species to what may be landed
    /// today, drawing down the backing ledger or balance. The rejected part
    /// is recorded on the fisher as unfilled catch.
    pub fn book(&mut self, fisher: &mut Fisher, species: usize, potential: f64) -> f64 {
        match self {
            Self::OpenAccess => potential,
            Self::Tac { ledgers } => {
                let landed = ledgers[species].book(potential);
                if potential > landed {
                    fisher.add_unfilled(species, potential - landed);
                }
                landed
            }
            Self::Itq { .. } => {
                let landed = potential.min(fisher.quota(species));
                fisher.draw_quota(species, landed);
                if potential > landed {
                    fisher.add_unfilled(species, potential - landed);
                }
                landed
            }
        }
    }

    /// Re-open ledgers and hand every fisher its yearly ITQ allocation.
    /// Closing prices carry over; price discovery continues across years.
    pub fn reset_yearly(&mut self, fishers: &mut [Fisher]) {
        match self {
            Self::OpenAccess => {}
            Self::Tac { ledgers } => ledgers.iter_mut().for_each(QuotaLedger::reset),
            Self::Itq { allocation, .. } => {
                for fisher in fishers {
                    for (species, amount) in allocation.iter().enumerate() {
                        fisher.set_quota(species, *amount);
                    }
                }
            }
        }
    }

    /// One ITQ clearing session per species (no-op under other regimes).
    ///
    /// Demand is today's unfilled catch of fishers targeting the species;
    /// supply is the full balance of fishers not targeting it. The traded
    /// volume `min(demand, supply)` moves pro rata from sellers to buyers at
    /// the current closing price, then the price takes one step toward
    /// scarcity. Quota is conserved; bought quota is usable from tomorrow.
    pub fn trade_session(&mut self, fishers: &mut [Fisher]) {
        let Self::Itq { prices, .. } = self else {
            return;
        };
        for (species, quota_price) in prices.iter_mut().enumerate() {
            let demand: f64 = fishers.iter().map(|f| f.unfilled(species)).sum();
            let supply: f64 = fishers
                .iter()
                .filter(|f| !f.gear().targets(species))
                .map(|f| f.quota(species))
                .sum();
            let traded = demand.min(supply);
            if traded > 0.0 {
                let price = quota_price.closing();
                for fisher in fishers.iter_mut() {
                    if fisher.gear().targets(species) {
                        let unfilled = fisher.unfilled(species);
                        if unfilled > 0.0 {
                            let share = traded * unfilled / demand;
                            fisher.add_quota(species, share);
                            fisher.credit(-share * price);
                        }
                    } else {
                        let held = fisher.quota(species);
                        if held > 0.0 {
                            let share = traded * held / supply;
                            fisher.draw_quota(species, share);
                            fisher.credit(share * price);
                        }
                    }
                }
            }
            quota_price.update(demand, supply);
        }
    }

    /// Fleet-wide remaining allowance under TAC.
    pub fn remaining(&self, species: usize) -> Option<f64> {
        match self {
            Self::Tac { ledgers } => Some(ledgers[species].remaining()),
            _ => None,
        }
    }

    pub fn quota_state(&self, species: usize) -> Option<QuotaState> {
        match self {
            Self::Tac { ledgers } => Some(ledgers[species].state()),
            _ => None,
        }
    }

    /// Last closing price of quota under ITQ.
    pub fn closing_price(&self, species: usize) -> Option<f64> {
        match self {
            Self::Itq { prices, .. } => Some(prices[species].closing()),
            _ => None,
        }
    }

    /// Yearly per-fisher allocation under ITQ.
    pub fn allocation(&self, species: usize) -> Option<f64> {
        match self {
            Self::Itq { allocation, .. } => Some(allocation[species]),
            _ => None,
        }
    }
}
