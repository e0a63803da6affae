use crate::adaptation::Adaptation;
use crate::errors::{Error, Result};
use crate::market::Market;
use crate::regulation::Regulation;
use crate::stock::Stock;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::LogNormal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub name: String,
}

/// Gear configuration: a catchability coefficient per species.
///
/// A `Gear` is an immutable value. Adaptation never edits a gear in place;
/// it builds a new one and swaps it in between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    catchability: Vec<f64>,
}

impl Gear {
    pub fn new(catchability: Vec<f64>) -> Self {
        Self { catchability }
    }

    pub fn catchability(&self, species: usize) -> f64 {
        self.catchability[species]
    }

    pub fn catchabilities(&self) -> &[f64] {
        &self.catchability
    }

    /// Whether this gear catches the given species at all.
    pub fn targets(&self, species: usize) -> bool {
        self.catchability[species] > 0.0
    }

    pub fn total_catchability(&self) -> f64 {
        self.catchability.iter().sum()
    }

    /// Euclidean distance between two gears in catchability space.
    pub fn distance(&self, other: &Self) -> f64 {
        self.catchability
            .iter()
            .zip(&other.catchability)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Whether two gears count as the same strategy for fitness attribution.
    pub fn is_close(&self, other: &Self, tol: f64) -> bool {
        self.distance(other) <= tol
    }
}

/// A harvesting agent.
///
/// The fisher owns its gear exclusively; the adaptation pass replaces it
/// atomically between ticks. `cash_history` holds one cash reading per
/// simulated day and is the trailing record every objective reads.
#[derive(Clone, Serialize, Deserialize)]
pub struct Fisher {
    gear: Gear,
    cash: f64,
    cash_history: Vec<f64>,
    quota: Vec<f64>,
    unfilled: Vec<f64>,
    adaptation: Option<Adaptation>,
}

impl Fisher {
    pub fn new(gear: Gear, n_species: usize) -> Self {
        Self {
            gear,
            cash: 0.0,
            cash_history: Vec::new(),
            quota: vec![0.0; n_species],
            unfilled: vec![0.0; n_species],
            adaptation: None,
        }
    }

    pub fn gear(&self) -> &Gear {
        &self.gear
    }

    /// Swap in a new gear. Called by the adaptation apply phase and by
    /// scenario setup, never while a tick is executing.
    pub fn replace_gear(&mut self, gear: Gear) {
        self.gear = gear;
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn credit(&mut self, amount: f64) {
        self.cash += amount;
    }

    pub fn cash_history(&self) -> &[f64] {
        &self.cash_history
    }

    pub fn record_cash(&mut self) {
        self.cash_history.push(self.cash);
    }

    /// Private quota balance for one species (meaningful under ITQ only).
    pub fn quota(&self, species: usize) -> f64 {
        self.quota[species]
    }

    pub fn set_quota(&mut self, species: usize, amount: f64) {
        self.quota[species] = amount;
    }

    pub fn draw_quota(&mut self, species: usize, amount: f64) {
        self.quota[species] = (self.quota[species] - amount).max(0.0);
    }

    pub fn add_quota(&mut self, species: usize, amount: f64) {
        self.quota[species] += amount;
    }

    /// Catch the regulation rejected today, per species.
    pub fn unfilled(&self, species: usize) -> f64 {
        self.unfilled[species]
    }

    pub fn add_unfilled(&mut self, species: usize, amount: f64) {
        self.unfilled[species] += amount;
    }

    pub fn clear_unfilled(&mut self) {
        self.unfilled.iter_mut().for_each(|v| *v = 0.0);
    }

    pub fn adaptation(&self) -> Option<&Adaptation> {
        self.adaptation.as_ref()
    }

    pub fn set_adaptation(&mut self, adaptation: Option<Adaptation>) {
        self.adaptation = adaptation;
    }
}

/// The mutable world state advanced by the schedule.
///
/// All per-species vectors are indexed by species id. The `*_today` counters
/// are zeroed at dawn and the `*_year` counters at year end, after the yearly
/// gatherers have read them.
#[derive(Clone, Serialize, Deserialize)]
pub struct Fishery {
    species: Vec<Species>,
    fishers: Vec<Fisher>,
    stock: Stock,
    market: Market,
    regulation: Regulation,
    luck_sigma: f64,
    landings_today: Vec<f64>,
    landings_year: Vec<f64>,
    earnings_today: Vec<f64>,
    earnings_year: Vec<f64>,
}

impl Fishery {
    pub fn new(
        species: Vec<Species>,
        fishers: Vec<Fisher>,
        stock: Stock,
        market: Market,
        regulation: Regulation,
        luck_sigma: f64,
    ) -> Self {
        let n = species.len();
        Self {
            species,
            fishers,
            stock,
            market,
            regulation,
            luck_sigma,
            landings_today: vec![0.0; n],
            landings_year: vec![0.0; n],
            earnings_today: vec![0.0; n],
            earnings_year: vec![0.0; n],
        }
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn fishers(&self) -> &[Fisher] {
        &self.fishers
    }

    pub fn fishers_mut(&mut self) -> &mut [Fisher] {
        &mut self.fishers
    }

    pub fn stock(&self) -> &Stock {
        &self.stock
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn regulation(&self) -> &Regulation {
        &self.regulation
    }

    pub fn regulation_mut(&mut self) -> &mut Regulation {
        &mut self.regulation
    }

    pub fn landings_today(&self, species: usize) -> f64 {
        self.landings_today[species]
    }

    pub fn landings_year(&self, species: usize) -> f64 {
        self.landings_year[species]
    }

    pub fn earnings_today(&self, species: usize) -> f64 {
        self.earnings_today[species]
    }

    pub fn earnings_year(&self, species: usize) -> f64 {
        self.earnings_year[species]
    }

    /// Number of fishers whose gear targets the given species.
    pub fn catchers(&self, species: usize) -> usize {
        self.fishers.iter().filter(|f| f.gear.targets(species)).count()
    }

    pub fn total_cash(&self) -> f64 {
        self.fishers.iter().map(Fisher::cash).sum()
    }

    /// One day of harvesting for the whole fleet, in fisher order.
    ///
    /// A single log-normal luck factor per fisher scales the day's potential
    /// catch of every species; the regulation clips the potential to what may
    /// be landed, the market prices the clipped portion, and only the landed
    /// quantity leaves the stock.
    pub fn harvest_day(&mut self, rng: &mut ChaCha12Rng) -> Result<()> {
        let luck_dist = LogNormal::new(0.0, self.luck_sigma)
            .map_err(|e| Error::Configuration(format!("invalid luck sigma: {e}")))?;

        let n_species = self.species.len();
        for i in 0..self.fishers.len() {
            let luck = luck_dist.sample(rng);
            for s in 0..n_species {
                let q = self.fishers[i].gear.catchability(s);
                if q <= 0.0 {
                    continue;
                }
                let potential = q * self.stock.expected_catch(s) * luck;
                if potential <= 0.0 {
                    continue;
                }
                let landed = self.regulation.book(&mut self.fishers[i], s, potential);
                if landed <= 0.0 {
                    // A closed quota makes a zero-revenue day, not a fault.
                    continue;
                }
                let revenue = self.market.sell(s, landed, self.landings_today[s]);
                self.fishers[i].credit(revenue);
                self.landings_today[s] += landed;
                self.landings_year[s] += landed;
                self.earnings_today[s] += revenue;
                self.earnings_year[s] += revenue;
                self.stock.deplete(s, landed);
            }
        }
        Ok(())
    }

    /// Daily ITQ closing session (no-op under other regimes).
    pub fn quota_market_day(&mut self) {
        self.regulation.trade_session(&mut self.fishers);
    }

    pub fn grow_stock(&mut self) {
        self.stock.grow();
    }

    /// Append today's closing cash to every fisher's history.
    pub fn record_memories(&mut self) {
        self.fishers.iter_mut().for_each(Fisher::record_cash);
    }

    pub fn reset_daily_counters(&mut self) {
        self.landings_today.iter_mut().for_each(|v| *v = 0.0);
        self.earnings_today.iter_mut().for_each(|v| *v = 0.0);
        self.fishers.iter_mut().for_each(Fisher::clear_unfilled);
    }

    pub fn reset_yearly_counters(&mut self) {
        self.landings_year.iter_mut().for_each(|v| *v = 0.0);
        self.earnings_year.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Re-open every quota ledger and re-allocate ITQ balances.
    pub fn reset_quota_year(&mut self) {
        self.regulation.reset_yearly(&mut self.fishers);
    }
}
