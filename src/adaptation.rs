//! Per-agent strategy adaptation.
//!
//! Once per cadence tick each adapting fisher runs one decision cycle:
//! explore a candidate gear with probability `exploration`, otherwise
//! imitate a sampled peer with probability `imitation`, otherwise keep the
//! current gear. A candidate is adopted only when its fitness under the
//! trailing cash-flow objective strictly beats the fisher's own; ties and
//! unevaluable fitnesses keep the current gear.
//!
//! The fleet pass is two-phase: every decision is made against the fleet as
//! it stood before the pass, then all swaps are applied. No fisher observes
//! a mid-pass gear change, and the order fishers are visited in cannot leak
//! into the outcome beyond their own random draws.

use crate::errors::{Error, Result};
use crate::model::{Fisher, Fishery, Gear};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::LogNormal;
use serde::{Deserialize, Serialize};

/// How an exploring fisher proposes a candidate gear.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateRule {
    /// Draw uniformly from a fixed list of gear options. Drawing the current
    /// gear again is allowed and resolves to a tie, hence a keep.
    Discrete { options: Vec<Gear> },
    /// Jitter every catchability of the current gear by an independent
    /// log-normal factor. Zero coefficients stay zero, so a fisher never
    /// perturbs its way onto a species it does not already target.
    Perturb { sigma: f64, match_tol: f64 },
}

impl CandidateRule {
    pub fn propose(&self, current: &Gear, rng: &mut ChaCha12Rng) -> Result<Gear> {
        match self {
            Self::Discrete { options } => options
                .choose(rng)
                .cloned()
                .ok_or_else(|| Error::Configuration("no candidate gear options".into())),
            Self::Perturb { sigma, .. } => {
                let jitter = LogNormal::new(0.0, *sigma)
                    .map_err(|e| Error::Configuration(format!("invalid perturbation sigma: {e}")))?;
                let catchability = current
                    .catchabilities()
                    .iter()
                    .map(|q| q * jitter.sample(rng))
                    .collect();
                Ok(Gear::new(catchability))
            }
        }
    }

    /// Gear distance within which holders count toward a candidate's
    /// fitness. Discrete options match exactly.
    pub fn match_tol(&self) -> f64 {
        match self {
            Self::Discrete { .. } => 0.0,
            Self::Perturb { match_tol, .. } => *match_tol,
        }
    }
}

/// How an imitating fisher samples the peer to copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NeighborRule {
    /// Any other fisher, uniformly.
    Uniform,
    /// A fisher within `span` positions on the fleet ring.
    Ring { span: usize },
}

impl NeighborRule {
    /// Sample a peer index distinct from `me`, or `None` when the fleet has
    /// nobody else to imitate.
    pub fn sample(&self, me: usize, n_fishers: usize, rng: &mut ChaCha12Rng) -> Option<usize> {
        if n_fishers < 2 {
            return None;
        }
        match *self {
            Self::Uniform => {
                let drawn = rng.random_range(0..n_fishers - 1);
                Some(if drawn >= me { drawn + 1 } else { drawn })
            }
            Self::Ring { span } => {
                let offset = rng.random_range(1..=span.min(n_fishers - 1)) as u64;
                let n = n_fishers as u64;
                let me = me as u64;
                let peer = if rng.random::<bool>() {
                    (me + offset) % n
                } else {
                    (me + n - offset % n) % n
                };
                Some(peer as usize)
            }
        }
    }
}

/// Eligibility filter applied to every candidate before fitness is even
/// consulted. An ineligible candidate ends the cycle with a keep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Acceptance {
    Any,
    /// Reject gears whose summed catchability exceeds `limit`.
    MaxCatchability { limit: f64 },
}

impl Acceptance {
    pub fn accepts(&self, gear: &Gear) -> bool {
        match *self {
            Self::Any => true,
            Self::MaxCatchability { limit } => gear.total_catchability() <= limit,
        }
    }
}

/// What to do when a fisher's history is shorter than the objective window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortHistory {
    /// The fitness is unevaluable and the cycle keeps the current gear.
    Stay,
    /// Evaluate over however much history exists.
    Truncate,
}

/// Trailing cash-flow objective: cash today minus cash `window` days ago.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub window: usize,
    pub short_history: ShortHistory,
}

impl CashFlow {
    /// A fisher's own fitness, or `None` when the history cannot support the
    /// window under the `Stay` policy.
    pub fn own_fitness(&self, fisher: &Fisher) -> Option<f64> {
        let history = fisher.cash_history();
        let n = history.len();
        if n < 2 {
            return None;
        }
        let span = if n > self.window {
            self.window
        } else {
            match self.short_history {
                ShortHistory::Stay => return None,
                ShortHistory::Truncate => n - 1,
            }
        };
        Some(history[n - 1] - history[n - 1 - span])
    }

    /// Fitness attributed to a gear: the mean own fitness of its current
    /// holders within `tol` gear distance. `None` when nobody holds it or no
    /// holder has an evaluable history.
    pub fn gear_fitness(&self, fishery: &Fishery, gear: &Gear, tol: f64) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0;
        for fisher in fishery.fishers() {
            if gear.is_close(fisher.gear(), tol) {
                if let Some(fitness) = self.own_fitness(fisher) {
                    sum += fitness;
                    count += 1;
                }
            }
        }
        if count == 0 { None } else { Some(sum / count as f64) }
    }
}

/// One fisher's adaptation module.
#[derive(Clone, Serialize, Deserialize)]
pub struct Adaptation {
    exploration: f64,
    imitation: f64,
    candidates: CandidateRule,
    neighbors: NeighborRule,
    objective: CashFlow,
    acceptance: Acceptance,
}

impl Adaptation {
    pub fn new(
        exploration: f64,
        imitation: f64,
        candidates: CandidateRule,
        neighbors: NeighborRule,
        objective: CashFlow,
        acceptance: Acceptance,
    ) -> Result<Self> {
        for (name, prob) in [("exploration", exploration), ("imitation", imitation)] {
            if !(0.0..=1.0).contains(&prob) {
                return Err(Error::Configuration(format!(
                    "{name} probability must be in the range 0.0..=1.0, but is {prob}"
                )));
            }
        }
        if exploration + imitation > 1.0 {
            return Err(Error::Configuration(format!(
                "exploration and imitation probabilities must sum to at most 1.0, \
                 but sum to {}",
                exploration + imitation
            )));
        }
        Ok(Self { exploration, imitation, candidates, neighbors, objective, acceptance })
    }

    pub fn objective(&self) -> &CashFlow {
        &self.objective
    }

    /// One decision cycle for the fisher at index `me`, read against the
    /// current fleet. Returns the gear to adopt, or `None` to keep.
    ///
    /// One uniform draw picks the branch; explore and imitate then consume
    /// further draws for their proposal. The candidate must pass the
    /// acceptance filter and strictly beat the fisher's own fitness. For an
    /// explored gear the candidate fitness is the holders' mean; for an
    /// imitated gear it is the peer's own.
    pub fn decide(
        &self,
        me: usize,
        fishery: &Fishery,
        rng: &mut ChaCha12Rng,
    ) -> Result<Option<Gear>> {
        let draw: f64 = rng.random();
        let current = fishery.fishers()[me].gear();

        let (candidate, candidate_fitness) = if draw < self.exploration {
            let candidate = self.candidates.propose(current, rng)?;
            if !self.acceptance.accepts(&candidate) {
                return Ok(None);
            }
            let fitness = self.objective.gear_fitness(fishery, &candidate, self.candidates.match_tol());
            (candidate, fitness)
        } else if draw < self.exploration + self.imitation {
            let Some(peer) = self.neighbors.sample(me, fishery.fishers().len(), rng) else {
                return Ok(None);
            };
            let peer = &fishery.fishers()[peer];
            if !self.acceptance.accepts(peer.gear()) {
                return Ok(None);
            }
            (peer.gear().clone(), self.objective.own_fitness(peer))
        } else {
            return Ok(None);
        };

        let own_fitness = self.objective.own_fitness(&fishery.fishers()[me]);
        match (own_fitness, candidate_fitness) {
            (Some(own), Some(candidate_fit)) if candidate_fit > own => Ok(Some(candidate)),
            _ => Ok(None),
        }
    }
}

/// Run one adaptation pass over the fleet.
///
/// Phase one decides for every adapting fisher against the pre-pass fleet;
/// phase two applies the collected swaps. Fishers without an adaptation
/// module are skipped.
pub fn adapt_fleet(fishery: &mut Fishery, rng: &mut ChaCha12Rng) -> Result<()> {
    let n_fishers = fishery.fishers().len();
    let mut swaps: Vec<(usize, Gear)> = Vec::new();
    for me in 0..n_fishers {
        let Some(adaptation) = fishery.fishers()[me].adaptation() else {
            continue;
        };
        if let Some(gear) = adaptation.decide(me, fishery, rng)? {
            swaps.push((me, gear));
        }
    }
    for (me, gear) in swaps {
        fishery.fishers_mut()[me].replace_gear(gear);
    }
    Ok(())
}
