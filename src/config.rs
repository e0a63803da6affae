use crate::adaptation::{Acceptance, NeighborRule, ShortHistory};
use crate::errors::Error;
use crate::schedule::Cadence;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use. Per-species vectors
/// are indexed like `species.names`. See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub run: RunConfig,
    pub species: SpeciesConfig,
    pub stock: StockConfig,
    pub fleet: FleetConfig,
    pub regulation: RegulationConfig,
    pub market: MarketConfig,
    /// Absent section means no fisher adapts.
    #[serde(default)]
    pub adaptation: Option<AdaptationConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Base RNG seed; drawn from OS entropy when absent. Each run mixes its
    /// run index into the base so repeated runs differ reproducibly.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_steps_per_day")]
    pub steps_per_day: u64,
    #[serde(default = "default_days_per_year")]
    pub days_per_year: u64,
    /// Simulated years added by one create or resume invocation.
    pub years_per_run: u64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub names: Vec<String>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockConfig {
    /// Constant expected catch per unit catchability.
    Fixed { cpue: Vec<f64> },
    /// Biomass depleted by landings and regrown logistically.
    Logistic {
        biomass: Vec<f64>,
        capacity: Vec<f64>,
        /// Yearly intrinsic growth rate, applied in daily increments.
        growth: Vec<f64>,
    },
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    pub n_fishers: usize,
    /// Standard deviation of the daily log-normal luck factor.
    pub luck_sigma: f64,
    pub gear: GearConfig,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GearConfig {
    /// Every fisher starts with the same gear.
    Uniform { catchability: Vec<f64> },
    /// Fishers start on the given options in round-robin order.
    Split { options: Vec<Vec<f64>> },
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegulationConfig {
    Open,
    /// One fleet-wide yearly quota per species.
    Tac { quotas: Vec<f64> },
    /// A yearly per-fisher allocation per species, traded daily.
    Itq {
        quotas: Vec<f64>,
        price: Option<QuotaPriceConfig>,
    },
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuotaPriceConfig {
    Additive { initial: f64, step: f64, floor: f64, cap: f64 },
    Multiplicative { initial: f64, rate: f64, floor: f64, cap: f64 },
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketConfig {
    Fixed { prices: Vec<f64> },
    /// Price falls linearly with the quantity already landed today.
    Congested { choke: Vec<f64>, slope: Vec<f64> },
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AdaptationConfig {
    pub enabled: bool,
    pub cadence: Cadence,
    pub exploration: f64,
    pub imitation: f64,
    pub objective: ObjectiveConfig,
    pub candidates: CandidateConfig,
    pub neighbors: NeighborRule,
    #[serde(default = "default_acceptance")]
    pub acceptance: Acceptance,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ObjectiveConfig {
    /// Trailing cash-flow window in days.
    pub window: usize,
    #[serde(default = "default_short_history")]
    pub short_history: ShortHistory,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateConfig {
    Discrete { options: Vec<Vec<f64>> },
    Perturb { sigma: f64, match_tol: f64 },
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub progress_every_years: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { progress_every_years: 1 }
    }
}

fn default_steps_per_day() -> u64 {
    1
}

fn default_days_per_year() -> u64 {
    365
}

fn default_acceptance() -> Acceptance {
    Acceptance::Any
}

fn default_short_history() -> ShortHistory {
    ShortHistory::Stay
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or if the
    /// configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let text =
            fs::read_to_string(file).with_context(|| format!("failed to open {file:?}"))?;

        let config: Config = toml::from_str(&text).context("failed to parse config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn n_species(&self) -> usize {
        self.species.names.len()
    }

    pub fn validate(&self) -> crate::errors::Result<()> {
        let n_species = self.n_species();
        check_num("species count", n_species, 1..64)?;
        for (i, name) in self.species.names.iter().enumerate() {
            if name.is_empty() {
                return Err(Error::Configuration("species names must be non-empty".into()));
            }
            if self.species.names[..i].contains(name) {
                return Err(Error::Configuration(format!(
                    "species names must be unique, but {name:?} repeats"
                )));
            }
        }

        check_num("run.steps_per_day", self.run.steps_per_day, 1..=24)?;
        check_num("run.days_per_year", self.run.days_per_year, 1..=366)?;
        check_num("run.years_per_run", self.run.years_per_run, 1..=10_000)?;

        match &self.stock {
            StockConfig::Fixed { cpue } => check_species_vec("stock.cpue", cpue, n_species)?,
            StockConfig::Logistic { biomass, capacity, growth } => {
                check_species_vec("stock.biomass", biomass, n_species)?;
                check_species_vec("stock.capacity", capacity, n_species)?;
                check_species_vec("stock.growth", growth, n_species)?;
            }
        }

        check_num("fleet.n_fishers", self.fleet.n_fishers, 1..100_000)?;
        check_num("fleet.luck_sigma", self.fleet.luck_sigma, 0.0..=2.0)?;
        match &self.fleet.gear {
            GearConfig::Uniform { catchability } => {
                check_species_vec("fleet.gear.catchability", catchability, n_species)?;
            }
            GearConfig::Split { options } => {
                if options.is_empty() {
                    return Err(Error::Configuration(
                        "fleet.gear.options must not be empty".into(),
                    ));
                }
                for option in options {
                    check_species_vec("fleet.gear.options", option, n_species)?;
                }
            }
        }

        match &self.regulation {
            RegulationConfig::Open => {}
            RegulationConfig::Tac { quotas } => {
                check_species_vec("regulation.quotas", quotas, n_species)?;
            }
            RegulationConfig::Itq { quotas, price } => {
                check_species_vec("regulation.quotas", quotas, n_species)?;
                let Some(price) = price else {
                    return Err(Error::Configuration(
                        "regulation.price is required under the itq regime".into(),
                    ));
                };
                let (initial, floor, cap) = match price {
                    QuotaPriceConfig::Additive { initial, step, floor, cap } => {
                        check_num("regulation.price.step", *step, 0.0..)?;
                        (*initial, *floor, *cap)
                    }
                    QuotaPriceConfig::Multiplicative { initial, rate, floor, cap } => {
                        check_num("regulation.price.rate", *rate, 0.0..=1.0)?;
                        (*initial, *floor, *cap)
                    }
                };
                if !(floor <= initial && initial <= cap) {
                    return Err(Error::Configuration(format!(
                        "regulation.price must satisfy floor <= initial <= cap, \
                         but is {floor} <= {initial} <= {cap}"
                    )));
                }
            }
        }

        match &self.market {
            MarketConfig::Fixed { prices } => {
                check_species_vec("market.prices", prices, n_species)?;
            }
            MarketConfig::Congested { choke, slope } => {
                check_species_vec("market.choke", choke, n_species)?;
                check_species_vec("market.slope", slope, n_species)?;
            }
        }

        if let Some(adaptation) = &self.adaptation {
            check_num("adaptation.exploration", adaptation.exploration, 0.0..=1.0)?;
            check_num("adaptation.imitation", adaptation.imitation, 0.0..=1.0)?;
            let sum = adaptation.exploration + adaptation.imitation;
            if sum > 1.0 {
                return Err(Error::Configuration(format!(
                    "adaptation.exploration and adaptation.imitation must sum to \
                     at most 1.0, but sum to {sum}"
                )));
            }
            check_num("adaptation.objective.window", adaptation.objective.window, 1..100_000)?;
            match &adaptation.candidates {
                CandidateConfig::Discrete { options } => {
                    if options.is_empty() {
                        return Err(Error::Configuration(
                            "adaptation.candidates.options must not be empty".into(),
                        ));
                    }
                    for option in options {
                        check_species_vec("adaptation.candidates.options", option, n_species)?;
                    }
                }
                CandidateConfig::Perturb { sigma, match_tol } => {
                    check_num("adaptation.candidates.sigma", *sigma, 0.0..=2.0)?;
                    check_num("adaptation.candidates.match_tol", *match_tol, 0.0..)?;
                }
            }
            if let NeighborRule::Ring { span } = adaptation.neighbors {
                check_num("adaptation.neighbors.span", span, 1..100_000)?;
            }
            if let Acceptance::MaxCatchability { limit } = adaptation.acceptance {
                check_num("adaptation.acceptance.limit", limit, 0.0..)?;
            }
        }

        check_num("output.progress_every_years", self.output.progress_every_years, 1..=10_000)?;

        Ok(())
    }
}

fn check_num<T, R>(name: &str, num: T, range: R) -> crate::errors::Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        return Err(Error::Configuration(format!(
            "{name} must be in the range {range:?}, but is {num:?}"
        )));
    }
    Ok(())
}

fn check_species_vec(name: &str, vec: &[f64], n_species: usize) -> crate::errors::Result<()> {
    let len = vec.len();
    if len != n_species {
        return Err(Error::Configuration(format!(
            "{name} must have one entry per species ({n_species}), but has {len}"
        )));
    }
    if vec.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(Error::Configuration(format!(
            "{name} must have only finite non-negative entries"
        )));
    }
    Ok(())
}
