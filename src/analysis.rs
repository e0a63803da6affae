use crate::config::{Config, RegulationConfig};
use crate::engine::Engine;
use crate::stats::{Accumulator, TimeSeries};
use anyhow::{Context, Result};
use std::{fs::File, io::BufWriter, path::Path};

/// An observable computed over a finished run's collected data.
pub trait Obs {
    fn scan(&mut self, engine: &Engine) -> Result<()>;
    fn report(&self) -> serde_json::Value;
}

/// Yearly landings per species and, where a quota exists, the fraction of
/// the fleet-wide allocation actually landed.
pub struct QuotaUse {
    species: Vec<String>,
    allocations: Option<Vec<f64>>,
    landings: Vec<Accumulator>,
    efficiency: Vec<Accumulator>,
}

impl QuotaUse {
    pub fn new(cfg: &Config) -> Self {
        let species = cfg.species.names.clone();
        let allocations = match &cfg.regulation {
            RegulationConfig::Open => None,
            RegulationConfig::Tac { quotas } => Some(quotas.clone()),
            RegulationConfig::Itq { quotas, .. } => Some(
                quotas
                    .iter()
                    .map(|quota| quota * cfg.fleet.n_fishers as f64)
                    .collect(),
            ),
        };
        let mut landings = Vec::new();
        landings.resize_with(species.len(), Accumulator::new);
        let mut efficiency = Vec::new();
        efficiency.resize_with(species.len(), Accumulator::new);
        Self { species, allocations, landings, efficiency }
    }
}

impl Obs for QuotaUse {
    fn scan(&mut self, engine: &Engine) -> Result<()> {
        for (s, name) in self.species.iter().enumerate() {
            let column = engine.data().yearly.column(&format!("{name} landings"))?;
            self.landings[s].add_all(column.values());
            if let Some(allocations) = &self.allocations {
                if allocations[s] > 0.0 {
                    for &landed in column.values() {
                        self.efficiency[s].add(landed / allocations[s]);
                    }
                }
            }
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        let per_species: Vec<_> = self
            .species
            .iter()
            .enumerate()
            .map(|(s, name)| {
                serde_json::json!({
                    "species": name,
                    "landings": self.landings[s].report(),
                    "efficiency": if self.efficiency[s].count() > 0 {
                        Some(self.efficiency[s].report())
                    } else {
                        None
                    },
                })
            })
            .collect();
        serde_json::json!({ "quota_use": per_species })
    }
}

/// Mean number of fishers targeting each species across the run's years.
pub struct FleetPresence {
    species: Vec<String>,
    catchers: Vec<Accumulator>,
}

impl FleetPresence {
    pub fn new(cfg: &Config) -> Self {
        let species = cfg.species.names.clone();
        let mut catchers = Vec::new();
        catchers.resize_with(species.len(), Accumulator::new);
        Self { species, catchers }
    }
}

impl Obs for FleetPresence {
    fn scan(&mut self, engine: &Engine) -> Result<()> {
        for (s, name) in self.species.iter().enumerate() {
            let column = engine.data().yearly.column(&format!("{name} catchers"))?;
            self.catchers[s].add_all(column.values());
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        let per_species: Vec<_> = self
            .species
            .iter()
            .enumerate()
            .map(|(s, name)| {
                serde_json::json!({
                    "species": name,
                    "catchers": self.catchers[s].report(),
                })
            })
            .collect();
        serde_json::json!({ "fleet_presence": per_species })
    }
}

/// Daily ITQ closing prices as equilibration-aware series per species.
pub struct QuotaPriceTrend {
    species: Vec<String>,
    prices: Vec<TimeSeries>,
}

impl QuotaPriceTrend {
    pub fn new(cfg: &Config) -> Self {
        let species = cfg.species.names.clone();
        let mut prices = Vec::new();
        prices.resize_with(species.len(), TimeSeries::new);
        Self { species, prices }
    }
}

impl Obs for QuotaPriceTrend {
    fn scan(&mut self, engine: &Engine) -> Result<()> {
        for (s, name) in self.species.iter().enumerate() {
            let column = engine.data().daily.column(&format!("{name} quota price"))?;
            self.prices[s].extend_from(column.values());
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        let per_species: Vec<_> = self
            .species
            .iter()
            .enumerate()
            .map(|(s, name)| {
                serde_json::json!({
                    "species": name,
                    "closing_price": self.prices[s].report(),
                })
            })
            .collect();
        serde_json::json!({ "quota_price": per_species })
    }
}

/// Total fleet cash at each year end.
pub struct FleetIncome {
    cash: TimeSeries,
}

impl FleetIncome {
    pub fn new() -> Self {
        Self { cash: TimeSeries::new() }
    }
}

impl Obs for FleetIncome {
    fn scan(&mut self, engine: &Engine) -> Result<()> {
        let column = engine.data().yearly.column("fleet cash")?;
        self.cash.extend_from(column.values());
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "fleet_cash": self.cash.report() })
    }
}

pub struct Analyzer {
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new(cfg: &Config) -> Self {
        let mut obs_ptr_vec: Vec<Box<dyn Obs>> = Vec::new();
        obs_ptr_vec.push(Box::new(QuotaUse::new(cfg)));
        obs_ptr_vec.push(Box::new(FleetPresence::new(cfg)));
        if matches!(cfg.regulation, RegulationConfig::Itq { .. }) {
            obs_ptr_vec.push(Box::new(QuotaPriceTrend::new(cfg)));
        }
        obs_ptr_vec.push(Box::new(FleetIncome::new()));
        Self { obs_ptr_vec }
    }

    /// Feed one run's checkpoint through every observable.
    pub fn scan_checkpoint<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let engine = Engine::load_checkpoint(file)?;
        for obs in &mut self.obs_ptr_vec {
            obs.scan(&engine).context("failed to update observable")?;
        }
        Ok(())
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);

        let reports: Vec<_> = self.obs_ptr_vec.iter().map(|obs| obs.report()).collect();
        serde_json::to_writer_pretty(writer, &reports)?;
        Ok(())
    }
}
