use crate::adaptation::Adaptation;
use crate::collectors::{DataCollector, Probe};
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::model::Fishery;
use crate::scenario;
use crate::schedule::{Action, Cadence, Schedule};
use anyhow::Context;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Simulation engine.
///
/// Holds the configuration, the schedule, the fishery state, the collected
/// data and the random number generator, and provides methods to run, save
/// and load simulations. The engine serializes as a whole, so a resumed
/// checkpoint continues bit for bit where the run left off.
#[derive(Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
    schedule: Schedule,
    fishery: Fishery,
    data: DataCollector,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Assemble a new `Engine` from a configuration and a seed.
    pub fn new(cfg: Config, seed: u64) -> Result<Self> {
        cfg.validate()?;
        let (fishery, schedule, data) = scenario::assemble(&cfg)?;
        let rng = ChaCha12Rng::seed_from_u64(seed);
        Ok(Self { cfg, schedule, fishery, data, rng })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn fishery(&self) -> &Fishery {
        &self.fishery
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn data(&self) -> &DataCollector {
        &self.data
    }

    /// Completed simulated years.
    pub fn year(&self) -> u64 {
        self.schedule.clock().year()
    }

    /// Move the schedule out of its created state and hand out the initial
    /// quota allocation.
    pub fn start(&mut self) -> Result<()> {
        self.schedule.start()?;
        self.fishery.reset_quota_year();
        Ok(())
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) -> Result<()> {
        self.schedule.step(&mut self.fishery, &mut self.data, &mut self.rng)
    }

    /// Step until `target` completed years, a stop request or a stop.
    pub fn run_until_year(&mut self, target: u64) -> Result<()> {
        let first_year = self.year();
        while self.schedule.is_running() && self.year() < target {
            let year_before = self.year();
            self.step()?;
            let year = self.year();
            if year > year_before && year % self.cfg.output.progress_every_years == 0 {
                let progress = 100.0 * (year - first_year) as f64 / (target - first_year) as f64;
                log::info!("completed year {year:04} ({progress:06.2}%)");
            }
        }
        Ok(())
    }

    /// Ask the schedule to stop at the next tick boundary.
    pub fn request_stop(&mut self) {
        self.schedule.request_stop();
    }

    pub fn stop(&mut self) {
        self.schedule.stop();
    }

    /// Add a named column and the periodic action that samples it. Data
    /// arrives from the next boundary of the chosen cadence.
    pub fn register_gatherer(
        &mut self,
        cadence: Cadence,
        name: &str,
        probe: Probe,
        default: f64,
    ) -> Result<()> {
        let column = self.data.register(cadence, name, probe, default)?;
        self.schedule.register(cadence, Action::Gather { column });
        Ok(())
    }

    /// Add a periodic action to the end of a cadence list.
    pub fn register_action(&mut self, cadence: Cadence, action: Action) {
        self.schedule.register(cadence, action);
    }

    /// Attach an adaptation module to one fisher and make sure an adaptation
    /// pass runs at the given cadence.
    pub fn register_adaptation(
        &mut self,
        fisher: usize,
        cadence: Cadence,
        adaptation: Adaptation,
    ) -> Result<()> {
        let n_fishers = self.fishery.fishers().len();
        let Some(fisher) = self.fishery.fishers_mut().get_mut(fisher) else {
            return Err(Error::NotFound(format!(
                "no fisher with index {fisher} in a fleet of {n_fishers}"
            )));
        };
        fisher.set_adaptation(Some(adaptation));
        if !self.schedule.has_action(cadence, Action::Adapt) {
            self.schedule.register(cadence, Action::Adapt);
        }
        Ok(())
    }

    /// Write one cadence's dataset as CSV.
    pub fn write_csv<P: AsRef<Path>>(&self, cadence: Cadence, file: P) -> anyhow::Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        self.data
            .dataset(cadence)
            .write_csv(&mut writer)
            .context("failed to write dataset")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Save a checkpoint of the entire engine state.
    ///
    /// Can be used to resume the simulation later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> anyhow::Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize engine")?;
        Ok(())
    }

    /// Load a previously saved engine checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> anyhow::Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let engine = decode::from_read(&mut reader).context("failed to deserialize engine")?;
        Ok(engine)
    }
}
