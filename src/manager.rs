use crate::analysis::Analyzer;
use crate::config::Config;
use crate::engine::Engine;
use crate::schedule::Cadence;
use anyhow::{Context, Result, bail};
use glob::glob;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Owner of one simulation directory: a `config.toml` and one `run-NNNN`
/// subdirectory per run, each holding the run's checkpoint, its daily and
/// yearly CSV exports and its analysis results.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Create the next run directory, seed a fresh engine and simulate
    /// `run.years_per_run` years.
    pub fn create_run(&self) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let seed = self.resolve_seed(run_idx)?;
        log::info!("run {run_idx:04} uses seed {seed}");

        let mut engine =
            Engine::new(self.cfg.clone(), seed).context("failed to assemble engine")?;
        engine.start().context("failed to start schedule")?;

        self.advance_and_save(run_idx, &mut engine)
    }

    /// Resume a run from its checkpoint and simulate `run.years_per_run`
    /// more years.
    pub fn resume_run(&self, run_idx: usize) -> Result<()> {
        let checkpoint_file = self.checkpoint_file(run_idx);
        let mut engine = Engine::load_checkpoint(&checkpoint_file)
            .with_context(|| format!("failed to load {checkpoint_file:?}"))?;
        if engine.cfg() != &self.cfg {
            bail!("checkpoint config differs from the current config");
        }
        log::info!("loaded {checkpoint_file:?}");

        self.advance_and_save(run_idx, &mut engine)
    }

    fn advance_and_save(&self, run_idx: usize, engine: &mut Engine) -> Result<()> {
        let target = engine.year() + self.cfg.run.years_per_run;
        engine
            .run_until_year(target)
            .context("failed to run simulation")?;

        engine
            .write_csv(Cadence::Daily, self.daily_file(run_idx))
            .context("failed to write daily data")?;
        engine
            .write_csv(Cadence::Yearly, self.yearly_file(run_idx))
            .context("failed to write yearly data")?;

        engine
            .save_checkpoint(self.checkpoint_file(run_idx))
            .context("failed to save checkpoint")?;

        Ok(())
    }

    pub fn analyze_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let mut analyzer = Analyzer::new(&self.cfg);

            analyzer
                .scan_checkpoint(self.checkpoint_file(run_idx))
                .context("failed to scan checkpoint")?;

            analyzer
                .save_results(self.results_file(run_idx))
                .context("failed to save results")?;
        }

        Ok(())
    }

    /// Remove every run directory, keeping the config.
    pub fn clean_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let run_dir = self.run_dir(run_idx);
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    /// Mix the run index into the configured base seed, or draw one from OS
    /// entropy when the config leaves the seed out.
    fn resolve_seed(&self, run_idx: usize) -> Result<u64> {
        let seed = match self.cfg.run.seed {
            Some(base) => base.wrapping_add(run_idx as u64),
            None => ChaCha12Rng::try_from_os_rng()
                .context("failed to seed from os entropy")?
                .random(),
        };
        Ok(seed)
    }

    fn count_run_dirs(&self) -> Result<usize> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .count();
        Ok(count)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn checkpoint_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("checkpoint.msgpack")
    }

    fn daily_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("daily.csv")
    }

    fn yearly_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("yearly.csv")
    }

    fn results_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("results.json")
    }
}
