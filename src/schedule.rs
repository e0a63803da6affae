//! Discrete time-stepped scheduler.
//!
//! Actions are plain data dispatched against the fishery, so the whole
//! schedule serializes with the engine and a resumed run replays exactly.
//! Within a tick, actions of the same cadence run in registration order;
//! daily actions run before yearly actions on a year boundary.

use crate::adaptation;
use crate::collectors::DataCollector;
use crate::errors::{Error, Result};
use crate::model::Fishery;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Daily,
    Yearly,
}

/// A periodic action on the schedule.
///
/// `Gather` appends to the column with the given index in the dataset of the
/// cadence it was registered under.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Zero the daily counters and yesterday's unfilled catch.
    Dawn,
    /// Run the fleet's harvest pass.
    Harvest,
    /// Run the daily ITQ clearing session.
    QuotaMarket,
    /// Apply one day of stock regrowth.
    StockGrowth,
    /// Append today's closing cash to every fisher's history.
    Memory,
    Gather { column: usize },
    /// Run the fleet's explore/imitate adaptation pass.
    Adapt,
    /// Re-open quota ledgers and re-allocate ITQ balances.
    QuotaReset,
    /// Zero the yearly counters, after the yearly gatherers have read them.
    YearEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Created,
    Running,
    Terminal,
}

/// Simulated time, counted in ticks.
#[derive(Clone, Serialize, Deserialize)]
pub struct Clock {
    step: u64,
    steps_per_day: u64,
    days_per_year: u64,
}

impl Clock {
    pub fn new(steps_per_day: u64, days_per_year: u64) -> Self {
        Self { step: 0, steps_per_day, days_per_year }
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Completed days.
    pub fn day(&self) -> u64 {
        self.step / self.steps_per_day
    }

    /// Completed years.
    pub fn year(&self) -> u64 {
        self.step / self.steps_per_year()
    }

    pub fn day_of_year(&self) -> u64 {
        self.day() % self.days_per_year
    }

    pub fn steps_per_year(&self) -> u64 {
        self.steps_per_day * self.days_per_year
    }

    fn advance(&mut self) {
        self.step += 1;
    }

    fn at_day_boundary(&self) -> bool {
        self.step % self.steps_per_day == 0
    }

    fn at_year_boundary(&self) -> bool {
        self.step % self.steps_per_year() == 0
    }
}

/// Owner of the tick loop and the registered periodic actions.
#[derive(Clone, Serialize, Deserialize)]
pub struct Schedule {
    state: RunState,
    stop_requested: bool,
    clock: Clock,
    daily: Vec<Action>,
    yearly: Vec<Action>,
}

impl Schedule {
    pub fn new(steps_per_day: u64, days_per_year: u64) -> Self {
        Self {
            state: RunState::Created,
            stop_requested: false,
            clock: Clock::new(steps_per_day, days_per_year),
            daily: Vec::new(),
            yearly: Vec::new(),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Append an action to its cadence list. Actions registered while a tick
    /// is being dispatched join from the next boundary.
    pub fn register(&mut self, cadence: Cadence, action: Action) {
        match cadence {
            Cadence::Daily => self.daily.push(action),
            Cadence::Yearly => self.yearly.push(action),
        }
    }

    pub fn has_action(&self, cadence: Cadence, action: Action) -> bool {
        match cadence {
            Cadence::Daily => self.daily.contains(&action),
            Cadence::Yearly => self.yearly.contains(&action),
        }
    }

    pub fn start(&mut self) -> Result<()> {
        match self.state {
            RunState::Created => {
                self.state = RunState::Running;
                Ok(())
            }
            RunState::Running => Err(Error::State("schedule is already running".into())),
            RunState::Terminal => Err(Error::State("schedule has been stopped".into())),
        }
    }

    /// Ask the schedule to stop at the next tick boundary. The in-flight
    /// tick, if any, completes normally.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn stop(&mut self) {
        self.stop_requested = false;
        self.state = RunState::Terminal;
    }

    /// Advance one tick: daily actions on a day boundary, then yearly
    /// actions on a year boundary. A pending stop request is consumed here
    /// instead, before any time passes, leaving the schedule terminal.
    pub fn step(
        &mut self,
        fishery: &mut Fishery,
        data: &mut DataCollector,
        rng: &mut ChaCha12Rng,
    ) -> Result<()> {
        match self.state {
            RunState::Running => {}
            RunState::Created => {
                return Err(Error::State("schedule has not been started".into()));
            }
            RunState::Terminal => {
                return Err(Error::State("schedule has been stopped".into()));
            }
        }
        if self.stop_requested {
            self.stop();
            return Ok(());
        }
        self.clock.advance();
        if self.clock.at_day_boundary() {
            self.run_actions(Cadence::Daily, fishery, data, rng)?;
            if self.clock.at_year_boundary() {
                self.run_actions(Cadence::Yearly, fishery, data, rng)?;
            }
        }
        Ok(())
    }

    fn run_actions(
        &mut self,
        cadence: Cadence,
        fishery: &mut Fishery,
        data: &mut DataCollector,
        rng: &mut ChaCha12Rng,
    ) -> Result<()> {
        let n = match cadence {
            Cadence::Daily => self.daily.len(),
            Cadence::Yearly => self.yearly.len(),
        };
        for i in 0..n {
            let action = match cadence {
                Cadence::Daily => self.daily[i],
                Cadence::Yearly => self.yearly[i],
            };
            dispatch(action, cadence, fishery, data, rng)?;
        }
        Ok(())
    }
}

fn dispatch(
    action: Action,
    cadence: Cadence,
    fishery: &mut Fishery,
    data: &mut DataCollector,
    rng: &mut ChaCha12Rng,
) -> Result<()> {
    match action {
        Action::Dawn => fishery.reset_daily_counters(),
        Action::Harvest => fishery.harvest_day(rng)?,
        Action::QuotaMarket => fishery.quota_market_day(),
        Action::StockGrowth => fishery.grow_stock(),
        Action::Memory => fishery.record_memories(),
        Action::Gather { column } => data.record(cadence, column, fishery)?,
        Action::Adapt => adaptation::adapt_fleet(fishery, rng)?,
        Action::QuotaReset => fishery.reset_quota_year(),
        Action::YearEnd => fishery.reset_yearly_counters(),
    }
    Ok(())
}
