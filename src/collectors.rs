//! Time-series collection: named columns sampled from the fishery at a fixed
//! cadence by gather actions on the schedule.

use crate::errors::{Error, Result};
use crate::model::Fishery;
use crate::regulation::Regulation;
use crate::schedule::Cadence;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// What a column measures.
///
/// Probes are plain data so the collector serializes with the rest of the
/// engine. Sampling is read-only and returns `None` when the quantity does
/// not exist under the current scenario (no priced quota, no tracked
/// biomass, an empty fleet); the column then records its default sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Probe {
    DailyLandings(usize),
    YearlyLandings(usize),
    DailyEarnings(usize),
    YearlyEarnings(usize),
    QuotaRemaining(usize),
    QuotaPrice(usize),
    Catchers(usize),
    Biomass(usize),
    FleetCash,
}

impl Probe {
    pub fn sample(&self, fishery: &Fishery) -> Option<f64> {
        match *self {
            Self::DailyLandings(s) => Some(fishery.landings_today(s)),
            Self::YearlyLandings(s) => Some(fishery.landings_year(s)),
            Self::DailyEarnings(s) => Some(fishery.earnings_today(s)),
            Self::YearlyEarnings(s) => Some(fishery.earnings_year(s)),
            Self::QuotaRemaining(s) => match fishery.regulation() {
                Regulation::OpenAccess => None,
                Regulation::Tac { .. } => fishery.regulation().remaining(s),
                Regulation::Itq { .. } => {
                    Some(fishery.fishers().iter().map(|f| f.quota(s)).sum())
                }
            },
            Self::QuotaPrice(s) => fishery.regulation().closing_price(s),
            Self::Catchers(s) => {
                if fishery.fishers().is_empty() {
                    None
                } else {
                    Some(fishery.catchers(s) as f64)
                }
            }
            Self::Biomass(s) => fishery.stock().biomass(s),
            Self::FleetCash => Some(fishery.total_cash()),
        }
    }
}

/// One named time series.
#[derive(Clone, Serialize, Deserialize)]
pub struct Column {
    name: String,
    probe: Probe,
    default: f64,
    values: Vec<f64>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        self.sum() / self.values.len() as f64
    }

    fn record(&mut self, fishery: &Fishery) {
        self.values.push(self.probe.sample(fishery).unwrap_or(self.default));
    }
}

/// Columns sharing one cadence, in registration order.
#[derive(Default, Clone, Serialize, Deserialize)]
pub struct DataSet {
    columns: Vec<Column>,
}

impl DataSet {
    /// Add a column and return its index for the matching gather action.
    pub fn register(&mut self, name: &str, probe: Probe, default: f64) -> Result<usize> {
        if self.columns.iter().any(|c| c.name == name) {
            return Err(Error::Configuration(format!(
                "column {name:?} is already registered"
            )));
        }
        self.columns.push(Column {
            name: name.to_string(),
            probe,
            default,
            values: Vec::new(),
        });
        Ok(self.columns.len() - 1)
    }

    pub fn record(&mut self, column: usize, fishery: &Fishery) -> Result<()> {
        self.columns
            .get_mut(column)
            .ok_or_else(|| Error::NotFound(format!("no column with index {column}")))?
            .record(fishery);
        Ok(())
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::NotFound(format!("no column named {name:?}")))
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Write all columns as CSV. Columns registered mid-run are shorter than
    /// the rest; their missing leading rows are left blank so that rows keep
    /// lining up by tick.
    pub fn write_csv<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        writeln!(writer, "{}", names.join(","))?;
        let n_rows = self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        for row in 0..n_rows {
            let mut cells: Vec<String> = Vec::with_capacity(self.columns.len());
            for column in &self.columns {
                let skipped = n_rows - column.values.len();
                if row < skipped {
                    cells.push(String::new());
                } else {
                    cells.push(format!("{}", column.values[row - skipped]));
                }
            }
            writeln!(writer, "{}", cells.join(","))?;
        }
        Ok(())
    }
}

/// The daily and yearly datasets of one run.
#[derive(Default, Clone, Serialize, Deserialize)]
pub struct DataCollector {
    pub daily: DataSet,
    pub yearly: DataSet,
}

impl DataCollector {
    pub fn register(&mut self, cadence: Cadence, name: &str, probe: Probe, default: f64) -> Result<usize> {
        self.dataset_mut(cadence).register(name, probe, default)
    }

    pub fn record(&mut self, cadence: Cadence, column: usize, fishery: &Fishery) -> Result<()> {
        self.dataset_mut(cadence).record(column, fishery)
    }

    pub fn dataset(&self, cadence: Cadence) -> &DataSet {
        match cadence {
            Cadence::Daily => &self.daily,
            Cadence::Yearly => &self.yearly,
        }
    }

    fn dataset_mut(&mut self, cadence: Cadence) -> &mut DataSet {
        match cadence {
            Cadence::Daily => &mut self.daily,
            Cadence::Yearly => &mut self.yearly,
        }
    }
}
