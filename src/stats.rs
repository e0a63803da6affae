use serde::{Deserialize, Serialize};

/// Streaming mean and sample variance (Welford's update).
#[derive(Default)]
pub struct Accumulator {
    count: usize,
    mean: f64,
    m2: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, val: f64) {
        self.count += 1;
        let delta = val - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (val - self.mean);
    }

    pub fn add_all(&mut self, vals: &[f64]) {
        vals.iter().for_each(|&val| self.add(val));
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: if self.count > 0 { self.mean } else { f64::NAN },
            std_dev: if self.count > 1 {
                (self.m2 / (self.count - 1) as f64).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

/// A recorded series with equilibration-aware summary statistics.
pub struct TimeSeries {
    vals: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimeSeriesReport {
    pub mean: f64,
    pub std_dev: f64,
    pub sem: f64,
    pub is_equil: bool,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self { vals: Vec::new() }
    }

    pub fn extend_from(&mut self, vals: &[f64]) {
        self.vals.extend_from_slice(vals);
    }

    /// Summary of the equilibrated tail of the series. `is_equil` is false
    /// when the equilibration rule would discard half the series, its
    /// worst-case answer.
    pub fn report(&self) -> TimeSeriesReport {
        let cut = equilibration_cut(&self.vals);
        let tail = &self.vals[cut..];
        TimeSeriesReport {
            mean: mean(tail),
            std_dev: variance(tail).sqrt(),
            sem: blocked_sem(tail),
            is_equil: cut != self.vals.len() / 2,
        }
    }
}

fn mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

fn variance(vals: &[f64]) -> f64 {
    let n = vals.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = mean(vals);
    vals.iter().map(|&val| (val - mean).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Standard error of the mean by the Flyvbjerg-Petersen blocking method:
/// halve the series into block means until the variance estimate plateaus
/// against its own error bar, and report the first plateau estimate.
fn blocked_sem(vals: &[f64]) -> f64 {
    let mut blocks = vals.to_vec();
    let mut estimates = Vec::new();
    while blocks.len() >= 2 {
        let n = blocks.len() as f64;
        let est = variance(&blocks) / n;
        let err = est * (2.0 / (n - 1.0)).sqrt();
        estimates.push((est, err));
        blocks = blocks
            .chunks_exact(2)
            .map(|pair| 0.5 * (pair[0] + pair[1]))
            .collect();
    }

    for (i, &(est, _)) in estimates.iter().enumerate() {
        let plateau = estimates[i..]
            .iter()
            .map(|&(later_est, later_err)| later_est - later_err)
            .fold(f64::NEG_INFINITY, f64::max);
        if est > plateau {
            return est.sqrt();
        }
    }

    estimates.last().map_or(f64::NAN, |&(est, _)| est.sqrt())
}

/// Initial-transient cutoff by the marginal standard error rule, searched
/// over power-of-two candidate cuts up to half the series.
fn equilibration_cut(vals: &[f64]) -> usize {
    let n = vals.len();
    if n < 4 {
        return 0;
    }

    let mut cuts = Vec::new();
    let mut cut = n / 2;
    loop {
        cuts.push(cut);
        if cut == 0 {
            break;
        }
        cut /= 2;
    }

    let mut best_cut = n / 2;
    let mut best_mse = f64::INFINITY;
    for &cut in cuts.iter().rev() {
        let tail = &vals[cut..];
        let len = tail.len();
        let mse = variance(tail) * (len - 1) as f64 / len.pow(2) as f64;
        if mse < best_mse {
            best_mse = mse;
            best_cut = cut;
        }
    }
    best_cut
}
