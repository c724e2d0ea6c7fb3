use serde::{Deserialize, Serialize};

/// Online accumulator of mean, variance and extrema (Welford's algorithm).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
    min: f64,
    max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;

        self.min = self.min.min(val);
        self.max = self.max.max(val);
    }

    /// Returns `None` if no value was added.
    pub fn report(&self) -> Option<AccumulatorReport> {
        if self.n_vals == 0 {
            return None;
        }
        Some(AccumulatorReport {
            n_vals: self.n_vals,
            mean: self.mean,
            std_dev: if self.n_vals > 1 {
                Some((self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt())
            } else {
                None
            },
            min: self.min,
            max: self.max,
        })
    }
}

/// Trailing statistics of one full window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub mean: f64,
    pub std_dev: Option<f64>,
}

/// Compute trailing rolling mean and sample standard deviation.
///
/// Element `i` covers `vals[i + 1 - window..=i]` and is `None` for the first `window - 1` elements.
/// `window` must be positive.
pub fn rolling_stats(vals: &[f64], window: usize) -> Vec<Option<WindowStats>> {
    let n_vals = vals.len();
    let mut stats = Vec::with_capacity(n_vals);
    if n_vals == 0 {
        return stats;
    }

    // Sums of values shifted by the first one to limit cancellation.
    let shift = vals[0];
    let mut sum = 0.0;
    let mut sum_2 = 0.0;

    for (idx, &val) in vals.iter().enumerate() {
        let val = val - shift;
        sum += val;
        sum_2 += val * val;
        if idx >= window {
            let old = vals[idx - window] - shift;
            sum -= old;
            sum_2 -= old * old;
        }
        if idx + 1 < window {
            stats.push(None);
            continue;
        }

        let n = window as f64;
        let std_dev = if window > 1 {
            let var = (sum_2 - sum * sum / n) / (n - 1.0);
            Some(var.max(0.0).sqrt())
        } else {
            None
        };
        stats.push(Some(WindowStats {
            mean: shift + sum / n,
            std_dev,
        }));
    }

    stats
}

fn compute_mean(vals: &[f64]) -> f64 {
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// Straight line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a degree-1 polynomial by least squares.
///
/// Without at least two distinct `x` values the slope is zero and the intercept is the mean of `y`.
/// Returns `None` for empty or mismatched input.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }
    let x_mean = compute_mean(x);
    let y_mean = compute_mean(y);

    // Centered sums keep the normal equations well conditioned for large offsets.
    let (sxx, sxy) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxx, sxy), (&xi, &yi)| {
            let dx = xi - x_mean;
            (sxx + dx * dx, sxy + dx * (yi - y_mean))
        });

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    Some(LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}
