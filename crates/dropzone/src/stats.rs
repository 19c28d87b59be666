//! Running statistical aggregates.
//!
//! Used to summarise placements across many simulated matches. Aggregates can
//! be built incrementally with [`RunningStats::push`] or combined pairwise with
//! [`RunningStats::merge`], which makes them safe to fold from independent runs.

use serde::{Deserialize, Serialize};

/// Mean, variance and range of a stream of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Population variance (σ²)
    pub variance: f64,
    /// Minimum sample
    pub min: f64,
    /// Maximum sample
    pub max: f64,
    /// Number of samples
    pub count: u64,
}

impl RunningStats {
    /// Create empty stats.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            mean: 0.0,
            variance: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            count: 0,
        }
    }

    /// Create stats from a single value.
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        Self {
            mean: value,
            variance: 0.0,
            min: value,
            max: value,
            count: 1,
        }
    }

    /// Add one sample. Non-finite samples are ignored.
    pub fn push(&mut self, value: f64) {
        if value.is_finite() {
            *self = Self::merge(self, &Self::from_value(value));
        }
    }

    /// Merge two stats using the parallel variance combination.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn merge(a: &Self, b: &Self) -> Self {
        if a.count == 0 {
            return *b;
        }
        if b.count == 0 {
            return *a;
        }

        let n_a = a.count as f64;
        let n_b = b.count as f64;
        let n_total = n_a + n_b;

        let delta = b.mean - a.mean;
        let mean = a.mean + delta * (n_b / n_total);
        let variance = (a.variance * n_a + b.variance * n_b + delta * delta * n_a * n_b / n_total)
            / n_total;

        Self {
            mean,
            variance,
            min: a.min.min(b.min),
            max: a.max.max(b.max),
            count: a.count + b.count,
        }
    }

    /// Standard deviation.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::empty();
        for value in iter {
            stats.push(value);
        }
        stats
    }
}
