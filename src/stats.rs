//! Sample collection and summary statistics.

use std::time::Duration;

/// Per-iteration timings for one case, in nanoseconds.
#[derive(Debug, Clone, Default)]
pub struct Samples {
    ns: Vec<f64>,
}

impl Samples {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ns: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, elapsed: Duration) {
        self.ns.push(elapsed.as_nanos() as f64);
    }

    pub fn len(&self) -> usize {
        self.ns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ns.is_empty()
    }

    /// Summarizes the samples, first dropping `trim` of them from each end
    /// when given.
    pub fn summarize(&self, trim: Option<f64>) -> Summary {
        let mut sorted = self.ns.clone();
        sorted.sort_unstable_by(f64::total_cmp);

        let drop = trim.map_or(0, |fraction| (sorted.len() as f64 * fraction).floor() as usize);
        let kept = if drop * 2 < sorted.len() {
            &sorted[drop..sorted.len() - drop]
        } else {
            &sorted[..]
        };
        Summary::of(kept)
    }
}

/// Mean, sample standard deviation, and extremes over a set of samples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub count: usize,
    pub mean_ns: f64,
    pub stddev_ns: f64,
    pub min_ns: f64,
    pub max_ns: f64,
}

impl Summary {
    fn of(sorted: &[f64]) -> Self {
        let count = sorted.len();
        if count == 0 {
            return Self::default();
        }

        let mean = sorted.iter().sum::<f64>() / count as f64;
        let stddev = if count > 1 {
            let sq: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum();
            (sq / (count - 1) as f64).sqrt()
        } else {
            0.0
        };

        Self {
            count,
            mean_ns: mean,
            stddev_ns: stddev,
            min_ns: sorted[0],
            max_ns: sorted[count - 1],
        }
    }

    /// Mean cost per processed element.
    pub fn ns_per_op(&self, ops: usize) -> f64 {
        if ops == 0 {
            0.0
        } else {
            self.mean_ns / ops as f64
        }
    }
}
