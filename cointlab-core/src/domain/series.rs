//! Series — the fundamental observation unit.

use serde::{Deserialize, Serialize};

/// A named, ordered sequence of real-valued observations.
///
/// Series are never mutated after ingestion: differencing and slicing
/// return new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First difference under the same name.
    pub fn diff(&self) -> Series {
        Series::new(self.name.clone(), difference(&self.values))
    }

    /// Half-open slice `[start, end)` under the same name.
    pub fn slice(&self, start: usize, end: usize) -> Series {
        let end = end.min(self.values.len());
        let start = start.min(end);
        Series::new(self.name.clone(), self.values[start..end].to_vec())
    }

    /// True if any observation is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }
}

/// `x[t] - x[t-1]`; one observation shorter than the input.
pub fn difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Apply [`difference`] `order` times.
pub fn difference_n(values: &[f64], order: usize) -> Vec<f64> {
    let mut out = values.to_vec();
    for _ in 0..order {
        out = difference(&out);
    }
    out
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by `n`).
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Numerically constant: population variance below `epsilon`.
pub fn is_degenerate(values: &[f64], epsilon: f64) -> bool {
    values.len() < 2 || variance(values) < epsilon
}
