//! Zivot–Andrews unit-root test with one endogenous structural break.
//!
//! For every candidate break `b` in the trimmed interior, regress
//! `Δx_t` on `[1, DU_t, t, (DT_t), x_{t-1}, Δx_{t-1..t-p}]` where
//! `DU_t = 1{t >= b}` and, for the trend variant, `DT_t = (t - b + 1) 1{t >= b}`.
//! The statistic is the smallest t-ratio of the `x_{t-1}` coefficient; the
//! break is where it is attained.

use nalgebra::DMatrix;

use super::adf::{adf_test, default_max_lag, AdfOptions};
use super::distributions::interp;
use super::linalg::to_dvector;
use super::ols::{fit_matrix, CovarianceType};
use crate::domain::{difference, BreakVerdict, CriticalValues, TrendSpec};
use crate::error::StatsError;

/// Minimum sample for a meaningful break search.
pub const MIN_OBSERVATIONS: usize = 20;

const SIGNIFICANCE: f64 = 0.05;
const PERCENTILES: [f64; 11] = [
    0.01, 0.025, 0.05, 0.10, 0.25, 0.50, 0.75, 0.90, 0.95, 0.975, 0.99,
];
/// Intercept break (model A).
const INTERCEPT_TABLE: [f64; 11] = [
    -5.34, -5.02, -4.80, -4.58, -4.11, -3.75, -3.36, -2.99, -2.77, -2.56, -2.32,
];
/// Intercept and trend break (model C).
const BOTH_TABLE: [f64; 11] = [
    -5.57, -5.30, -5.08, -4.82, -4.42, -4.05, -3.69, -3.34, -3.12, -2.96, -2.71,
];

/// Search options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZivotAndrewsOptions {
    pub regression: TrendSpec,
    /// Fraction of the sample excluded at each end.
    pub trim: f64,
    /// Fixed lag count; `None` takes the AIC lag of an ADF(ct) test.
    pub lags: Option<usize>,
}

impl Default for ZivotAndrewsOptions {
    fn default() -> Self {
        Self {
            regression: TrendSpec::Constant,
            trim: 0.15,
            lags: None,
        }
    }
}

pub fn zivot_andrews_test(
    x: &[f64],
    options: ZivotAndrewsOptions,
) -> Result<BreakVerdict, StatsError> {
    let n = x.len();
    if n < MIN_OBSERVATIONS {
        return Err(StatsError::insufficient("Zivot-Andrews test", MIN_OBSERVATIONS, n));
    }
    let (table, trend_break) = match options.regression {
        TrendSpec::Constant => (INTERCEPT_TABLE, false),
        TrendSpec::ConstantTrend => (BOTH_TABLE, true),
        TrendSpec::None => {
            return Err(StatsError::Unsupported(
                "Zivot-Andrews requires a constant or constant+trend specification".into(),
            ))
        }
    };

    let det = if trend_break { 4 } else { 3 };
    let trim_count = (n as f64 * options.trim) as usize;
    let cap = max_feasible_lag(n, det, trim_count).ok_or_else(|| {
        StatsError::insufficient("Zivot-Andrews break search", 2 * (det + 2), n)
    })?;
    let lags = match options.lags {
        Some(l) => l.min(cap),
        None => {
            let adf = AdfOptions {
                max_lag: Some(default_max_lag(n).min(cap)),
                ..AdfOptions::with_regression(TrendSpec::ConstantTrend)
            };
            adf_test(x, adf)?.used_lag.min(cap)
        }
    };

    let first = trim_count.max(lags + 2);
    let last = n - trim_count;

    let dx = difference(x);
    // Rows t = lags+1 ..= n-1, dependent Δx_t = dx[t-1].
    let start = lags + 1;
    let y = to_dvector(&dx[start - 1..]);

    let mut best: Option<(f64, usize)> = None;
    for bp in first..last {
        let design = break_design(x, &dx, start, lags, bp, trend_break);
        let fit = fit_matrix(&y, &design, Some(0), CovarianceType::NonRobust)?;
        let stat = fit.t_values[det];
        if stat.is_nan() {
            continue;
        }
        if best.map_or(true, |(s, _)| stat < s) {
            best = Some((stat, bp));
        }
    }

    let (stat, breakpoint) = best.ok_or_else(|| {
        StatsError::Numerical("Zivot-Andrews statistic undefined at every candidate break".into())
    })?;
    let p_value = interp(stat, &table, &PERCENTILES);

    Ok(BreakVerdict {
        test_statistic: stat,
        p_value,
        used_lag: lags,
        breakpoint,
        critical_values: CriticalValues::from_array([table[0], table[2], table[3]]),
        is_stationary: p_value < SIGNIFICANCE,
    })
}

/// Largest lag that leaves the break regression more rows than columns and a
/// non-empty candidate window. `det` counts the columns before the lagged level.
fn max_feasible_lag(n: usize, det: usize, trim_count: usize) -> Option<usize> {
    let last = n.saturating_sub(trim_count);
    (0..n)
        .take_while(|&lags| n > 2 * lags + det + 2 && trim_count.max(lags + 2) < last)
        .last()
}

fn break_design(
    x: &[f64],
    dx: &[f64],
    start: usize,
    lags: usize,
    bp: usize,
    trend_break: bool,
) -> DMatrix<f64> {
    let n = x.len();
    let det = if trend_break { 4 } else { 3 };
    DMatrix::from_fn(n - start, det + 1 + lags, |r, c| {
        let t = start + r;
        let after = t >= bp;
        match c {
            0 => 1.0,
            1 => f64::from(u8::from(after)),
            2 => t as f64,
            3 if trend_break => {
                if after {
                    (t - bp + 1) as f64
                } else {
                    0.0
                }
            }
            c if c == det => x[t - 1],
            c => dx[t - 1 - (c - det)],
        }
    })
}
