//! Augmented Dickey–Fuller unit-root test.
//!
//! Regression: `Δx_t = [deterministic] + γ x_{t-1} + Σ_{j=1..p} φ_j Δx_{t-j} + e_t`,
//! with the statistic being the t-ratio of `γ`. The lag order is chosen by
//! AIC over a common estimation sample, then the chosen model is refit on
//! the longest sample it allows.

use nalgebra::DMatrix;

use super::linalg::to_dvector;
use super::mackinnon::{mackinnon_crit, mackinnon_p};
use super::ols::{fit_matrix, CovarianceType};
use crate::domain::{difference, TrendSpec, UnitRootVerdict};
use crate::error::StatsError;

/// Significance level used for the stationarity verdict.
const SIGNIFICANCE: f64 = 0.05;

/// Lag-selection options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfOptions {
    pub regression: TrendSpec,
    /// Upper bound on lagged differences. `None` uses `ceil(12 (n/100)^¼)`.
    pub max_lag: Option<usize>,
    /// Choose the lag by AIC; otherwise use `max_lag` directly.
    pub autolag: bool,
}

impl Default for AdfOptions {
    fn default() -> Self {
        Self {
            regression: TrendSpec::Constant,
            max_lag: None,
            autolag: true,
        }
    }
}

impl AdfOptions {
    pub fn with_regression(regression: TrendSpec) -> Self {
        Self {
            regression,
            ..Self::default()
        }
    }
}

/// Schwert-style default upper lag bound.
pub fn default_max_lag(n_obs: usize) -> usize {
    (12.0 * (n_obs as f64 / 100.0).powf(0.25)).ceil() as usize
}

/// Run the test.
pub fn adf_test(x: &[f64], options: AdfOptions) -> Result<UnitRootVerdict, StatsError> {
    let n = x.len();
    let ntrend = options.regression.ntrend();
    let cap = (n / 2) as i64 - ntrend as i64 - 1;
    if cap < 0 {
        return Err(StatsError::insufficient("ADF test", 2 * (ntrend + 1), n));
    }
    let max_lag = options
        .max_lag
        .unwrap_or_else(|| default_max_lag(n))
        .min(cap as usize);

    let dx = difference(x);

    let used_lag = if options.autolag {
        select_lag(x, &dx, max_lag, options.regression)?
    } else {
        max_lag
    };

    let design = adf_design(x, &dx, used_lag, options.regression, used_lag);
    let y = to_dvector(&dx[used_lag..]);
    let fit = fit_matrix(&y, &design, const_column(options.regression), CovarianceType::NonRobust)?;

    // The lagged level sits right after the deterministic columns.
    let stat = fit.t_values[ntrend];
    let p_value = mackinnon_p(stat, options.regression, 1)?;
    let critical_values = mackinnon_crit(options.regression, 1, fit.n_obs)?;

    Ok(UnitRootVerdict {
        test_statistic: stat,
        p_value,
        used_lag,
        n_obs: fit.n_obs,
        critical_values,
        is_stationary: p_value < SIGNIFICANCE,
    })
}

/// Pick the lag count minimizing AIC when every candidate uses the same
/// `n - 1 - max_lag` observations. Ties keep the smaller lag.
fn select_lag(
    x: &[f64],
    dx: &[f64],
    max_lag: usize,
    regression: TrendSpec,
) -> Result<usize, StatsError> {
    let y = to_dvector(&dx[max_lag..]);
    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=max_lag {
        let design = adf_design(x, dx, lag, regression, max_lag);
        let fit = fit_matrix(&y, &design, const_column(regression), CovarianceType::NonRobust)?;
        let aic = fit.aic();
        match best {
            Some((best_aic, _)) if !(aic < best_aic) => {}
            _ if aic.is_nan() => {}
            _ => best = Some((aic, lag)),
        }
    }
    Ok(best.map(|(_, lag)| lag).unwrap_or(0))
}

fn const_column(regression: TrendSpec) -> Option<usize> {
    (regression != TrendSpec::None).then_some(0)
}

/// Rows `t = start..n-1` of `[deterministic, x_t, Δx_{t-1}, …, Δx_{t-lag}]`
/// explaining `Δx_t = x_{t+1} - x_t`.
fn adf_design(x: &[f64], dx: &[f64], lag: usize, regression: TrendSpec, start: usize) -> DMatrix<f64> {
    let rows = dx.len() - start;
    let ntrend = regression.ntrend();
    DMatrix::from_fn(rows, ntrend + 1 + lag, |r, c| {
        let t = start + r;
        match c {
            0 if ntrend >= 1 => 1.0,
            1 if ntrend == 2 => (r + 1) as f64,
            c if c == ntrend => x[t],
            c => dx[t - (c - ntrend)],
        }
    })
}
