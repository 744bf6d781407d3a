//! Response-surface p-values and critical values for Dickey–Fuller type statistics.
//!
//! p-values follow MacKinnon (1994): `Φ(poly(τ))` with separate small- and
//! large-statistic polynomials. Critical values follow MacKinnon (2010):
//! `b0 + b1/T + b2/T² + b3/T³`. `n_vars` is 1 for a plain unit-root test and
//! 2 for the Engle–Granger residual test.

use super::distributions::normal_cdf;
use crate::domain::{CriticalValues, TrendSpec};
use crate::error::StatsError;

struct PValueSurface {
    tau_max: f64,
    tau_min: f64,
    tau_star: f64,
    small: [f64; 3],
    large: [f64; 4],
}

fn p_value_surface(trend: TrendSpec, n_vars: usize) -> Option<PValueSurface> {
    let surface = match (trend, n_vars) {
        (TrendSpec::None, 1) => PValueSurface {
            tau_max: f64::INFINITY,
            tau_min: -19.04,
            tau_star: -1.04,
            small: [0.6344, 1.2378, 0.032496],
            large: [0.4797, 0.93557, -0.06999, 0.033066],
        },
        (TrendSpec::Constant, 1) => PValueSurface {
            tau_max: 2.74,
            tau_min: -18.83,
            tau_star: -1.61,
            small: [2.1659, 1.4412, 0.038269],
            large: [1.7339, 0.93202, -0.12745, -0.010368],
        },
        (TrendSpec::ConstantTrend, 1) => PValueSurface {
            tau_max: 0.7,
            tau_min: -16.18,
            tau_star: -2.89,
            small: [3.2512, 1.6047, 0.049588],
            large: [2.5261, 0.61654, -0.37956, -0.060285],
        },
        (TrendSpec::Constant, 2) => PValueSurface {
            tau_max: 0.92,
            tau_min: -18.86,
            tau_star: -2.62,
            small: [2.92, 1.5012, 0.039796],
            large: [2.1945, 0.64695, -0.29198, -0.042377],
        },
        (TrendSpec::ConstantTrend, 2) => PValueSurface {
            tau_max: 0.63,
            tau_min: -21.15,
            tau_star: -3.19,
            small: [3.6646, 1.5419, 0.045463],
            large: [2.85, 0.5272, -0.63781, -0.142911],
        },
        _ => return None,
    };
    Some(surface)
}

fn critical_surface(trend: TrendSpec, n_vars: usize) -> Option<[[f64; 4]; 3]> {
    let table = match (trend, n_vars) {
        (TrendSpec::None, 1) => [
            [-2.56574, -2.2358, -3.627, 0.0],
            [-1.94100, -0.2686, -3.365, 31.223],
            [-1.61682, 0.2656, -2.714, 25.364],
        ],
        (TrendSpec::Constant, 1) => [
            [-3.43035, -6.5393, -16.786, -79.433],
            [-2.86154, -2.8903, -4.234, -40.040],
            [-2.56677, -1.5384, -2.809, 0.0],
        ],
        (TrendSpec::ConstantTrend, 1) => [
            [-3.95877, -9.0531, -28.428, -134.155],
            [-3.41049, -4.3904, -9.036, -45.374],
            [-3.12705, -2.5856, -3.925, -22.380],
        ],
        (TrendSpec::Constant, 2) => [
            [-3.89644, -10.9519, -22.527, 0.0],
            [-3.33613, -6.1101, -6.823, 0.0],
            [-3.04445, -4.2412, -2.720, 0.0],
        ],
        (TrendSpec::ConstantTrend, 2) => [
            [-4.32762, -15.4387, -35.679, 0.0],
            [-3.78057, -9.5106, -12.074, 0.0],
            [-3.49631, -7.0815, -7.538, 21.892],
        ],
        _ => return None,
    };
    Some(table)
}

fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Asymptotic p-value of a Dickey–Fuller statistic.
pub fn mackinnon_p(stat: f64, trend: TrendSpec, n_vars: usize) -> Result<f64, StatsError> {
    let s = p_value_surface(trend, n_vars).ok_or_else(|| {
        StatsError::Unsupported(format!("no p-value surface for trend {trend} with {n_vars} variables"))
    })?;
    if stat.is_nan() {
        return Ok(f64::NAN);
    }
    if stat > s.tau_max {
        return Ok(1.0);
    }
    if stat < s.tau_min {
        return Ok(0.0);
    }
    let poly = if stat <= s.tau_star {
        polyval(&s.small, stat)
    } else {
        polyval(&s.large, stat)
    };
    Ok(normal_cdf(poly))
}

/// Finite-sample 1/5/10% critical values for `n_obs` observations.
pub fn mackinnon_crit(
    trend: TrendSpec,
    n_vars: usize,
    n_obs: usize,
) -> Result<CriticalValues, StatsError> {
    let table = critical_surface(trend, n_vars).ok_or_else(|| {
        StatsError::Unsupported(format!(
            "no critical-value surface for trend {trend} with {n_vars} variables"
        ))
    })?;
    let t = n_obs as f64;
    let eval = |b: &[f64; 4]| b[0] + b[1] / t + b[2] / (t * t) + b[3] / (t * t * t);
    Ok(CriticalValues::from_array([
        eval(&table[0]),
        eval(&table[1]),
        eval(&table[2]),
    ]))
}
