//! Seasonal-trend decomposition by moving averages, with ACF period detection.
//!
//! The decomposition is additive, `x = trend + seasonal + residual`:
//! - trend: centred moving average over one period (2×m for even m),
//!   shrinking symmetrically at the edges
//! - seasonal: centred per-phase mean of the detrended series
//! - strength of a component: `var(c) / (var(c) + var(residual))`

use crate::domain::{mean, variance, SeasonalTrendVerdict};

/// Below this length no decomposition is attempted.
pub const MIN_DECOMPOSITION_POINTS: usize = 24;

/// Minimum autocorrelation for a lag to count as a seasonal peak.
const ACF_PEAK_THRESHOLD: f64 = 0.3;

/// Additive components of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub period: usize,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
}

impl Decomposition {
    pub fn trend_strength(&self) -> f64 {
        strength(&self.trend, &self.residual)
    }

    pub fn seasonal_strength(&self) -> f64 {
        strength(&self.seasonal, &self.residual)
    }
}

fn strength(component: &[f64], residual: &[f64]) -> f64 {
    let c = variance(component);
    let r = variance(residual);
    if c + r > 0.0 {
        c / (c + r)
    } else {
        0.0
    }
}

/// Sample autocorrelation at `lag`, normalised by the full-sample variance.
pub fn autocorrelation_at_lag(values: &[f64], lag: usize, mean: f64, variance: f64) -> f64 {
    if lag >= values.len() || variance < 1e-10 {
        return 0.0;
    }
    let pairs = (values.len() - lag) as f64;
    let cov = values[..values.len() - lag]
        .iter()
        .zip(&values[lag..])
        .map(|(a, b)| (a - mean) * (b - mean))
        .sum::<f64>()
        / pairs;
    cov / variance
}

/// Period guess from the series length alone.
pub fn fallback_period(n: usize) -> usize {
    match n {
        n if n >= 104 => 52,
        n if n >= 50 => 30,
        n if n >= 20 => 7,
        n => (n / 3).max(2),
    }
}

/// Local ACF peak closest to `expected_period`, or [`fallback_period`].
///
/// Only lags in `2..=max_period` (default `n/2 - 1`) whose autocorrelation
/// exceeds 0.3 and both neighbours are considered.
pub fn find_period_via_acf(values: &[f64], max_period: Option<usize>, expected_period: usize) -> usize {
    let n = values.len();
    let upper = max_period.unwrap_or((n / 2).saturating_sub(1)).min(n.saturating_sub(2));
    if upper < 3 {
        return fallback_period(n);
    }
    let m = mean(values);
    let v = variance(values);
    let acf: Vec<f64> = (0..=upper + 1)
        .map(|lag| autocorrelation_at_lag(values, lag, m, v))
        .collect();

    (2..=upper)
        .filter(|&lag| acf[lag] > ACF_PEAK_THRESHOLD && acf[lag] > acf[lag - 1] && acf[lag] >= acf[lag + 1])
        .min_by_key(|&lag| (lag.abs_diff(expected_period), lag))
        .unwrap_or_else(|| fallback_period(n))
}

/// Clamp a candidate period into the range the decomposition supports.
pub fn effective_period(period: usize, n: usize) -> usize {
    let p = period.max(2);
    if p >= n / 2 {
        (n / 3).max(2)
    } else {
        p
    }
}

/// Decompose with a fixed period. Returns `None` for short inputs.
pub fn decompose(values: &[f64], period: usize) -> Option<Decomposition> {
    let n = values.len();
    if n < MIN_DECOMPOSITION_POINTS {
        return None;
    }
    let period = effective_period(period, n);
    let trend = centred_moving_average(values, period);

    let detrended: Vec<f64> = values.iter().zip(&trend).map(|(x, t)| x - t).collect();
    let mut phase_means: Vec<f64> = (0..period)
        .map(|p| {
            let phase: Vec<f64> = detrended.iter().skip(p).step_by(period).copied().collect();
            mean(&phase)
        })
        .collect();
    let centre = mean(&phase_means);
    for m in &mut phase_means {
        *m -= centre;
    }
    let seasonal: Vec<f64> = (0..n).map(|t| phase_means[t % period]).collect();
    let residual: Vec<f64> = (0..n).map(|t| values[t] - trend[t] - seasonal[t]).collect();

    Some(Decomposition {
        period,
        trend,
        seasonal,
        residual,
    })
}

/// Detect the period, decompose, and summarise the component strengths.
pub fn seasonal_trend_strength(
    values: &[f64],
    expected_period: usize,
    trend_threshold: f64,
    seasonal_threshold: f64,
) -> SeasonalTrendVerdict {
    if values.len() < MIN_DECOMPOSITION_POINTS {
        return SeasonalTrendVerdict::absent();
    }
    let period = find_period_via_acf(values, None, expected_period);
    match decompose(values, period) {
        Some(d) => {
            let trend_strength = d.trend_strength();
            let seasonal_strength = d.seasonal_strength();
            SeasonalTrendVerdict {
                has_trend: trend_strength > trend_threshold,
                has_seasonality: seasonal_strength > seasonal_threshold,
                trend_strength,
                seasonal_strength,
                period: Some(d.period),
            }
        }
        None => SeasonalTrendVerdict::absent(),
    }
}

/// Weighted centred moving average; weights are renormalised where the window is truncated.
fn centred_moving_average(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let half = period / 2;
    let weight = |offset: usize| -> f64 {
        if period % 2 == 0 && offset == half {
            0.5
        } else {
            1.0
        }
    };
    (0..n)
        .map(|t| {
            let reach = half.min(t).min(n - 1 - t);
            let mut sum = values[t];
            let mut total = 1.0;
            for k in 1..=reach {
                let w = weight(k);
                sum += w * (values[t - k] + values[t + k]);
                total += 2.0 * w;
            }
            sum / total
        })
        .collect()
}
