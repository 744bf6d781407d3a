//! KPSS stationarity test with automatic (Hobijn et al.) bandwidth.
//!
//! Null hypothesis: the series is level- (or trend-) stationary. The p-value
//! is interpolated from the tabulated critical values and therefore lives in
//! `[0.01, 0.10]`.

use super::distributions::interp;
use super::linalg::{deterministic_terms, residualize, series_matrix};
use crate::domain::{mean, KpssCriticalValues, StationarityVerdict, TrendSpec};
use crate::error::StatsError;

const SIGNIFICANCE: f64 = 0.05;
const P_LEVELS: [f64; 4] = [0.10, 0.05, 0.025, 0.01];
const LEVEL_CRIT: [f64; 4] = [0.347, 0.463, 0.574, 0.739];
const TREND_CRIT: [f64; 4] = [0.119, 0.146, 0.176, 0.216];

/// Run the test around a constant (`c`) or a linear trend (`ct`).
pub fn kpss_test(x: &[f64], regression: TrendSpec) -> Result<StationarityVerdict, StatsError> {
    let n = x.len();
    if n < 3 {
        return Err(StatsError::insufficient("KPSS test", 3, n));
    }

    let (resid, crit) = match regression {
        TrendSpec::Constant => {
            let m = mean(x);
            (x.iter().map(|v| v - m).collect::<Vec<f64>>(), LEVEL_CRIT)
        }
        TrendSpec::ConstantTrend => {
            let y = series_matrix(&[x])?;
            let r = residualize(&y, &deterministic_terms(n, true))?;
            (r.iter().copied().collect(), TREND_CRIT)
        }
        TrendSpec::None => {
            return Err(StatsError::Unsupported(
                "KPSS requires a constant or constant+trend specification".into(),
            ))
        }
    };

    let lags = auto_bandwidth(&resid).min(n - 1);

    let nf = n as f64;
    let mut partial = 0.0;
    let eta = resid
        .iter()
        .map(|e| {
            partial += e;
            partial * partial
        })
        .sum::<f64>()
        / (nf * nf);
    let s_hat = long_run_variance(&resid, lags);
    let stat = eta / s_hat;

    // Critical values increase with p decreasing, so interpolate on the reversed table.
    let p_value = interp(stat, &crit, &P_LEVELS);

    Ok(StationarityVerdict {
        kpss_stat: stat,
        p_value,
        lags,
        crit: KpssCriticalValues {
            ten_percent: crit[0],
            five_percent: crit[1],
            two_and_half_percent: crit[2],
            one_percent: crit[3],
        },
        is_stationary: p_value > SIGNIFICANCE,
    })
}

/// Bartlett-weighted long-run variance estimate.
fn long_run_variance(resid: &[f64], lags: usize) -> f64 {
    let n = resid.len();
    let mut s = resid.iter().map(|e| e * e).sum::<f64>();
    for i in 1..=lags {
        let prod: f64 = resid[i..].iter().zip(resid).map(|(a, b)| a * b).sum();
        s += 2.0 * prod * (1.0 - i as f64 / (lags as f64 + 1.0));
    }
    s / n as f64
}

/// Data-dependent bandwidth of Hobijn, Franses and Ooms (1998).
fn auto_bandwidth(resid: &[f64]) -> usize {
    let n = resid.len();
    let nf = n as f64;
    let cov_lags = nf.powf(2.0 / 9.0) as usize;
    let mut s0 = resid.iter().map(|e| e * e).sum::<f64>() / nf;
    let mut s1 = 0.0;
    for i in 1..=cov_lags.min(n - 1) {
        let prod: f64 = resid[i..].iter().zip(resid).map(|(a, b)| a * b).sum();
        let scaled = prod / (nf / 2.0);
        s0 += scaled;
        s1 += i as f64 * scaled;
    }
    if s0 == 0.0 || !s0.is_finite() {
        return 0;
    }
    let s_hat = s1 / s0;
    let gamma = 1.1447 * (s_hat * s_hat).powf(1.0 / 3.0);
    (gamma * nf.powf(1.0 / 3.0)) as usize
}
