//! Cointegration tests: Engle–Granger (two series) and Johansen trace (many).

use nalgebra::{DMatrix, SymmetricEigen};

use super::adf::{adf_test, AdfOptions};
use super::linalg::{detrend, residualize, series_matrix};
use super::mackinnon::{mackinnon_crit, mackinnon_p};
use super::ols::{fit, CovarianceType};
use crate::domain::{PairwiseCointegration, RankCointegration, TrendSpec};
use crate::error::StatsError;

/// Largest system the trace critical-value table covers.
pub const MAX_JOHANSEN_SERIES: usize = 6;

/// Osterwald-Lenum trace critical values (90%, 95%, 99%), indexed by the
/// number of common stochastic trends `k - r`, for det orders -1, 0, 1.
const TRACE_CRIT: [[[f64; 3]; MAX_JOHANSEN_SERIES]; 3] = [
    [
        [2.9762, 4.1296, 6.9406],
        [10.4741, 12.3212, 16.3640],
        [21.7781, 24.2761, 29.5147],
        [37.0339, 40.1749, 46.5716],
        [56.2839, 60.0627, 67.6367],
        [79.5329, 83.9383, 92.7136],
    ],
    [
        [2.7055, 3.8415, 6.6349],
        [13.4294, 15.4943, 19.9349],
        [27.0669, 29.7961, 35.4628],
        [44.4929, 47.8545, 54.6815],
        [65.8202, 69.8189, 77.8202],
        [91.1090, 95.7542, 104.9637],
    ],
    [
        [2.7055, 3.8415, 6.6349],
        [16.1619, 18.3985, 23.1485],
        [32.0645, 35.0116, 41.0815],
        [51.6492, 55.2459, 62.5202],
        [75.1027, 79.3422, 87.7748],
        [102.4674, 107.3429, 116.9829],
    ],
];

/// Regress `y0` on `y1` and test the residuals for a unit root.
///
/// Residuals get an ADF test without deterministic terms; the statistic is
/// compared against the two-variable MacKinnon surface. Perfectly collinear
/// inputs short-circuit to `-∞` (p = 0).
pub fn engle_granger(
    y0: &[f64],
    y1: &[f64],
    trend: TrendSpec,
    max_lag: Option<usize>,
) -> Result<PairwiseCointegration, StatsError> {
    if y0.len() != y1.len() {
        return Err(StatsError::DimensionMismatch(format!(
            "cointegration inputs have lengths {} and {}",
            y0.len(),
            y1.len()
        )));
    }
    if trend == TrendSpec::None {
        return Err(StatsError::Unsupported(
            "Engle-Granger requires a constant or constant+trend specification".into(),
        ));
    }
    let n = y0.len();
    let time: Vec<f64> = (1..=n).map(|t| t as f64).collect();
    let mut regressors: Vec<&[f64]> = vec![y1];
    if trend == TrendSpec::ConstantTrend {
        regressors.push(&time);
    }
    let long_run = fit(y0, &regressors, true, CovarianceType::NonRobust)?;

    let collinear = long_run.r_squared >= 1.0 - 100.0 * f64::EPSILON.sqrt();
    let coint_t = if collinear {
        f64::NEG_INFINITY
    } else {
        adf_test(
            &long_run.residuals,
            AdfOptions {
                regression: TrendSpec::None,
                max_lag,
                autolag: true,
            },
        )?
        .test_statistic
    };

    Ok(PairwiseCointegration {
        coint_t,
        p_value: mackinnon_p(coint_t, trend, 2)?,
        crit_values: mackinnon_crit(trend, 2, n - 1)?,
    })
}

/// Johansen trace test with `lag_order` lagged differences.
pub fn johansen(
    series: &[&[f64]],
    trend: TrendSpec,
    lag_order: usize,
) -> Result<RankCointegration, StatsError> {
    let k = series.len();
    if k == 0 || k > MAX_JOHANSEN_SERIES {
        return Err(StatsError::Unsupported(format!(
            "Johansen test supports 1 to {MAX_JOHANSEN_SERIES} series, got {k}"
        )));
    }
    let x = series_matrix(series)?;
    let t_len = x.nrows();
    let min_len = lag_order + k + 3;
    if t_len < min_len {
        return Err(StatsError::insufficient("Johansen test", min_len, t_len));
    }

    let det_order = trend.det_order();
    let f = det_order.min(0);
    let x = detrend(&x, det_order)?;

    let dx = DMatrix::from_fn(t_len - 1, k, |r, c| x[(r + 1, c)] - x[(r, c)]);
    let rows = dx.nrows() - lag_order;
    // Lagged differences: columns are lag 1 of every series, then lag 2, ...
    let z = DMatrix::from_fn(rows, k * lag_order, |r, c| {
        let lag = c / k + 1;
        dx[(lag_order + r - lag, c % k)]
    });
    let z = detrend(&z, f)?;
    let dy = detrend(&dx.rows(lag_order, rows).into_owned(), f)?;
    let r0t = residualize(&dy, &z)?;
    // Levels lagged once relative to the differences.
    let lx = detrend(&x.rows(lag_order, rows).into_owned(), f)?;
    let rkt = residualize(&lx, &z)?;

    let n = rkt.nrows() as f64;
    let skk = rkt.transpose() * &rkt / n;
    let sk0 = rkt.transpose() * &r0t / n;
    let s00 = r0t.transpose() * &r0t / n;
    ensure_well_conditioned(&s00, "Johansen residual covariance")?;
    ensure_well_conditioned(&skk, "Johansen level covariance")?;
    let s00_inv = s00
        .try_inverse()
        .ok_or(StatsError::SingularMatrix("Johansen residual covariance"))?;
    let sig = &sk0 * s00_inv * sk0.transpose();

    // Solve sig v = λ skk v through the Cholesky factor of skk.
    let chol = skk
        .cholesky()
        .ok_or(StatsError::SingularMatrix("Johansen level covariance"))?;
    let l = chol.l();
    let half = l
        .solve_lower_triangular(&sig)
        .ok_or(StatsError::SingularMatrix("Johansen level covariance"))?;
    let reduced = l
        .solve_lower_triangular(&half.transpose())
        .ok_or(StatsError::SingularMatrix("Johansen level covariance"))?;
    let symmetric = (&reduced + reduced.transpose()) * 0.5;

    let mut eigenvalues: Vec<f64> = SymmetricEigen::new(symmetric)
        .eigenvalues
        .iter()
        .copied()
        .collect();
    eigenvalues.sort_by(|a, b| b.total_cmp(a));
    if eigenvalues.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::Numerical("Johansen eigenvalues are not finite".into()));
    }

    let table = &TRACE_CRIT[(det_order + 1) as usize];
    let trace_statistics: Vec<f64> = (0..k)
        .map(|i| {
            -n * eigenvalues[i..]
                .iter()
                .map(|l| (1.0 - l.clamp(0.0, 1.0)).ln())
                .sum::<f64>()
        })
        .collect();
    let critical_values: Vec<[f64; 3]> = (0..k).map(|i| table[k - i - 1]).collect();

    Ok(RankCointegration {
        eigenvalues,
        trace_statistics,
        critical_values,
        lag_order,
    })
}

/// Reject symmetric moment matrices whose smallest eigenvalue is negligible.
fn ensure_well_conditioned(m: &DMatrix<f64>, context: &'static str) -> Result<(), StatsError> {
    let eig = SymmetricEigen::new(m.clone()).eigenvalues;
    let max = eig.iter().copied().fold(0.0_f64, f64::max);
    let min = eig.iter().copied().fold(f64::INFINITY, f64::min);
    if !(max > 0.0) || min <= max * 1e-12 {
        return Err(StatsError::SingularMatrix(context));
    }
    Ok(())
}
