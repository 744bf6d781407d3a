//! Ordinary least squares with classical or HAC (Newey–West) covariance.
//!
//! - Solution via SVD pseudo-inverse, so rank-deficient designs still fit
//! - Non-robust covariance `s² (X'X)⁺` with Student-t inference
//! - HAC covariance `(X'X)⁺ S (X'X)⁺` with Bartlett weights and normal inference
//! - Classical F-test, or a Wald F-test under robust covariance
//! - Durbin–Watson and a Gaussian-equivalent AIC on the residuals

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::distributions::{f_survival, normal_two_sided_p, student_t_two_sided_p};
use super::linalg::{design_matrix, pseudo_inverse, to_dvector};
use crate::error::StatsError;

/// Parameter covariance estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CovarianceType {
    #[default]
    NonRobust,
    /// Bartlett-kernel HAC. `None` picks `floor(4 (n/100)^(2/9))` lags.
    Hac { max_lags: Option<usize> },
}

/// Fitted OLS model.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub params: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub t_values: Vec<f64>,
    pub p_values: Vec<f64>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_pvalue: f64,
    pub residuals: Vec<f64>,
    pub ssr: f64,
    pub n_obs: usize,
    pub rank: usize,
    pub df_resid: f64,
    pub covariance: CovarianceType,
    /// Bandwidth actually used for HAC, if any.
    pub hac_lags: Option<usize>,
}

impl OlsFit {
    /// `n ln(RSS/n) + 2p`, the log-likelihood AIC up to a constant.
    pub fn aic(&self) -> f64 {
        let n = self.n_obs as f64;
        n * (self.ssr / n).ln() + 2.0 * self.params.len() as f64
    }

    pub fn durbin_watson(&self) -> f64 {
        durbin_watson(&self.residuals)
    }
}

/// `Σ(e_t - e_{t-1})² / Σe_t²`.
pub fn durbin_watson(residuals: &[f64]) -> f64 {
    let denom: f64 = residuals.iter().map(|e| e * e).sum();
    if denom == 0.0 {
        return f64::NAN;
    }
    let num: f64 = residuals.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    num / denom
}

/// Default Newey–West bandwidth.
pub fn default_hac_lags(n_obs: usize) -> usize {
    (4.0 * (n_obs as f64 / 100.0).powf(2.0 / 9.0)).floor() as usize
}

/// Fit `y` on column regressors, optionally adding an intercept as the first parameter.
pub fn fit(
    y: &[f64],
    regressors: &[&[f64]],
    add_constant: bool,
    covariance: CovarianceType,
) -> Result<OlsFit, StatsError> {
    let x = if regressors.is_empty() {
        if !add_constant {
            return Err(StatsError::DimensionMismatch("no regressors".into()));
        }
        DMatrix::from_element(y.len(), 1, 1.0)
    } else {
        design_matrix(regressors, add_constant)?
    };
    let const_idx = add_constant.then_some(0);
    fit_matrix(&to_dvector(y), &x, const_idx, covariance)
}

/// Fit against a prepared design matrix. `const_idx` marks the intercept column, if any.
pub fn fit_matrix(
    y: &DVector<f64>,
    x: &DMatrix<f64>,
    const_idx: Option<usize>,
    covariance: CovarianceType,
) -> Result<OlsFit, StatsError> {
    let (n, k) = x.shape();
    if y.len() != n {
        return Err(StatsError::DimensionMismatch(format!(
            "dependent has {} rows, design has {n}",
            y.len()
        )));
    }
    if n <= k {
        return Err(StatsError::insufficient("least squares", k + 1, n));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::Numerical("non-finite dependent value".into()));
    }

    let pinv = pseudo_inverse(x)?;
    let beta = &pinv.matrix * y;
    let fitted = x * &beta;
    let resid = y - fitted;
    let ssr = resid.dot(&resid);

    let k_const = usize::from(const_idx.is_some());
    let rank = pinv.rank;
    let df_model = rank.saturating_sub(k_const) as f64;
    let df_resid = n as f64 - rank as f64;
    if df_resid <= 0.0 {
        return Err(StatsError::insufficient("least squares", rank + 1, n));
    }

    let tss = if const_idx.is_some() {
        let m = y.mean();
        y.iter().map(|v| (v - m).powi(2)).sum::<f64>()
    } else {
        y.dot(y)
    };
    let r_squared = if tss > 0.0 { 1.0 - ssr / tss } else { f64::NAN };
    let adj_r_squared = 1.0 - (n as f64 - k_const as f64) / df_resid * (1.0 - r_squared);

    // (X'X)⁺ = X⁺ X⁺'
    let normalized_cov = &pinv.matrix * pinv.matrix.transpose();

    let (cov, hac_lags) = match covariance {
        CovarianceType::NonRobust => (normalized_cov.clone() * (ssr / df_resid), None),
        CovarianceType::Hac { max_lags } => {
            let lags = max_lags.unwrap_or_else(|| default_hac_lags(n));
            let meat = hac_meat(x, &resid, lags);
            (&normalized_cov * meat * &normalized_cov, Some(lags))
        }
    };

    let params: Vec<f64> = beta.iter().copied().collect();
    let std_errors: Vec<f64> = cov.diagonal().iter().map(|v| v.max(0.0).sqrt()).collect();
    let t_values: Vec<f64> = params
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| b / se)
        .collect();
    let p_values: Vec<f64> = match covariance {
        CovarianceType::NonRobust => t_values
            .iter()
            .map(|t| student_t_two_sided_p(*t, df_resid))
            .collect(),
        CovarianceType::Hac { .. } => t_values.iter().map(|t| normal_two_sided_p(*t)).collect(),
    };

    let (f_statistic, f_pvalue) = match covariance {
        CovarianceType::NonRobust => {
            if df_model > 0.0 {
                let ess = tss - ssr;
                let f = (ess / df_model) / (ssr / df_resid);
                (f, f_survival(f, df_model, df_resid))
            } else {
                (f64::NAN, f64::NAN)
            }
        }
        CovarianceType::Hac { .. } => wald_f_test(&beta, &cov, const_idx, df_resid),
    };

    Ok(OlsFit {
        params,
        std_errors,
        t_values,
        p_values,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_pvalue,
        residuals: resid.iter().copied().collect(),
        ssr,
        n_obs: n,
        rank,
        df_resid,
        covariance,
        hac_lags,
    })
}

/// Bartlett-weighted long-run covariance of the score `x_t e_t`.
fn hac_meat(x: &DMatrix<f64>, resid: &DVector<f64>, lags: usize) -> DMatrix<f64> {
    let (n, k) = x.shape();
    let mut scores = x.clone();
    for i in 0..n {
        let e = resid[i];
        for j in 0..k {
            scores[(i, j)] *= e;
        }
    }
    let mut meat = scores.transpose() * &scores;
    for lag in 1..=lags.min(n.saturating_sub(1)) {
        let w = 1.0 - lag as f64 / (lags as f64 + 1.0);
        let lead = scores.rows(lag, n - lag);
        let lagged = scores.rows(0, n - lag);
        let s = lead.transpose() * lagged;
        meat += (&s + s.transpose()) * w;
    }
    meat
}

/// Joint test that every non-intercept coefficient is zero.
fn wald_f_test(
    beta: &DVector<f64>,
    cov: &DMatrix<f64>,
    const_idx: Option<usize>,
    df_resid: f64,
) -> (f64, f64) {
    let idx: Vec<usize> = (0..beta.len()).filter(|i| Some(*i) != const_idx).collect();
    let q = idx.len();
    if q == 0 {
        return (f64::NAN, f64::NAN);
    }
    let rb = DVector::from_fn(q, |r, _| beta[idx[r]]);
    let rvr = DMatrix::from_fn(q, q, |r, c| cov[(idx[r], idx[c])]);
    match rvr.try_inverse() {
        Some(inv) => {
            let f = (rb.transpose() * inv * &rb)[(0, 0)] / q as f64;
            (f, f_survival(f, q as f64, df_resid))
        }
        None => (f64::NAN, f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_with_wiggle(n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, v)| 1.0 + 2.0 * v + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        (x, y)
    }

    #[test]
    fn recovers_line() {
        let (x, y) = line_with_wiggle(50);
        let f = fit(&y, &[&x], true, CovarianceType::NonRobust).unwrap();
        assert!((f.params[0] - 1.0).abs() < 0.1);
        assert!((f.params[1] - 2.0).abs() < 0.01);
        assert!(f.r_squared > 0.99);
        assert_eq!(f.n_obs, 50);
        assert!(f.f_pvalue < 1e-10);
    }

    #[test]
    fn alternating_residuals_give_high_durbin_watson() {
        let (x, y) = line_with_wiggle(50);
        let f = fit(&y, &[&x], true, CovarianceType::NonRobust).unwrap();
        assert!(f.durbin_watson() > 3.5);
    }

    #[test]
    fn durbin_watson_of_constant_residuals() {
        assert!((durbin_watson(&[1.0, 1.0, 1.0]) - 0.0).abs() < 1e-12);
        assert!(durbin_watson(&[0.0, 0.0]).is_nan());
    }

    #[test]
    fn hac_keeps_point_estimates() {
        let (x, y) = line_with_wiggle(60);
        let plain = fit(&y, &[&x], true, CovarianceType::NonRobust).unwrap();
        let hac = fit(&y, &[&x], true, CovarianceType::Hac { max_lags: None }).unwrap();
        for (a, b) in plain.params.iter().zip(&hac.params) {
            assert!((a - b).abs() < 1e-9);
        }
        assert_eq!(hac.hac_lags, Some(default_hac_lags(60)));
        assert!(hac.std_errors.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn default_bandwidth() {
        assert_eq!(default_hac_lags(100), 4);
        assert_eq!(default_hac_lags(500), 5);
        assert_eq!(default_hac_lags(30), 3);
    }

    #[test]
    fn too_few_rows_is_an_error() {
        let x = [1.0, 2.0];
        let y = [1.0, 2.0];
        assert!(fit(&y, &[&x], true, CovarianceType::NonRobust).is_err());
    }

    #[test]
    fn aic_penalizes_parameters() {
        let (x, y) = line_with_wiggle(40);
        let f = fit(&y, &[&x], true, CovarianceType::NonRobust).unwrap();
        let n = 40.0;
        assert!((f.aic() - (n * (f.ssr / n).ln() + 4.0)).abs() < 1e-9);
    }
}
