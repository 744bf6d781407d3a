//! Vector autoregression: AIC lag-order selection and equation-by-equation OLS.

use nalgebra::DMatrix;

use super::distributions::normal_two_sided_p;
use super::linalg::pseudo_inverse;
use crate::error::StatsError;

/// Fitted VAR(p) with an intercept in every equation.
///
/// Parameter rows are ordered `const, L1.y_0 … L1.y_{k-1}, L2.y_0, …`;
/// column `j` is the equation for variable `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct VarFit {
    pub lag_order: usize,
    pub n_vars: usize,
    pub n_obs: usize,
    pub params: DMatrix<f64>,
    pub std_errors: DMatrix<f64>,
    pub t_values: DMatrix<f64>,
    pub p_values: DMatrix<f64>,
    pub residuals: DMatrix<f64>,
    /// Degrees-of-freedom adjusted residual covariance.
    pub sigma_u: DMatrix<f64>,
    /// Regressor matrix, kept so single equations can be refit.
    pub design: DMatrix<f64>,
}

impl VarFit {
    /// `(lag, variable)` for parameter row `row`; `None` for the intercept.
    pub fn regressor_at(&self, row: usize) -> Option<(usize, usize)> {
        if row == 0 {
            None
        } else {
            Some(((row - 1) / self.n_vars + 1, (row - 1) % self.n_vars))
        }
    }

    pub fn equation_residuals(&self, eq: usize) -> Vec<f64> {
        self.residuals.column(eq).iter().copied().collect()
    }
}

/// Largest lag such that each equation keeps positive residual degrees of freedom.
pub fn feasible_max_lag(n_obs: usize, n_vars: usize, requested: usize) -> usize {
    if n_obs < 2 {
        return 0;
    }
    requested.min((n_obs - 2) / (n_vars + 1))
}

/// Rows `t = start..T` of `[1, y_{t-1}, …, y_{t-lags}]`.
fn lagged_design(data: &DMatrix<f64>, lags: usize, start: usize) -> DMatrix<f64> {
    let (t_len, k) = data.shape();
    DMatrix::from_fn(t_len - start, 1 + k * lags, |r, c| {
        if c == 0 {
            return 1.0;
        }
        let lag = (c - 1) / k + 1;
        let var = (c - 1) % k;
        data[(start + r - lag, var)]
    })
}

fn log_det(sigma: &DMatrix<f64>) -> f64 {
    let det = sigma.determinant();
    if det > 0.0 {
        det.ln()
    } else {
        f64::NAN
    }
}

/// Lag order in `0..=max_lags` minimising `ln|Σ_ml| + 2(p k² + k)/T` on a common sample.
///
/// Ties keep the smaller order. Candidates with a non-positive residual
/// determinant are skipped.
pub fn select_order(data: &DMatrix<f64>, max_lags: usize) -> Result<usize, StatsError> {
    let (t_len, k) = data.shape();
    if k == 0 {
        return Err(StatsError::DimensionMismatch("VAR needs at least one series".into()));
    }
    let max_lags = feasible_max_lag(t_len, k, max_lags);
    let y = data.rows(max_lags, t_len - max_lags).into_owned();
    let n = y.nrows() as f64;

    let mut best: Option<(f64, usize)> = None;
    for p in 0..=max_lags {
        let z = lagged_design(data, p, max_lags);
        let pinv = pseudo_inverse(&z)?;
        let resid = &y - &z * (&pinv.matrix * &y);
        let sigma = resid.transpose() * &resid / n;
        let free_params = (p * k * k + k) as f64;
        let aic = log_det(&sigma) + 2.0 * free_params / n;
        if aic.is_nan() {
            continue;
        }
        if best.map_or(true, |(b, _)| aic < b) {
            best = Some((aic, p));
        }
    }
    Ok(best.map(|(_, p)| p).unwrap_or(0))
}

/// Fit a VAR of order `lag_order` on the columns of `data`.
pub fn fit(data: &DMatrix<f64>, lag_order: usize) -> Result<VarFit, StatsError> {
    let (t_len, k) = data.shape();
    let n_params = 1 + k * lag_order;
    if t_len <= lag_order + n_params {
        return Err(StatsError::insufficient("VAR fit", lag_order + n_params + 1, t_len));
    }
    let z = lagged_design(data, lag_order, lag_order);
    let y = data.rows(lag_order, t_len - lag_order).into_owned();
    let n_obs = y.nrows();

    let pinv = pseudo_inverse(&z)?;
    let params = &pinv.matrix * &y;
    let residuals = &y - &z * &params;
    let df_resid = (n_obs - n_params) as f64;
    let sigma_u = residuals.transpose() * &residuals / df_resid;

    let zz_inv = &pinv.matrix * pinv.matrix.transpose();
    let std_errors = DMatrix::from_fn(n_params, k, |r, c| (zz_inv[(r, r)] * sigma_u[(c, c)]).max(0.0).sqrt());
    let t_values = params.component_div(&std_errors);
    let p_values = t_values.map(normal_two_sided_p);

    Ok(VarFit {
        lag_order,
        n_vars: k,
        n_obs,
        params,
        std_errors,
        t_values,
        p_values,
        residuals,
        sigma_u,
        design: z,
    })
}
