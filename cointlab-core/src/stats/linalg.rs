//! Dense linear-algebra helpers on top of `nalgebra`.

use nalgebra::{DMatrix, DVector};

use crate::error::StatsError;

/// Moore–Penrose pseudo-inverse together with the numerical rank.
#[derive(Debug, Clone)]
pub struct PseudoInverse {
    pub matrix: DMatrix<f64>,
    pub rank: usize,
}

/// Pseudo-inverse via SVD with a cutoff relative to the largest singular value.
pub fn pseudo_inverse(x: &DMatrix<f64>) -> Result<PseudoInverse, StatsError> {
    let (rows, cols) = x.shape();
    if rows == 0 || cols == 0 {
        return Err(StatsError::DimensionMismatch(format!(
            "cannot invert a {rows}x{cols} matrix"
        )));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::Numerical("non-finite value in design matrix".into()));
    }

    let svd = x.clone().svd(true, true);
    let max_sv = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let tol = max_sv * rows.max(cols) as f64 * f64::EPSILON;
    let rank = svd.singular_values.iter().filter(|&&s| s > tol).count();
    let matrix = svd
        .pseudo_inverse(tol)
        .map_err(|e| StatsError::Numerical(e.to_string()))?;
    Ok(PseudoInverse { matrix, rank })
}

/// Stack equal-length columns into an `n x k` matrix, optionally prepending a constant.
pub fn design_matrix(columns: &[&[f64]], add_constant: bool) -> Result<DMatrix<f64>, StatsError> {
    let n = match columns.first() {
        Some(c) => c.len(),
        None if add_constant => {
            return Err(StatsError::DimensionMismatch(
                "constant-only design needs an explicit row count".into(),
            ))
        }
        None => 0,
    };
    if let Some(bad) = columns.iter().find(|c| c.len() != n) {
        return Err(StatsError::DimensionMismatch(format!(
            "regressor length {} differs from {n}",
            bad.len()
        )));
    }
    let offset = usize::from(add_constant);
    Ok(DMatrix::from_fn(n, columns.len() + offset, |i, j| {
        if add_constant && j == 0 {
            1.0
        } else {
            columns[j - offset][i]
        }
    }))
}

/// `[1, t]` columns for `t = 1..=n`, optionally only the constant.
pub fn deterministic_terms(n: usize, with_trend: bool) -> DMatrix<f64> {
    let cols = if with_trend { 2 } else { 1 };
    DMatrix::from_fn(n, cols, |i, j| if j == 0 { 1.0 } else { (i + 1) as f64 })
}

/// Residuals of regressing every column of `y` on `z`. An empty `z` returns `y` unchanged.
pub fn residualize(y: &DMatrix<f64>, z: &DMatrix<f64>) -> Result<DMatrix<f64>, StatsError> {
    if z.ncols() == 0 {
        return Ok(y.clone());
    }
    if z.nrows() != y.nrows() {
        return Err(StatsError::DimensionMismatch(format!(
            "residualize: {} rows vs {} rows",
            y.nrows(),
            z.nrows()
        )));
    }
    let pinv = pseudo_inverse(z)?;
    let beta = &pinv.matrix * y;
    Ok(y - z * beta)
}

/// Remove deterministic terms column-wise: -1 none, 0 demean, 1 linear detrend.
pub fn detrend(y: &DMatrix<f64>, order: i32) -> Result<DMatrix<f64>, StatsError> {
    match order {
        o if o < 0 => Ok(y.clone()),
        0 => {
            let mut out = y.clone();
            for mut col in out.column_iter_mut() {
                let m = col.mean();
                col.add_scalar_mut(-m);
            }
            Ok(out)
        }
        _ => residualize(y, &deterministic_terms(y.nrows(), true)),
    }
}

/// Copy column `j` into a `Vec`.
pub fn column_to_vec(m: &DMatrix<f64>, j: usize) -> Vec<f64> {
    m.column(j).iter().copied().collect()
}

pub fn to_dvector(values: &[f64]) -> DVector<f64> {
    DVector::from_column_slice(values)
}

/// Build a `T x k` matrix whose columns are the given series.
pub fn series_matrix(series: &[&[f64]]) -> Result<DMatrix<f64>, StatsError> {
    design_matrix(series, false)
}
