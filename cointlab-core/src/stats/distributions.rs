//! Reference distributions for p-values.
//!
//! Thin wrappers over `statrs` that map construction failures (bad degrees
//! of freedom, NaN input) to NaN instead of panicking.

use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal, StudentsT};

/// Standard normal CDF.
pub fn normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    match Normal::new(0.0, 1.0) {
        Ok(n) => n.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// Two-sided p-value of a statistic under N(0, 1).
pub fn normal_two_sided_p(stat: f64) -> f64 {
    if stat.is_nan() {
        return f64::NAN;
    }
    match Normal::new(0.0, 1.0) {
        Ok(n) => (2.0 * n.sf(stat.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}

/// Two-sided p-value of a statistic under Student's t with `df` degrees of freedom.
pub fn student_t_two_sided_p(stat: f64, df: f64) -> f64 {
    if stat.is_nan() || !(df > 0.0) {
        return f64::NAN;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(t) => (2.0 * t.sf(stat.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}

/// Upper-tail probability of an F(d1, d2) statistic.
pub fn f_survival(stat: f64, d1: f64, d2: f64) -> f64 {
    if stat.is_nan() || !(d1 > 0.0) || !(d2 > 0.0) {
        return f64::NAN;
    }
    if stat <= 0.0 {
        return 1.0;
    }
    match FisherSnedecor::new(d1, d2) {
        Ok(f) => f.sf(stat),
        Err(_) => f64::NAN,
    }
}

/// Piecewise-linear interpolation with clamping at both ends.
///
/// `xp` must be increasing. Values outside the table take the nearest end value.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    if xp.is_empty() || x.is_nan() {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    let last = xp.len() - 1;
    if x >= xp[last] {
        return fp[last];
    }
    for i in 1..xp.len() {
        if x <= xp[i] {
            let w = (x - xp[i - 1]) / (xp[i] - xp[i - 1]);
            return fp[i - 1] + w * (fp[i] - fp[i - 1]);
        }
    }
    fp[last]
}
