//! Verdict records returned by the statistical oracles.
//!
//! Field names are part of the JSON output contract. Non-finite values
//! serialize as `null`.

use serde::{Deserialize, Serialize};

/// Critical values at the 1%, 5% and 10% levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_percent: f64,
    pub five_percent: f64,
    pub ten_percent: f64,
}

impl CriticalValues {
    pub fn from_array(values: [f64; 3]) -> Self {
        Self {
            one_percent: values[0],
            five_percent: values[1],
            ten_percent: values[2],
        }
    }

    pub fn undefined() -> Self {
        Self::from_array([f64::NAN; 3])
    }
}

/// KPSS critical values, which are tabulated at one extra level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpssCriticalValues {
    pub one_percent: f64,
    pub two_and_half_percent: f64,
    pub five_percent: f64,
    pub ten_percent: f64,
}

/// Unit-root (ADF) outcome. Stationary iff the unit root is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRootVerdict {
    pub test_statistic: f64,
    pub p_value: f64,
    pub used_lag: usize,
    pub n_obs: usize,
    pub critical_values: CriticalValues,
    pub is_stationary: bool,
}

impl UnitRootVerdict {
    /// Placeholder for a numerically constant series, which is stationary by definition.
    pub fn degenerate(n_obs: usize) -> Self {
        Self {
            test_statistic: f64::NAN,
            p_value: f64::NAN,
            used_lag: 0,
            n_obs,
            critical_values: CriticalValues::undefined(),
            is_stationary: true,
        }
    }
}

/// Stationarity (KPSS) outcome. Stationary iff the null is not rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationarityVerdict {
    pub kpss_stat: f64,
    pub p_value: f64,
    pub lags: usize,
    pub crit: KpssCriticalValues,
    pub is_stationary: bool,
}

impl StationarityVerdict {
    pub fn degenerate() -> Self {
        Self {
            kpss_stat: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            crit: KpssCriticalValues {
                one_percent: f64::NAN,
                two_and_half_percent: f64::NAN,
                five_percent: f64::NAN,
                ten_percent: f64::NAN,
            },
            is_stationary: true,
        }
    }
}

/// Unit-root test allowing one endogenous break (Zivot–Andrews).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakVerdict {
    pub test_statistic: f64,
    pub p_value: f64,
    pub used_lag: usize,
    pub breakpoint: usize,
    pub critical_values: CriticalValues,
    pub is_stationary: bool,
}

/// Strength of trend and seasonal components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTrendVerdict {
    pub has_trend: bool,
    pub has_seasonality: bool,
    pub trend_strength: f64,
    pub seasonal_strength: f64,
    pub period: Option<usize>,
}

impl SeasonalTrendVerdict {
    pub fn absent() -> Self {
        Self {
            has_trend: false,
            has_seasonality: false,
            trend_strength: 0.0,
            seasonal_strength: 0.0,
            period: None,
        }
    }
}

/// Two-variable residual-based cointegration outcome (Engle–Granger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseCointegration {
    pub coint_t: f64,
    pub p_value: f64,
    pub crit_values: CriticalValues,
}

/// Johansen rank test outcome, ordered by rank hypothesis r = 0, 1, ...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankCointegration {
    pub eigenvalues: Vec<f64>,
    pub trace_statistics: Vec<f64>,
    /// 90%, 95% and 99% critical values per rank hypothesis.
    pub critical_values: Vec<[f64; 3]>,
    pub lag_order: usize,
}

impl RankCointegration {
    /// 95% critical values, one per rank hypothesis.
    pub fn five_percent_critical_values(&self) -> Vec<f64> {
        self.critical_values.iter().map(|row| row[1]).collect()
    }
}
