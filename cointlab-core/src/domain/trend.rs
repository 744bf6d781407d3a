//! Deterministic-term specification for unit-root and stationarity tests.

use serde::{Deserialize, Serialize};

/// Deterministic terms included in a test regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TrendSpec {
    /// No deterministic terms.
    #[serde(rename = "n")]
    None,
    /// Constant only.
    #[default]
    #[serde(rename = "c")]
    Constant,
    /// Constant and linear time trend.
    #[serde(rename = "ct")]
    ConstantTrend,
}

impl TrendSpec {
    /// Number of deterministic regressors.
    pub fn ntrend(self) -> usize {
        match self {
            TrendSpec::None => 0,
            TrendSpec::Constant => 1,
            TrendSpec::ConstantTrend => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrendSpec::None => "n",
            TrendSpec::Constant => "c",
            TrendSpec::ConstantTrend => "ct",
        }
    }

    /// Johansen deterministic-order code: -1, 0 or 1.
    pub fn det_order(self) -> i32 {
        match self {
            TrendSpec::None => -1,
            TrendSpec::Constant => 0,
            TrendSpec::ConstantTrend => 1,
        }
    }

    /// Pick `ct` for trending series, `c` otherwise.
    pub fn from_trend_flag(has_trend: bool) -> Self {
        if has_trend {
            TrendSpec::ConstantTrend
        } else {
            TrendSpec::Constant
        }
    }
}

impl std::fmt::Display for TrendSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
