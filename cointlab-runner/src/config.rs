//! Pipeline configuration — thresholds, search caps and target keywords.
//!
//! Every field has a default, so a TOML file only needs the keys it changes.

use std::path::Path;

use cointlab_core::oracle::StatisticalOracle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "INVALID_CONFIG"
    }
}

/// Tunables for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Highest integration order the classifier will report.
    pub max_integration_order: usize,

    /// Minimum observations per series for a request to be accepted.
    pub min_observations: usize,

    /// Below this length the break test is skipped and the conflict is reported as-is.
    pub min_break_test_observations: usize,

    /// Population variance below which a series is treated as constant.
    pub constant_variance_epsilon: f64,

    /// Breakpoints closer than this are merged into the earlier one.
    pub break_tolerance: usize,

    /// Lower-cased substrings that mark a series as the dependent variable.
    pub target_keywords: Vec<String>,

    /// Seasonal period hint passed to the seasonal-trend oracle.
    pub expected_period: usize,

    pub trend_strength_threshold: f64,
    pub seasonal_strength_threshold: f64,

    /// Level used for coefficient significance and the pairwise cointegration decision.
    pub significance: f64,

    /// Durbin–Watson band `[dw_lower, dw_upper]` considered free of autocorrelation.
    pub dw_lower: f64,
    pub dw_upper: f64,

    /// Upper bound of the lag search in the regression escalation.
    pub max_regression_lags: usize,

    /// A lag `k` is only tried when `n > k + min_lag_headroom`.
    pub min_lag_headroom: usize,

    /// Upper bound of the VAR lag search used to pick the rank-test lag.
    pub johansen_max_lags: usize,

    /// Upper bound of the VAR lag search on differences.
    pub var_max_lags: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_integration_order: 2,
            min_observations: 20,
            min_break_test_observations: 20,
            constant_variance_epsilon: 1e-10,
            break_tolerance: 5,
            target_keywords: default_target_keywords(),
            expected_period: 52,
            trend_strength_threshold: 0.2,
            seasonal_strength_threshold: 0.2,
            significance: 0.05,
            dw_lower: 1.5,
            dw_upper: 2.5,
            max_regression_lags: 5,
            min_lag_headroom: 10,
            johansen_max_lags: 10,
            var_max_lags: 15,
        }
    }
}

fn default_target_keywords() -> Vec<String> {
    [
        "disease",
        "mortality",
        "morbidity",
        "health",
        "death",
        "illness",
        "hospital",
        "respiratory",
        "cardio",
        "infection",
        "incidence",
        "prevalence",
        "malaria",
        "dengue",
        "cholera",
        "asthma",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// True if a Durbin–Watson statistic falls outside the accepted band.
    ///
    /// An undefined statistic (all-zero residuals) is not flagged.
    pub fn is_autocorrelated(&self, dw: f64) -> bool {
        dw < self.dw_lower || dw > self.dw_upper
    }

    /// Default statistical oracle sharing this config's strength thresholds.
    pub fn statistical_oracle(&self) -> StatisticalOracle {
        StatisticalOracle {
            trend_strength_threshold: self.trend_strength_threshold,
            seasonal_strength_threshold: self.seasonal_strength_threshold,
            ..StatisticalOracle::new()
        }
    }
}
