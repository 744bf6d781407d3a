//! CointLab Core — domain types, oracle traits, statistical routines, synthetic data.
//!
//! This crate holds everything the decision pipeline consumes but does not decide:
//! - Domain types (series, trend specifications, test verdicts)
//! - Oracle traits for unit-root, stationarity, break, seasonality and cointegration tests
//! - A default oracle backed by ADF, KPSS, Zivot-Andrews, Engle-Granger and Johansen
//! - OLS with classical and HAC covariance, VAR lag selection and estimation
//! - Deterministic synthetic series generation for tests, benches and the CLI

pub mod domain;
pub mod error;
pub mod oracle;
pub mod rng;
pub mod stats;
pub mod synthetic;

#[cfg(test)]
pub(crate) mod test_support;

pub use domain::{Series, TrendSpec};
pub use error::StatsError;
pub use oracle::{CointegrationOracle, SeasonalTrendOracle, StationarityOracle, StatisticalOracle};
pub use rng::SeedHierarchy;
pub use synthetic::{Scenario, SyntheticGenerator};
