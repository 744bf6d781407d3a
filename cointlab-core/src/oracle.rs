//! Oracle traits consumed by the decision pipeline, and their default implementation.
//!
//! The pipeline only ever talks to these traits, so tests can substitute
//! scripted oracles to drive specific decision paths.

use crate::domain::{
    BreakVerdict, PairwiseCointegration, RankCointegration, SeasonalTrendVerdict,
    StationarityVerdict, TrendSpec, UnitRootVerdict,
};
use crate::error::StatsError;
use crate::stats::{
    adf_test, engle_granger, johansen, kpss_test, seasonal_trend_strength, zivot_andrews_test,
    AdfOptions, ZivotAndrewsOptions,
};

/// Unit-root, stationarity and structural-break tests for one series.
pub trait StationarityOracle: Send + Sync {
    /// Null: unit root. Stationary iff rejected.
    fn unit_root(&self, series: &[f64]) -> Result<UnitRootVerdict, StatsError>;

    /// Null: stationarity around the given deterministic terms.
    fn stationarity(&self, series: &[f64], trend: TrendSpec)
        -> Result<StationarityVerdict, StatsError>;

    /// Unit root allowing one break. Requires at least 20 observations.
    fn structural_break(&self, series: &[f64], trend: TrendSpec)
        -> Result<BreakVerdict, StatsError>;
}

/// Trend and seasonality strength used to choose the deterministic terms.
pub trait SeasonalTrendOracle: Send + Sync {
    fn decompose(&self, series: &[f64], period_hint: usize) -> SeasonalTrendVerdict;
}

/// Pairwise and system cointegration tests.
pub trait CointegrationOracle: Send + Sync {
    fn pairwise(
        &self,
        a: &[f64],
        b: &[f64],
        trend: TrendSpec,
    ) -> Result<PairwiseCointegration, StatsError>;

    fn rank(
        &self,
        series: &[&[f64]],
        trend: TrendSpec,
        lag_order: usize,
    ) -> Result<RankCointegration, StatsError>;
}

/// Default oracle backed by the routines in [`crate::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticalOracle {
    /// Fraction trimmed at each end of the break search.
    pub break_trim: f64,
    pub trend_strength_threshold: f64,
    pub seasonal_strength_threshold: f64,
}

impl StatisticalOracle {
    pub const fn new() -> Self {
        Self {
            break_trim: 0.15,
            trend_strength_threshold: 0.2,
            seasonal_strength_threshold: 0.2,
        }
    }
}

impl Default for StatisticalOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl StationarityOracle for StatisticalOracle {
    fn unit_root(&self, series: &[f64]) -> Result<UnitRootVerdict, StatsError> {
        // The unit-root side always uses a constant only.
        adf_test(series, AdfOptions::with_regression(TrendSpec::Constant))
    }

    fn stationarity(
        &self,
        series: &[f64],
        trend: TrendSpec,
    ) -> Result<StationarityVerdict, StatsError> {
        kpss_test(series, trend)
    }

    fn structural_break(&self, series: &[f64], trend: TrendSpec) -> Result<BreakVerdict, StatsError> {
        zivot_andrews_test(
            series,
            ZivotAndrewsOptions {
                regression: trend,
                trim: self.break_trim,
                lags: None,
            },
        )
    }
}

impl SeasonalTrendOracle for StatisticalOracle {
    fn decompose(&self, series: &[f64], period_hint: usize) -> SeasonalTrendVerdict {
        seasonal_trend_strength(
            series,
            period_hint,
            self.trend_strength_threshold,
            self.seasonal_strength_threshold,
        )
    }
}

impl CointegrationOracle for StatisticalOracle {
    fn pairwise(
        &self,
        a: &[f64],
        b: &[f64],
        trend: TrendSpec,
    ) -> Result<PairwiseCointegration, StatsError> {
        engle_granger(a, b, trend, None)
    }

    fn rank(
        &self,
        series: &[&[f64]],
        trend: TrendSpec,
        lag_order: usize,
    ) -> Result<RankCointegration, StatsError> {
        johansen(series, trend, lag_order)
    }
}
