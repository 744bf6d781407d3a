//! Shared fixtures for the runner integration tests.
//!
//! `Scripted` answers the stationarity questions with a lag-1
//! autocorrelation rule so pipeline tests do not depend on the sampling
//! luck of real hypothesis tests.

#![allow(dead_code)]

use cointlab_core::domain::{
    BreakVerdict, CriticalValues, KpssCriticalValues, PairwiseCointegration, RankCointegration,
    SeasonalTrendVerdict, StationarityVerdict, TrendSpec, UnitRootVerdict,
};
use cointlab_core::oracle::{CointegrationOracle, SeasonalTrendOracle, StationarityOracle};
use cointlab_core::StatsError;

/// Lag-1 sample autocorrelation.
pub fn lag1_autocorrelation(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let den: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    let num: f64 = values
        .windows(2)
        .map(|w| (w[1] - mean) * (w[0] - mean))
        .sum();
    num / den
}

pub struct Scripted {
    /// Series of exactly this length get a unit-root / stationarity conflict.
    pub conflict_len: Option<usize>,
    /// Breakpoint reported by the break test.
    pub break_at: usize,
    pub cointegrated: bool,
    /// Shorter series fail every test with `InsufficientData`.
    pub min_len: usize,
}

impl Default for Scripted {
    fn default() -> Self {
        Self {
            conflict_len: None,
            break_at: 0,
            cointegrated: false,
            min_len: 10,
        }
    }
}

impl Scripted {
    fn looks_stationary(&self, series: &[f64]) -> Result<bool, StatsError> {
        if series.len() < self.min_len {
            return Err(StatsError::insufficient("scripted test", self.min_len, series.len()));
        }
        Ok(lag1_autocorrelation(series).abs() < 0.7)
    }

    fn in_conflict(&self, series: &[f64]) -> bool {
        self.conflict_len == Some(series.len())
    }
}

impl StationarityOracle for Scripted {
    fn unit_root(&self, series: &[f64]) -> Result<UnitRootVerdict, StatsError> {
        let stationary = self.looks_stationary(series)? && !self.in_conflict(series);
        Ok(UnitRootVerdict {
            test_statistic: if stationary { -6.0 } else { -1.0 },
            p_value: if stationary { 0.001 } else { 0.7 },
            used_lag: 0,
            n_obs: series.len(),
            critical_values: CriticalValues::from_array([-3.46, -2.87, -2.57]),
            is_stationary: stationary,
        })
    }

    fn stationarity(&self, series: &[f64], _: TrendSpec) -> Result<StationarityVerdict, StatsError> {
        let stationary = self.looks_stationary(series)? || self.in_conflict(series);
        Ok(StationarityVerdict {
            kpss_stat: if stationary { 0.1 } else { 1.5 },
            p_value: if stationary { 0.1 } else { 0.01 },
            lags: 4,
            crit: KpssCriticalValues {
                one_percent: 0.739,
                two_and_half_percent: 0.574,
                five_percent: 0.463,
                ten_percent: 0.347,
            },
            is_stationary: stationary,
        })
    }

    fn structural_break(&self, series: &[f64], _: TrendSpec) -> Result<BreakVerdict, StatsError> {
        self.looks_stationary(series)?;
        Ok(BreakVerdict {
            test_statistic: -6.5,
            p_value: 0.001,
            used_lag: 0,
            breakpoint: self.break_at,
            critical_values: CriticalValues::from_array([-5.34, -4.8, -4.58]),
            is_stationary: self.break_at > 0,
        })
    }
}

impl SeasonalTrendOracle for Scripted {
    fn decompose(&self, _: &[f64], _: usize) -> SeasonalTrendVerdict {
        SeasonalTrendVerdict::absent()
    }
}

impl CointegrationOracle for Scripted {
    fn pairwise(&self, _: &[f64], _: &[f64], _: TrendSpec) -> Result<PairwiseCointegration, StatsError> {
        Ok(PairwiseCointegration {
            coint_t: if self.cointegrated { -5.0 } else { -1.5 },
            p_value: if self.cointegrated { 0.01 } else { 0.6 },
            crit_values: CriticalValues::from_array([-3.9, -3.34, -3.04]),
        })
    }

    fn rank(&self, _: &[&[f64]], _: TrendSpec, _: usize) -> Result<RankCointegration, StatsError> {
        Err(StatsError::Unsupported("scripted oracle has no rank test".into()))
    }
}
