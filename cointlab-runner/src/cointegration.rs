//! Cointegration selector — pairwise test for two series, rank test for more.

use cointlab_core::domain::{PairwiseCointegration, Series, TrendSpec};
use cointlab_core::oracle::CointegrationOracle;
use cointlab_core::stats::linalg::series_matrix;
use cointlab_core::stats::var;
use cointlab_core::StatsError;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::observer::{AnalysisObserver, TraceEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CointegrationTest {
    /// Augmented Engle–Granger.
    Aeg,
    Johansen,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CointegrationResult {
    pub test_type: CointegrationTest,
    pub n_series: usize,
    pub is_cointegrated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aeg_result: Option<PairwiseCointegration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub johansen_eigenvalues: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub johansen_trace_stats: Option<Vec<f64>>,
    /// 5% critical value per rank hypothesis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub johansen_critical_values: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_cointegration_relations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lag_order: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CointegrationResult {
    fn johansen(n_series: usize) -> Self {
        Self {
            test_type: CointegrationTest::Johansen,
            n_series,
            is_cointegrated: false,
            aeg_result: None,
            johansen_eigenvalues: None,
            johansen_trace_stats: None,
            johansen_critical_values: None,
            n_cointegration_relations: None,
            lag_order: None,
            note: None,
        }
    }
}

/// Number of leading rank hypotheses rejected, stopping at the first acceptance.
pub fn count_relations(trace_stats: &[f64], critical_values: &[f64]) -> usize {
    trace_stats
        .iter()
        .zip(critical_values)
        .take_while(|(stat, crit)| stat > crit)
        .count()
}

/// Lagged-difference order for the rank test, chosen by VAR AIC on levels.
///
/// Falls back to 1 when the sample is too short to search or the search fails.
pub fn johansen_lag_order(series: &[Series], max_lags: usize, headroom: usize) -> usize {
    let n_obs = series.first().map_or(0, Series::len);
    if n_obs <= max_lags + headroom {
        return 1;
    }
    let columns: Vec<&[f64]> = series.iter().map(Series::values).collect();
    let selected = series_matrix(&columns).and_then(|data| var::select_order(&data, max_lags));
    match selected {
        Ok(p) => p.max(1),
        Err(_) => 1,
    }
}

/// Test a block of non-stationary series for cointegration.
///
/// Two series use the pairwise test of series 0 on series 1. Three or more
/// use the rank test; a singular system is reported as not cointegrated.
pub fn check(
    series: &[Series],
    trend: TrendSpec,
    oracle: &dyn CointegrationOracle,
    config: &PipelineConfig,
    observer: &dyn AnalysisObserver,
) -> Result<CointegrationResult, StatsError> {
    let result = match series {
        [] | [_] => {
            return Err(StatsError::DimensionMismatch(format!(
                "cointegration needs at least 2 series, got {}",
                series.len()
            )))
        }
        [a, b] => {
            let pair = oracle.pairwise(a.values(), b.values(), trend)?;
            CointegrationResult {
                test_type: CointegrationTest::Aeg,
                n_series: 2,
                is_cointegrated: pair.p_value < config.significance,
                aeg_result: Some(pair),
                johansen_eigenvalues: None,
                johansen_trace_stats: None,
                johansen_critical_values: None,
                n_cointegration_relations: None,
                lag_order: None,
                note: None,
            }
        }
        _ => {
            let lag_order = johansen_lag_order(series, config.johansen_max_lags, config.min_lag_headroom);
            observer.on_event(&TraceEvent::LagOrderSelected {
                context: "johansen",
                lag_order,
            });
            let columns: Vec<&[f64]> = series.iter().map(Series::values).collect();
            match oracle.rank(&columns, trend, lag_order) {
                Ok(rank) => {
                    let crit = rank.five_percent_critical_values();
                    let relations = count_relations(&rank.trace_statistics, &crit);
                    CointegrationResult {
                        is_cointegrated: relations >= 1,
                        johansen_eigenvalues: Some(rank.eigenvalues),
                        johansen_trace_stats: Some(rank.trace_statistics),
                        johansen_critical_values: Some(crit),
                        n_cointegration_relations: Some(relations),
                        lag_order: Some(rank.lag_order),
                        ..CointegrationResult::johansen(series.len())
                    }
                }
                Err(StatsError::SingularMatrix(context)) => {
                    observer.on_event(&TraceEvent::Warning {
                        message: format!("rank test singular in {context}, treating as not cointegrated"),
                    });
                    CointegrationResult {
                        n_cointegration_relations: Some(0),
                        lag_order: Some(lag_order),
                        note: Some(format!(
                            "singular moment matrix ({context}); series are collinear"
                        )),
                        ..CointegrationResult::johansen(series.len())
                    }
                }
                Err(e) => return Err(e),
            }
        }
    };

    observer.on_event(&TraceEvent::CointegrationChecked {
        test_type: result.test_type,
        is_cointegrated: result.is_cointegrated,
        relations: result.n_cointegration_relations,
    });
    Ok(result)
}
