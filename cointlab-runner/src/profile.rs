//! Block profiling — trend spec, integration order and model type for a set of series.
//!
//! Used on the full sample and again on every period after segmentation.

use cointlab_core::domain::{SeasonalTrendVerdict, Series, TrendSpec};
use cointlab_core::StatsError;
use serde::{Deserialize, Serialize};

use crate::analysis::Oracles;
use crate::classifier::{Classifier, IntegrationOrderResult};
use crate::config::PipelineConfig;
use crate::decider::{decide, ModelType};
use crate::observer::{AnalysisObserver, TraceEvent};

/// Per-series report record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesOrder {
    pub series_index: usize,
    pub variable_name: String,
    pub trend_spec: TrendSpec,
    #[serde(flatten)]
    pub integration: IntegrationOrderResult,
    #[serde(flatten)]
    pub seasonal_trend: SeasonalTrendVerdict,
}

impl SeriesOrder {
    pub fn order(&self) -> usize {
        self.integration.order
    }
}

/// Orders and model type of one block of equal-length series.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockProfile {
    pub series_orders: Vec<SeriesOrder>,
    pub model_type: ModelType,
}

impl BlockProfile {
    pub fn orders(&self) -> Vec<usize> {
        self.series_orders.iter().map(SeriesOrder::order).collect()
    }

    /// Trend spec chosen for the series in position 0.
    pub fn target_trend(&self) -> TrendSpec {
        self.series_orders
            .first()
            .map(|s| s.trend_spec)
            .unwrap_or_default()
    }
}

pub struct Profiler<'a> {
    oracles: Oracles<'a>,
    config: &'a PipelineConfig,
    observer: &'a dyn AnalysisObserver,
}

impl<'a> Profiler<'a> {
    pub fn new(
        oracles: Oracles<'a>,
        config: &'a PipelineConfig,
        observer: &'a dyn AnalysisObserver,
    ) -> Self {
        Self {
            oracles,
            config,
            observer,
        }
    }

    pub fn profile(&self, series: &[Series]) -> Result<BlockProfile, StatsError> {
        let classifier = Classifier::new(self.oracles.stationarity, self.config, self.observer);
        let mut series_orders = Vec::with_capacity(series.len());
        for (series_index, s) in series.iter().enumerate() {
            let seasonal_trend = self
                .oracles
                .seasonal
                .decompose(s.values(), self.config.expected_period);
            let trend_spec = TrendSpec::from_trend_flag(seasonal_trend.has_trend);
            self.observer.on_event(&TraceEvent::TrendSpecChosen {
                series_index,
                trend: trend_spec,
                trend_strength: seasonal_trend.trend_strength,
                period: seasonal_trend.period,
            });
            let integration = classifier.classify(series_index, s.values(), trend_spec)?;
            series_orders.push(SeriesOrder {
                series_index,
                variable_name: s.name.clone(),
                trend_spec,
                integration,
                seasonal_trend,
            });
        }

        let orders: Vec<usize> = series_orders.iter().map(SeriesOrder::order).collect();
        let model_type = decide(&orders);
        self.observer.on_event(&TraceEvent::ModelTypeDecided {
            orders,
            model_type,
        });
        Ok(BlockProfile {
            series_orders,
            model_type,
        })
    }
}
