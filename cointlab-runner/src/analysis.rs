//! Analysis orchestrator — validate, pick the target, profile, segment, build models.
//!
//! One call owns its whole result graph. Nothing is cached or shared between
//! calls except the immutable configuration and the stateless oracles.

use cointlab_core::domain::Series;
use cointlab_core::oracle::{
    CointegrationOracle, SeasonalTrendOracle, StationarityOracle, StatisticalOracle,
};
use cointlab_core::StatsError;
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::models::ModelBuilder;
use crate::observer::{AnalysisObserver, TargetReason, TraceEvent};
use crate::profile::Profiler;
use crate::request::{AnalysisRequest, ValidationError};
use crate::result::{
    AnalysisResult, ErrorResponse, ModelOutcome, ModelResults, PeriodModelResult, SCHEMA_VERSION,
};
use crate::segmenter::{self, PreparedData};

static DEFAULT_ORACLE: StatisticalOracle = StatisticalOracle::new();

/// The oracle handles consumed by the pipeline.
#[derive(Clone, Copy)]
pub struct Oracles<'a> {
    pub stationarity: &'a dyn StationarityOracle,
    pub seasonal: &'a dyn SeasonalTrendOracle,
    pub cointegration: &'a dyn CointegrationOracle,
}

impl<'a> Oracles<'a> {
    /// Use one value for every oracle role.
    pub fn uniform<O>(oracle: &'a O) -> Self
    where
        O: StationarityOracle + SeasonalTrendOracle + CointegrationOracle,
    {
        Self {
            stationarity: oracle,
            seasonal: oracle,
            cointegration: oracle,
        }
    }
}

impl Oracles<'static> {
    /// The default statistical oracle with its built-in thresholds.
    pub fn statistical() -> Self {
        Self::uniform(&DEFAULT_ORACLE)
    }
}

/// Failure of a whole analysis call.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("analysis failed: {0}")]
    Failed(StatsError),
}

impl AnalysisError {
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::Validation(e) => e.code(),
            AnalysisError::Failed(_) => "ANALYSIS_FAILED",
        }
    }
}

impl From<&AnalysisError> for ErrorResponse {
    fn from(e: &AnalysisError) -> Self {
        ErrorResponse::new(e.code(), e.to_string())
    }
}

/// Explicit index, else the first name containing a keyword, else 0.
pub fn select_target(
    names: &[String],
    explicit: Option<usize>,
    keywords: &[String],
) -> (usize, TargetReason) {
    if let Some(index) = explicit {
        return (index, TargetReason::Explicit);
    }
    for (index, name) in names.iter().enumerate() {
        let lower = name.to_lowercase();
        if let Some(keyword) = keywords.iter().find(|k| lower.contains(&k.to_lowercase())) {
            return (
                index,
                TargetReason::Keyword {
                    keyword: keyword.clone(),
                },
            );
        }
    }
    (0, TargetReason::Default)
}

/// Runs the full pipeline for one request.
#[derive(Clone, Copy)]
pub struct Analyzer<'a> {
    oracles: Oracles<'a>,
    config: &'a PipelineConfig,
    observer: &'a dyn AnalysisObserver,
}

impl<'a> Analyzer<'a> {
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

    pub fn config(&self) -> &PipelineConfig {
        self.config
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        request.validate(self.config.min_observations)?;
        let input_hash = request.fingerprint();

        let mut series = request.to_series();
        let names: Vec<String> = series.iter().map(|s| s.name.clone()).collect();
        let explicit = request.target_index.map(|t| t as usize);
        let (target_index, reason) = select_target(&names, explicit, &self.config.target_keywords);
        self.observer.on_event(&TraceEvent::TargetSelected {
            index: target_index,
            name: names[target_index].clone(),
            reason,
        });
        series.swap(0, target_index);

        let profiler = Profiler::new(self.oracles, self.config, self.observer);
        let profile = profiler.profile(&series).map_err(|e| {
            self.observer.on_event(&TraceEvent::StageFailed {
                stage: "profiling",
                message: e.to_string(),
            });
            AnalysisError::Failed(e)
        })?;

        let period_profiler = |block: &[Series]| profiler.profile(block);
        let prepared = segmenter::prepare(
            &series,
            &profile,
            self.config.break_tolerance,
            &period_profiler,
            self.observer,
        );

        let builder = ModelBuilder::new(self.oracles, self.config, self.observer);
        let (model_results, transformations) = if prepared.has_structural_break() {
            (self.segmented_results(&builder, prepared), None)
        } else {
            let built = builder.build(&series, &profile);
            let results = ModelResults {
                has_structural_break: false,
                outcome: built.outcome,
                structural_breaks: None,
                periods: None,
                period_results: None,
            };
            (results, built.transformations)
        };

        let structural_breaks = model_results.structural_breaks.clone().unwrap_or_default();
        Ok(AnalysisResult {
            schema_version: SCHEMA_VERSION,
            input_hash,
            series_count: series.len(),
            variable_names: series.iter().map(|s| s.name.clone()).collect(),
            target_variable: names[target_index].clone(),
            target_index,
            series_orders: profile.series_orders,
            model_type: profile.model_type,
            has_structural_break: model_results.has_structural_break,
            structural_breaks,
            transformations,
            model_results: Some(model_results),
        })
    }

    fn segmented_results(&self, builder: &ModelBuilder<'_>, prepared: PreparedData) -> ModelResults {
        let periods = prepared.periods.iter().map(|p| p.period).collect();
        let period_results = prepared
            .periods
            .into_iter()
            .map(|data| {
                let mut result = PeriodModelResult::new(&data.period);
                match data.profile {
                    Ok(profile) => {
                        let built = builder.build(&data.series, &profile);
                        result.model_type = Some(profile.model_type);
                        result.series_orders = profile.series_orders;
                        result.transformations = built.transformations;
                        result.outcome = built.outcome;
                    }
                    Err(e) => {
                        result.outcome =
                            ModelOutcome::failed(format!("period analysis failed: {e}"));
                    }
                }
                result
            })
            .collect();
        ModelResults {
            has_structural_break: true,
            outcome: ModelOutcome::default(),
            structural_breaks: Some(prepared.structural_breaks),
            periods: Some(periods),
            period_results: Some(period_results),
        }
    }
}
