//! CointLab Runner — the automated model-selection pipeline.
//!
//! This crate builds on `cointlab-core` to provide:
//! - Request parsing (JSON, CSV) with validation and fingerprinting
//! - Integration-order classification with break-aware conflict resolution
//! - Model-type decision and structural-break segmentation
//! - Cointegration selection (pairwise or rank test)
//! - Regression escalation (baseline, lagged, robust covariance)
//! - Per-model-type builders: levels OLS, error correction, VAR on differences
//! - Parallel batch analysis and structured trace events

pub mod analysis;
pub mod batch;
pub mod classifier;
pub mod cointegration;
pub mod config;
pub mod decider;
pub mod models;
pub mod observer;
pub mod profile;
pub mod regression;
pub mod request;
pub mod result;
pub mod segmenter;

pub use analysis::{select_target, AnalysisError, Analyzer, Oracles};
pub use batch::{analyze_batch, load_request, run_files, BatchEntry, BatchError, InputFormat};
pub use classifier::{Classifier, IntegrationOrderResult};
pub use cointegration::{CointegrationResult, CointegrationTest};
pub use config::{ConfigError, PipelineConfig};
pub use decider::{decide, ModelType};
pub use models::{BuiltModel, ModelBuilder};
pub use observer::{
    AnalysisObserver, NullObserver, RecordingObserver, Tee, TargetReason, TraceEvent,
    TracingObserver,
};
pub use profile::{BlockProfile, Profiler, SeriesOrder};
pub use regression::{EscalationBuilder, EscalationStage, RegressionResult};
pub use request::{AnalysisRequest, RequestError, SeriesInput, ValidationError};
pub use result::{
    AnalysisResult, ErrorResponse, ModelKind, ModelOutcome, ModelResults, PeriodModelResult,
    Transformation, TransformationInfo, SCHEMA_VERSION,
};
pub use segmenter::{Period, PeriodType, PreparedData, StructuralBreak};
