//! Analysis result records — the JSON output contract.
//!
//! Optional sections are omitted rather than written as `null`; non-finite
//! statistics inside present sections serialize as `null`.

use serde::{Deserialize, Serialize};

use crate::cointegration::CointegrationResult;
use crate::decider::ModelType;
use crate::profile::SeriesOrder;
use crate::regression::RegressionResult;
use crate::segmenter::{Period, PeriodType, StructuralBreak};

/// Bumped whenever a field is renamed or removed.
pub const SCHEMA_VERSION: u32 = 1;

/// Which model was fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LevelsOls,
    ErrorCorrection,
    VarDifferences,
    MixedRegression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transformation {
    None,
    FirstDifference,
    SecondDifference,
    HigherDifference,
}

impl Transformation {
    pub fn for_order(order: usize) -> Self {
        match order {
            0 => Transformation::None,
            1 => Transformation::FirstDifference,
            2 => Transformation::SecondDifference,
            _ => Transformation::HigherDifference,
        }
    }
}

/// How one series entered a mixed-order regression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationInfo {
    pub series_index: usize,
    pub variable_name: String,
    pub original_order: usize,
    pub transformation: Transformation,
}

/// Fitted model of one block, or the stage that failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cointegration: Option<CointegrationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regression: Option<RegressionResult>,
    /// Long-run equation of an error-correction model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_run: Option<RegressionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var_lag_order: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ModelOutcome {
    pub fn failed(message: String) -> Self {
        Self {
            error_message: Some(message),
            ..Default::default()
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error_message.is_some()
    }
}

/// Model results of one period after segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodModelResult {
    pub period_type: PeriodType,
    pub period_number: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub data_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_type: Option<ModelType>,
    pub series_orders: Vec<SeriesOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformations: Option<Vec<TransformationInfo>>,
    #[serde(flatten)]
    pub outcome: ModelOutcome,
}

impl PeriodModelResult {
    pub fn new(period: &Period) -> Self {
        Self {
            period_type: period.period_type,
            period_number: period.period_number,
            start_index: period.start_index,
            end_index: period.end_index,
            data_size: period.data_size,
            model_type: None,
            series_orders: Vec::new(),
            transformations: None,
            outcome: ModelOutcome::default(),
        }
    }
}

/// Model section of the result: one global model, or one per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResults {
    pub has_structural_break: bool,
    #[serde(flatten)]
    pub outcome: ModelOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structural_breaks: Option<Vec<StructuralBreak>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periods: Option<Vec<Period>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_results: Option<Vec<PeriodModelResult>>,
}

/// Complete output of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub schema_version: u32,
    /// Blake3 digest of the request.
    pub input_hash: String,
    pub series_count: usize,
    /// Names in analysis order: the target first.
    pub variable_names: Vec<String>,
    pub target_variable: String,
    /// Position of the target in the request.
    pub target_index: usize,
    pub series_orders: Vec<SeriesOrder>,
    pub model_type: ModelType,
    pub has_structural_break: bool,
    pub structural_breaks: Vec<StructuralBreak>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformations: Option<Vec<TransformationInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_results: Option<ModelResults>,
}

impl AnalysisResult {
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Serialized form of any failure: `{"error": CODE, "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: code.to_string(),
            message: message.into(),
        }
    }
}
