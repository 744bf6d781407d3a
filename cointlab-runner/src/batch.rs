//! Batch analysis — many requests or input files analysed in parallel.
//!
//! Each request is independent, so batches fan out over rayon's global pool.
//! Per-file failures never abort the batch; they are written next to the
//! successful results as error documents.

use std::fs::File;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::analysis::{AnalysisError, Analyzer};
use crate::request::{AnalysisRequest, RequestError};
use crate::result::{AnalysisResult, ErrorResponse};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BatchError {
    pub fn code(&self) -> &'static str {
        match self {
            BatchError::Read { .. } | BatchError::Write { .. } => "IO_ERROR",
            BatchError::Request(e) => e.code(),
            BatchError::Analysis(e) => e.code(),
            BatchError::Serialize(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<&BatchError> for ErrorResponse {
    fn from(e: &BatchError) -> Self {
        ErrorResponse::new(e.code(), e.to_string())
    }
}

/// Input encoding, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => InputFormat::Csv,
            _ => InputFormat::Json,
        }
    }
}

/// Load a request from a JSON or CSV file.
pub fn load_request(path: &Path, columns: Option<&[String]>) -> Result<AnalysisRequest, BatchError> {
    let read_err = |source| BatchError::Read {
        path: path.to_path_buf(),
        source,
    };
    let request = match InputFormat::from_path(path) {
        InputFormat::Csv => {
            let file = File::open(path).map_err(read_err)?;
            AnalysisRequest::from_csv_reader(file, columns)?
        }
        InputFormat::Json => {
            let text = std::fs::read_to_string(path).map_err(read_err)?;
            AnalysisRequest::from_json(&text)?
        }
    };
    Ok(request)
}

/// Analyse every request in parallel, preserving input order.
pub fn analyze_batch(
    analyzer: &Analyzer<'_>,
    requests: &[AnalysisRequest],
) -> Vec<Result<AnalysisResult, AnalysisError>> {
    requests.par_iter().map(|r| analyzer.analyze(r)).collect()
}

/// Outcome of one file in a batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub input: PathBuf,
    /// Where the result or error document was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Output file for `input`: `<output_dir>/<stem>.result.json`.
pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("input");
    output_dir.join(format!("{stem}.result.json"))
}

/// Analyse each file and write one JSON document per input into `output_dir`.
pub fn run_files(
    analyzer: &Analyzer<'_>,
    inputs: &[PathBuf],
    output_dir: &Path,
    pretty: bool,
) -> Vec<BatchEntry> {
    inputs
        .par_iter()
        .map(|input| {
            let output = output_path(input, output_dir);
            let analysed = load_request(input, None)
                .and_then(|request| Ok(analyzer.analyze(&request)?))
                .and_then(|result| Ok(result.to_json(pretty)?));
            let (document, error) = match analysed {
                Ok(json) => (json, None),
                Err(e) => {
                    tracing::warn!(input = %input.display(), code = e.code(), error = %e, "batch input failed");
                    let response = ErrorResponse::from(&e);
                    let json = serde_json::to_string(&response).unwrap_or_default();
                    (json, Some(response))
                }
            };
            match std::fs::write(&output, document) {
                Ok(()) => BatchEntry {
                    input: input.clone(),
                    output: Some(output),
                    error,
                },
                Err(source) => {
                    let e = BatchError::Write {
                        path: output,
                        source,
                    };
                    BatchEntry {
                        input: input.clone(),
                        output: None,
                        error: Some(ErrorResponse::from(&e)),
                    }
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Oracles;
    use crate::config::PipelineConfig;
    use crate::observer::NullObserver;
    use cointlab_core::Scenario;

    #[test]
    fn format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a/b.CSV")), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(Path::new("a/b.json")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("noext")), InputFormat::Json);
    }

    #[test]
    fn output_path_uses_stem() {
        let p = output_path(Path::new("/in/flu_weekly.csv"), Path::new("/out"));
        assert_eq!(p, PathBuf::from("/out/flu_weekly.result.json"));
    }

    #[test]
    fn batch_preserves_order() {
        let config = PipelineConfig::default();
        let analyzer = Analyzer::new(Oracles::statistical(), &config, &NullObserver);
        let good = AnalysisRequest::new(Scenario::WhiteNoise.generate(80, 1), None);
        let bad = AnalysisRequest::new(Vec::new(), None);
        let results = analyze_batch(&analyzer, &[good, bad]);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().code(), "INSUFFICIENT_SERIES");
    }

    #[test]
    fn run_files_writes_results_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let request = AnalysisRequest::new(Scenario::WhiteNoise.generate(80, 3), None);
        std::fs::write(&good, serde_json::to_string(&request).unwrap()).unwrap();
        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "  ").unwrap();
        let missing = dir.path().join("missing.csv");

        let out = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default();
        let analyzer = Analyzer::new(Oracles::statistical(), &config, &NullObserver);
        let entries = run_files(&analyzer, &[good, empty, missing], out.path(), false);

        assert!(entries[0].is_ok());
        let written = std::fs::read_to_string(out.path().join("good.result.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["schema_version"], 1);

        assert_eq!(entries[1].error.as_ref().unwrap().error, "NO_INPUT");
        let written = std::fs::read_to_string(out.path().join("empty.result.json")).unwrap();
        assert!(written.contains("NO_INPUT"));

        assert_eq!(entries[2].error.as_ref().unwrap().error, "IO_ERROR");
    }
}
