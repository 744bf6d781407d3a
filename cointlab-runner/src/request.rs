//! Analysis request — parsing, validation and content fingerprinting.
//!
//! Requests arrive as JSON (`{"series": [...], "target_index": n}`) or CSV
//! (header row = names). Series may be named objects or bare arrays; bare
//! arrays are named `series_1`, `series_2`, ... by position.

use std::io::Read;

use cointlab_core::Series;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::result::ErrorResponse;

/// A request was structurally valid but cannot be analyzed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("at least 2 series are required, got {got}")]
    InsufficientSeries { got: usize },

    #[error("series '{name}' has {len} observations, at least {min} are required")]
    SeriesTooShort { name: String, len: usize, min: usize },

    #[error("series '{name}' has {len} observations, expected {expected} like the first series")]
    LengthMismatch {
        name: String,
        len: usize,
        expected: usize,
    },

    #[error("series '{name}' has a non-finite value at index {index}")]
    NonFiniteValue { name: String, index: usize },

    #[error("target index {index} is out of range for {count} series")]
    InvalidTargetIndex { index: i64, count: usize },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InsufficientSeries { .. } => "INSUFFICIENT_SERIES",
            ValidationError::SeriesTooShort { .. } => "SERIES_TOO_SHORT",
            ValidationError::LengthMismatch { .. } => "LENGTH_MISMATCH",
            ValidationError::NonFiniteValue { .. } => "NON_FINITE_VALUE",
            ValidationError::InvalidTargetIndex { .. } => "INVALID_TARGET_INDEX",
        }
    }
}

/// Failure to turn raw input into an [`AnalysisRequest`].
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("no input data provided")]
    NoInput,

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid CSV: {0}")]
    InvalidCsv(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl RequestError {
    pub fn code(&self) -> &'static str {
        match self {
            RequestError::NoInput => "NO_INPUT",
            RequestError::InvalidJson(_) => "INVALID_JSON",
            RequestError::InvalidCsv(_) => "INVALID_CSV",
            RequestError::Validation(e) => e.code(),
        }
    }
}

impl From<&RequestError> for ErrorResponse {
    fn from(e: &RequestError) -> Self {
        ErrorResponse::new(e.code(), e.to_string())
    }
}

impl From<csv::Error> for RequestError {
    fn from(e: csv::Error) -> Self {
        RequestError::InvalidCsv(e.to_string())
    }
}

/// One input series: `{"name": ..., "data": [...]}` or a bare array.
///
/// `null` entries are accepted and become NaN, so they surface as a
/// validation error rather than a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesInput {
    Named {
        name: String,
        #[serde(deserialize_with = "nullable_values")]
        data: Vec<f64>,
    },
    Values(#[serde(deserialize_with = "nullable_values")] Vec<f64>),
}

fn nullable_values<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

impl SeriesInput {
    pub fn values(&self) -> &[f64] {
        match self {
            SeriesInput::Named { data, .. } => data,
            SeriesInput::Values(data) => data,
        }
    }

    /// Name as given, or `series_{position + 1}` for bare arrays.
    pub fn name_at(&self, position: usize) -> String {
        match self {
            SeriesInput::Named { name, .. } => name.clone(),
            SeriesInput::Values(_) => format!("series_{}", position + 1),
        }
    }
}

/// A full analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub series: Vec<SeriesInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_index: Option<i64>,
}

impl AnalysisRequest {
    pub fn new(series: Vec<Series>, target_index: Option<i64>) -> Self {
        Self {
            series: series
                .into_iter()
                .map(|s| SeriesInput::Named {
                    name: s.name,
                    data: s.values,
                })
                .collect(),
            target_index,
        }
    }

    pub fn with_target(mut self, target_index: Option<i64>) -> Self {
        self.target_index = target_index;
        self
    }

    pub fn from_json(input: &str) -> Result<Self, RequestError> {
        if input.trim().is_empty() {
            return Err(RequestError::NoInput);
        }
        Ok(serde_json::from_str(input)?)
    }

    /// Read a CSV table with a header row.
    ///
    /// With `columns`, exactly those columns are taken in the given order.
    /// Otherwise every column whose non-empty cells all parse as numbers is
    /// taken and the rest (dates, country codes) are skipped. Empty cells
    /// become NaN.
    pub fn from_csv_reader<R: Read>(
        reader: R,
        columns: Option<&[String]>,
    ) -> Result<Self, RequestError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(RequestError::NoInput);
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record = record?;
            for (j, column) in cells.iter_mut().enumerate() {
                column.push(record.get(j).unwrap_or("").to_string());
            }
        }
        if cells.first().map_or(true, Vec::is_empty) {
            return Err(RequestError::NoInput);
        }

        let selected: Vec<usize> = match columns {
            Some(names) => names
                .iter()
                .map(|name| {
                    headers.iter().position(|h| h == name).ok_or_else(|| {
                        RequestError::InvalidCsv(format!("column '{name}' not found"))
                    })
                })
                .collect::<Result<_, _>>()?,
            None => (0..headers.len())
                .filter(|&j| is_numeric_column(&cells[j]))
                .collect(),
        };
        if selected.is_empty() {
            return Err(RequestError::InvalidCsv("no numeric columns".into()));
        }

        let mut series = Vec::with_capacity(selected.len());
        for j in selected {
            let data = cells[j]
                .iter()
                .enumerate()
                .map(|(row, cell)| parse_cell(cell, &headers[j], row))
                .collect::<Result<Vec<_>, _>>()?;
            series.push(SeriesInput::Named {
                name: headers[j].clone(),
                data,
            });
        }
        Ok(Self {
            series,
            target_index: None,
        })
    }

    /// Names after applying the `series_{i}` default.
    pub fn names(&self) -> Vec<String> {
        self.series
            .iter()
            .enumerate()
            .map(|(i, s)| s.name_at(i))
            .collect()
    }

    /// Owned series with resolved names, in request order.
    pub fn to_series(&self) -> Vec<Series> {
        self.series
            .iter()
            .enumerate()
            .map(|(i, s)| Series::new(s.name_at(i), s.values().to_vec()))
            .collect()
    }

    /// Check the request against the pipeline's input contract.
    ///
    /// Checks run in order: series count, per-series length, equal lengths,
    /// finiteness, then the target index.
    pub fn validate(&self, min_observations: usize) -> Result<(), ValidationError> {
        if self.series.len() < 2 {
            return Err(ValidationError::InsufficientSeries {
                got: self.series.len(),
            });
        }
        for (i, s) in self.series.iter().enumerate() {
            if s.values().len() < min_observations {
                return Err(ValidationError::SeriesTooShort {
                    name: s.name_at(i),
                    len: s.values().len(),
                    min: min_observations,
                });
            }
        }
        let expected = self.series[0].values().len();
        for (i, s) in self.series.iter().enumerate().skip(1) {
            if s.values().len() != expected {
                return Err(ValidationError::LengthMismatch {
                    name: s.name_at(i),
                    len: s.values().len(),
                    expected,
                });
            }
        }
        for (i, s) in self.series.iter().enumerate() {
            if let Some(index) = s.values().iter().position(|v| !v.is_finite()) {
                return Err(ValidationError::NonFiniteValue {
                    name: s.name_at(i),
                    index,
                });
            }
        }
        if let Some(index) = self.target_index {
            if index < 0 || index as usize >= self.series.len() {
                return Err(ValidationError::InvalidTargetIndex {
                    index,
                    count: self.series.len(),
                });
            }
        }
        Ok(())
    }

    /// Blake3 digest of names, values and target index.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (i, s) in self.series.iter().enumerate() {
            hasher.update(s.name_at(i).as_bytes());
            hasher.update(&[0]);
            hasher.update(&(s.values().len() as u64).to_le_bytes());
            for v in s.values() {
                hasher.update(&v.to_bits().to_le_bytes());
            }
        }
        match self.target_index {
            Some(t) => hasher.update(&t.to_le_bytes()),
            None => hasher.update(b"auto"),
        };
        hasher.finalize().to_hex().to_string()
    }
}

fn is_numeric_column(cells: &[String]) -> bool {
    let mut any = false;
    for cell in cells {
        if cell.is_empty() {
            continue;
        }
        if cell.parse::<f64>().is_err() {
            return false;
        }
        any = true;
    }
    any
}

fn parse_cell(cell: &str, column: &str, row: usize) -> Result<f64, RequestError> {
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>().map_err(|_| {
        RequestError::InvalidCsv(format!(
            "column '{column}' row {}: '{cell}' is not a number",
            row + 1
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize, offset: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 * 0.5 + offset).collect()
    }

    fn request(lens: &[usize]) -> AnalysisRequest {
        AnalysisRequest {
            series: lens
                .iter()
                .enumerate()
                .map(|(i, &n)| SeriesInput::Named {
                    name: format!("s{i}"),
                    data: ramp(n, i as f64),
                })
                .collect(),
            target_index: None,
        }
    }

    #[test]
    fn parses_named_and_bare_series() {
        let req = AnalysisRequest::from_json(
            r#"{"series": [{"name": "y", "data": [1, 2, 3]}, [4, 5, 6]], "target_index": 0}"#,
        )
        .unwrap();
        assert_eq!(req.names(), vec!["y".to_string(), "series_2".to_string()]);
        assert_eq!(req.series[1].values(), &[4.0, 5.0, 6.0]);
        assert_eq!(req.target_index, Some(0));
    }

    #[test]
    fn empty_input_is_no_input() {
        let err = AnalysisRequest::from_json("   ").unwrap_err();
        assert_eq!(err.code(), "NO_INPUT");
    }

    #[test]
    fn malformed_json_is_invalid_json() {
        let err = AnalysisRequest::from_json("{\"series\": [").unwrap_err();
        assert_eq!(err.code(), "INVALID_JSON");
    }

    #[test]
    fn null_becomes_non_finite() {
        let mut data = vec!["1.0"; 25];
        data[3] = "null";
        let json = format!(
            r#"{{"series": [[{}], [{}]]}}"#,
            data.join(","),
            vec!["2.0"; 25].join(",")
        );
        let req = AnalysisRequest::from_json(&json).unwrap();
        let err = req.validate(20).unwrap_err();
        assert_eq!(err.code(), "NON_FINITE_VALUE");
        assert!(matches!(err, ValidationError::NonFiniteValue { index: 3, .. }));
    }

    #[test]
    fn validation_codes() {
        assert_eq!(request(&[30]).validate(20).unwrap_err().code(), "INSUFFICIENT_SERIES");
        assert_eq!(request(&[30, 10]).validate(20).unwrap_err().code(), "SERIES_TOO_SHORT");
        assert_eq!(request(&[30, 31]).validate(20).unwrap_err().code(), "LENGTH_MISMATCH");
        let bad_target = request(&[30, 30]).with_target(Some(2));
        assert_eq!(bad_target.validate(20).unwrap_err().code(), "INVALID_TARGET_INDEX");
        let negative = request(&[30, 30]).with_target(Some(-1));
        assert_eq!(negative.validate(20).unwrap_err().code(), "INVALID_TARGET_INDEX");
        assert!(request(&[30, 30, 30]).with_target(Some(2)).validate(20).is_ok());
    }

    #[test]
    fn fingerprint_is_content_addressed() {
        let a = request(&[30, 30]);
        let b = request(&[30, 30]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        let c = request(&[30, 30]).with_target(Some(1));
        assert_ne!(a.fingerprint(), c.fingerprint());
        let mut d = request(&[30, 30]);
        if let SeriesInput::Named { data, .. } = &mut d.series[1] {
            data[0] += 1e-12;
        }
        assert_ne!(a.fingerprint(), d.fingerprint());
    }

    #[test]
    fn csv_skips_non_numeric_columns() {
        let csv = "country,week,y,x\nIDN,1,1.5,2\nIDN,2,1.7,\nIDN,3,1.9,4\n";
        let req = AnalysisRequest::from_csv_reader(csv.as_bytes(), None).unwrap();
        assert_eq!(req.names(), vec!["week", "y", "x"]);
        assert!(req.series[2].values()[1].is_nan());
    }

    #[test]
    fn csv_explicit_columns() {
        let csv = "country,y,x\nIDN,1.5,2\nIDN,1.7,3\n";
        let cols = vec!["x".to_string(), "y".to_string()];
        let req = AnalysisRequest::from_csv_reader(csv.as_bytes(), Some(&cols)).unwrap();
        assert_eq!(req.names(), vec!["x", "y"]);
        let missing = vec!["z".to_string()];
        let err = AnalysisRequest::from_csv_reader(csv.as_bytes(), Some(&missing)).unwrap_err();
        assert_eq!(err.code(), "INVALID_CSV");
        let text = vec!["country".to_string()];
        let err = AnalysisRequest::from_csv_reader(csv.as_bytes(), Some(&text)).unwrap_err();
        assert_eq!(err.code(), "INVALID_CSV");
    }

    #[test]
    fn csv_without_rows_is_no_input() {
        let err = AnalysisRequest::from_csv_reader("y,x\n".as_bytes(), None).unwrap_err();
        assert_eq!(err.code(), "NO_INPUT");
    }
}
