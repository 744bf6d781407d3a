//! Structured error type shared by every statistical routine in this crate.

use thiserror::Error;

/// Failure of a statistical computation.
///
/// Degenerate inputs that have a well-defined fallback (constant series,
/// perfectly collinear regressors) are handled by the callers; these variants
/// are for cases where no meaningful number can be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("insufficient data for {context}: need at least {needed} observations, got {got}")]
    InsufficientData {
        context: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("singular matrix in {0}")]
    SingularMatrix(&'static str),

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("numerical failure: {0}")]
    Numerical(String),
}

impl StatsError {
    pub fn insufficient(context: &'static str, needed: usize, got: usize) -> Self {
        Self::InsufficientData {
            context,
            needed,
            got,
        }
    }
}
