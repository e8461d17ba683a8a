//! Error types for the quantile-metrics library.

use thiserror::Error;

/// Result type alias for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that can occur while evaluating quantile forecasts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Two series that must share an index do not.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// The prediction table has no series for a requested (quantile, fold) key.
    #[error("missing prediction data for quantile {quantile}, fold {fold}")]
    MissingFoldData { quantile: f64, fold: usize },

    /// Insufficient data points for the metric.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Writing a table to its destination failed.
    #[error("io error: {0}")]
    Io(String),
}

impl EvalError {
    /// Shape mismatch between two series lengths.
    pub(crate) fn length_mismatch(expected: usize, got: usize) -> Self {
        Self::ShapeMismatch {
            expected: format!("{expected} observations"),
            got: format!("{got} observations"),
        }
    }
}

impl From<std::io::Error> for EvalError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
