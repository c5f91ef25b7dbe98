//! Error types for the econuy-transform library.

use thiserror::Error;

/// Result type alias for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Errors that can occur while building datasets or applying transforms.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Date index error.
    #[error("index error: {0}")]
    IndexError(String),

    /// Row or column position out of range.
    #[error("index {index} out of bounds for size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    /// A descriptor field the operation depends on is not set.
    #[error("'{indicator}' is missing the required '{field}' metadata")]
    MissingMetadata {
        field: &'static str,
        indicator: String,
    },

    /// The column's metadata does not satisfy the operation's precondition.
    #[error("'{indicator}' does not have the appropriate metadata: {reason}")]
    NotApplicable { indicator: String, reason: String },

    /// Frequency code not present in the periods-per-year table.
    #[error("unknown frequency '{0}'")]
    UnknownFrequency(String),

    /// Frequency is known but the operation cannot work with it.
    #[error("{operation} needs {expected} frequency, got '{frequency}'")]
    UnsupportedFrequency {
        operation: &'static str,
        expected: &'static str,
        frequency: String,
    },

    /// Indicator not present in the dataset.
    #[error("unknown indicator '{0}'")]
    UnknownIndicator(String),

    /// The auxiliary series accessor failed.
    #[error("could not get auxiliary series '{name}': {message}")]
    Source { name: String, message: String },

    /// The X13 binary ran but reported an error.
    #[error("X13 error: {0}")]
    X13(String),

    /// The X13 binary could not be located.
    #[error("X13 binary not found: {0}")]
    BinaryNotFound(String),

    /// Downloading the X13 binary failed.
    #[error("download failed: {0}")]
    Download(String),

    /// Filesystem or process I/O failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl TransformError {
    pub(crate) fn missing(field: &'static str, indicator: &str) -> Self {
        Self::MissingMetadata {
            field,
            indicator: indicator.to_string(),
        }
    }

    pub(crate) fn not_applicable(indicator: &str, reason: impl Into<String>) -> Self {
        Self::NotApplicable {
            indicator: indicator.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for TransformError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
