//! Error types for the sales forecasting pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, SalesError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum SalesError {
    /// A field could not be parsed (timestamp absent or unparsable, bad value)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Expected columns are missing or have an unusable type
    #[error("Data schema error: missing or invalid columns [{}]", .columns.join(", "))]
    DataSchema { columns: Vec<String> },

    /// No usable rows were left after cleaning
    #[error("Empty dataset: no usable records after cleaning")]
    EmptyDataset,

    /// The trained artifact is missing, unreadable or incompatible
    #[error("Artifact load error: {0}")]
    ArtifactLoad(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Data error: {0}")]
    Data(String),
}

impl SalesError {
    /// Schema error for a single column
    pub fn missing_column(name: impl Into<String>) -> Self {
        SalesError::DataSchema {
            columns: vec![name.into()],
        }
    }
}

impl From<polars::error::PolarsError> for SalesError {
    fn from(err: polars::error::PolarsError) -> Self {
        SalesError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for SalesError {
    fn from(err: serde_json::Error) -> Self {
        SalesError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for SalesError {
    fn from(err: ndarray::ShapeError) -> Self {
        SalesError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
