//! Error types for the recall core

use thiserror::Error;

/// Result type alias for recall operations
pub type RecallResult<T> = Result<T, RecallError>;

/// Main error type for the recall core
///
/// Errors from the caching subsystem never reach the original caller: the
/// `DualLevelCache` boundary maps every `Err` to a cache miss / no-op.
/// Internally operations stay explicit `Result`s so that programming errors
/// are not hidden behind a blanket catch.
#[derive(Error, Debug, Clone)]
pub enum RecallError {
    /// Cache storage errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl RecallError {
    /// Create a new cache error
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache(message.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<std::io::Error> for RecallError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for RecallError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

impl From<anyhow::Error> for RecallError {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(error.to_string())
    }
}
