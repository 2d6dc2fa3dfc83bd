//! Error types for filterer-filter

use thiserror::Error;

/// Errors that can occur during filtering operations
#[derive(Debug, Error)]
pub enum FilterError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] filterer_core::Error),

    /// Unknown averaging method name
    #[error("unknown averaging method: {0} (expected packed/fast or channel/slow)")]
    UnknownMethod(String),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;
