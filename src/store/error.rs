//! Metric store error types

use thiserror::Error;

/// Errors that can occur in the metric store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Metric name is not one of the tracked series
    #[error("Invalid metric key: {0}. Use t, h or p")]
    InvalidKey(String),

    /// Payload could not be read as a finite number
    #[error("Cannot parse {raw:?} as a {key} reading")]
    Parse { key: String, raw: String },
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
