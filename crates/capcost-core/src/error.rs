//! Error types for capcost core types.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building snapshots and configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid quantity {input:?}: {reason}")]
    InvalidQuantity { input: String, reason: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
