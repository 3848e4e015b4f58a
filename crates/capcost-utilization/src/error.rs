//! Utilization error types.

use thiserror::Error;

/// Errors that can occur while computing node utilization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UtilizationError {
    #[error("failed to get {resource} from {node}")]
    ResourceMissing { resource: String, node: String },

    #[error("{resource} is 0 at {node}")]
    ResourceZero { resource: String, node: String },

    #[error(
        "{resource} at {node}: daemonset and mirror pods reserve {reserved_milli}m of {allocatable_milli}m allocatable"
    )]
    CapacityExhausted {
        resource: String,
        node: String,
        allocatable_milli: i64,
        reserved_milli: i64,
    },
}

pub type UtilizationResult<T> = Result<T, UtilizationError>;
