//! capcost-utilization: node utilization for scale-down evaluation.
//!
//! # Algorithm
//!
//! ```text
//! for each pod on the node:
//!     daemonset pod (skip_daemonset_pods) → reserved += requests
//!     mirror pod    (skip_mirror_pods)    → reserved += requests
//!     long-terminating                    → ignored
//!     otherwise                           → requested += requests
//!
//! utilization(resource) = requested / (allocatable - reserved)
//!
//! GPU node:  utilization = utilization(gpu), or 0 if the GPU is unready
//! otherwise: utilization = max(utilization(cpu), utilization(memory))
//! ```

pub mod error;
pub mod info;

pub use error::{UtilizationError, UtilizationResult};
pub use info::{
    DominantResource, PodAccounting, UtilizationInfo, calculate, calculate_utilization_of_resource,
    calculate_with_config, classify_pod,
};
