//! capcost-core: shared types for node/pod price and utilization estimation.
//!
//! - **`resource`**: milli-precision [`Quantity`] and resource names
//! - **`types`**: node, pod and node-info snapshots plus well-known labels
//! - **`pod`** / **`gpu`**: lifecycle and GPU predicates
//! - **`config`**: `capcost.toml` parsing

pub mod config;
pub mod error;
pub mod gpu;
pub mod pod;
pub mod resource;
pub mod types;

pub use config::CapcostConfig;
pub use error::{CoreError, CoreResult};
pub use resource::{Quantity, ResourceList};
pub use types::*;
