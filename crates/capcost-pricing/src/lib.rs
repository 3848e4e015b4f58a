//! capcost price estimator: node and pod cost over a time window.
//!
//! # Components
//!
//! - **`catalog`**: read-only price tables (TOML-loadable, bundled GCE defaults)
//! - **`resolve`**: ordered table lookup with flat fallback
//! - **`model`**: the [`PriceModel`] trait and its catalog-backed implementation
//!
//! # Node pricing
//!
//! ```text
//! hours = ceil(minutes) / 60
//! table = preemptible/spot ? preemptible_instance_prices : instance_prices
//!
//! if instance type in table:
//!     instance = table[type] * hours
//! else if instance type known:
//!     instance = (cpu * cpu_price(family) + mem_gib * mem_price(family)) * hours
//!                * discount(family)           // 1.0 unless preemptible
//!
//! gpu = gpus * gpu_price(gpu type label | base) * hours
//! ```

pub mod catalog;
pub mod error;
pub mod model;
pub mod resolve;

pub use catalog::PriceCatalog;
pub use error::{PricingError, PricingResult};
pub use model::{CatalogPriceModel, NodePriceEstimate, PriceBasis, PriceModel, billable_hours};
pub use resolve::{PriceTable, lookup_price, resolve_price};
