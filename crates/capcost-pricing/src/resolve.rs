//! Price resolution: ordered table lookup with a flat fallback.
//!
//! Every price the estimator uses goes through [`lookup_price`] or
//! [`resolve_price`], so the "family entry, else flat default" policy is
//! applied the same way to CPU, memory, discounts, GPUs and instances.

use std::collections::HashMap;

/// Key → hourly price (or discount factor).
pub type PriceTable = HashMap<String, f64>;

/// Substring that marks a custom machine shape.
pub const CUSTOM_MARKER: &str = "custom";

/// First entry for `key` across `tables`, in order.
pub fn lookup_price(key: &str, tables: &[&PriceTable]) -> Option<f64> {
    tables.iter().find_map(|table| table.get(key).copied())
}

/// Like [`lookup_price`], falling back to `default` on a miss.
pub fn resolve_price(key: &str, tables: &[&PriceTable], default: f64) -> f64 {
    lookup_price(key, tables).unwrap_or(default)
}

/// Portion of the instance type before the first `-`.
pub fn instance_family(instance_type: &str) -> &str {
    instance_type.split('-').next().unwrap_or(instance_type)
}

pub fn is_custom(instance_type: &str) -> bool {
    instance_type.contains(CUSTOM_MARKER)
}
