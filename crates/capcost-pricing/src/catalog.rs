//! Price catalog: the read-only lookup tables behind every estimate.
//!
//! Tables are keyed by instance family (`n1`, `e2`, ...), full instance
//! type (`n1-standard-4`) or GPU type (`nvidia-tesla-t4`). A catalog is
//! never mutated once built; share it with `Arc` across threads.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PricingError, PricingResult};
use crate::resolve::PriceTable;

const GCE_CATALOG: &str = include_str!("../catalogs/gce.toml");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PriceCatalog {
    /// Flat price per core-hour when no family entry exists.
    pub base_cpu_price_per_hour: f64,
    /// Flat price per GiB-hour when no family entry exists.
    pub base_memory_price_per_hour_per_gib: f64,
    /// Flat price per GPU-hour when the GPU type is unknown.
    pub base_gpu_price_per_hour: f64,
    /// Preemptible/on-demand ratio for families without their own entry.
    pub preemptible_discount: f64,

    pub predefined_cpu_prices: PriceTable,
    pub custom_cpu_prices: PriceTable,
    pub predefined_memory_prices: PriceTable,
    pub custom_memory_prices: PriceTable,

    pub instance_prices: PriceTable,
    pub preemptible_instance_prices: PriceTable,

    pub gpu_prices: PriceTable,
    pub preemptible_gpu_prices: PriceTable,

    pub predefined_preemptible_discount: PriceTable,
    pub custom_preemptible_discount: PriceTable,
}

impl Default for PriceCatalog {
    fn default() -> Self {
        Self {
            base_cpu_price_per_hour: 0.0,
            base_memory_price_per_hour_per_gib: 0.0,
            base_gpu_price_per_hour: 0.0,
            preemptible_discount: 1.0,
            predefined_cpu_prices: PriceTable::new(),
            custom_cpu_prices: PriceTable::new(),
            predefined_memory_prices: PriceTable::new(),
            custom_memory_prices: PriceTable::new(),
            instance_prices: PriceTable::new(),
            preemptible_instance_prices: PriceTable::new(),
            gpu_prices: PriceTable::new(),
            preemptible_gpu_prices: PriceTable::new(),
            predefined_preemptible_discount: PriceTable::new(),
            custom_preemptible_discount: PriceTable::new(),
        }
    }
}

impl PriceCatalog {
    /// The bundled GCE list prices.
    pub fn gce_default() -> PricingResult<Self> {
        Self::from_toml_str(GCE_CATALOG)
    }

    pub fn from_file(path: &Path) -> PricingResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> PricingResult<Self> {
        let catalog: PriceCatalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check that every price is finite and non-negative and every
    /// discount lies in `[0, 1]`.
    pub fn validate(&self) -> PricingResult<()> {
        let flat = [
            ("base_cpu_price_per_hour", self.base_cpu_price_per_hour),
            ("base_memory_price_per_hour_per_gib", self.base_memory_price_per_hour_per_gib),
            ("base_gpu_price_per_hour", self.base_gpu_price_per_hour),
        ];
        for (name, value) in flat {
            check_price(name, value)?;
        }
        check_discount("preemptible_discount", self.preemptible_discount)?;

        let tables = [
            ("predefined_cpu_prices", &self.predefined_cpu_prices),
            ("custom_cpu_prices", &self.custom_cpu_prices),
            ("predefined_memory_prices", &self.predefined_memory_prices),
            ("custom_memory_prices", &self.custom_memory_prices),
            ("instance_prices", &self.instance_prices),
            ("preemptible_instance_prices", &self.preemptible_instance_prices),
            ("gpu_prices", &self.gpu_prices),
            ("preemptible_gpu_prices", &self.preemptible_gpu_prices),
        ];
        for (name, table) in tables {
            for (key, value) in table {
                check_price(&format!("{name}.{key}"), *value)?;
            }
        }

        let discounts = [
            ("predefined_preemptible_discount", &self.predefined_preemptible_discount),
            ("custom_preemptible_discount", &self.custom_preemptible_discount),
        ];
        for (name, table) in discounts {
            for (key, value) in table {
                check_discount(&format!("{name}.{key}"), *value)?;
            }
        }
        Ok(())
    }

    pub fn cpu_prices(&self, custom: bool) -> &PriceTable {
        if custom { &self.custom_cpu_prices } else { &self.predefined_cpu_prices }
    }

    pub fn memory_prices(&self, custom: bool) -> &PriceTable {
        if custom { &self.custom_memory_prices } else { &self.predefined_memory_prices }
    }

    pub fn instance_price_table(&self, preemptible: bool) -> &PriceTable {
        if preemptible { &self.preemptible_instance_prices } else { &self.instance_prices }
    }

    pub fn gpu_price_table(&self, preemptible: bool) -> &PriceTable {
        if preemptible { &self.preemptible_gpu_prices } else { &self.gpu_prices }
    }

    pub fn preemptible_discounts(&self, custom: bool) -> &PriceTable {
        if custom {
            &self.custom_preemptible_discount
        } else {
            &self.predefined_preemptible_discount
        }
    }
}

fn check_price(name: &str, value: f64) -> PricingResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PricingError::InvalidCatalog(format!(
            "{name} must be a non-negative price, got {value}"
        )));
    }
    Ok(())
}

fn check_discount(name: &str, value: f64) -> PricingResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(PricingError::InvalidCatalog(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}
