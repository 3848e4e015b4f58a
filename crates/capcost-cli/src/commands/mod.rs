pub mod price;
pub mod utilization;

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use tracing::debug;

use capcost_core::CapcostConfig;
use capcost_pricing::{CatalogPriceModel, PriceCatalog};

/// Load `capcost.toml`, or defaults when no path is given.
pub fn load_config(path: Option<&str>) -> Result<CapcostConfig> {
    match path {
        Some(path) => CapcostConfig::from_file(Path::new(path))
            .with_context(|| format!("failed to load config {path}")),
        None => Ok(CapcostConfig::default()),
    }
}

/// Build a price model from the catalog named on the command line, the
/// config file, or the bundled GCE catalog, in that order.
pub fn load_price_model(config: &CapcostConfig, catalog_override: Option<&str>) -> Result<CatalogPriceModel> {
    let catalog_path = catalog_override
        .map(Path::new)
        .or(config.pricing.catalog.as_deref());

    let catalog = match catalog_path {
        Some(path) => {
            debug!(catalog = %path.display(), "loading price catalog");
            PriceCatalog::from_file(path)
                .with_context(|| format!("failed to load price catalog {}", path.display()))?
        }
        None => PriceCatalog::gce_default()?,
    };
    Ok(CatalogPriceModel::new(catalog).with_gpu_label(config.pricing.gpu_label.clone()))
}

pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let content = std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {path}"))
}

/// Parse a duration string like "30s", "90m", "2h" or bare seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let (digits, unit_secs) = if let Some(secs) = s.strip_suffix('s') {
        (secs, 1)
    } else if let Some(mins) = s.strip_suffix('m') {
        (mins, 60)
    } else if let Some(hours) = s.strip_suffix('h') {
        (hours, 3600)
    } else {
        (s, 1)
    };
    let Ok(value) = digits.parse::<u64>() else {
        bail!("invalid duration {s:?}: expected e.g. 30s, 90m, 2h");
    };
    Ok(Duration::from_secs(value.saturating_mul(unit_secs)))
}

/// Billing window of the given length, anchored at the Unix epoch.
pub fn billing_window(duration: &str) -> Result<(SystemTime, SystemTime)> {
    let start = UNIX_EPOCH;
    let end = start
        .checked_add(parse_duration(duration)?)
        .with_context(|| format!("duration {duration:?} is out of range"))?;
    Ok((start, end))
}

/// `now` as a Unix timestamp, or the current time.
pub fn evaluation_time(now: Option<u64>) -> Result<SystemTime> {
    match now {
        Some(secs) => UNIX_EPOCH
            .checked_add(Duration::from_secs(secs))
            .with_context(|| format!("timestamp {secs} is out of range")),
        None => Ok(SystemTime::now()),
    }
}
