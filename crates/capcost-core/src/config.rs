//! capcost.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::types::DEFAULT_GPU_LABEL;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CapcostConfig {
    pub utilization: UtilizationConfig,
    pub pricing: PricingConfig,
}

/// Options for node utilization accounting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UtilizationConfig {
    /// Subtract daemonset pod requests from allocatable instead of counting them.
    pub skip_daemonset_pods: bool,
    /// Subtract mirror pod requests from allocatable instead of counting them.
    pub skip_mirror_pods: bool,
    pub gpu_label: String,
}

impl Default for UtilizationConfig {
    fn default() -> Self {
        Self {
            skip_daemonset_pods: true,
            skip_mirror_pods: true,
            gpu_label: DEFAULT_GPU_LABEL.to_string(),
        }
    }
}

/// Options for price estimation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PricingConfig {
    /// Price catalog TOML; the bundled GCE catalog is used when unset.
    pub catalog: Option<PathBuf>,
    pub gpu_label: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            gpu_label: DEFAULT_GPU_LABEL.to_string(),
        }
    }
}

impl CapcostConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        // Relative catalog paths are resolved against the config file.
        if let Some(catalog) = &config.pricing.catalog
            && catalog.is_relative()
            && let Some(dir) = path.parent()
        {
            config.pricing.catalog = Some(dir.join(catalog));
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: CapcostConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.utilization.gpu_label.trim().is_empty() {
            return Err(CoreError::InvalidConfig("utilization.gpu_label must not be empty".into()));
        }
        if self.pricing.gpu_label.trim().is_empty() {
            return Err(CoreError::InvalidConfig("pricing.gpu_label must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CapcostConfig::default();
        assert!(config.utilization.skip_daemonset_pods);
        assert!(config.utilization.skip_mirror_pods);
        assert_eq!(config.utilization.gpu_label, DEFAULT_GPU_LABEL);
        assert!(config.pricing.catalog.is_none());
    }

    #[test]
    fn test_parse_empty() {
        let config = CapcostConfig::from_toml_str("").unwrap();
        assert_eq!(config, CapcostConfig::default());
    }

    #[test]
    fn test_parse_partial() {
        let toml_str = r#"
[utilization]
skip_mirror_pods = false
gpu_label = "example.com/accelerator"
"#;
        let config = CapcostConfig::from_toml_str(toml_str).unwrap();
        assert!(config.utilization.skip_daemonset_pods);
        assert!(!config.utilization.skip_mirror_pods);
        assert_eq!(config.utilization.gpu_label, "example.com/accelerator");
        assert_eq!(config.pricing.gpu_label, DEFAULT_GPU_LABEL);
    }

    #[test]
    fn test_rejects_empty_gpu_label() {
        let toml_str = r#"
[pricing]
gpu_label = ""
"#;
        assert!(CapcostConfig::from_toml_str(toml_str).is_err());
    }

    #[test]
    fn test_round_trip() {
        let config = CapcostConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("skip_daemonset_pods"));
        assert_eq!(CapcostConfig::from_toml_str(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_catalog_path_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capcost.toml");
        std::fs::write(&path, "[pricing]\ncatalog = \"prices/gce.toml\"\n").unwrap();

        let config = CapcostConfig::from_file(&path).unwrap();
        assert_eq!(config.pricing.catalog, Some(dir.path().join("prices/gce.toml")));
    }
}
