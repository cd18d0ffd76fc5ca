//! Configuration I/O (YAML loading)
//!
//! A YAML file names a base preset and optionally overrides individual
//! fields:
//!
//! ```yaml
//! version: 1
//! preset: balanced
//! overrides:
//!   worklist_order: fifo
//!   info:
//!     print_details: true
//!     summary_size: 3
//! ```

use super::dsa_config::{DsaConfig, DsaInfoConfig, WorklistOrder};
use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current schema version
pub const CONFIG_VERSION: u32 = 1;

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: Option<u32>,

    /// Base preset
    pub preset: String,

    /// Fine-grained overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worklist_order: Option<WorklistOrder>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_fixpoint: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_all_call_sites: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<DsaInfoConfig>,
}

impl DsaConfig {
    /// Load and validate a configuration from YAML text
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        match export.version {
            None => return Err(ConfigError::MissingVersion),
            Some(CONFIG_VERSION) => {}
            Some(found) => {
                return Err(ConfigError::UnsupportedVersion {
                    found,
                    supported: vec![CONFIG_VERSION],
                })
            }
        }

        let preset: Preset = export.preset.parse()?;

        let mut config = Self::from_preset(preset);
        if let Some(overrides) = export.overrides {
            if let Some(order) = overrides.worklist_order {
                config.worklist_order = order;
            }
            if let Some(verify) = overrides.verify_fixpoint {
                config.verify_fixpoint = verify;
            }
            if let Some(seed_all) = overrides.seed_all_call_sites {
                config.seed_all_call_sites = seed_all;
            }
            if let Some(info) = overrides.info {
                config.info = info;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialize as a `custom` preset with every field overridden
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: Some(CONFIG_VERSION),
            preset: Preset::Custom.to_string(),
            overrides: Some(ConfigOverrides {
                worklist_order: Some(self.worklist_order),
                verify_fixpoint: Some(self.verify_fixpoint),
                seed_all_call_sites: Some(self.seed_all_call_sites),
                info: Some(self.info.clone()),
            }),
        };

        serde_yaml::to_string(&export).map_err(ConfigError::Yaml)
    }
}
