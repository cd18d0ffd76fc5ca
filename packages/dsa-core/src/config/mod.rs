//! Configuration System
//!
//! Two levels:
//! - Preset: one-liner defaults (`DsaConfig::from_preset(Preset::Fast)`)
//! - YAML: a preset plus per-field overrides (`DsaConfig::from_yaml_file`)
//!
//! # Examples
//!
//! ```rust
//! use dsa_core::config::{DsaConfig, Preset, WorklistOrder};
//!
//! let config = DsaConfig::from_preset(Preset::Balanced)
//!     .worklist_order(WorklistOrder::Fifo);
//! assert!(config.validate().is_ok());
//! ```

pub mod dsa_config;
pub mod error;
pub mod io;
pub mod preset;

// Re-exports
pub use dsa_config::{DsaConfig, DsaInfoConfig, WorklistOrder};
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, ConfigOverrides, CONFIG_VERSION};
pub use preset::Preset;
