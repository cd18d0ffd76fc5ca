//! Global analysis configuration
//!
//! Knobs for the context-sensitive worklist, the post-condition check and
//! the node-statistics report. The context-insensitive analysis has no
//! tunables beyond these.

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use serde::{Deserialize, Serialize};

/// Order in which pending call sites are popped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorklistOrder {
    /// Stack: most recently queued call site first
    Lifo,

    /// Queue: oldest queued call site first
    Fifo,
}

impl Default for WorklistOrder {
    fn default() -> Self {
        WorklistOrder::Lifo
    }
}

/// Node-statistics report settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsaInfoConfig {
    /// Print one line per accessed node (not only the summary)
    pub print_details: bool,

    /// Number of most-accessed nodes in the summary
    pub summary_size: usize,
}

impl DsaInfoConfig {
    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.summary_size == 0 || self.summary_size > 100 {
            return Err(ConfigError::range_with_hint(
                "info.summary_size",
                self.summary_size,
                1,
                100,
                "Summary must list at least one node",
            ));
        }
        Ok(())
    }
}

impl Default for DsaInfoConfig {
    fn default() -> Self {
        Self {
            print_details: false,
            summary_size: 5,
        }
    }
}

/// Configuration for the global (interprocedural) analyses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsaConfig {
    /// Worklist discipline for the top-down/bottom-up fixpoint
    pub worklist_order: WorklistOrder,

    /// Re-scan every call site after the fixpoint and report the ones
    /// that still require propagation
    pub verify_fixpoint: bool,

    /// Seed the worklist with every resolvable call site instead of only
    /// the ones whose bottom-up mapping is not injective
    pub seed_all_call_sites: bool,

    /// Node-statistics report
    pub info: DsaInfoConfig,
}

impl DsaConfig {
    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        self.info.validate()
    }

    /// Builder: Set worklist_order
    pub fn worklist_order(mut self, v: WorklistOrder) -> Self {
        self.worklist_order = v;
        self
    }

    /// Builder: Set verify_fixpoint
    pub fn verify_fixpoint(mut self, v: bool) -> Self {
        self.verify_fixpoint = v;
        self
    }

    /// Builder: Set seed_all_call_sites
    pub fn seed_all_call_sites(mut self, v: bool) -> Self {
        self.seed_all_call_sites = v;
        self
    }

    /// Builder: Set info.print_details
    pub fn print_details(mut self, v: bool) -> Self {
        self.info.print_details = v;
        self
    }

    /// Builder: Set info.summary_size
    pub fn summary_size(mut self, v: usize) -> Self {
        self.info.summary_size = v;
        self
    }

    /// Get preset configuration
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                worklist_order: WorklistOrder::Lifo,
                verify_fixpoint: false,
                seed_all_call_sites: false,
                info: DsaInfoConfig::default(),
            },
            Preset::Balanced | Preset::Custom => Self {
                worklist_order: WorklistOrder::Lifo,
                verify_fixpoint: true,
                seed_all_call_sites: false,
                info: DsaInfoConfig::default(),
            },
            Preset::Thorough => Self {
                worklist_order: WorklistOrder::Lifo,
                verify_fixpoint: true,
                seed_all_call_sites: true,
                info: DsaInfoConfig {
                    print_details: true,
                    summary_size: 10,
                },
            },
        }
    }
}

impl Default for DsaConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}
