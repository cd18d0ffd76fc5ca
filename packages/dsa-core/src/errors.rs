//! Error types for dsa-core
//!
//! Every variant except `Config` is an invariant violation: a caller asked
//! for something an earlier phase should have established. They are
//! propagated with `?` and abort the analysis run. Fixpoint inconsistencies
//! are not errors; they are reported as data by the context-sensitive pass.

use crate::config::ConfigError;
use crate::shared::models::{FunctionId, ValueId};
use thiserror::Error;

/// Main error type for dsa-core operations
#[derive(Debug, Error)]
pub enum DsaError {
    /// `get_cell` on a location the graph has no cell for
    #[error("no cell for location {0}")]
    MissingCell(ValueId),

    /// `get_ret_cell` on a function without a return cell
    #[error("no return cell for function {0}")]
    MissingReturnCell(FunctionId),

    /// A call-site function is absent from the per-function graph map
    #[error("no graph for function '{0}'")]
    MissingGraph(String),

    /// Function id out of range for the module
    #[error("unknown function {0}")]
    UnknownFunction(FunctionId),

    /// Value id out of range for the module
    #[error("unknown value {0}")]
    UnknownValue(ValueId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DsaError {
    /// Create a missing-graph error for a function name
    pub fn missing_graph(name: impl Into<String>) -> Self {
        DsaError::MissingGraph(name.into())
    }

    /// Whether this error is a violated precondition (as opposed to bad input)
    pub fn is_invariant_violation(&self) -> bool {
        !matches!(self, DsaError::Config(_))
    }
}

/// Result type alias for dsa operations
pub type DsaResult<T> = std::result::Result<T, DsaError>;
