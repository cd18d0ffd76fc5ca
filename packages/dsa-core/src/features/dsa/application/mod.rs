//! Application layer for data-structure analysis
//!
//! - **LocalAnalysis**: flow-insensitive graph of one function
//! - **BottomUpAnalysis**: SCC-ordered summaries cloned into callers
//! - **ContextInsensitiveAnalysis**: one graph for the whole module
//! - **ContextSensitiveAnalysis**: bottom-up plus top-down/bottom-up fixpoint
//! - **DsaInfo**: node access report over either engine's output

pub mod bottom_up;
pub mod context_insensitive;
pub mod context_sensitive;
pub mod dsa_info;
pub mod local;

pub use bottom_up::{BottomUpAnalysis, BottomUpResult, BottomUpStats};
pub use context_insensitive::{
    ContextInsensitiveAnalysis, ContextInsensitiveResult, ContextInsensitiveStats,
};
pub use context_sensitive::{
    decide_from_mapping, decide_propagation, ContextSensitiveAnalysis, ContextSensitiveResult,
    ContextSensitiveStats, PropagationFailure, PropagationKind,
};
pub use dsa_info::{AllocSiteInfo, DsaInfo, NodeInfo};
pub use local::LocalAnalysis;
