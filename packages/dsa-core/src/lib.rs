/*
 * dsa-core - Interprocedural Data-Structure Analysis
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Program model (Module, Function, Op)
 * - features/    : call_graph, dsa (domain/ports/application/infrastructure)
 * - config/      : Presets, validation, YAML
 */

#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional

/// Program model
pub mod shared;

/// Feature modules
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{DsaConfig, DsaInfoConfig, Preset, WorklistOrder};
pub use errors::{DsaError, DsaResult};
pub use features::call_graph::{CallGraph, DsaCallSite};
pub use features::dsa::{
    BottomUpAnalysis, Cell, ContextInsensitiveAnalysis, ContextInsensitiveResult,
    ContextSensitiveAnalysis, ContextSensitiveResult, DsaInfo, GlobalAnalysis, GlobalGraphs,
    Graph, LocalAnalysis, LocalGraphBuilder, NodeId, PropagationFailure, PropagationKind,
};
pub use shared::models::{FunctionId, Module, Op, ValueId};
