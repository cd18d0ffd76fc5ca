//! Shared module - Common types
//!
//! The program model every feature reads. It has no dependency on any
//! feature module.

pub mod models;

// Re-exports for convenience
pub use models::*;
