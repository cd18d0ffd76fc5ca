//! Common test utilities for dsa-core
//!
//! Shared program fixtures and graph assertions for the integration tests.

#![allow(dead_code)]

mod assertions;
mod fixtures;

// Re-export all utilities
pub use assertions::*;
pub use fixtures::*;
