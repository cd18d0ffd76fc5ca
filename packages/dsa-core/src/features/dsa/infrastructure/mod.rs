//! Infrastructure for the global analyses
//!
//! - cloner: cross-graph subgraph copies and call-site resolution
//! - simulation_mapper: callee-to-caller graph homomorphism
//! - worklist: pending call sites

pub mod cloner;
pub mod simulation_mapper;
pub mod worklist;

pub use cloner::{clone_callee_into_caller, clone_caller_into_callee, resolve_arguments, Cloner};
pub use simulation_mapper::SimulationMapper;
pub use worklist::Worklist;
