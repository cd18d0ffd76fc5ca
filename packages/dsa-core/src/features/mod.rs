//! Feature modules - Each feature follows Hexagonal Architecture
//!
//! Each feature contains:
//! - domain/     - Pure analysis state (graphs, cells)
//! - ports/      - Interface definitions (traits)
//! - application/ - Analyses
//! - infrastructure/ - Algorithms the analyses are built from

pub mod call_graph;
pub mod dsa;
