//! Domain models for data-structure analysis
//!
//! - Cell / NodeId: memory locations
//! - Node: abstract memory object payload
//! - Graph: node arena + location maps + unification
//! - GraphStore: per-function graph slots

pub mod cell;
pub mod graph;
pub mod graph_store;
pub mod node;

pub use cell::{Cell, NodeId};
pub use graph::{Graph, MAX_FIELD_OFFSET};
pub use graph_store::GraphStore;
pub use node::{Node, NodeFlags};
