//! Call graph and call sites
//!
//! Collaborators of the global analyses: SCC-ordered traversal of the
//! direct call graph and a per-instruction call-site view.

pub mod call_graph;
pub mod call_site;

pub use call_graph::{CallGraph, CallRecord};
pub use call_site::DsaCallSite;
