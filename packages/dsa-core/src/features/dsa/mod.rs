//! # Data-Structure Analysis
//!
//! Unification-based, field-sensitive points-to analysis with explicit
//! graphs per function. Two global engines share the domain and the
//! cloning machinery:
//! - **Context-insensitive**: every function is imported into one graph and
//!   call sites are resolved by unifying actuals with formals.
//! - **Context-sensitive**: a bottom-up pass builds per-SCC summaries, then a
//!   worklist propagates callee/caller information across call sites until
//!   every resolvable call site has an injective simulation.
//!
//! ## References
//! - Lattner, Lenharth & Adve "Making Context-Sensitive Points-to Analysis
//!   with Heap Cloning Practical For The Real World" (PLDI 2007)
//! - Gurfinkel & Navas "A Context-Sensitive Memory Model for Verification
//!   of C/C++ Programs" (SAS 2017)
//!
//! ## Usage
//! ```text
//! use dsa_core::{CallGraph, ContextSensitiveAnalysis, DsaConfig, GlobalAnalysis, GlobalGraphs};
//!
//! let cg = CallGraph::new(&module);
//! let out = ContextSensitiveAnalysis::new(DsaConfig::default()).run_on_module(&module, &cg)?;
//! let g = out.get_graph(main)?;
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{
    BottomUpAnalysis, ContextInsensitiveAnalysis, ContextInsensitiveResult,
    ContextSensitiveAnalysis, ContextSensitiveResult, DsaInfo, LocalAnalysis, PropagationFailure,
    PropagationKind,
};
pub use domain::{Cell, Graph, GraphStore, Node, NodeFlags, NodeId};
pub use ports::{GlobalAnalysis, GlobalGraphs, LocalGraphBuilder};
// Re-export infrastructure (internal use - prefer application layer)
#[doc(hidden)]
pub use infrastructure::{Cloner, SimulationMapper, Worklist};
