//! Ports (Interfaces) for data-structure analysis
//!
//! - `LocalGraphBuilder`: single-function graph construction
//! - `GlobalAnalysis`: whole-module engines
//! - `GlobalGraphs`: what clients query after a run
//!
//! # Example (Generic - Zero-cost)
//! ```ignore
//! fn run<A: GlobalAnalysis>(analysis: &mut A, m: &Module, cg: &CallGraph) -> DsaResult<bool> {
//!     let out = analysis.run_on_module(m, cg)?;
//!     Ok(out.has_graph(FunctionId(0)))
//! }
//! ```

use crate::errors::DsaResult;
use crate::features::call_graph::CallGraph;
use crate::features::dsa::domain::Graph;
use crate::shared::models::{FunctionId, Module};

/// Builds the intraprocedural graph of one function
pub trait LocalGraphBuilder {
    /// Add the local structure of `f` to `graph`
    fn build_into(&self, module: &Module, f: FunctionId, graph: &mut Graph) -> DsaResult<()>;

    /// Local graph of `f` on its own
    fn build(&self, module: &Module, f: FunctionId) -> DsaResult<Graph> {
        let mut graph = Graph::new();
        self.build_into(module, f, &mut graph)?;
        graph.compress();
        Ok(graph)
    }
}

/// Per-function graphs produced by a global analysis
pub trait GlobalGraphs {
    /// Graph of `f`. The per-function engine fails for a function without
    /// one; the single-graph engine hands out its shared graph
    fn get_graph(&self, f: FunctionId) -> DsaResult<&Graph>;

    fn has_graph(&self, f: FunctionId) -> bool;

    /// Identity of the graph object of `f`: functions sharing a graph share
    /// the id
    fn graph_id(&self, f: FunctionId) -> Option<usize>;

    /// Whether the analysis changed the program (never)
    fn modified(&self) -> bool {
        false
    }
}

/// Whole-module points-to analysis
pub trait GlobalAnalysis {
    type Output: GlobalGraphs;

    /// Analysis name (for logs)
    fn name(&self) -> &'static str;

    fn run_on_module(&mut self, module: &Module, call_graph: &CallGraph) -> DsaResult<Self::Output>;
}
