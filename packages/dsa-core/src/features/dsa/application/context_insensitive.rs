//! Context-insensitive global analysis
//!
//! One graph for the whole module. SCCs are visited callees first; the
//! local graphs of an SCC are imported before any of its call sites is
//! resolved, so mutually recursive functions settle in a single pass.

use crate::errors::DsaResult;
use crate::features::call_graph::{CallGraph, DsaCallSite};
use crate::features::dsa::application::local::LocalAnalysis;
use crate::features::dsa::domain::Graph;
use crate::features::dsa::infrastructure::resolve_arguments;
use crate::features::dsa::ports::{GlobalAnalysis, GlobalGraphs, LocalGraphBuilder};
use crate::shared::models::{FunctionId, Module};
use rustc_hash::FxHashSet;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct ContextInsensitiveStats {
    pub functions: usize,
    pub resolved_call_sites: usize,
    pub skipped_call_sites: usize,
    pub nodes: usize,
    pub duration_ms: f64,
}

/// The shared graph and the functions that were imported into it
#[derive(Debug, Clone, Default)]
pub struct ContextInsensitiveResult {
    graph: Graph,
    functions: FxHashSet<FunctionId>,
    pub stats: ContextInsensitiveStats,
}

impl ContextInsensitiveResult {
    /// The one graph shared by every function
    pub fn graph(&self) -> &Graph {
        &self.graph
    }
}

impl GlobalGraphs for ContextInsensitiveResult {
    /// The shared graph, whether or not `f` was imported into it
    fn get_graph(&self, _f: FunctionId) -> DsaResult<&Graph> {
        Ok(&self.graph)
    }

    fn has_graph(&self, f: FunctionId) -> bool {
        self.functions.contains(&f)
    }

    fn graph_id(&self, f: FunctionId) -> Option<usize> {
        self.has_graph(f).then_some(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextInsensitiveAnalysis<L: LocalGraphBuilder = LocalAnalysis> {
    local: L,
}

impl ContextInsensitiveAnalysis<LocalAnalysis> {
    pub fn new() -> Self {
        Self {
            local: LocalAnalysis::new(),
        }
    }
}

impl<L: LocalGraphBuilder> ContextInsensitiveAnalysis<L> {
    pub fn with_local(local: L) -> Self {
        Self { local }
    }
}

impl<L: LocalGraphBuilder> GlobalAnalysis for ContextInsensitiveAnalysis<L> {
    type Output = ContextInsensitiveResult;

    fn name(&self) -> &'static str {
        "context-insensitive dsa"
    }

    fn run_on_module(&mut self, module: &Module, call_graph: &CallGraph) -> DsaResult<Self::Output> {
        let start = Instant::now();
        tracing::info!(module = module.name(), "starting {}", self.name());

        let mut graph = Graph::new();
        let mut functions = FxHashSet::default();
        let mut stats = ContextInsensitiveStats::default();

        for scc in call_graph.sccs() {
            for &f in scc {
                if !module.function(f).has_body() {
                    continue;
                }
                let local = self.local.build(module, f)?;
                graph.import(&local);
                functions.insert(f);
            }

            for &f in scc {
                for record in call_graph.calls(f) {
                    let cs = DsaCallSite::new(module, record.instruction)?;
                    if !cs.is_resolvable() {
                        tracing::debug!(call = %module.value_name(cs.instruction()), "skipping unresolved call");
                        stats.skipped_call_sites += 1;
                        continue;
                    }
                    resolve_arguments(&cs, &mut graph);
                    stats.resolved_call_sites += 1;
                }
            }
            graph.compress();
        }

        stats.functions = functions.len();
        stats.nodes = graph.num_nodes();
        stats.duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            functions = stats.functions,
            nodes = stats.nodes,
            resolved = stats.resolved_call_sites,
            duration_ms = stats.duration_ms,
            "finished {}",
            self.name()
        );

        Ok(ContextInsensitiveResult {
            graph,
            functions,
            stats,
        })
    }
}
