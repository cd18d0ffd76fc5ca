//! Call graph over a module with SCC decomposition
//!
//! Nodes are functions, edges are direct calls (caller -> callee).
//! Indirect calls and inline asm are recorded per function but add no edge.

use crate::shared::models::{FunctionId, Module, ValueId};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::FxHashSet;

/// One call instruction issued by a function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallRecord {
    /// The call instruction
    pub instruction: ValueId,

    /// Statically known callee, `None` for indirect calls and inline asm
    pub callee: Option<FunctionId>,
}

/// Call graph with precomputed SCCs
///
/// SCCs are stored in petgraph's Tarjan order: postorder, so every callee
/// SCC comes before the SCCs of its callers. Members of an SCC are sorted
/// by id.
#[derive(Debug, Clone)]
pub struct CallGraph {
    /// Function nodes + call edges (weight = call instruction)
    graph: DiGraph<FunctionId, ValueId>,

    /// FunctionId index -> node index
    nodes: Vec<NodeIndex>,

    /// FunctionId index -> calls issued, in program order
    calls: Vec<Vec<CallRecord>>,

    /// SCCs, callees first
    sccs: Vec<Vec<FunctionId>>,

    /// FunctionId index -> position in `sccs`
    scc_of: Vec<usize>,
}

impl CallGraph {
    /// Build the call graph of `module`
    pub fn new(module: &Module) -> Self {
        let mut graph = DiGraph::with_capacity(module.num_functions(), 0);
        let nodes: Vec<NodeIndex> = module.functions().map(|f| graph.add_node(f.id)).collect();

        let mut calls = vec![Vec::new(); module.num_functions()];
        for function in module.functions() {
            for inst in module.body(function.id) {
                if !inst.op.is_call() {
                    continue;
                }
                let callee = inst.called_function();
                calls[function.id.index()].push(CallRecord {
                    instruction: inst.id,
                    callee,
                });
                if let Some(callee) = callee {
                    graph.add_edge(nodes[function.id.index()], nodes[callee.index()], inst.id);
                }
            }
        }

        let mut sccs: Vec<Vec<FunctionId>> = tarjan_scc(&graph)
            .into_iter()
            .map(|component| component.into_iter().map(|n| graph[n]).collect())
            .collect();
        let mut scc_of = vec![0; module.num_functions()];
        for (i, members) in sccs.iter_mut().enumerate() {
            members.sort();
            for f in members.iter() {
                scc_of[f.index()] = i;
            }
        }

        tracing::debug!(
            functions = module.num_functions(),
            edges = graph.edge_count(),
            sccs = sccs.len(),
            "built call graph"
        );

        Self {
            graph,
            nodes,
            calls,
            sccs,
            scc_of,
        }
    }

    /// SCCs, callees first
    pub fn sccs(&self) -> &[Vec<FunctionId>] {
        &self.sccs
    }

    /// Index of the SCC containing `f`
    pub fn scc_index(&self, f: FunctionId) -> usize {
        self.scc_of[f.index()]
    }

    /// Members of the SCC containing `f`
    pub fn scc_members(&self, f: FunctionId) -> &[FunctionId] {
        &self.sccs[self.scc_of[f.index()]]
    }

    /// Whether two functions belong to the same SCC
    pub fn same_scc(&self, a: FunctionId, b: FunctionId) -> bool {
        self.scc_of[a.index()] == self.scc_of[b.index()]
    }

    /// Calls issued by `f`, in program order
    pub fn calls(&self, f: FunctionId) -> &[CallRecord] {
        &self.calls[f.index()]
    }

    /// Distinct direct callees of `f`
    pub fn callees(&self, f: FunctionId) -> Vec<FunctionId> {
        self.neighbors(f, Direction::Outgoing)
    }

    /// Distinct direct callers of `f`
    pub fn callers(&self, f: FunctionId) -> Vec<FunctionId> {
        self.neighbors(f, Direction::Incoming)
    }

    fn neighbors(&self, f: FunctionId, dir: Direction) -> Vec<FunctionId> {
        let mut seen = FxHashSet::default();
        let mut out: Vec<FunctionId> = self
            .graph
            .neighbors_directed(self.nodes[f.index()], dir)
            .map(|n| self.graph[n])
            .filter(|g| seen.insert(*g))
            .collect();
        out.sort();
        out
    }

    /// Whether the SCC at `index` contains a cycle (several members or a
    /// self call)
    pub fn is_recursive(&self, index: usize) -> bool {
        let members = &self.sccs[index];
        match members.as_slice() {
            [single] => self.graph.contains_edge(self.nodes[single.index()], self.nodes[single.index()]),
            _ => true,
        }
    }

    /// All call instructions of the module, grouped by caller in id order
    pub fn all_calls(&self) -> impl Iterator<Item = (FunctionId, &CallRecord)> {
        self.calls
            .iter()
            .enumerate()
            .flat_map(|(i, records)| records.iter().map(move |r| (FunctionId(i as u32), r)))
    }

    pub fn num_functions(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_call_edges(&self) -> usize {
        self.graph.edge_count()
    }
}
