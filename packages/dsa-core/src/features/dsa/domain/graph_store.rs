//! Per-function graph slots
//!
//! Functions of one call-graph SCC share a slot, so one graph object stands
//! for all of them. Distinct slots can be borrowed together (one shared,
//! one mutable) for cross-graph cloning.

use super::graph::Graph;
use crate::errors::{DsaError, DsaResult};
use crate::shared::models::{FunctionId, Module};

#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    graphs: Vec<Graph>,

    /// FunctionId index -> slot
    slot_of: Vec<Option<usize>>,

    /// FunctionId index -> name (for error messages)
    names: Vec<String>,
}

impl GraphStore {
    pub fn new(module: &Module) -> Self {
        Self {
            graphs: Vec::new(),
            slot_of: vec![None; module.num_functions()],
            names: module.functions().map(|f| f.name.clone()).collect(),
        }
    }

    /// New empty graph shared by `members`
    pub fn add_slot(&mut self, members: &[FunctionId]) -> usize {
        let slot = self.graphs.len();
        self.graphs.push(Graph::new());
        for f in members {
            self.slot_of[f.index()] = Some(slot);
        }
        slot
    }

    pub fn slot(&self, f: FunctionId) -> Option<usize> {
        self.slot_of.get(f.index()).copied().flatten()
    }

    /// Slot of `f`; a function without one is an invariant violation
    pub fn require_slot(&self, f: FunctionId) -> DsaResult<usize> {
        self.slot(f).ok_or_else(|| DsaError::missing_graph(self.name(f)))
    }

    pub fn has_graph(&self, f: FunctionId) -> bool {
        self.slot(f).is_some()
    }

    pub fn get(&self, f: FunctionId) -> Option<&Graph> {
        self.slot(f).map(|s| &self.graphs[s])
    }

    pub fn require(&self, f: FunctionId) -> DsaResult<&Graph> {
        Ok(&self.graphs[self.require_slot(f)?])
    }

    pub fn at(&self, slot: usize) -> &Graph {
        &self.graphs[slot]
    }

    pub fn at_mut(&mut self, slot: usize) -> &mut Graph {
        &mut self.graphs[slot]
    }

    /// `read` shared and `write` mutable; the slots must differ
    pub fn pair(&mut self, read: usize, write: usize) -> (&Graph, &mut Graph) {
        debug_assert_ne!(read, write);
        if read < write {
            let (lo, hi) = self.graphs.split_at_mut(write);
            (&lo[read], &mut hi[0])
        } else {
            let (lo, hi) = self.graphs.split_at_mut(read);
            (&hi[0], &mut lo[write])
        }
    }

    pub fn num_graphs(&self) -> usize {
        self.graphs.len()
    }

    pub fn graphs(&self) -> &[Graph] {
        &self.graphs
    }

    fn name(&self, f: FunctionId) -> String {
        self.names
            .get(f.index())
            .cloned()
            .unwrap_or_else(|| f.to_string())
    }
}
