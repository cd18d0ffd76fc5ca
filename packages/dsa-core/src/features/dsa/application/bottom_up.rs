//! Bottom-up analysis
//!
//! Visits call-graph SCCs callees first. Members of an SCC share one graph:
//! their local graphs are built into it, calls between members are
//! resolved by unification, and calls into already-finished SCCs clone the
//! callee's interface into the shared graph. Once an SCC is finished, the
//! simulation mapping of each call site it issues is recorded for the
//! context-sensitive pass.

use crate::errors::DsaResult;
use crate::features::call_graph::{CallGraph, DsaCallSite};
use crate::features::dsa::application::local::LocalAnalysis;
use crate::features::dsa::domain::GraphStore;
use crate::features::dsa::infrastructure::{
    clone_callee_into_caller, resolve_arguments, SimulationMapper,
};
use crate::features::dsa::ports::LocalGraphBuilder;
use crate::shared::models::{Module, ValueId};
use rustc_hash::FxHashMap;
use std::time::Instant;

/// Bottom-up statistics
#[derive(Debug, Clone, Default)]
pub struct BottomUpStats {
    pub sccs: usize,
    pub local_graphs: usize,
    /// Call sites resolved by cloning the callee summary
    pub cloned_call_sites: usize,
    /// Call sites resolved inside a shared SCC graph
    pub scc_call_sites: usize,
    /// Indirect, inline-asm and declaration call sites
    pub skipped_call_sites: usize,
    pub duration_ms: f64,
}

/// Graphs and per-call-site simulations after the bottom-up pass
#[derive(Debug, Clone)]
pub struct BottomUpResult {
    pub graphs: GraphStore,

    /// Resolvable call site -> simulation from callee into caller
    pub mappings: FxHashMap<ValueId, Option<SimulationMapper>>,

    pub stats: BottomUpStats,
}

/// Bottom-up pass over a module, generic over the local graph builder
#[derive(Debug, Clone, Default)]
pub struct BottomUpAnalysis<L: LocalGraphBuilder = LocalAnalysis> {
    local: L,
}

impl BottomUpAnalysis<LocalAnalysis> {
    pub fn new() -> Self {
        Self {
            local: LocalAnalysis::new(),
        }
    }
}

impl<L: LocalGraphBuilder> BottomUpAnalysis<L> {
    pub fn with_local(local: L) -> Self {
        Self { local }
    }

    pub fn run(&self, module: &Module, call_graph: &CallGraph) -> DsaResult<BottomUpResult> {
        let start = Instant::now();
        let mut graphs = GraphStore::new(module);
        let mut mappings = FxHashMap::default();
        let mut stats = BottomUpStats::default();

        for scc in call_graph.sccs() {
            stats.sccs += 1;
            let slot = graphs.add_slot(scc);

            for &f in scc {
                if module.function(f).has_body() {
                    self.local.build_into(module, f, graphs.at_mut(slot))?;
                    stats.local_graphs += 1;
                }
            }

            let mut resolvable = Vec::new();
            for &f in scc {
                for record in call_graph.calls(f) {
                    let cs = DsaCallSite::new(module, record.instruction)?;
                    let Some(callee) = cs.callee().filter(|_| cs.is_resolvable()) else {
                        stats.skipped_call_sites += 1;
                        continue;
                    };

                    let callee_slot = graphs.require_slot(callee)?;
                    if callee_slot == slot {
                        resolve_arguments(&cs, graphs.at_mut(slot));
                        stats.scc_call_sites += 1;
                    } else {
                        let (callee_g, caller_g) = graphs.pair(callee_slot, slot);
                        clone_callee_into_caller(&cs, callee_g, caller_g);
                        stats.cloned_call_sites += 1;
                    }
                    resolvable.push((cs, callee));
                }
            }
            graphs.at_mut(slot).compress();

            for (cs, callee) in resolvable {
                let callee_g = graphs.require(callee)?;
                let caller_g = graphs.at(slot);
                let sm = SimulationMapper::for_call_site(&cs, callee_g, caller_g);
                mappings.insert(cs.instruction(), sm);
            }
        }

        stats.duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(
            sccs = stats.sccs,
            cloned = stats.cloned_call_sites,
            in_scc = stats.scc_call_sites,
            skipped = stats.skipped_call_sites,
            "bottom-up pass finished"
        );

        Ok(BottomUpResult {
            graphs,
            mappings,
            stats,
        })
    }
}
