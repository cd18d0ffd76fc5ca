//! Context-sensitive global analysis
//!
//! Every function owns a graph (SCC members share one). The bottom-up pass
//! builds them and records a simulation per call site; a worklist then
//! propagates across call sites until every caller/callee pair is
//! consistent:
//!
//! - no simulation, or one that is not a function: **up**, clone the
//!   callee's interface into the caller;
//! - a function that is not injective: **down**, clone the caller's
//!   interface into the callee;
//! - otherwise nothing to do.
//!
//! After a propagation every call site that uses or is issued by the
//! changed graph's SCC is queued again.

use crate::config::DsaConfig;
use crate::errors::DsaResult;
use crate::features::call_graph::{CallGraph, DsaCallSite};
use crate::features::dsa::application::bottom_up::{BottomUpAnalysis, BottomUpResult, BottomUpStats};
use crate::features::dsa::application::local::LocalAnalysis;
use crate::features::dsa::domain::{Graph, GraphStore};
use crate::features::dsa::infrastructure::{
    clone_callee_into_caller, clone_caller_into_callee, resolve_arguments, SimulationMapper,
    Worklist,
};
use crate::features::dsa::ports::{GlobalAnalysis, GlobalGraphs, LocalGraphBuilder};
use crate::shared::models::{FunctionId, Module, ValueId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Instant;

/// Direction a call site must be propagated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropagationKind {
    /// Caller into callee
    Down,
    /// Callee into caller
    Up,
    /// Consistent
    None,
}

impl fmt::Display for PropagationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropagationKind::Down => write!(f, "DOWN"),
            PropagationKind::Up => write!(f, "UP"),
            PropagationKind::None => write!(f, "NONE"),
        }
    }
}

/// Decision for a precomputed simulation
pub fn decide_from_mapping(sm: Option<&SimulationMapper>) -> PropagationKind {
    match sm {
        None => PropagationKind::Up,
        Some(sm) if !sm.is_function() => PropagationKind::Up,
        Some(sm) if !sm.is_injective() => PropagationKind::Down,
        Some(_) => PropagationKind::None,
    }
}

/// Decide how `cs` must be propagated between its two graphs
pub fn decide_propagation(cs: &DsaCallSite, callee_g: &Graph, caller_g: &Graph) -> PropagationKind {
    let sm = SimulationMapper::for_call_site(cs, callee_g, caller_g);
    decide_from_mapping(sm.as_ref())
}

/// A call site still requiring propagation after the fixpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationFailure {
    /// Caller function name
    pub caller: String,
    /// Call instruction name
    pub instruction: String,
    pub kind: PropagationKind,
}

impl fmt::Display for PropagationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} needs {}", self.caller, self.instruction, self.kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextSensitiveStats {
    /// Call sites queued from the bottom-up mappings
    pub seeded: usize,
    /// Worklist pops
    pub pops: usize,
    /// Caller-into-callee propagations
    pub td_propagations: usize,
    /// Callee-into-caller propagations
    pub bu_propagations: usize,
    /// Propagations after which the same direction was still required
    pub repeated: usize,
    pub bottom_up: BottomUpStats,
    pub duration_ms: f64,
}

/// Per-function graphs after the fixpoint
#[derive(Debug, Clone)]
pub struct ContextSensitiveResult {
    graphs: GraphStore,
    /// Post-condition violations (empty unless something is wrong)
    pub failures: Vec<PropagationFailure>,
    pub stats: ContextSensitiveStats,
}

impl ContextSensitiveResult {
    pub fn graphs(&self) -> &GraphStore {
        &self.graphs
    }

    /// Whether the post-condition check found no inconsistent call site
    pub fn is_consistent(&self) -> bool {
        self.failures.is_empty()
    }
}

impl GlobalGraphs for ContextSensitiveResult {
    fn get_graph(&self, f: FunctionId) -> DsaResult<&Graph> {
        self.graphs.require(f)
    }

    fn has_graph(&self, f: FunctionId) -> bool {
        self.graphs.has_graph(f)
    }

    fn graph_id(&self, f: FunctionId) -> Option<usize> {
        self.graphs.slot(f)
    }
}

/// Call sites that use (as callee) or are issued by an SCC, shared by all
/// of its members
#[derive(Debug, Clone, Default)]
struct UseDef {
    uses: BTreeSet<ValueId>,
    defs: BTreeSet<ValueId>,
}

#[derive(Debug, Clone, Default)]
pub struct ContextSensitiveAnalysis<L: LocalGraphBuilder = LocalAnalysis> {
    config: DsaConfig,
    bottom_up: BottomUpAnalysis<L>,
}

impl ContextSensitiveAnalysis<LocalAnalysis> {
    pub fn new(config: DsaConfig) -> Self {
        Self {
            config,
            bottom_up: BottomUpAnalysis::new(),
        }
    }
}

impl<L: LocalGraphBuilder> ContextSensitiveAnalysis<L> {
    pub fn with_local(config: DsaConfig, local: L) -> Self {
        Self {
            config,
            bottom_up: BottomUpAnalysis::with_local(local),
        }
    }

    pub fn config(&self) -> &DsaConfig {
        &self.config
    }

    /// Per-SCC use/def sets over resolvable call sites, indexed like
    /// `call_graph.sccs()`
    fn build_use_def(call_graph: &CallGraph, sites: &FxHashMap<ValueId, DsaCallSite>) -> Vec<UseDef> {
        let mut index = vec![UseDef::default(); call_graph.sccs().len()];
        for (caller, record) in call_graph.all_calls() {
            let Some(cs) = sites.get(&record.instruction) else {
                continue;
            };
            let Some(callee) = cs.callee().filter(|_| cs.is_resolvable()) else {
                continue;
            };
            index[call_graph.scc_index(callee)]
                .uses
                .insert(record.instruction);
            index[call_graph.scc_index(caller)]
                .defs
                .insert(record.instruction);
        }
        index
    }

    /// Apply `kind` to `cs`; returns the function whose graph changed
    fn propagate(
        graphs: &mut GraphStore,
        cs: &DsaCallSite,
        callee: FunctionId,
        kind: PropagationKind,
    ) -> DsaResult<FunctionId> {
        let caller_slot = graphs.require_slot(cs.caller())?;
        let callee_slot = graphs.require_slot(callee)?;

        if caller_slot == callee_slot {
            let g = graphs.at_mut(caller_slot);
            resolve_arguments(cs, g);
            g.compress();
            return Ok(cs.caller());
        }

        match kind {
            PropagationKind::Down => {
                let (caller_g, callee_g) = graphs.pair(caller_slot, callee_slot);
                clone_caller_into_callee(cs, caller_g, callee_g);
                Ok(callee)
            }
            PropagationKind::Up => {
                let (callee_g, caller_g) = graphs.pair(callee_slot, caller_slot);
                clone_callee_into_caller(cs, callee_g, caller_g);
                Ok(cs.caller())
            }
            PropagationKind::None => Ok(cs.caller()),
        }
    }

    fn decide(graphs: &GraphStore, cs: &DsaCallSite, callee: FunctionId) -> DsaResult<PropagationKind> {
        let callee_g = graphs.require(callee)?;
        let caller_g = graphs.require(cs.caller())?;
        Ok(decide_propagation(cs, callee_g, caller_g))
    }

    /// Re-scan every resolvable call site and collect the inconsistent ones
    fn check_fixpoint(
        module: &Module,
        call_graph: &CallGraph,
        graphs: &GraphStore,
        sites: &FxHashMap<ValueId, DsaCallSite>,
    ) -> DsaResult<Vec<PropagationFailure>> {
        let mut failures = Vec::new();
        for (caller, record) in call_graph.all_calls() {
            let Some(cs) = sites.get(&record.instruction) else {
                continue;
            };
            let Some(callee) = cs.callee().filter(|_| cs.is_resolvable()) else {
                continue;
            };
            let kind = Self::decide(graphs, cs, callee)?;
            if kind != PropagationKind::None {
                let failure = PropagationFailure {
                    caller: module.function(caller).name.clone(),
                    instruction: module.value_name(record.instruction),
                    kind,
                };
                tracing::error!(%failure, "call site not at fixpoint");
                failures.push(failure);
            }
        }
        Ok(failures)
    }
}

impl<L: LocalGraphBuilder> GlobalAnalysis for ContextSensitiveAnalysis<L> {
    type Output = ContextSensitiveResult;

    fn name(&self) -> &'static str {
        "context-sensitive dsa"
    }

    fn run_on_module(&mut self, module: &Module, call_graph: &CallGraph) -> DsaResult<Self::Output> {
        let start = Instant::now();
        tracing::info!(module = module.name(), order = ?self.config.worklist_order, "starting {}", self.name());

        let BottomUpResult {
            mut graphs,
            mappings,
            stats: bottom_up,
        } = self.bottom_up.run(module, call_graph)?;
        let mut stats = ContextSensitiveStats {
            bottom_up,
            ..Default::default()
        };

        let mut sites = FxHashMap::default();
        for (_, record) in call_graph.all_calls() {
            sites.insert(record.instruction, DsaCallSite::new(module, record.instruction)?);
        }
        let use_def = Self::build_use_def(call_graph, &sites);

        let mut worklist = Worklist::new(self.config.worklist_order);
        for (_, record) in call_graph.all_calls() {
            let Some(cs) = sites.get(&record.instruction) else {
                continue;
            };
            if !cs.is_resolvable() {
                continue;
            }
            let needs_check = self.config.seed_all_call_sites
                || match mappings.get(&record.instruction) {
                    Some(Some(sm)) => !sm.is_injective(),
                    _ => true,
                };
            if needs_check && worklist.insert(record.instruction) {
                stats.seeded += 1;
            }
        }
        tracing::debug!(seeded = stats.seeded, "worklist seeded");

        while let Some(inst) = worklist.pop() {
            stats.pops += 1;
            let Some(cs) = sites.get(&inst) else {
                continue;
            };
            if cs.is_inline_asm() {
                continue;
            }
            let Some(callee) = cs.callee().filter(|_| cs.is_resolvable()) else {
                continue;
            };

            let kind = Self::decide(&graphs, cs, callee)?;
            tracing::trace!(call = %module.value_name(inst), %kind, "decided");
            if kind == PropagationKind::None {
                continue;
            }

            let changed = Self::propagate(&mut graphs, cs, callee, kind)?;
            match kind {
                PropagationKind::Down => stats.td_propagations += 1,
                PropagationKind::Up => stats.bu_propagations += 1,
                PropagationKind::None => {}
            }

            let sets = &use_def[call_graph.scc_index(changed)];
            worklist.extend(sets.uses.iter().chain(sets.defs.iter()).copied());

            let again = Self::decide(&graphs, cs, callee)?;
            if again == kind {
                stats.repeated += 1;
                tracing::warn!(
                    caller = %module.function(cs.caller()).name,
                    call = %module.value_name(inst),
                    %kind,
                    "call site still needs the same propagation"
                );
            }
        }

        let failures = if self.config.verify_fixpoint {
            Self::check_fixpoint(module, call_graph, &graphs, &sites)?
        } else {
            Vec::new()
        };

        stats.duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            pops = stats.pops,
            down = stats.td_propagations,
            up = stats.bu_propagations,
            failures = failures.len(),
            duration_ms = stats.duration_ms,
            "finished {}",
            self.name()
        );

        Ok(ContextSensitiveResult {
            graphs,
            failures,
            stats,
        })
    }
}
