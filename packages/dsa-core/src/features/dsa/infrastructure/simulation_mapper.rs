//! Simulation mapping between a callee graph and a caller graph
//!
//! A simulation maps every callee node reachable from the call-site
//! interface (globals, return cell, formals) to a caller node plus a
//! non-negative offset shift, such that every callee link has a matching
//! caller link. The mapping decides how a call site must be propagated:
//!
//! | mapping | meaning |
//! |---------|---------|
//! | none | caller has not absorbed the callee yet |
//! | not a function | some callee node has two images |
//! | function, not injective | caller is coarser than callee |
//! | function and injective | call site is consistent |

use crate::features::call_graph::DsaCallSite;
use crate::features::dsa::domain::{Cell, Graph, NodeId};
use rustc_hash::{FxHashMap, FxHashSet};

/// Callee node -> caller images `(node, delta)`
#[derive(Debug, Clone, Default)]
pub struct SimulationMapper {
    images: FxHashMap<NodeId, Vec<(NodeId, u32)>>,
}

impl SimulationMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `callee_cell` of `callee` to `caller_cell` of `caller`, following
    /// links. Returns false if no simulation exists.
    pub fn insert(&mut self, callee: &Graph, caller: &Graph, callee_cell: Cell, caller_cell: Cell) -> bool {
        let mut stack = vec![(callee_cell, caller_cell)];

        while let Some((c1, c2)) = stack.pop() {
            let c1 = callee.resolve(c1);
            let c2 = caller.resolve(c2);
            let n1 = c1.node();
            let n2 = c2.node();
            let caller_collapsed = caller.node(n2).is_collapsed();

            let delta = if caller_collapsed {
                0
            } else if callee.node(n1).is_collapsed() || c2.offset() < c1.offset() {
                return false;
            } else {
                c2.offset() - c1.offset()
            };

            let images = self.images.entry(n1).or_default();
            let known = images.iter().find(|(n, _)| *n == n2).map(|(_, d)| *d);
            match known {
                Some(d) if d == delta => continue,
                Some(_) => return false,
                None => images.push((n2, delta)),
            }

            for (k, target) in callee.links(n1) {
                let at = if caller_collapsed {
                    Cell::new(n2, 0)
                } else {
                    match k.checked_add(delta) {
                        Some(offset) => Cell::new(n2, offset),
                        None => return false,
                    }
                };
                match caller.link(at) {
                    Some(caller_target) => stack.push((target, caller_target)),
                    None => return false,
                }
            }
        }
        true
    }

    /// Every mapped callee node has exactly one image
    pub fn is_function(&self) -> bool {
        self.images.values().all(|v| v.len() == 1)
    }

    /// A function whose images are pairwise distinct nodes
    pub fn is_injective(&self) -> bool {
        if !self.is_function() {
            return false;
        }
        let mut seen = FxHashSet::default();
        self.images.values().all(|v| seen.insert(v[0].0))
    }

    /// Images of a callee node
    pub fn images(&self, callee_node: NodeId) -> &[(NodeId, u32)] {
        self.images
            .get(&callee_node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn num_mapped(&self) -> usize {
        self.images.len()
    }

    /// Simulation of the interface of `cs` from `callee_g` into `caller_g`
    ///
    /// Returns `None` if the interface cannot be mapped: a callee global,
    /// return cell or formal without caller counterpart, or a structural
    /// mismatch below it.
    pub fn for_call_site(cs: &DsaCallSite, callee_g: &Graph, caller_g: &Graph) -> Option<Self> {
        let callee = cs.callee()?;
        let mut sm = SimulationMapper::new();

        for (global, cell) in callee_g.globals() {
            let image = caller_g.cell(global)?;
            if !sm.insert(callee_g, caller_g, cell, image) {
                return None;
            }
        }

        if let Some(ret) = callee_g.ret_cell(callee) {
            let image = caller_g.cell(cs.instruction())?;
            if !sm.insert(callee_g, caller_g, ret, image) {
                return None;
            }
        }

        for (actual, formal) in cs.arg_pairs() {
            if let Some(cell) = callee_g.cell(formal) {
                let image = caller_g.cell(actual)?;
                if !sm.insert(callee_g, caller_g, cell, image) {
                    return None;
                }
            }
        }

        Some(sm)
    }
}
