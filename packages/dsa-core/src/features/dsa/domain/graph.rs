//! Points-to graph with offset-aware unification
//!
//! Nodes live in an arena and are never freed. Unifying two nodes forwards
//! one into the other with an offset shift, union-find style; `compress`
//! shortens the forwarding chains and rewrites every stored cell.
//!
//! # Offset conflicts
//!
//! Unifying two cells of the same node at different offsets collapses the
//! node: it becomes a single field at offset 0 and all of its outgoing
//! links are unified together. Merging with a collapsed node collapses the
//! result.
//!
//! A node has at most `MAX_FIELD_OFFSET + 1` bytes of fields. A merge or a
//! store that would reach past that, or overflow the offset arithmetic,
//! collapses the node instead. Shifts saturate, so an oversized offset is
//! always caught by the bound.
//!
//! # Example
//! ```
//! use dsa_core::features::dsa::domain::Graph;
//! use dsa_core::shared::models::Module;
//!
//! let mut m = Module::new("m");
//! let f = m.add_function("f", 0);
//! let x = m.alloca(f, "x");
//! let y = m.alloca(f, "y");
//!
//! let mut g = Graph::new();
//! let cx = g.mk_cell(x);
//! let cy = g.mk_cell(y);
//! g.unify(cx, cy.shifted(8));
//! assert_eq!(g.get_cell(x).unwrap(), g.get_cell(y).unwrap().shifted(8));
//! assert_eq!(g.num_nodes(), 1);
//! ```

use super::cell::{Cell, NodeId};
use super::node::Node;
use crate::errors::{DsaError, DsaResult};
use crate::shared::models::{FunctionId, ValueId};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// Largest field offset a node keeps before it is collapsed
pub const MAX_FIELD_OFFSET: u32 = 1 << 10;

/// Deferred unification work
#[derive(Debug, Clone, Copy)]
enum Pending {
    /// Make both cells denote the same location
    Unify(Cell, Cell),
    /// Store `target` as the pointer at `from`, unifying with any existing one
    Link { from: Cell, target: Cell },
}

/// Points-to graph of one function (or of a whole module)
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Node arena
    nodes: Vec<Node>,

    /// Non-global locations
    values: FxHashMap<ValueId, Cell>,

    /// Global locations, in id order
    globals: BTreeMap<ValueId, Cell>,

    /// Return cells
    returns: FxHashMap<FunctionId, Cell>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Nodes
    // ═══════════════════════════════════════════════════════════════════════

    /// Fresh node with no links
    pub fn mk_node(&mut self) -> NodeId {
        self.push_node(Node::default())
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Final representative of `id` and the accumulated offset shift
    fn find(&self, id: NodeId) -> (NodeId, u32) {
        let mut node = id;
        let mut delta: u32 = 0;
        while let Some((next, d)) = self.nodes[node.index()].forward {
            node = next;
            delta = delta.saturating_add(d);
        }
        (node, delta)
    }

    /// Representative node of `id`
    pub fn representative(&self, id: NodeId) -> NodeId {
        self.find(id).0
    }

    /// Follow forwarding links; collapsed nodes resolve to offset 0
    pub fn resolve(&self, cell: Cell) -> Cell {
        let (node, delta) = self.find(cell.node());
        if self.nodes[node.index()].collapsed {
            Cell::new(node, 0)
        } else {
            Cell::new(node, cell.offset().saturating_add(delta))
        }
    }

    /// Payload of the representative of `id`
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[self.representative(id).index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        let rep = self.representative(id);
        &mut self.nodes[rep.index()]
    }

    pub fn is_collapsed(&self, cell: Cell) -> bool {
        self.node(cell.node()).collapsed
    }

    /// Live representatives, in arena order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.forward.is_none())
            .map(|(i, _)| NodeId(i as u32))
    }

    /// Number of live representatives
    pub fn num_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| n.forward.is_none()).count()
    }

    /// Number of arena entries, forwarded ones included
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.globals.is_empty() && self.returns.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Locations
    // ═══════════════════════════════════════════════════════════════════════

    /// Cell of `v`, created on a fresh node if absent
    pub fn mk_cell(&mut self, v: ValueId) -> Cell {
        let existing = if v.is_global() {
            self.globals.get(&v)
        } else {
            self.values.get(&v)
        };
        if let Some(cell) = existing.copied() {
            return self.resolve(cell);
        }

        let cell = Cell::new(self.mk_node(), 0);
        if v.is_global() {
            let node = &mut self.nodes[cell.node().index()];
            node.flags.global = true;
            node.globals.insert(v);
            self.globals.insert(v, cell);
        } else {
            self.values.insert(v, cell);
        }
        cell
    }

    /// Return cell of `f`, created on a fresh node if absent
    pub fn mk_ret_cell(&mut self, f: FunctionId) -> Cell {
        if let Some(cell) = self.returns.get(&f).copied() {
            return self.resolve(cell);
        }
        let cell = Cell::new(self.mk_node(), 0);
        self.returns.insert(f, cell);
        cell
    }

    pub fn has_cell(&self, v: ValueId) -> bool {
        if v.is_global() {
            self.globals.contains_key(&v)
        } else {
            self.values.contains_key(&v)
        }
    }

    /// Resolved cell of `v`, if any
    pub fn cell(&self, v: ValueId) -> Option<Cell> {
        let cell = if v.is_global() {
            self.globals.get(&v)
        } else {
            self.values.get(&v)
        };
        cell.map(|c| self.resolve(*c))
    }

    /// Resolved cell of `v`; asking for an absent location is a bug
    pub fn get_cell(&self, v: ValueId) -> DsaResult<Cell> {
        self.cell(v).ok_or(DsaError::MissingCell(v))
    }

    pub fn has_ret_cell(&self, f: FunctionId) -> bool {
        self.returns.contains_key(&f)
    }

    pub fn ret_cell(&self, f: FunctionId) -> Option<Cell> {
        self.returns.get(&f).map(|c| self.resolve(*c))
    }

    pub fn get_ret_cell(&self, f: FunctionId) -> DsaResult<Cell> {
        self.ret_cell(f).ok_or(DsaError::MissingReturnCell(f))
    }

    /// Non-global locations with resolved cells, in unspecified order
    pub fn values(&self) -> impl Iterator<Item = (ValueId, Cell)> + '_ {
        self.values.iter().map(|(v, c)| (*v, self.resolve(*c)))
    }

    /// Global locations with resolved cells, in id order
    pub fn globals(&self) -> impl Iterator<Item = (ValueId, Cell)> + '_ {
        self.globals.iter().map(|(v, c)| (*v, self.resolve(*c)))
    }

    /// Return cells, in unspecified order
    pub fn returns(&self) -> impl Iterator<Item = (FunctionId, Cell)> + '_ {
        self.returns.iter().map(|(f, c)| (*f, self.resolve(*c)))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Links
    // ═══════════════════════════════════════════════════════════════════════

    /// Resolved pointer stored at `cell`
    pub fn link(&self, cell: Cell) -> Option<Cell> {
        let cell = self.resolve(cell);
        self.nodes[cell.node().index()]
            .links
            .get(&cell.offset())
            .map(|t| self.resolve(*t))
    }

    /// Pointer stored at `cell`, pointing to a fresh node if absent
    pub fn link_or_create(&mut self, cell: Cell) -> Cell {
        let cell = self.fit(cell);
        if let Some(target) = self.link(cell) {
            return target;
        }
        let target = Cell::new(self.mk_node(), 0);
        self.nodes[cell.node().index()]
            .links
            .insert(cell.offset(), target);
        target
    }

    /// Store `target` at `from`; an existing pointer there is unified with it
    pub fn add_link(&mut self, from: Cell, target: Cell) {
        let mut pending = vec![Pending::Link { from, target }];
        self.drain(&mut pending);
    }

    /// Resolved outgoing links of the representative of `id`
    pub fn links(&self, id: NodeId) -> impl Iterator<Item = (u32, Cell)> + '_ {
        self.node(id)
            .links
            .iter()
            .map(move |(k, t)| (*k, self.resolve(*t)))
    }

    /// Representatives reachable from `roots` through links
    pub fn reachable_nodes(&self, roots: impl IntoIterator<Item = Cell>) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<NodeId> = roots
            .into_iter()
            .map(|c| self.representative(c.node()))
            .collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            for (_, target) in self.links(id) {
                if !seen.contains(&target.node()) {
                    stack.push(target.node());
                }
            }
        }
        seen
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Unification
    // ═══════════════════════════════════════════════════════════════════════

    /// Make `a` and `b` denote the same location
    pub fn unify(&mut self, a: Cell, b: Cell) {
        let mut pending = vec![Pending::Unify(a, b)];
        self.drain(&mut pending);
    }

    /// Make the node of `cell` field-insensitive
    pub fn collapse(&mut self, cell: Cell) {
        let mut pending = Vec::new();
        let rep = self.representative(cell.node());
        self.collapse_rep(rep, &mut pending);
        self.drain(&mut pending);
    }

    fn drain(&mut self, pending: &mut Vec<Pending>) {
        while let Some(work) = pending.pop() {
            match work {
                Pending::Unify(a, b) => self.merge(a, b, pending),
                Pending::Link { from, target } => {
                    let from = self.bound(from, pending);
                    let links = &mut self.nodes[from.node().index()].links;
                    match links.get(&from.offset()).copied() {
                        Some(existing) => pending.push(Pending::Unify(existing, target)),
                        None => {
                            links.insert(from.offset(), target);
                        }
                    }
                }
            }
        }
    }

    /// Resolved `cell`; a cell past the field bound collapses its node
    fn bound(&mut self, cell: Cell, pending: &mut Vec<Pending>) -> Cell {
        let cell = self.resolve(cell);
        if cell.offset() > MAX_FIELD_OFFSET {
            self.collapse_rep(cell.node(), pending);
            return self.resolve(cell);
        }
        cell
    }

    /// `bound` with its follow-up work drained
    fn fit(&mut self, cell: Cell) -> Cell {
        let mut pending = Vec::new();
        let cell = self.bound(cell, &mut pending);
        self.drain(&mut pending);
        self.resolve(cell)
    }

    fn merge(&mut self, a: Cell, b: Cell, pending: &mut Vec<Pending>) {
        let a = self.bound(a, pending);
        let b = self.bound(b, pending);
        let (a, b) = (self.resolve(a), self.resolve(b));

        if a.node() == b.node() {
            if a.offset() != b.offset() {
                self.collapse_rep(a.node(), pending);
            }
            return;
        }

        // The cell with the smaller offset moves, so the shift is never negative
        let (from, into, delta) = if a.offset() <= b.offset() {
            (a.node(), b.node(), b.offset() - a.offset())
        } else {
            (b.node(), a.node(), a.offset() - b.offset())
        };

        let mut absorbed = std::mem::take(&mut self.nodes[from.index()]);
        self.nodes[from.index()].forward = Some((into, delta));
        let links = std::mem::take(&mut absorbed.links);
        let spills = links
            .keys()
            .any(|k| k.checked_add(delta).map_or(true, |o| o > MAX_FIELD_OFFSET));
        let collapse_into =
            (absorbed.collapsed || spills) && !self.nodes[into.index()].collapsed;
        absorbed.collapsed = false;
        self.nodes[into.index()].absorb(absorbed);

        if collapse_into {
            self.collapse_rep(into, pending);
        }
        for (k, target) in links {
            pending.push(Pending::Link {
                from: Cell::new(into, k.saturating_add(delta)),
                target,
            });
        }
    }

    fn collapse_rep(&mut self, rep: NodeId, pending: &mut Vec<Pending>) {
        let node = &mut self.nodes[rep.index()];
        if node.collapsed {
            return;
        }
        node.collapsed = true;
        for (_, target) in std::mem::take(&mut node.links) {
            pending.push(Pending::Link {
                from: Cell::new(rep, 0),
                target,
            });
        }
    }

    /// Point every forwarded node straight at its representative and
    /// rewrite every stored cell to its resolved form
    pub fn compress(&mut self) {
        for i in 0..self.nodes.len() {
            if self.nodes[i].forward.is_some() {
                let root = self.find(NodeId(i as u32));
                self.nodes[i].forward = Some(root);
            }
        }

        let values = std::mem::take(&mut self.values);
        self.values = values
            .into_iter()
            .map(|(v, c)| (v, self.resolve(c)))
            .collect();
        let globals = std::mem::take(&mut self.globals);
        self.globals = globals
            .into_iter()
            .map(|(v, c)| (v, self.resolve(c)))
            .collect();
        let returns = std::mem::take(&mut self.returns);
        self.returns = returns
            .into_iter()
            .map(|(f, c)| (f, self.resolve(c)))
            .collect();

        for i in 0..self.nodes.len() {
            if self.nodes[i].forward.is_some() {
                continue;
            }
            let links = std::mem::take(&mut self.nodes[i].links);
            self.nodes[i].links = links
                .into_iter()
                .map(|(k, t)| (k, self.resolve(t)))
                .collect();
        }
    }

    /// Locations grouped by the representative of their cell
    pub fn referrers(&self) -> FxHashMap<NodeId, Vec<ValueId>> {
        let mut out: FxHashMap<NodeId, Vec<ValueId>> = FxHashMap::default();
        for (v, c) in self.values().chain(self.globals()) {
            out.entry(c.node()).or_default().push(v);
        }
        for vs in out.values_mut() {
            vs.sort();
        }
        out
    }

    /// Whether `a` and `b` name the same representative node
    pub fn same_node(&self, a: Cell, b: Cell) -> bool {
        self.representative(a.node()) == self.representative(b.node())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::ValueClass;

    fn inst(i: u32) -> ValueId {
        ValueId::new(ValueClass::Instruction, i)
    }

    fn global(i: u32) -> ValueId {
        ValueId::new(ValueClass::Global, i)
    }

    #[test]
    fn test_mk_cell_is_stable() {
        let mut g = Graph::new();
        let a = g.mk_cell(inst(0));
        assert_eq!(g.mk_cell(inst(0)), a);
        assert!(g.has_cell(inst(0)));
        assert!(!g.has_cell(inst(1)));
        assert_eq!(g.num_nodes(), 1);
    }

    #[test]
    fn test_global_cell_flagged() {
        let mut g = Graph::new();
        let c = g.mk_cell(global(0));
        let node = g.node(c.node());
        assert!(node.flags().global);
        assert!(node.globals().contains(&global(0)));
        assert_eq!(g.globals().count(), 1);
        assert_eq!(g.values().count(), 0);
    }

    #[test]
    fn test_missing_cells_are_errors() {
        let g = Graph::new();
        assert!(matches!(
            g.get_cell(inst(4)),
            Err(DsaError::MissingCell(v)) if v == inst(4)
        ));
        assert!(matches!(
            g.get_ret_cell(FunctionId(1)),
            Err(DsaError::MissingReturnCell(FunctionId(1)))
        ));
    }

    #[test]
    fn test_unify_with_offset_moves_links() {
        let mut g = Graph::new();
        let a = g.mk_cell(inst(0));
        let b = g.mk_cell(inst(1));
        let t = g.mk_cell(inst(2));
        g.add_link(a.shifted(4), t);

        g.unify(a, b.shifted(8));

        let a = g.get_cell(inst(0)).unwrap();
        let b = g.get_cell(inst(1)).unwrap();
        assert_eq!(a, b.shifted(8));
        assert_eq!(g.link(b.shifted(12)), Some(g.get_cell(inst(2)).unwrap()));
        assert_eq!(g.num_nodes(), 2);
    }

    #[test]
    fn test_unify_merges_clashing_links() {
        let mut g = Graph::new();
        let a = g.mk_cell(inst(0));
        let b = g.mk_cell(inst(1));
        let ta = g.mk_cell(inst(2));
        let tb = g.mk_cell(inst(3));
        g.add_link(a, ta);
        g.add_link(b, tb);

        g.unify(a, b);
        assert_eq!(g.get_cell(inst(2)).unwrap(), g.get_cell(inst(3)).unwrap());
        assert_eq!(g.num_nodes(), 2);
    }

    #[test]
    fn test_same_node_different_offsets_collapses() {
        let mut g = Graph::new();
        let a = g.mk_cell(inst(0));
        let t0 = g.mk_cell(inst(1));
        let t8 = g.mk_cell(inst(2));
        g.add_link(a, t0);
        g.add_link(a.shifted(8), t8);

        g.unify(a, a.shifted(8));

        let a = g.get_cell(inst(0)).unwrap();
        assert!(g.is_collapsed(a));
        assert_eq!(g.resolve(a.shifted(16)), a);
        assert_eq!(g.links(a.node()).count(), 1);
        assert_eq!(g.get_cell(inst(1)).unwrap(), g.get_cell(inst(2)).unwrap());
    }

    #[test]
    fn test_merge_with_collapsed_collapses_result() {
        let mut g = Graph::new();
        let a = g.mk_cell(inst(0));
        let b = g.mk_cell(inst(1));
        g.collapse(a);
        g.unify(a, b.shifted(4));
        assert!(g.is_collapsed(g.get_cell(inst(1)).unwrap()));
        assert_eq!(g.get_cell(inst(1)).unwrap().offset(), 0);
    }

    #[test]
    fn test_cyclic_unification_terminates() {
        // a -> b -> a, c -> c; unify a with c
        let mut g = Graph::new();
        let a = g.mk_cell(inst(0));
        let b = g.mk_cell(inst(1));
        let c = g.mk_cell(inst(2));
        g.add_link(a, b);
        g.add_link(b, a);
        g.add_link(c, c);

        g.unify(a, c);
        assert_eq!(g.num_nodes(), 1);
        let a = g.get_cell(inst(0)).unwrap();
        assert_eq!(g.link(a), Some(a));
    }

    #[test]
    fn test_unify_never_creates_nodes() {
        let mut g = Graph::new();
        let cells: Vec<Cell> = (0..6).map(|i| g.mk_cell(inst(i))).collect();
        g.add_link(cells[0], cells[1]);
        g.add_link(cells[2], cells[3]);
        let arena = g.arena_len();
        let before = g.num_nodes();

        g.unify(cells[0], cells[2]);
        assert_eq!(g.arena_len(), arena);
        assert_eq!(g.num_nodes(), before - 2);
    }

    #[test]
    fn test_compress_idempotent() {
        let mut g = Graph::new();
        let cells: Vec<Cell> = (0..5).map(|i| g.mk_cell(inst(i))).collect();
        g.unify(cells[0], cells[1].shifted(4));
        g.unify(cells[1], cells[2].shifted(4));
        g.unify(cells[3], cells[4]);
        g.add_link(cells[0], cells[3]);

        let before: Vec<_> = (0..5).map(|i| g.get_cell(inst(i)).unwrap()).collect();
        g.compress();
        let once: Vec<_> = (0..5).map(|i| g.get_cell(inst(i)).unwrap()).collect();
        g.compress();
        let twice: Vec<_> = (0..5).map(|i| g.get_cell(inst(i)).unwrap()).collect();

        assert_eq!(before, once);
        assert_eq!(once, twice);
        assert_eq!(once[0], once[2].shifted(8));
    }

    #[test]
    fn test_reachable_nodes() {
        let mut g = Graph::new();
        let a = g.mk_cell(inst(0));
        let b = g.mk_cell(inst(1));
        let c = g.mk_cell(inst(2));
        g.add_link(a, b);
        g.add_link(b, a);

        let reach = g.reachable_nodes([a]);
        assert_eq!(reach.len(), 2);
        assert!(!reach.contains(&c.node()));
    }

    #[test]
    fn test_overflowing_shift_collapses() {
        let mut g = Graph::new();
        let s = g.mk_cell(inst(0));
        let a = g.mk_cell(inst(1));
        g.unify(a, s.shifted(u32::MAX - 4));
        let b = g.mk_cell(inst(2));
        let a = g.resolve(a);
        g.unify(b, a.shifted(8));

        assert_eq!(s.shifted(u32::MAX - 4).shifted(8).offset(), u32::MAX);
        assert!(g.is_collapsed(s));
        assert!(g.same_node(s, b));
        assert_eq!(g.get_cell(inst(2)).unwrap().offset(), 0);
    }

    #[test]
    fn test_merge_past_field_bound_collapses() {
        let mut g = Graph::new();
        let x = g.mk_cell(inst(0));
        let y = g.mk_cell(inst(1));
        let t = g.mk_cell(inst(2));
        g.add_link(x.shifted(8), t);

        // x+8 would land at MAX_FIELD_OFFSET + 8 inside y's node
        g.unify(x, y.shifted(MAX_FIELD_OFFSET));
        assert!(g.is_collapsed(y));
        assert_eq!(g.link(y), g.cell(inst(2)));
    }

    #[test]
    fn test_merge_at_field_bound_keeps_fields() {
        let mut g = Graph::new();
        let x = g.mk_cell(inst(0));
        let y = g.mk_cell(inst(1));
        let t = g.mk_cell(inst(2));
        g.add_link(x, t);

        g.unify(x, y.shifted(MAX_FIELD_OFFSET));
        assert!(!g.is_collapsed(y));
        assert_eq!(g.link(y.shifted(MAX_FIELD_OFFSET)), g.cell(inst(2)));
    }

    #[test]
    fn test_store_past_field_bound_collapses() {
        let mut g = Graph::new();
        let p = g.mk_cell(inst(0));
        let t = g.mk_cell(inst(1));
        g.add_link(p.shifted(MAX_FIELD_OFFSET + 4), t);

        assert!(g.is_collapsed(p));
        assert_eq!(g.link(p), g.cell(inst(1)));
        assert_eq!(g.link_or_create(p.shifted(u32::MAX)), g.get_cell(inst(1)).unwrap());
    }

    #[test]
    fn test_link_or_create() {
        let mut g = Graph::new();
        let p = g.mk_cell(inst(0));
        let t = g.link_or_create(p);
        assert_eq!(g.link_or_create(p), t);
        assert_eq!(g.num_nodes(), 2);
    }
}
