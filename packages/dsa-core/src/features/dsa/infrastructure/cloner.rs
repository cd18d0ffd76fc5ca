//! Subgraph cloning between graphs
//!
//! [`Cloner`] copies the structure reachable from a source node into a
//! destination graph. Sharing and cycles are preserved: every source
//! representative is cloned at most once per cloner.
//!
//! The call-site helpers below move a callee's interface into its caller
//! (bottom-up) or the caller's into the callee (top-down). Both work in the
//! same fixed order: globals, return cell, then actual/formal pairs up to
//! the shorter list. The destination is compressed once at the end.

use crate::features::call_graph::DsaCallSite;
use crate::features::dsa::domain::{Cell, Graph, NodeId};
use crate::shared::models::ValueId;
use rustc_hash::FxHashMap;

/// Clones source nodes into `dst`, memoized by source representative
pub struct Cloner<'g> {
    dst: &'g mut Graph,
    map: FxHashMap<NodeId, NodeId>,
}

impl<'g> Cloner<'g> {
    pub fn new(dst: &'g mut Graph) -> Self {
        Self {
            dst,
            map: FxHashMap::default(),
        }
    }

    /// Destination node standing for `node` of `src`
    pub fn clone(&mut self, src: &Graph, node: NodeId) -> NodeId {
        let root = src.representative(node);
        if let Some(&done) = self.map.get(&root) {
            return done;
        }

        let copy = self.fresh(src, root);
        let mut stack = vec![root];
        while let Some(src_node) = stack.pop() {
            let dst_node = self.map[&src_node];
            let links: Vec<(u32, Cell)> = src.links(src_node).collect();
            for (offset, target) in links {
                let dst_target = match self.map.get(&target.node()) {
                    Some(&n) => n,
                    None => {
                        stack.push(target.node());
                        self.fresh(src, target.node())
                    }
                };
                self.dst
                    .node_mut(dst_node)
                    .links
                    .insert(offset, Cell::new(dst_target, target.offset()));
            }
        }
        copy
    }

    /// Destination cell standing for `cell` of `src`
    pub fn clone_cell(&mut self, src: &Graph, cell: Cell) -> Cell {
        let cell = src.resolve(cell);
        Cell::new(self.clone(src, cell.node()), cell.offset())
    }

    fn fresh(&mut self, src: &Graph, root: NodeId) -> NodeId {
        let id = self.dst.push_node(src.node(root).payload_clone());
        self.map.insert(root, id);
        id
    }

    /// Number of source nodes cloned so far
    pub fn num_cloned(&self) -> usize {
        self.map.len()
    }

    pub fn dst(&mut self) -> &mut Graph {
        self.dst
    }
}

impl Graph {
    /// Clone every location, global and return cell of `other` into this
    /// graph, unifying with existing cells of the same location
    pub fn import(&mut self, other: &Graph) {
        let mut values: Vec<(ValueId, Cell)> = other.values().chain(other.globals()).collect();
        values.sort();
        let mut returns: Vec<_> = other.returns().collect();
        returns.sort();

        let mut cloner = Cloner::new(self);
        for (v, cell) in values {
            let copy = cloner.clone_cell(other, cell);
            let own = cloner.dst().mk_cell(v);
            cloner.dst().unify(own, copy);
        }
        for (f, cell) in returns {
            let copy = cloner.clone_cell(other, cell);
            let own = cloner.dst().mk_ret_cell(f);
            cloner.dst().unify(own, copy);
        }
        self.compress();
    }
}

/// Clone the callee's interface into the caller (bottom-up)
pub fn clone_callee_into_caller(cs: &DsaCallSite, callee_g: &Graph, caller_g: &mut Graph) {
    let Some(callee) = cs.callee() else {
        return;
    };
    let mut cloner = Cloner::new(caller_g);

    for (global, cell) in callee_g.globals() {
        let copy = cloner.clone_cell(callee_g, cell);
        let own = cloner.dst().mk_cell(global);
        cloner.dst().unify(own, copy);
    }

    if let Some(ret) = callee_g.ret_cell(callee) {
        let copy = cloner.clone_cell(callee_g, ret);
        let own = cloner.dst().mk_cell(cs.instruction());
        cloner.dst().unify(own, copy);
    }

    for (actual, formal) in cs.arg_pairs() {
        if let Some(cell) = callee_g.cell(formal) {
            let copy = cloner.clone_cell(callee_g, cell);
            let own = cloner.dst().mk_cell(actual);
            cloner.dst().unify(own, copy);
        }
    }

    caller_g.compress();
}

/// Clone the caller's interface into the callee (top-down)
pub fn clone_caller_into_callee(cs: &DsaCallSite, caller_g: &Graph, callee_g: &mut Graph) {
    let Some(callee) = cs.callee() else {
        return;
    };
    let mut cloner = Cloner::new(callee_g);

    for (global, cell) in caller_g.globals() {
        let copy = cloner.clone_cell(caller_g, cell);
        let own = cloner.dst().mk_cell(global);
        cloner.dst().unify(own, copy);
    }

    if let (Some(ret), Some(cell)) = (
        cloner.dst().ret_cell(callee),
        caller_g.cell(cs.instruction()),
    ) {
        let copy = cloner.clone_cell(caller_g, cell);
        cloner.dst().unify(ret, copy);
    }

    for (actual, formal) in cs.arg_pairs() {
        if let (Some(cell), Some(own)) = (caller_g.cell(actual), cloner.dst().cell(formal)) {
            let copy = cloner.clone_cell(caller_g, cell);
            cloner.dst().unify(own, copy);
        }
    }

    callee_g.compress();
}

/// Resolve a call site whose caller and callee share `g`: unify the call
/// instruction with the return cell and each actual with its formal
pub fn resolve_arguments(cs: &DsaCallSite, g: &mut Graph) {
    let Some(callee) = cs.callee() else {
        return;
    };

    if let Some(ret) = g.ret_cell(callee) {
        let own = g.mk_cell(cs.instruction());
        g.unify(own, ret);
    }

    for (actual, formal) in cs.arg_pairs() {
        if let Some(cell) = g.cell(formal) {
            let own = g.mk_cell(actual);
            g.unify(own, cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Module, ValueClass};

    fn inst(i: u32) -> ValueId {
        ValueId::new(ValueClass::Instruction, i)
    }

    #[test]
    fn test_clone_preserves_cycle() {
        let mut src = Graph::new();
        let a = src.mk_cell(inst(0));
        let b = src.mk_cell(inst(1));
        src.add_link(a, b);
        src.add_link(b.shifted(8), a);

        let mut dst = Graph::new();
        let mut cloner = Cloner::new(&mut dst);
        let ca = cloner.clone(&src, a.node());
        assert_eq!(cloner.num_cloned(), 2);

        let cb = dst.link(Cell::new(ca, 0)).unwrap();
        assert_eq!(dst.link(cb.shifted(8)), Some(Cell::new(ca, 0)));
        assert_eq!(dst.num_nodes(), 2);
    }

    #[test]
    fn test_clone_is_memoized() {
        let mut src = Graph::new();
        let a = src.mk_cell(inst(0));
        let b = src.mk_cell(inst(1));
        src.unify(a, b.shifted(4));

        let mut dst = Graph::new();
        let existing = dst.mk_node();
        let mut cloner = Cloner::new(&mut dst);
        let first = cloner.clone(&src, a.node());
        let second = cloner.clone(&src, b.node());
        assert_eq!(first, second);
        assert_ne!(first, existing);
    }

    #[test]
    fn test_clone_copies_payload() {
        let mut src = Graph::new();
        let g = src.mk_cell(ValueId::new(ValueClass::Global, 0));
        src.collapse(g);

        let mut dst = Graph::new();
        let copy = Cloner::new(&mut dst).clone(&src, g.node());
        let node = dst.node(copy);
        assert!(node.is_collapsed());
        assert!(node.flags().global);
        assert_eq!(node.globals().len(), 1);
    }

    #[test]
    fn test_import_unifies_by_location() {
        let mut first = Graph::new();
        let x = first.mk_cell(inst(0));
        let gv = first.mk_cell(ValueId::new(ValueClass::Global, 0));
        first.add_link(x, gv);

        let mut second = Graph::new();
        let y = second.mk_cell(inst(1));
        let gv2 = second.mk_cell(ValueId::new(ValueClass::Global, 0));
        second.add_link(y, gv2);

        let mut shared = Graph::new();
        shared.import(&first);
        shared.import(&second);

        let x = shared.get_cell(inst(0)).unwrap();
        let y = shared.get_cell(inst(1)).unwrap();
        assert_eq!(shared.link(x), shared.link(y));
        assert_eq!(shared.globals().count(), 1);
    }

    /// `caller: r = callee(a)`, callee stores its argument into the global
    #[test]
    fn test_call_site_helpers() {
        let mut m = Module::new("m");
        let gv = m.add_global("G");
        let callee = m.add_function("callee", 1);
        let p = m.param(callee, 0);
        m.store(callee, p, gv);
        m.ret(callee, Some(gv));
        let caller = m.add_function("caller", 0);
        let a = m.alloca(caller, "a");
        let call = m.call(caller, callee, vec![a]);
        let cs = DsaCallSite::new(&m, call).unwrap();

        let mut callee_g = Graph::new();
        let pc = callee_g.mk_cell(p);
        let gc = callee_g.mk_cell(gv);
        callee_g.add_link(gc, pc);
        let ret = callee_g.mk_ret_cell(callee);
        callee_g.unify(ret, gc);

        let mut caller_g = Graph::new();
        caller_g.mk_cell(a);
        clone_callee_into_caller(&cs, &callee_g, &mut caller_g);

        let g_cell = caller_g.get_cell(gv).unwrap();
        assert_eq!(caller_g.get_cell(call).unwrap(), g_cell);
        assert_eq!(caller_g.link(g_cell), Some(caller_g.get_cell(a).unwrap()));

        // Top-down: the callee learns nothing new but stays consistent
        clone_caller_into_callee(&cs, &caller_g, &mut callee_g);
        let gc = callee_g.get_cell(gv).unwrap();
        assert_eq!(callee_g.link(gc), Some(callee_g.get_cell(p).unwrap()));
        assert_eq!(callee_g.get_ret_cell(callee).unwrap(), gc);
    }

    #[test]
    fn test_resolve_arguments_in_shared_graph() {
        let mut m = Module::new("m");
        let f = m.add_function("f", 2);
        let p0 = m.param(f, 0);
        m.ret(f, Some(p0));
        let main = m.add_function("main", 0);
        let a = m.alloca(main, "a");
        let b = m.alloca(main, "b");
        let call = m.call(main, f, vec![a, b]);
        let cs = DsaCallSite::new(&m, call).unwrap();

        let mut g = Graph::new();
        let c0 = g.mk_cell(p0);
        let r = g.mk_ret_cell(f);
        g.unify(r, c0);
        g.mk_cell(a);
        g.mk_cell(b);

        resolve_arguments(&cs, &mut g);
        assert_eq!(g.get_cell(call).unwrap(), g.get_cell(a).unwrap());
        // formal 1 has no cell: b stays separate
        assert_ne!(g.get_cell(b).unwrap(), g.get_cell(a).unwrap());
    }
}
