//! Custom assertions for graph verification

use dsa_core::{FunctionId, GlobalGraphs, Graph, Module, ValueId};
use std::collections::BTreeMap;

/// Assert that `a` and `b` point into the same node
pub fn assert_same_node(g: &Graph, a: ValueId, b: ValueId) {
    let ca = g.get_cell(a).expect("cell for a");
    let cb = g.get_cell(b).expect("cell for b");
    assert!(g.same_node(ca, cb), "expected {a} and {b} on one node, got {ca} and {cb}");
}

/// Assert that `a` and `b` point into different nodes
pub fn assert_distinct_nodes(g: &Graph, a: ValueId, b: ValueId) {
    let ca = g.get_cell(a).expect("cell for a");
    let cb = g.get_cell(b).expect("cell for b");
    assert!(!g.same_node(ca, cb), "expected {a} and {b} on different nodes, both on {ca}");
}

/// Locations of `f` grouped by node, as sorted names
pub fn alias_partition<G: GlobalGraphs>(module: &Module, out: &G, f: FunctionId) -> Vec<Vec<String>> {
    let g = out.get_graph(f).expect("graph");
    let func = module.function(f);
    let locals = func
        .params
        .iter()
        .copied()
        .chain(module.body(f).map(|i| i.id));

    let mut groups: BTreeMap<_, Vec<String>> = BTreeMap::new();
    for v in locals {
        if let Some(c) = g.cell(v) {
            groups.entry(c.node()).or_default().push(module.value_name(v));
        }
    }
    let mut partition: Vec<Vec<String>> = groups
        .into_values()
        .map(|mut names| {
            names.sort();
            names
        })
        .collect();
    partition.sort();
    partition
}
