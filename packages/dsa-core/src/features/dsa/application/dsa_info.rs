//! Node access report
//!
//! Counts how often each abstract memory object is read or written by the
//! program, gives every accessed node a stable id and a representative
//! name, and maps allocation sites to the node they allocate into. Works on
//! the output of any global analysis.

use crate::config::DsaInfoConfig;
use crate::errors::DsaResult;
use crate::features::dsa::domain::NodeId;
use crate::features::dsa::ports::GlobalGraphs;
use crate::shared::models::{FunctionId, Module, Op, ValueId};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Write};

/// A node is identified by the graph it lives in and its representative
type NodeKey = (usize, NodeId);

/// One read/written node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub id: u32,
    /// Smallest referrer name (named locations preferred)
    pub rep_name: String,
    /// Number of memory accesses through pointers into the node
    pub accesses: u64,
    /// Number of locations pointing into the node
    pub referrers: usize,
}

impl NodeInfo {
    /// Pointed to by exactly one location
    pub fn is_singleton(&self) -> bool {
        self.referrers == 1
    }
}

/// One allocation instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocSiteInfo {
    pub id: u32,
    pub site: String,
    pub function: String,
    /// Id of the accessed node it allocates into
    pub node: Option<u32>,
}

/// Access report over the graphs of a global analysis
#[derive(Debug, Clone, Serialize)]
pub struct DsaInfo {
    pub nodes: Vec<NodeInfo>,
    pub alloc_sites: Vec<AllocSiteInfo>,
    pub total_accesses: u64,

    #[serde(skip)]
    config: DsaInfoConfig,

    #[serde(skip)]
    ids: FxHashMap<NodeKey, u32>,

    #[serde(skip)]
    value_keys: FxHashMap<(FunctionId, ValueId), NodeKey>,
}

#[derive(Default)]
struct NodeAcc {
    referrers: Vec<ValueId>,
    accesses: u64,
}

impl DsaInfo {
    /// Compute the report for `module` over `graphs`
    pub fn compute<G: GlobalGraphs>(
        module: &Module,
        graphs: &G,
        config: &DsaInfoConfig,
    ) -> DsaResult<Self> {
        let mut acc: BTreeMap<NodeKey, NodeAcc> = BTreeMap::new();
        let mut seen_graphs = FxHashSet::default();
        let mut value_keys = FxHashMap::default();

        // referrers, once per distinct graph
        for f in module.functions() {
            let Some(gid) = graphs.graph_id(f.id) else {
                continue;
            };
            let g = graphs.get_graph(f.id)?;
            if seen_graphs.insert(gid) {
                for (node, vs) in g.referrers() {
                    acc.entry((gid, node)).or_default().referrers = vs;
                }
            }
        }

        // accesses, per instruction of each analyzed function
        for f in module.functions() {
            let Some(gid) = graphs.graph_id(f.id) else {
                continue;
            };
            let g = graphs.get_graph(f.id)?;
            for inst in module.body(f.id) {
                let (ptr, weight) = match &inst.op {
                    Op::Load { ptr } => (*ptr, 1),
                    Op::Store { ptr, .. } => (*ptr, 1),
                    Op::MemCopy { dst, .. } => (*dst, 2),
                    Op::MemSet { dst } => (*dst, 1),
                    _ => continue,
                };
                if let Some(c) = g.cell(ptr) {
                    acc.entry((gid, c.node())).or_default().accesses += weight;
                }
            }
            for inst in module.body(f.id) {
                if let Some(c) = g.cell(inst.id) {
                    value_keys.insert((f.id, inst.id), (gid, c.node()));
                }
            }
            for &p in &f.params {
                if let Some(c) = g.cell(p) {
                    value_keys.insert((f.id, p), (gid, c.node()));
                }
            }
        }

        let mut accessed: Vec<(NodeKey, NodeInfo)> = acc
            .into_iter()
            .filter(|(_, a)| a.accesses > 0)
            .map(|(key, a)| {
                let info = NodeInfo {
                    id: 0,
                    rep_name: rep_name(module, &a.referrers),
                    accesses: a.accesses,
                    referrers: a.referrers.len(),
                };
                (key, info)
            })
            .collect();
        accessed.sort_by(|(ka, a), (kb, b)| {
            (&a.rep_name, a.accesses, ka).cmp(&(&b.rep_name, b.accesses, kb))
        });

        let mut ids = FxHashMap::default();
        let mut nodes = Vec::with_capacity(accessed.len());
        for (i, (key, mut info)) in accessed.into_iter().enumerate() {
            info.id = i as u32 + 1;
            ids.insert(key, info.id);
            nodes.push(info);
        }
        let total_accesses = nodes.iter().map(|n| n.accesses).sum();

        let mut alloc_sites = Vec::new();
        for f in module.functions() {
            for inst in module.body(f.id).filter(|i| i.op.is_allocation()) {
                let node = value_keys
                    .get(&(f.id, inst.id))
                    .and_then(|key| ids.get(key))
                    .copied();
                alloc_sites.push(AllocSiteInfo {
                    id: alloc_sites.len() as u32 + 1,
                    site: module.value_name(inst.id),
                    function: f.name.clone(),
                    node,
                });
            }
        }

        tracing::debug!(
            nodes = nodes.len(),
            accesses = total_accesses,
            alloc_sites = alloc_sites.len(),
            "computed node access report"
        );

        Ok(Self {
            nodes,
            alloc_sites,
            total_accesses,
            config: config.clone(),
            ids,
            value_keys,
        })
    }

    /// Id of the accessed node `v` of function `f` points into
    pub fn node_id(&self, f: FunctionId, v: ValueId) -> Option<u32> {
        self.value_keys
            .get(&(f, v))
            .and_then(|key| self.ids.get(key))
            .copied()
    }

    pub fn node(&self, id: u32) -> Option<&NodeInfo> {
        id.checked_sub(1).and_then(|i| self.nodes.get(i as usize))
    }

    /// The most accessed nodes with their share of all accesses (percent)
    pub fn summary(&self) -> Vec<(u32, u64)> {
        let mut by_accesses: Vec<&NodeInfo> = self.nodes.iter().collect();
        by_accesses.sort_by(|a, b| b.accesses.cmp(&a.accesses));
        by_accesses
            .into_iter()
            .take(self.config.summary_size)
            .map(|n| (n.id, n.accesses * 100 / self.total_accesses.max(1)))
            .collect()
    }

    /// Human-readable report
    pub fn write_text(&self, out: &mut impl Write) -> fmt::Result {
        writeln!(out, " ========== DsaInfo ==========")?;
        writeln!(out, "{:>8} Total number of read/written DS nodes", self.nodes.len())?;
        writeln!(out, "{:>8} Total number of DS node reads and writes", self.total_accesses)?;

        let summary = self.summary();
        writeln!(out, "Summary of the {} most accessed DS nodes", summary.len())?;
        for (id, pct) in summary {
            writeln!(out, "  [Node Id {}] {}% of total memory accesses", id, pct)?;
        }

        if self.config.print_details {
            writeln!(out, "Detailed information about all DS nodes")?;
            for n in &self.nodes {
                let kind = if n.is_singleton() { "singleton" } else { "non-singleton" };
                writeln!(
                    out,
                    "  [Node Id {}]  {}={}  with {} memory accesses",
                    n.id, kind, n.rep_name, n.accesses
                )?;
            }
        }

        writeln!(out, " ========== Allocation sites ==========")?;
        writeln!(out, "{:>8} Total number of allocation sites", self.alloc_sites.len())?;
        if self.config.print_details {
            for site in &self.alloc_sites {
                match site.node {
                    Some(node) => writeln!(
                        out,
                        "  [Alloc site Id {} DSNode Id {}] {} in {}",
                        site.id, node, site.site, site.function
                    )?,
                    None => writeln!(
                        out,
                        "  [Alloc site Id {} DSNode Id NOT FOUND] {} in {}",
                        site.id, site.site, site.function
                    )?,
                }
            }
        }
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let mut s = String::new();
        // writing into a String cannot fail
        let _ = self.write_text(&mut s);
        s
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn rep_name(module: &Module, referrers: &[ValueId]) -> String {
    let mut named: Vec<String> = referrers
        .iter()
        .filter(|v| module.has_name(**v))
        .map(|v| module.value_name(*v))
        .collect();
    if named.is_empty() {
        named = referrers.iter().map(|v| module.value_name(*v)).collect();
    }
    named.sort();
    named.into_iter().next().unwrap_or_default()
}
