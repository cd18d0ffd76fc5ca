//! Graph node payload

use super::cell::{Cell, NodeId};
use crate::shared::models::ValueId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What kind of memory a node abstracts and how it is accessed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFlags {
    pub alloca: bool,
    pub heap: bool,
    pub global: bool,
    pub read: bool,
    pub modified: bool,
}

impl NodeFlags {
    /// Union of both flag sets
    pub fn join(self, other: NodeFlags) -> NodeFlags {
        NodeFlags {
            alloca: self.alloca || other.alloca,
            heap: self.heap || other.heap,
            global: self.global || other.global,
            read: self.read || other.read,
            modified: self.modified || other.modified,
        }
    }
}

/// One abstract memory object
///
/// A node is either a representative or forwarded into another node. A
/// forwarded node keeps its payload empty; everything lives on the
/// representative.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Merged into `(target, delta)`: offset `k` here is `k + delta` there
    pub(crate) forward: Option<(NodeId, u32)>,

    /// Outgoing pointers by offset
    pub(crate) links: BTreeMap<u32, Cell>,

    /// Field-insensitive: every offset is 0
    pub(crate) collapsed: bool,

    pub(crate) flags: NodeFlags,

    /// Globals whose storage this node abstracts
    pub(crate) globals: BTreeSet<ValueId>,

    /// Alloca / heap-allocation instructions creating this object
    pub(crate) alloc_sites: BTreeSet<ValueId>,
}

impl Node {
    #[inline]
    pub fn is_forwarding(&self) -> bool {
        self.forward.is_some()
    }

    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn flags_mut(&mut self) -> &mut NodeFlags {
        &mut self.flags
    }

    /// Raw outgoing links; targets may be stale until resolved
    pub fn raw_links(&self) -> &BTreeMap<u32, Cell> {
        &self.links
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn globals(&self) -> &BTreeSet<ValueId> {
        &self.globals
    }

    pub fn alloc_sites(&self) -> &BTreeSet<ValueId> {
        &self.alloc_sites
    }

    pub fn add_alloc_site(&mut self, site: ValueId) {
        self.alloc_sites.insert(site);
    }

    /// Copy of the payload without links or forwarding
    pub(crate) fn payload_clone(&self) -> Node {
        Node {
            forward: None,
            links: BTreeMap::new(),
            collapsed: self.collapsed,
            flags: self.flags,
            globals: self.globals.clone(),
            alloc_sites: self.alloc_sites.clone(),
        }
    }

    /// Absorb the payload of a node merged into this one
    pub(crate) fn absorb(&mut self, other: Node) {
        self.flags = self.flags.join(other.flags);
        self.collapsed |= other.collapsed;
        self.globals.extend(other.globals);
        self.alloc_sites.extend(other.alloc_sites);
    }
}
