//! Cell: a (node, byte offset) pair
//!
//! A cell is only meaningful relative to the graph that owns its node.
//! Stored cells may name a node that was later merged away; always go
//! through [`Graph::resolve`](super::Graph::resolve) before comparing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index into a graph's node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A memory location: byte `offset` within `node`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    node: NodeId,
    offset: u32,
}

impl Cell {
    #[inline]
    pub fn new(node: NodeId, offset: u32) -> Self {
        Self { node, offset }
    }

    #[inline]
    pub fn node(self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn offset(self) -> u32 {
        self.offset
    }

    /// Same node, `delta` bytes further; saturates past `u32::MAX`
    #[inline]
    pub fn shifted(self, delta: u32) -> Self {
        Self {
            node: self.node,
            offset: self.offset.saturating_add(delta),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.node, self.offset)
    }
}
