//! Pending call sites with idempotent insertion

use crate::config::WorklistOrder;
use crate::shared::models::ValueId;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Call-site instructions waiting to be re-examined
#[derive(Debug, Clone)]
pub struct Worklist {
    order: WorklistOrder,
    queue: VecDeque<ValueId>,
    pending: FxHashSet<ValueId>,
}

impl Worklist {
    pub fn new(order: WorklistOrder) -> Self {
        Self {
            order,
            queue: VecDeque::new(),
            pending: FxHashSet::default(),
        }
    }

    /// Queue `cs` unless already pending; returns whether it was added
    pub fn insert(&mut self, cs: ValueId) -> bool {
        if !self.pending.insert(cs) {
            return false;
        }
        self.queue.push_back(cs);
        true
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = ValueId>) {
        for cs in items {
            self.insert(cs);
        }
    }

    pub fn pop(&mut self) -> Option<ValueId> {
        let cs = match self.order {
            WorklistOrder::Lifo => self.queue.pop_back(),
            WorklistOrder::Fifo => self.queue.pop_front(),
        }?;
        self.pending.remove(&cs);
        Some(cs)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
