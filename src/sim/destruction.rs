//! Deferred destruction queue
//!
//! Filled from contact callbacks while the world is stepping, drained by the
//! simulation loop before the next step. Insertion order is preserved for
//! iteration; each entity appears at most once.

use std::collections::HashSet;

use super::entity::EntityId;

#[derive(Debug, Default)]
pub struct DestructionQueue {
    order: Vec<EntityId>,
    members: HashSet<EntityId>,
}

impl DestructionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entity for removal. Returns `false` if it was already queued.
    pub fn enqueue(&mut self, id: EntityId) -> bool {
        if self.members.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityId> {
        self.order.iter()
    }

    /// Take every queued entity in insertion order, leaving the queue empty
    pub fn drain_and_clear(&mut self) -> Vec<EntityId> {
        self.members.clear();
        std::mem::take(&mut self.order)
    }

    /// Drop all pending removals (level restart)
    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}
