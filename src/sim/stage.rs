//! Presentation stage
//!
//! The simulation attaches an actor for every spawned entity and detaches it
//! when the entity is drained. Rendering lives behind this trait.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, EntityKind};

/// Handle to a visual actor owned by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorHandle(pub u32);

pub trait Stage {
    fn add_actor(&mut self, id: EntityId, kind: EntityKind, position: Vec2, rotation: f32) -> ActorHandle;

    /// Detach an actor. Returns `false` if it was already gone.
    fn remove_actor(&mut self, actor: ActorHandle) -> bool;
}

/// Actor record kept by [`HeadlessStage`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorRecord {
    pub entity: EntityId,
    pub kind: EntityKind,
    pub spawn_position: Vec2,
    pub rotation: f32,
}

/// Stage with no visuals, tracking which actors are attached
#[derive(Debug, Default)]
pub struct HeadlessStage {
    actors: BTreeMap<ActorHandle, ActorRecord>,
    next_handle: u32,
}

impl HeadlessStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor(&self, handle: ActorHandle) -> Option<&ActorRecord> {
        self.actors.get(&handle)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn actors(&self) -> impl Iterator<Item = (&ActorHandle, &ActorRecord)> {
        self.actors.iter()
    }
}

impl Stage for HeadlessStage {
    fn add_actor(&mut self, id: EntityId, kind: EntityKind, position: Vec2, rotation: f32) -> ActorHandle {
        self.next_handle += 1;
        let handle = ActorHandle(self.next_handle);
        self.actors.insert(
            handle,
            ActorRecord {
                entity: id,
                kind,
                spawn_position: position,
                rotation,
            },
        );
        handle
    }

    fn remove_actor(&mut self, actor: ActorHandle) -> bool {
        self.actors.remove(&actor).is_some()
    }
}
