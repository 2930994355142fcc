//! Entities and the registry that maps them to body and actor handles
//!
//! The registry never owns the body or the actor. It holds the handles needed
//! to tear both down, plus the kind tag and payload the classifier reads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::stage::ActorHandle;
use super::world::BodyHandle;

/// Stable identifier for a spawned entity, never reused within a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Closed set of things a level can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Static terrain and walls
    Ground,
    /// Breakable box, the scoring target
    Crate,
    /// Projectile
    Grenade,
    /// Sensor volume that swallows anything leaving the arena
    KillZone,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Ground,
        EntityKind::Crate,
        EntityKind::Grenade,
        EntityKind::KillZone,
    ];

    /// Returns true if this kind must be destroyed to clear the level
    pub fn counts_as_target(&self) -> bool {
        *self == EntityKind::Crate
    }

    pub fn is_projectile(&self) -> bool {
        *self == EntityKind::Grenade
    }
}

/// Per-entity gameplay data
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Payload {
    /// Hits left before the entity breaks; `None` breaks on the first damaging hit
    pub health: Option<u32>,
    /// Explosion radius reported to presentation when the entity is removed
    pub blast_radius: Option<f32>,
}

impl Payload {
    /// Apply damage, returning true if the entity is now broken
    pub fn take_damage(&mut self, amount: u32) -> bool {
        match self.health.as_mut() {
            Some(hp) => {
                *hp = hp.saturating_sub(amount);
                *hp == 0
            }
            None => amount > 0,
        }
    }
}

/// A live simulation object
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub body: BodyHandle,
    pub actor: ActorHandle,
    pub payload: Payload,
}

/// Live entities, iterated in id order
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity.id, entity);
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Remove and return an entity; `None` if it was already removed
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of live entities of one kind
    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.entities.values().filter(|e| e.kind == kind).count()
    }

    /// Take every entity out, in id order
    pub fn drain(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.entities).into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_damage() {
        let mut tough = Payload {
            health: Some(2),
            blast_radius: None,
        };
        assert!(!tough.take_damage(1));
        assert!(tough.take_damage(1));
        assert!(tough.take_damage(1));

        let mut fragile = Payload::default();
        assert!(!fragile.take_damage(0));
        assert!(fragile.take_damage(1));
    }

    #[test]
    fn test_registry_remove_is_idempotent() {
        let mut registry = EntityRegistry::new();
        registry.insert(Entity {
            id: EntityId(7),
            kind: EntityKind::Crate,
            body: BodyHandle(1),
            actor: ActorHandle(1),
            payload: Payload::default(),
        });
        assert!(registry.remove(EntityId(7)).is_some());
        assert!(registry.remove(EntityId(7)).is_none());
        assert!(registry.is_empty());
    }
}
