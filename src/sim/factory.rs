//! Entity factory and fixture templates
//!
//! Each kind has a default template (body type, shape, material, filtering,
//! payload). Levels layer overrides on top, and individual spawns can layer
//! one more. The fully resolved fixture goes to the physics world in a
//! single `create_body` call, so a body is never visible untagged.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::entity::{Entity, EntityId, EntityKind, EntityRegistry, Payload};
use super::stage::Stage;
use super::world::{BodyDef, BodyType, FixtureDef, PhysicsWorld, Shape};
use crate::consts::*;
use crate::error::SpawnError;
use crate::settings::WorldBounds;

/// Everything needed to build one kind of entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixtureTemplate {
    pub body_type: BodyType,
    pub shape: Shape,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub category: Category,
    pub mask: Category,
    pub is_sensor: bool,
    pub health: Option<u32>,
    pub blast_radius: Option<f32>,
}

impl FixtureTemplate {
    /// Built-in defaults for a kind
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Ground => Self {
                body_type: BodyType::Static,
                shape: Shape::Rect {
                    half_extents: Vec2::new(500.0, 50.0),
                },
                density: 0.6,
                friction: 0.7,
                restitution: 0.3,
                category: Category::WALL,
                mask: Category::all(),
                is_sensor: false,
                health: None,
                blast_radius: None,
            },
            EntityKind::Crate => Self {
                body_type: BodyType::Dynamic,
                shape: Shape::Rect {
                    half_extents: Vec2::splat(CRATE_HALF_EXTENT),
                },
                density: 0.6,
                friction: 0.7,
                restitution: 0.3,
                category: Category::TARGET,
                mask: Category::all(),
                is_sensor: false,
                health: Some(1),
                blast_radius: None,
            },
            EntityKind::Grenade => Self {
                body_type: BodyType::Dynamic,
                shape: Shape::Circle {
                    radius: GRENADE_RADIUS,
                },
                density: 1.5,
                friction: 0.4,
                restitution: 0.2,
                category: Category::PROJECTILE,
                mask: Category::all(),
                is_sensor: false,
                health: None,
                blast_radius: Some(GRENADE_BLAST_RADIUS),
            },
            EntityKind::KillZone => Self {
                body_type: BodyType::Static,
                shape: Shape::Rect {
                    half_extents: Vec2::new(500.0, 50.0),
                },
                density: 0.0,
                friction: 0.0,
                restitution: 0.0,
                category: Category::SENSOR,
                mask: Category::PROJECTILE | Category::TARGET,
                is_sensor: true,
                health: None,
                blast_radius: None,
            },
        }
    }

    /// This template with every `Some` field of the override applied
    pub fn with_override(&self, o: &FixtureOverride) -> Self {
        Self {
            shape: o.shape.unwrap_or(self.shape),
            density: o.density.unwrap_or(self.density),
            friction: o.friction.unwrap_or(self.friction),
            restitution: o.restitution.unwrap_or(self.restitution),
            category: o.category.unwrap_or(self.category),
            mask: o.mask.unwrap_or(self.mask),
            ..*self
        }
    }

    pub fn fixture_def(&self) -> FixtureDef {
        FixtureDef {
            shape: self.shape,
            density: self.density,
            friction: self.friction,
            restitution: self.restitution,
            category: self.category,
            mask: self.mask,
            is_sensor: self.is_sensor,
        }
    }

    /// Reason this template cannot produce a body, if any
    fn invalid_reason(&self) -> Option<&'static str> {
        if !self.shape.is_valid() {
            Some("shape must have positive, finite extents")
        } else if !(self.density.is_finite() && self.density >= 0.0) {
            Some("density must be finite and non-negative")
        } else if !(self.friction.is_finite() && self.friction >= 0.0) {
            Some("friction must be finite and non-negative")
        } else if !(0.0..=1.0).contains(&self.restitution) {
            Some("restitution must lie in [0, 1]")
        } else {
            None
        }
    }
}

/// Optional per-level or per-spawn replacements for template fields
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureOverride {
    pub shape: Option<Shape>,
    pub density: Option<f32>,
    pub friction: Option<f32>,
    pub restitution: Option<f32>,
    pub category: Option<Category>,
    pub mask: Option<Category>,
}

/// Resolved templates for every kind
#[derive(Debug, Clone)]
pub struct TemplateTable {
    templates: HashMap<EntityKind, FixtureTemplate>,
}

impl Default for TemplateTable {
    fn default() -> Self {
        Self {
            templates: EntityKind::ALL
                .iter()
                .map(|kind| (*kind, FixtureTemplate::for_kind(*kind)))
                .collect(),
        }
    }
}

impl TemplateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: EntityKind) -> FixtureTemplate {
        self.templates
            .get(&kind)
            .copied()
            .unwrap_or_else(|| FixtureTemplate::for_kind(kind))
    }

    /// Layer an override onto the current template for `kind`
    pub fn apply_override(&mut self, kind: EntityKind, o: &FixtureOverride) {
        let layered = self.get(kind).with_override(o);
        self.templates.insert(kind, layered);
    }

    /// Put every kind back to its built-in defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Per-spawn parameters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnParams {
    pub fixture: FixtureOverride,
    pub velocity: Vec2,
    /// Replaces the template's health
    pub health: Option<u32>,
}

impl SpawnParams {
    pub fn with_velocity(velocity: Vec2) -> Self {
        Self {
            velocity,
            ..Default::default()
        }
    }
}

/// Builds bodies, actors and registry entries for new entities
#[derive(Debug)]
pub struct EntityFactory {
    templates: TemplateTable,
    bounds: WorldBounds,
    next_id: u32,
}

impl EntityFactory {
    pub fn new(templates: TemplateTable, bounds: WorldBounds) -> Self {
        Self {
            templates,
            bounds,
            next_id: 1,
        }
    }

    pub fn templates(&self) -> &TemplateTable {
        &self.templates
    }

    pub fn templates_mut(&mut self) -> &mut TemplateTable {
        &mut self.templates
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create an entity and attach it to the world, the stage and the registry
    #[allow(clippy::too_many_arguments)]
    pub fn spawn<W, S>(
        &mut self,
        world: &mut W,
        stage: &mut S,
        registry: &mut EntityRegistry,
        kind: EntityKind,
        position: Vec2,
        rotation: f32,
        params: &SpawnParams,
    ) -> Result<EntityId, SpawnError>
    where
        W: PhysicsWorld + ?Sized,
        S: Stage + ?Sized,
    {
        if !position.is_finite() || !rotation.is_finite() || !params.velocity.is_finite() {
            return Err(SpawnError::NonFinite { kind });
        }
        if !self.bounds.contains(position) {
            return Err(SpawnError::OutOfBounds { kind, position });
        }

        let template = self.templates.get(kind).with_override(&params.fixture);
        if let Some(reason) = template.invalid_reason() {
            return Err(SpawnError::InvalidFixture { kind, reason });
        }
        if template.category.is_empty() {
            return Err(SpawnError::EmptyCategory { kind });
        }

        let id = self.next_entity_id();
        let body = world.create_body(
            &BodyDef {
                body_type: template.body_type,
                position,
                rotation,
                velocity: params.velocity,
                user_data: Some(id),
            },
            &template.fixture_def(),
        );
        let actor = stage.add_actor(id, kind, position, rotation);

        registry.insert(Entity {
            id,
            kind,
            body,
            actor,
            payload: Payload {
                health: params.health.or(template.health),
                blast_radius: template.blast_radius,
            },
        });

        log::trace!("Spawned {:?} {:?} at ({}, {})", kind, id, position.x, position.y);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arcade::ArcadeWorld;
    use crate::sim::stage::HeadlessStage;

    fn setup() -> (EntityFactory, ArcadeWorld, HeadlessStage, EntityRegistry) {
        (
            EntityFactory::new(TemplateTable::new(), WorldBounds::default()),
            ArcadeWorld::default(),
            HeadlessStage::new(),
            EntityRegistry::new(),
        )
    }

    #[test]
    fn test_spawn_tags_body_immediately() {
        let (mut factory, mut world, mut stage, mut registry) = setup();
        let id = factory
            .spawn(
                &mut world,
                &mut stage,
                &mut registry,
                EntityKind::Grenade,
                Vec2::new(1000.0, 400.0),
                0.0,
                &SpawnParams::default(),
            )
            .unwrap();

        let entity = registry.get(id).unwrap();
        assert_eq!(world.user_data(entity.body), Some(id));
        assert_eq!(stage.actor(entity.actor).map(|a| a.entity), Some(id));
        assert_eq!(entity.payload.blast_radius, Some(GRENADE_BLAST_RADIUS));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let (mut factory, mut world, mut stage, mut registry) = setup();
        let err = factory
            .spawn(
                &mut world,
                &mut stage,
                &mut registry,
                EntityKind::Crate,
                Vec2::new(-5000.0, 0.0),
                0.0,
                &SpawnParams::default(),
            )
            .unwrap_err();
        assert!(matches!(err, SpawnError::OutOfBounds { kind: EntityKind::Crate, .. }));
        assert_eq!(world.body_count(), 0);
        assert_eq!(stage.actor_count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let (mut factory, mut world, mut stage, mut registry) = setup();
        let bouncy = SpawnParams {
            fixture: FixtureOverride {
                restitution: Some(1.5),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = factory
            .spawn(&mut world, &mut stage, &mut registry, EntityKind::Crate, Vec2::ZERO, 0.0, &bouncy)
            .unwrap_err();
        assert!(matches!(err, SpawnError::InvalidFixture { .. }));

        let untagged = SpawnParams {
            fixture: FixtureOverride {
                category: Some(Category::empty()),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = factory
            .spawn(&mut world, &mut stage, &mut registry, EntityKind::Crate, Vec2::ZERO, 0.0, &untagged)
            .unwrap_err();
        assert_eq!(err, SpawnError::EmptyCategory { kind: EntityKind::Crate });

        let err = factory
            .spawn(
                &mut world,
                &mut stage,
                &mut registry,
                EntityKind::Crate,
                Vec2::new(f32::NAN, 0.0),
                0.0,
                &SpawnParams::default(),
            )
            .unwrap_err();
        assert_eq!(err, SpawnError::NonFinite { kind: EntityKind::Crate });
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_level_override_layers_on_defaults() {
        let mut table = TemplateTable::new();
        table.apply_override(
            EntityKind::Ground,
            &FixtureOverride {
                density: Some(0.9),
                ..Default::default()
            },
        );
        let ground = table.get(EntityKind::Ground);
        assert_eq!(ground.density, 0.9);
        assert_eq!(ground.friction, 0.7);
        assert_eq!(ground.category, Category::WALL);

        table.reset();
        assert_eq!(table.get(EntityKind::Ground).density, 0.6);
    }

    #[test]
    fn test_ten_projectiles_in_one_frame() {
        let (mut factory, mut world, mut stage, mut registry) = setup();
        let ids: Vec<EntityId> = (0..10)
            .map(|i| {
                factory
                    .spawn(
                        &mut world,
                        &mut stage,
                        &mut registry,
                        EntityKind::Grenade,
                        Vec2::new(1000.0 + i as f32 * 300.0, 400.0),
                        0.0,
                        &SpawnParams::default(),
                    )
                    .unwrap()
            })
            .collect();

        assert_eq!(registry.len(), 10);
        assert_eq!(world.body_count(), 10);
        let mut bodies: Vec<_> = ids.iter().map(|id| registry.get(*id).unwrap().body).collect();
        bodies.dedup();
        assert_eq!(bodies.len(), 10);
    }
}
