//! Physics world abstraction
//!
//! The simulation depends only on this trait. Any engine that can create and
//! destroy tagged bodies, filter by category, step with solver iteration counts
//! and report begin/end contacts synchronously can sit behind it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::entity::EntityId;

/// Opaque handle to a body owned by the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Never moves, infinite mass
    Static,
    /// Integrated under gravity and contact impulses
    Dynamic,
}

/// Collision shape of a fixture, in body-local space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { half_extents: Vec2 },
}

impl Shape {
    pub fn area(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Rect { half_extents } => 4.0 * half_extents.x * half_extents.y,
        }
    }

    /// Radius of the smallest circle around the shape's centre
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => radius,
            Shape::Rect { half_extents } => half_extents.length(),
        }
    }

    pub fn is_valid(&self) -> bool {
        match *self {
            Shape::Circle { radius } => radius.is_finite() && radius > 0.0,
            Shape::Rect { half_extents } => {
                half_extents.is_finite() && half_extents.x > 0.0 && half_extents.y > 0.0
            }
        }
    }
}

/// Fixture material and filtering, fully resolved before the body exists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixtureDef {
    pub shape: Shape,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// What this fixture is
    pub category: Category,
    /// What this fixture may touch
    pub mask: Category,
    /// Sensors report contacts but are never pushed apart
    pub is_sensor: bool,
}

/// Body placement; user data is attached atomically with creation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDef {
    pub body_type: BodyType,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub user_data: Option<EntityId>,
}

/// Read-only view of one side of a contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureView {
    pub body: BodyHandle,
    pub category: Category,
    pub user_data: Option<EntityId>,
}

/// A pair of fixtures that started or stopped touching during a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: FixtureView,
    pub b: FixtureView,
    /// Relative speed along the contact normal at the moment of impact
    pub impact_speed: f32,
    /// Approximate contact point in world space
    pub point: Vec2,
}

impl Contact {
    /// Same contact with A and B exchanged
    pub fn swapped(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
            impact_speed: self.impact_speed,
            point: self.point,
        }
    }
}

/// Receives contact notifications synchronously from inside `PhysicsWorld::step`
///
/// Implementations must not mutate the world; they only record intents.
pub trait ContactListener {
    fn begin_contact(&mut self, contact: &Contact);

    fn end_contact(&mut self, _contact: &Contact) {}
}

/// Two fixtures interact only if each one's category is in the other's mask
#[inline]
pub fn should_collide(a_category: Category, a_mask: Category, b_category: Category, b_mask: Category) -> bool {
    a_mask.intersects(b_category) && b_mask.intersects(a_category)
}

/// Capabilities the simulation needs from a physics engine
pub trait PhysicsWorld {
    /// Create a body with a single fixture. Category, mask and user data are
    /// in place before the body can take part in any step.
    fn create_body(&mut self, body: &BodyDef, fixture: &FixtureDef) -> BodyHandle;

    /// Remove a body. Returns `false` if it was already gone.
    ///
    /// Must never be called while a step is in progress.
    fn destroy_body(&mut self, handle: BodyHandle) -> bool;

    fn contains(&self, handle: BodyHandle) -> bool;

    fn set_user_data(&mut self, handle: BodyHandle, data: Option<EntityId>);

    fn user_data(&self, handle: BodyHandle) -> Option<EntityId>;

    /// Position and rotation, `None` for absent bodies
    fn body_position(&self, handle: BodyHandle) -> Option<(Vec2, f32)>;

    fn body_velocity(&self, handle: BodyHandle) -> Option<Vec2>;

    fn body_count(&self) -> usize;

    fn set_gravity(&mut self, gravity: Vec2);

    /// Advance the world by `dt`, firing contact callbacks on `listener`
    /// before returning.
    fn step(
        &mut self,
        dt: f32,
        velocity_iterations: u32,
        position_iterations: u32,
        listener: &mut dyn ContactListener,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_collide_needs_both_masks() {
        let all = Category::all();
        assert!(should_collide(Category::WALL, all, Category::TARGET, all));
        assert!(!should_collide(
            Category::WALL,
            Category::PROJECTILE,
            Category::TARGET,
            all
        ));
        assert!(!should_collide(
            Category::WALL,
            all,
            Category::TARGET,
            Category::PROJECTILE
        ));
    }

    #[test]
    fn test_shape_validity() {
        assert!(Shape::Circle { radius: 1.0 }.is_valid());
        assert!(!Shape::Circle { radius: 0.0 }.is_valid());
        assert!(!Shape::Rect { half_extents: Vec2::new(1.0, -1.0) }.is_valid());
        assert!(!Shape::Rect { half_extents: Vec2::new(f32::INFINITY, 1.0) }.is_valid());
    }
}
