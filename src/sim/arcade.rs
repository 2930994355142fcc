//! Built-in arcade physics world
//!
//! A small impulse-based engine implementing [`PhysicsWorld`]: static and
//! dynamic bodies, circles and axis-aligned boxes, sensors, gravity and
//! begin/end contact tracking. Boxes collide axis-aligned; body rotation is
//! carried for presentation only.
//!
//! Iteration is in body-handle order so a run is reproducible.

use std::collections::BTreeMap;

use glam::Vec2;

use super::collision::{CollisionResult, shape_collision};
use super::entity::EntityId;
use super::world::{
    BodyDef, BodyHandle, BodyType, Contact, ContactListener, FixtureDef, FixtureView, PhysicsWorld,
    should_collide,
};

/// Penetration allowed before position correction kicks in
const LINEAR_SLOP: f32 = 0.5;
/// Fraction of the remaining penetration removed per position iteration
const CORRECTION_FACTOR: f32 = 0.8;

#[derive(Debug, Clone)]
struct Body {
    body_type: BodyType,
    position: Vec2,
    rotation: f32,
    velocity: Vec2,
    fixture: FixtureDef,
    inv_mass: f32,
    user_data: Option<EntityId>,
}

impl Body {
    fn new(def: &BodyDef, fixture: &FixtureDef) -> Self {
        let inv_mass = match def.body_type {
            BodyType::Static => 0.0,
            BodyType::Dynamic => {
                let mass = fixture.density * fixture.shape.area();
                // Massless dynamic bodies behave as unit mass
                if mass > f32::EPSILON { 1.0 / mass } else { 1.0 }
            }
        };
        Self {
            body_type: def.body_type,
            position: def.position,
            rotation: def.rotation,
            velocity: match def.body_type {
                BodyType::Static => Vec2::ZERO,
                BodyType::Dynamic => def.velocity,
            },
            fixture: *fixture,
            inv_mass,
            user_data: def.user_data,
        }
    }

    fn view(&self, handle: BodyHandle) -> FixtureView {
        FixtureView {
            body: handle,
            category: self.fixture.category,
            user_data: self.user_data,
        }
    }
}

/// One overlapping pair found during a step
#[derive(Debug, Clone)]
struct Manifold {
    a: BodyHandle,
    b: BodyHandle,
    result: CollisionResult,
    sensor: bool,
}

/// Impulse-based 2D world
#[derive(Debug)]
pub struct ArcadeWorld {
    gravity: Vec2,
    bodies: BTreeMap<BodyHandle, Body>,
    /// Pairs touching at the end of the previous step, with their last contact point
    touching: BTreeMap<(BodyHandle, BodyHandle), Vec2>,
    next_handle: u32,
    stepping: bool,
}

impl ArcadeWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            bodies: BTreeMap::new(),
            touching: BTreeMap::new(),
            next_handle: 0,
            stepping: false,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Number of pairs currently in contact
    pub fn contact_count(&self) -> usize {
        self.touching.len()
    }

    pub fn is_stepping(&self) -> bool {
        self.stepping
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            if body.body_type == BodyType::Dynamic {
                body.velocity += gravity * dt;
                body.position += body.velocity * dt;
            }
        }
    }

    /// Overlapping, mask-compatible pairs with at least one dynamic body
    fn find_manifolds(&self) -> Vec<Manifold> {
        let bodies: Vec<(&BodyHandle, &Body)> = self.bodies.iter().collect();
        let mut manifolds = Vec::new();

        for (i, (ha, a)) in bodies.iter().enumerate() {
            for (hb, b) in bodies.iter().skip(i + 1) {
                if a.body_type == BodyType::Static && b.body_type == BodyType::Static {
                    continue;
                }
                if !should_collide(a.fixture.category, a.fixture.mask, b.fixture.category, b.fixture.mask) {
                    continue;
                }
                let result = shape_collision(&a.fixture.shape, a.position, &b.fixture.shape, b.position);
                if result.hit {
                    manifolds.push(Manifold {
                        a: **ha,
                        b: **hb,
                        result,
                        sensor: a.fixture.is_sensor || b.fixture.is_sensor,
                    });
                }
            }
        }
        manifolds
    }

    fn report_contacts(&mut self, manifolds: &[Manifold], listener: &mut dyn ContactListener) {
        let mut now = BTreeMap::new();

        for m in manifolds {
            let pair = (m.a, m.b);
            now.insert(pair, m.result.point);
            if self.touching.contains_key(&pair) {
                continue;
            }
            let (Some(a), Some(b)) = (self.bodies.get(&m.a), self.bodies.get(&m.b)) else {
                continue;
            };
            let impact_speed = (a.velocity - b.velocity).dot(m.result.normal).abs();
            listener.begin_contact(&Contact {
                a: a.view(m.a),
                b: b.view(m.b),
                impact_speed,
                point: m.result.point,
            });
        }

        for (pair, point) in &self.touching {
            if now.contains_key(pair) {
                continue;
            }
            if let (Some(a), Some(b)) = (self.bodies.get(&pair.0), self.bodies.get(&pair.1)) {
                listener.end_contact(&Contact {
                    a: a.view(pair.0),
                    b: b.view(pair.1),
                    impact_speed: 0.0,
                    point: *point,
                });
            }
        }

        self.touching = now;
    }

    fn resolve_velocity(&mut self, m: &Manifold) {
        let (Some(a), Some(b)) = (self.bodies.get(&m.a), self.bodies.get(&m.b)) else {
            return;
        };
        let inv_sum = a.inv_mass + b.inv_mass;
        if inv_sum <= 0.0 {
            return;
        }

        let n = m.result.normal;
        let relative = b.velocity - a.velocity;
        let closing = relative.dot(n);
        if closing > 0.0 {
            // Already separating
            return;
        }

        let restitution = a.fixture.restitution.max(b.fixture.restitution);
        let friction = (a.fixture.friction * b.fixture.friction).sqrt();

        let j = -(1.0 + restitution) * closing / inv_sum;
        let tangent = (relative - closing * n).normalize_or_zero();
        let jt = (-relative.dot(tangent) / inv_sum).clamp(-j * friction, j * friction);
        let impulse = n * j + tangent * jt;

        let (inv_a, inv_b) = (a.inv_mass, b.inv_mass);
        if let Some(a) = self.bodies.get_mut(&m.a) {
            a.velocity -= impulse * inv_a;
        }
        if let Some(b) = self.bodies.get_mut(&m.b) {
            b.velocity += impulse * inv_b;
        }
    }

    fn resolve_position(&mut self, m: &Manifold) {
        let (Some(a), Some(b)) = (self.bodies.get(&m.a), self.bodies.get(&m.b)) else {
            return;
        };
        let inv_sum = a.inv_mass + b.inv_mass;
        if inv_sum <= 0.0 {
            return;
        }

        // Re-test at current positions; earlier iterations may have separated the pair
        let current = shape_collision(&a.fixture.shape, a.position, &b.fixture.shape, b.position);
        if !current.hit {
            return;
        }
        let depth = (current.penetration - LINEAR_SLOP).max(0.0);
        let correction = current.normal * (depth * CORRECTION_FACTOR / inv_sum);

        let (inv_a, inv_b) = (a.inv_mass, b.inv_mass);
        if let Some(a) = self.bodies.get_mut(&m.a) {
            a.position -= correction * inv_a;
        }
        if let Some(b) = self.bodies.get_mut(&m.b) {
            b.position += correction * inv_b;
        }
    }
}

impl Default for ArcadeWorld {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, crate::consts::GRAVITY_Y))
    }
}

impl PhysicsWorld for ArcadeWorld {
    fn create_body(&mut self, body: &BodyDef, fixture: &FixtureDef) -> BodyHandle {
        assert!(!self.stepping, "create_body called while the world is stepping");
        self.next_handle += 1;
        let handle = BodyHandle(self.next_handle);
        self.bodies.insert(handle, Body::new(body, fixture));
        handle
    }

    fn destroy_body(&mut self, handle: BodyHandle) -> bool {
        assert!(!self.stepping, "destroy_body called while the world is stepping");
        if self.bodies.remove(&handle).is_none() {
            return false;
        }
        self.touching.retain(|(a, b), _| *a != handle && *b != handle);
        true
    }

    fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }

    fn set_user_data(&mut self, handle: BodyHandle, data: Option<EntityId>) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.user_data = data;
        }
    }

    fn user_data(&self, handle: BodyHandle) -> Option<EntityId> {
        self.bodies.get(&handle).and_then(|b| b.user_data)
    }

    fn body_position(&self, handle: BodyHandle) -> Option<(Vec2, f32)> {
        self.bodies.get(&handle).map(|b| (b.position, b.rotation))
    }

    fn body_velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.velocity)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    fn step(
        &mut self,
        dt: f32,
        velocity_iterations: u32,
        position_iterations: u32,
        listener: &mut dyn ContactListener,
    ) {
        assert!(!self.stepping, "step re-entered");
        self.stepping = true;

        self.integrate(dt);
        let manifolds = self.find_manifolds();
        self.report_contacts(&manifolds, listener);

        let solid: Vec<&Manifold> = manifolds.iter().filter(|m| !m.sensor).collect();
        for _ in 0..velocity_iterations {
            for m in &solid {
                self.resolve_velocity(m);
            }
        }
        for _ in 0..position_iterations {
            for m in &solid {
                self.resolve_position(m);
            }
        }

        self.stepping = false;
    }
}
