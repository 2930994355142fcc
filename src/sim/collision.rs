//! Narrow-phase collision tests for circles and axis-aligned boxes
//!
//! Every test reports the normal pointing from the first shape toward the
//! second, so pushing B along `normal` (and A against it) separates them.

use glam::Vec2;

use super::world::Shape;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Approximate contact point (if hit)
    pub point: Vec2,
    /// Unit normal from A toward B
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }

    /// Same contact seen from B
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Dispatch on the shape pair
pub fn shape_collision(shape_a: &Shape, pos_a: Vec2, shape_b: &Shape, pos_b: Vec2) -> CollisionResult {
    match (*shape_a, *shape_b) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => circle_circle(pos_a, ra, pos_b, rb),
        (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
            circle_rect(pos_a, radius, pos_b, half_extents)
        }
        (Shape::Rect { half_extents }, Shape::Circle { radius }) => {
            circle_rect(pos_b, radius, pos_a, half_extents).flipped()
        }
        (Shape::Rect { half_extents: ha }, Shape::Rect { half_extents: hb }) => rect_rect(pos_a, ha, pos_b, hb),
    }
}

/// Circle vs circle
pub fn circle_circle(pos_a: Vec2, radius_a: f32, pos_b: Vec2, radius_b: f32) -> CollisionResult {
    let delta = pos_b - pos_a;
    let dist_sq = delta.length_squared();
    let reach = radius_a + radius_b;

    if dist_sq >= reach * reach {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    // Concentric circles: pick an arbitrary but stable axis
    let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::Y };

    CollisionResult {
        hit: true,
        point: pos_a + normal * radius_a,
        normal,
        penetration: reach - dist,
    }
}

/// Circle vs axis-aligned box; normal points from the circle toward the box
pub fn circle_rect(center: Vec2, radius: f32, rect_pos: Vec2, half_extents: Vec2) -> CollisionResult {
    let local = center - rect_pos;
    let clamped = local.clamp(-half_extents, half_extents);
    let closest = rect_pos + clamped;
    let offset = center - closest;
    let dist_sq = offset.length_squared();

    if dist_sq > f32::EPSILON {
        if dist_sq >= radius * radius {
            return CollisionResult::miss();
        }
        let dist = dist_sq.sqrt();
        // Outward normal from box to circle, flipped to point circle -> box
        let outward = offset / dist;
        return CollisionResult {
            hit: true,
            point: closest,
            normal: -outward,
            penetration: radius - dist,
        };
    }

    // Centre is inside the box: push out along the axis of least overlap
    let gap = half_extents - local.abs();
    let outward = if gap.x < gap.y {
        Vec2::new(local.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, local.y.signum())
    };
    let penetration = gap.x.min(gap.y) + radius;

    CollisionResult {
        hit: true,
        point: closest,
        normal: -outward,
        penetration,
    }
}

/// Axis-aligned box vs box
pub fn rect_rect(pos_a: Vec2, half_a: Vec2, pos_b: Vec2, half_b: Vec2) -> CollisionResult {
    let delta = pos_b - pos_a;
    let overlap = half_a + half_b - delta.abs();

    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return CollisionResult::miss();
    }

    let (normal, penetration) = if overlap.x < overlap.y {
        (Vec2::new(delta.x.signum(), 0.0), overlap.x)
    } else {
        (Vec2::new(0.0, delta.y.signum()), overlap.y)
    };

    CollisionResult {
        hit: true,
        point: pos_a + delta * 0.5,
        normal,
        penetration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_circle_overlap() {
        let result = circle_circle(Vec2::ZERO, 10.0, Vec2::new(15.0, 0.0), 10.0);
        assert!(result.hit);
        assert!((result.penetration - 5.0).abs() < 1e-4);
        assert!((result.normal - Vec2::X).length() < 1e-4);
    }

    #[test]
    fn test_circle_circle_touching_is_miss() {
        let result = circle_circle(Vec2::ZERO, 10.0, Vec2::new(20.0, 0.0), 10.0);
        assert!(!result.hit);
    }

    #[test]
    fn test_circle_resting_on_box() {
        // Box top at y = 0, circle of radius 12 centred at y = 10
        let result = circle_rect(Vec2::new(0.0, 10.0), 12.0, Vec2::new(0.0, -50.0), Vec2::new(100.0, 50.0));
        assert!(result.hit);
        // Normal points from circle down into the box
        assert!(result.normal.y < -0.99);
        assert!((result.penetration - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_circle_centre_inside_box() {
        let result = circle_rect(Vec2::new(0.0, -5.0), 4.0, Vec2::ZERO, Vec2::new(100.0, 10.0));
        assert!(result.hit);
        assert!(result.normal.y > 0.99);
        assert!((result.penetration - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_rect_rect_axis_of_least_overlap() {
        let result = rect_rect(Vec2::ZERO, Vec2::splat(10.0), Vec2::new(18.0, 2.0), Vec2::splat(10.0));
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::X);
        assert!((result.penetration - 2.0).abs() < 1e-4);

        let miss = rect_rect(Vec2::ZERO, Vec2::splat(10.0), Vec2::new(25.0, 0.0), Vec2::splat(10.0));
        assert!(!miss.hit);
    }

    #[test]
    fn test_shape_collision_flips_for_rect_first() {
        let rect = Shape::Rect { half_extents: Vec2::splat(10.0) };
        let circle = Shape::Circle { radius: 5.0 };
        let ab = shape_collision(&rect, Vec2::ZERO, &circle, Vec2::new(12.0, 0.0));
        let ba = shape_collision(&circle, Vec2::new(12.0, 0.0), &rect, Vec2::ZERO);
        assert!(ab.hit && ba.hit);
        assert!((ab.normal + ba.normal).length() < 1e-4);
        assert!(ab.normal.x > 0.99);
    }
}
