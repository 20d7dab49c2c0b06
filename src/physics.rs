//! Collidable bodies: shape representation, overlap tests, collision response.
//!
//! Every simulated body carries a [`Physics`] component.  The model is
//! deliberately small:
//!
//! | Pair                         | `collides_with`                          | `resolve`                       |
//! |------------------------------|------------------------------------------|---------------------------------|
//! | circle / circle              | centre distance `<` radius sum           | push the mobile one out if exactly one is anchored |
//! | circle / rect                | single projected probe point in the rect | no-op                           |
//! | rect / rect                  | strict AABB overlap                      | no-op                           |
//! | anything / triangle          | always `false`                           | no-op                           |
//!
//! The circle/rect probe under-detects corner overlaps; gameplay is tuned
//! around that, so it stays.

use bevy::prelude::*;

use crate::constants::COINCIDENT_EPSILON;
use crate::object::GameObject;

/// Collision footprint of a body, centred on its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    /// Axis-aligned rectangle.
    Rect { width: f32, height: f32 },
    /// Declared for content authors but never collides.
    Triangle,
}

impl Shape {
    /// Widest extent of the footprint (used to scale spawner-sized particles).
    pub fn diameter(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => radius * 2.0,
            Shape::Rect { width, height } => width.max(height),
            Shape::Triangle => 0.0,
        }
    }
}

/// Position, velocity, heading and footprint of a simulated body.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Physics {
    pub position: Vec2,
    /// World units per tick.
    pub velocity: Vec2,
    /// Heading in radians, counter-clockwise from +X.
    pub facing: f32,
    pub shape: Shape,
    /// Infinite mass: never displaced by collision resolution.
    pub anchored: bool,
}

impl Physics {
    pub fn new(position: Vec2, shape: Shape) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            facing: 0.0,
            shape,
            anchored: false,
        }
    }

    pub fn circle(position: Vec2, radius: f32) -> Self {
        Self::new(position, Shape::Circle { radius })
    }

    pub fn rect(position: Vec2, width: f32, height: f32) -> Self {
        Self::new(position, Shape::Rect { width, height })
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_facing(mut self, facing: f32) -> Self {
        self.facing = facing;
        self
    }

    pub fn anchored(mut self) -> Self {
        self.anchored = true;
        self
    }

    /// Unit vector along the current heading.
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.facing)
    }

    /// Advance position by one tick of velocity.
    pub fn integrate(&mut self) {
        self.position += self.velocity;
    }

    /// Overlap test against another body; see the module table for the rules.
    pub fn collides_with(&self, other: &Physics) -> bool {
        match (self.shape, other.shape) {
            (Shape::Triangle, _) | (_, Shape::Triangle) => false,
            (Shape::Circle { radius: r1 }, Shape::Circle { radius: r2 }) => {
                self.position.distance(other.position) < r1 + r2
            }
            (Shape::Circle { radius }, Shape::Rect { width, height }) => {
                circle_probe_hits_rect(self.position, radius, other.position, width, height)
            }
            (Shape::Rect { width, height }, Shape::Circle { radius }) => {
                circle_probe_hits_rect(other.position, radius, self.position, width, height)
            }
            (
                Shape::Rect {
                    width: w1,
                    height: h1,
                },
                Shape::Rect {
                    width: w2,
                    height: h2,
                },
            ) => {
                let d = (self.position - other.position).abs();
                d.x < (w1 + w2) * 0.5 && d.y < (h1 + h2) * 0.5
            }
        }
    }

    /// Separate two overlapping bodies.
    ///
    /// Only a circle pair with exactly one anchored member is resolved: the
    /// mobile circle is pushed out by the overlap depth, its velocity is scaled
    /// by `restitution`, and its facing follows the new heading.  Every other
    /// combination (both mobile, both anchored, any rectangle or triangle) is
    /// left untouched.
    pub fn resolve(&mut self, other: &mut Physics, restitution: f32) {
        if self.anchored == other.anchored {
            return;
        }
        let (mobile, anchor) = if self.anchored {
            (other, &*self)
        } else {
            (self, &*other)
        };
        let (Shape::Circle { radius: rm }, Shape::Circle { radius: ra }) =
            (mobile.shape, anchor.shape)
        else {
            return;
        };

        let offset = mobile.position - anchor.position;
        let dist = offset.length();
        let overlap = rm + ra - dist;
        if overlap <= 0.0 {
            return;
        }
        let normal = if dist > COINCIDENT_EPSILON {
            offset / dist
        } else {
            Vec2::X
        };

        mobile.position += normal * overlap;
        mobile.velocity *= restitution;
        if mobile.velocity.length_squared() > 0.0 {
            mobile.facing = mobile.velocity.to_angle();
        }
    }
}

/// Project a point from the circle centre toward the rectangle centre, one
/// radius out, and test only that point for containment.
fn circle_probe_hits_rect(
    center: Vec2,
    radius: f32,
    rect_center: Vec2,
    width: f32,
    height: f32,
) -> bool {
    let toward = (rect_center - center).normalize_or_zero();
    let probe = center + toward * radius;
    let d = (probe - rect_center).abs();
    d.x < width * 0.5 && d.y < height * 0.5
}

/// Wrap an angle into `(-π, π]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % std::f32::consts::TAU;
    if a > std::f32::consts::PI {
        a -= std::f32::consts::TAU;
    } else if a <= -std::f32::consts::PI {
        a += std::f32::consts::TAU;
    }
    a
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Advance every active body by its velocity.
pub fn integrate_system(mut q: Query<(&GameObject, &mut Physics)>) {
    for (object, mut body) in q.iter_mut() {
        if object.is_active() {
            body.integrate();
        }
    }
}

/// Pairwise overlap pass over active bodies.
///
/// Runs after integration so contacts see this tick's positions.  Pairs of
/// anchored bodies are skipped before `resolve` is ever called.
pub fn body_collision_system(
    mut q: Query<(&GameObject, &mut Physics)>,
    config: Res<crate::config::SimConfig>,
) {
    let mut pairs = q.iter_combinations_mut();
    while let Some([(obj_a, mut a), (obj_b, mut b)]) = pairs.fetch_next() {
        if !obj_a.is_active() || !obj_b.is_active() {
            continue;
        }
        if a.anchored && b.anchored {
            continue;
        }
        if a.collides_with(&b) {
            a.resolve(&mut b, config.restitution);
        }
    }
}
