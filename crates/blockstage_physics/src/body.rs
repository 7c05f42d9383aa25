//! Rigid bodies

use blockstage_math::{Aabb, Vec3};
use slotmap::new_key_type;

new_key_type! {
    /// Key to a rigid body in the physics world
    ///
    /// Generational: once a body is removed, stale keys return None instead
    /// of pointing at whatever reuses the slot.
    pub struct BodyKey;
}

/// A box-shaped rigid body
#[derive(Clone, Debug)]
pub struct RigidBody {
    /// Center of the body in world space
    pub position: Vec3,
    /// Velocity (units per second)
    pub velocity: Vec3,
    /// Half extents of the collision box
    pub half_extents: Vec3,
    /// Whether gravity applies to this body
    pub affected_by_gravity: bool,
    /// Static bodies never move on their own
    pub is_static: bool,
}

impl RigidBody {
    /// Create a dynamic box body
    pub fn new_box(position: Vec3, half_extents: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            half_extents: half_extents.abs(),
            affected_by_gravity: true,
            is_static: false,
        }
    }

    /// Create a static box body
    pub fn new_static_box(position: Vec3, half_extents: Vec3) -> Self {
        Self::new_box(position, half_extents).with_static(true)
    }

    /// Set the velocity of this body
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Mark this body as static (also disables gravity)
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        if is_static {
            self.affected_by_gravity = false;
        }
        self
    }

    /// Teleport the body, clearing its velocity
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
    }

    /// World-space bounds of the body
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(self.position, self.half_extents)
    }
}
