//! Math types for the blockstage editor
//!
//! Vector, quaternion and matrix types come from [`glam`]; this crate adds
//! the geometric queries the editor needs on top of them.
//!
//! ## Core Types
//!
//! - [`Ray`] - Half-line used for picking and placement raycasts
//! - [`Plane`] - Infinite plane defined by a point and a normal
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`easing`] - Easing curves for camera transitions

mod ray;
mod aabb;
pub mod easing;

pub use ray::{Ray, Plane};
pub use aabb::Aabb;

pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};

/// Squared distance between two screen-space points
#[inline]
pub fn screen_distance_sq(a: Vec2, b: Vec2) -> f32 {
    (a - b).length_squared()
}
