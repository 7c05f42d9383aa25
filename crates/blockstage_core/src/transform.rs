//! Node transforms (position, orientation, scale)

use blockstage_math::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Rotation of a node
///
/// Nodes created from euler angles keep them until something writes a
/// quaternion; readers that need a quaternion call [`Orientation::to_quat`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Orientation {
    /// Euler angles in radians (x = pitch, y = yaw, z = roll), applied Y-X-Z
    Euler(Vec3),
    /// Unit quaternion
    Quaternion(Quat),
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Euler(Vec3::ZERO)
    }
}

impl Orientation {
    /// Convert to a quaternion
    pub fn to_quat(&self) -> Quat {
        match *self {
            Orientation::Euler(angles) => Quat::from_euler(EulerRot::YXZ, angles.y, angles.x, angles.z),
            Orientation::Quaternion(q) => q,
        }
    }
}

/// A node transform relative to its parent
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation
    pub position: Vec3,
    /// Rotation
    #[serde(default)]
    pub orientation: Orientation,
    /// Per-axis scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Identity transform
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Orientation::default(),
            scale: Vec3::ONE,
        }
    }

    /// Transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Transform from position, quaternion and scale
    pub fn from_parts(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            orientation: Orientation::Quaternion(rotation),
            scale,
        }
    }

    /// Set the orientation
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Rotation as a quaternion
    #[inline]
    pub fn rotation(&self) -> Quat {
        self.orientation.to_quat()
    }

    /// Local-to-parent matrix (scale, then rotation, then translation)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.position)
    }

    /// Decompose a matrix back into a transform
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self::from_parts(position, rotation, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let t = Transform::identity();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.rotation(), Quat::IDENTITY);
    }

    #[test]
    fn test_zero_euler_is_exact_identity() {
        let q = Orientation::Euler(Vec3::ZERO).to_quat();
        assert_eq!(q, Quat::IDENTITY);
    }

    #[test]
    fn test_euler_yaw_converts() {
        let q = Orientation::Euler(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0)).to_quat();
        let rotated = q * Vec3::X;
        assert!((rotated - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_matrix_round_trip() {
        let t = Transform::from_parts(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.7),
            Vec3::new(2.0, 2.0, 2.0),
        );
        let back = Transform::from_matrix(&t.to_matrix());
        assert!((back.position - t.position).length() < 1e-5);
        assert!((back.scale - t.scale).length() < 1e-5);
        assert!(back.rotation().angle_between(t.rotation()) < 1e-4);
    }
}
