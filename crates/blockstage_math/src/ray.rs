//! Rays and planes

use glam::Vec3;

/// A half-line with a normalized direction
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Start point of the ray
    pub origin: Vec3,
    /// Unit direction of the ray
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction
    ///
    /// A zero direction falls back to -Z so the ray stays usable.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Z),
        }
    }

    /// Point at parameter `t` along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the plane, if the ray hits it in front of the origin
    pub fn intersect_plane(&self, plane: &Plane) -> Option<f32> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() <= f32::EPSILON {
            return None;
        }
        let t = (plane.point - self.origin).dot(plane.normal) / denom;
        (t >= 0.0).then_some(t)
    }
}

/// An infinite plane through `point` with unit `normal`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Any point on the plane
    pub point: Vec3,
    /// Unit normal of the plane
    pub normal: Vec3,
}

impl Plane {
    /// Create a plane from a point and a normal (normalized here)
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.try_normalize().unwrap_or(Vec3::Y),
        }
    }

    /// Horizontal plane at the given height
    pub fn horizontal(y: f32) -> Self {
        Self::from_point_normal(Vec3::new(0.0, y, 0.0), Vec3::Y)
    }

    /// Signed distance from a point to the plane
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        (p - self.point).dot(self.normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ray_hits_ground_plane() {
        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let t = ray.intersect_plane(&Plane::horizontal(0.0)).unwrap();
        assert!((t - 10.0).abs() < 1e-5);
        assert!(ray.at(t).y.abs() < 1e-5);
    }

    #[test]
    fn test_parallel_ray_misses_plane() {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(ray.intersect_plane(&Plane::horizontal(0.0)).is_none());
    }

    #[test]
    fn test_plane_behind_ray_is_missed() {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        assert!(ray.intersect_plane(&Plane::horizontal(0.0)).is_none());
    }

    #[test]
    fn test_signed_distance() {
        let plane = Plane::horizontal(2.0);
        assert_eq!(plane.signed_distance(Vec3::new(0.0, 5.0, 0.0)), 3.0);
    }
}
