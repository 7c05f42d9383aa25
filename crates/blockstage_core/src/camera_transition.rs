//! Smooth camera moves toward a new selection
//!
//! A transition interpolates the camera's target and position with an
//! ease-in-out curve over a fixed duration. Progress is driven by the
//! frame delta passed to [`CameraTransition::update`].

use std::time::Duration;

use blockstage_math::easing::ease_in_out_cubic;

use crate::camera::{Camera, CameraPose};

/// Default duration of a focus transition
pub const DEFAULT_TRANSITION_DURATION: Duration = Duration::from_millis(300);

/// An in-flight camera move
#[derive(Clone, Debug)]
pub struct CameraTransition {
    from: CameraPose,
    to: CameraPose,
    duration: Duration,
    elapsed: Duration,
}

impl CameraTransition {
    /// Create a transition between two poses
    pub fn new(from: CameraPose, to: CameraPose, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
        }
    }

    /// Transition that re-centers an orbit camera on `focus`, keeping the
    /// camera's offset from its target
    ///
    /// Returns None for cameras without an orbit target.
    pub fn focus(camera: &Camera, focus: blockstage_math::Vec3, duration: Duration) -> Option<Self> {
        let from = camera.pose();
        let target = from.target?;
        let offset = from.position - target;
        let to = CameraPose {
            target: Some(focus),
            position: focus + offset,
        };
        Some(Self::new(from, to, duration))
    }

    /// Advance by `dt` and apply the interpolated pose to the camera
    ///
    /// Returns true when the transition is complete.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) -> bool {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = ease_in_out_cubic(self.progress());
        let target = match (self.from.target, self.to.target) {
            (Some(a), Some(b)) => Some(a.lerp(b, t)),
            (_, b) => b,
        };
        camera.set_pose(CameraPose {
            target,
            position: self.from.position.lerp(self.to.position, t),
        });
        self.is_complete()
    }

    /// Linear progress from 0.0 (start) to 1.0 (complete)
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Check if the transition is complete
    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Pose the transition ends at
    pub fn destination(&self) -> CameraPose {
        self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockstage_math::Vec3;

    #[test]
    fn test_focus_requires_orbit_camera() {
        let camera = Camera::free(Vec3::ZERO, 0.0, 0.0);
        assert!(CameraTransition::focus(&camera, Vec3::ONE, DEFAULT_TRANSITION_DURATION).is_none());
    }

    #[test]
    fn test_focus_keeps_offset() {
        let camera = Camera::default();
        let offset = camera.position() - camera.target().unwrap();
        let transition = CameraTransition::focus(&camera, Vec3::new(4.0, 0.0, 0.0), DEFAULT_TRANSITION_DURATION).unwrap();
        let dest = transition.destination();
        assert_eq!(dest.target, Some(Vec3::new(4.0, 0.0, 0.0)));
        assert!((dest.position - Vec3::new(4.0, 0.0, 0.0) - offset).length() < 1e-5);
    }

    #[test]
    fn test_transition_does_not_snap() {
        let mut camera = Camera::default();
        let focus = Vec3::new(10.0, 0.0, 0.0);
        let mut transition = CameraTransition::focus(&camera, focus, Duration::from_millis(300)).unwrap();

        let done = transition.update(&mut camera, Duration::from_millis(50));
        assert!(!done);
        let target = camera.target().unwrap();
        assert!(target.x > 0.0 && target.x < 10.0);
    }

    #[test]
    fn test_transition_completes_at_destination() {
        let mut camera = Camera::default();
        let focus = Vec3::new(2.0, 1.0, -3.0);
        let mut transition = CameraTransition::focus(&camera, focus, Duration::from_millis(300)).unwrap();

        assert!(!transition.update(&mut camera, Duration::from_millis(100)));
        assert!(!transition.update(&mut camera, Duration::from_millis(100)));
        assert!(transition.update(&mut camera, Duration::from_millis(200)));
        assert_eq!(transition.progress(), 1.0);
        assert!((camera.target().unwrap() - focus).length() < 1e-4);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let mut camera = Camera::default();
        let mut transition = CameraTransition::focus(&camera, Vec3::ONE, Duration::ZERO).unwrap();
        assert!(transition.update(&mut camera, Duration::ZERO));
    }
}
