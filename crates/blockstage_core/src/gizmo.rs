//! Transform gizmos
//!
//! A [`GizmoSet`] bundles the utility layer the gizmos draw on, a bounding
//! box gizmo and a position (translation) gizmo. Both gizmos always share
//! the same target.

use blockstage_math::{Plane, Vec2, Vec3};
use thiserror::Error;

use crate::node::NodeKey;
use crate::scene::Scene;

/// Default screen radius of the position gizmo handle, in pixels
pub const DEFAULT_HANDLE_RADIUS: f32 = 24.0;

/// Errors from gizmo operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GizmoError {
    /// Disposing something that is already gone
    #[error("{0} already disposed")]
    AlreadyDisposed(&'static str),
}

/// Overlay layer the gizmos render into
#[derive(Debug, Default)]
pub struct UtilityLayer {
    disposed: bool,
}

impl UtilityLayer {
    /// Dispose the layer
    pub fn dispose(&mut self) -> Result<(), GizmoError> {
        if self.disposed {
            return Err(GizmoError::AlreadyDisposed("utility layer"));
        }
        self.disposed = true;
        Ok(())
    }

    /// Whether the layer has been disposed
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Bounding box drawn around the target
#[derive(Debug, Default)]
pub struct BoundingBoxGizmo {
    target: Option<NodeKey>,
    disposed: bool,
}

impl BoundingBoxGizmo {
    /// Current target
    pub fn target(&self) -> Option<NodeKey> {
        self.target
    }

    /// Dispose the gizmo
    pub fn dispose(&mut self) -> Result<(), GizmoError> {
        if self.disposed {
            return Err(GizmoError::AlreadyDisposed("bounding box gizmo"));
        }
        self.target = None;
        self.disposed = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct GizmoDrag {
    plane: Plane,
    grab_offset: Vec3,
}

/// Translation handle drawn at the target's position
#[derive(Debug)]
pub struct PositionGizmo {
    target: Option<NodeKey>,
    handle_radius: f32,
    drag: Option<GizmoDrag>,
    disposed: bool,
}

impl PositionGizmo {
    fn new(handle_radius: f32) -> Self {
        Self {
            target: None,
            handle_radius,
            drag: None,
            disposed: false,
        }
    }

    /// Current target
    pub fn target(&self) -> Option<NodeKey> {
        self.target
    }

    /// Dispose the gizmo
    pub fn dispose(&mut self) -> Result<(), GizmoError> {
        if self.disposed {
            return Err(GizmoError::AlreadyDisposed("position gizmo"));
        }
        self.target = None;
        self.drag = None;
        self.disposed = true;
        Ok(())
    }
}

/// The gizmo widgets of one scene session
#[derive(Debug)]
pub struct GizmoSet {
    layer: UtilityLayer,
    bounding_box: BoundingBoxGizmo,
    position: PositionGizmo,
}

impl Default for GizmoSet {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLE_RADIUS)
    }
}

impl GizmoSet {
    /// Create a fresh layer and gizmos
    pub fn new(handle_radius: f32) -> Self {
        Self {
            layer: UtilityLayer::default(),
            bounding_box: BoundingBoxGizmo::default(),
            position: PositionGizmo::new(handle_radius),
        }
    }

    /// Point both gizmos at `key`
    pub fn attach(&mut self, key: NodeKey) {
        if self.position.disposed || self.bounding_box.disposed {
            log::warn!("Ignoring gizmo attach after dispose");
            return;
        }
        self.bounding_box.target = Some(key);
        self.position.target = Some(key);
        self.position.drag = None;
    }

    /// Clear both gizmo targets
    pub fn detach(&mut self) {
        self.bounding_box.target = None;
        self.position.target = None;
        self.position.drag = None;
    }

    /// Current target of the position gizmo
    pub fn target(&self) -> Option<NodeKey> {
        self.position.target
    }

    /// The bounding box gizmo
    pub fn bounding_box(&self) -> &BoundingBoxGizmo {
        &self.bounding_box
    }

    /// The position gizmo
    pub fn position(&self) -> &PositionGizmo {
        &self.position
    }

    /// Whether `screen` lands on the position handle
    pub fn hit_test(&self, scene: &Scene, screen: Vec2) -> bool {
        let Some(target) = self.position.target else {
            return false;
        };
        let Some(world) = scene.world_position(target) else {
            return false;
        };
        let Some(projected) = scene.camera.project(world) else {
            return false;
        };
        let radius = self.position.handle_radius;
        blockstage_math::screen_distance_sq(projected, screen) <= radius * radius
    }

    /// Start dragging the target if `screen` is on the handle
    pub fn begin_drag(&mut self, scene: &Scene, screen: Vec2) -> bool {
        if !self.hit_test(scene, screen) {
            return false;
        }
        let Some(world) = self.position.target.and_then(|t| scene.world_position(t)) else {
            return false;
        };
        let plane = Plane::from_point_normal(world, scene.camera.forward());
        let ray = scene.camera.screen_ray(screen);
        let grab_offset = ray
            .intersect_plane(&plane)
            .map(|t| world - ray.at(t))
            .unwrap_or(Vec3::ZERO);
        self.position.drag = Some(GizmoDrag { plane, grab_offset });
        true
    }

    /// Move the target with the pointer during a drag
    pub fn drag_to(&mut self, scene: &mut Scene, screen: Vec2) {
        let (Some(drag), Some(target)) = (self.position.drag, self.position.target) else {
            return;
        };
        let ray = scene.camera.screen_ray(screen);
        let Some(t) = ray.intersect_plane(&drag.plane) else {
            return;
        };
        let Some(current_world) = scene.world_position(target) else {
            self.position.drag = None;
            return;
        };
        let delta = ray.at(t) + drag.grab_offset - current_world;
        let Some(local) = scene.node(target).map(|n| n.transform.position) else {
            return;
        };
        scene.set_position(target, local + delta);
    }

    /// Finish a drag
    pub fn end_drag(&mut self) -> bool {
        self.position.drag.take().is_some()
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.position.drag.is_some()
    }

    /// Dispose the bounding box and position gizmos
    pub fn dispose_widgets(&mut self) -> Result<(), GizmoError> {
        let bounding_box = self.bounding_box.dispose();
        let position = self.position.dispose();
        bounding_box.and(position)
    }

    /// Dispose the utility layer
    pub fn dispose_layer(&mut self) -> Result<(), GizmoError> {
        self.layer.dispose()
    }

    /// Whether every part has been disposed
    pub fn is_disposed(&self) -> bool {
        self.layer.is_disposed() && self.bounding_box.disposed && self.position.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn scene_with_box() -> (Scene, NodeKey) {
        let mut scene = Scene::default();
        let key = scene.add_node(Node::with_geometry("box", Vec3::splat(0.5)));
        (scene, key)
    }

    #[test]
    fn test_attach_sets_both_targets() {
        let (_, key) = scene_with_box();
        let mut gizmos = GizmoSet::default();
        gizmos.attach(key);
        assert_eq!(gizmos.bounding_box().target(), Some(key));
        assert_eq!(gizmos.position().target(), Some(key));
        gizmos.detach();
        assert_eq!(gizmos.target(), None);
        assert_eq!(gizmos.bounding_box().target(), None);
    }

    #[test]
    fn test_hit_test_uses_handle_radius() {
        let (scene, key) = scene_with_box();
        let mut gizmos = GizmoSet::default();
        let center = scene.camera.project(Vec3::ZERO).unwrap();

        assert!(!gizmos.hit_test(&scene, center));
        gizmos.attach(key);
        assert!(gizmos.hit_test(&scene, center));
        assert!(gizmos.hit_test(&scene, center + Vec2::new(20.0, 0.0)));
        assert!(!gizmos.hit_test(&scene, center + Vec2::new(40.0, 0.0)));
    }

    #[test]
    fn test_drag_moves_target() {
        let (mut scene, key) = scene_with_box();
        let mut gizmos = GizmoSet::default();
        gizmos.attach(key);
        let center = scene.camera.project(Vec3::ZERO).unwrap();

        assert!(gizmos.begin_drag(&scene, center));
        gizmos.drag_to(&mut scene, center + Vec2::new(100.0, 0.0));
        assert!(gizmos.end_drag());
        assert!(!gizmos.is_dragging());

        let moved = scene.node(key).unwrap().transform.position;
        assert!(moved.length() > 0.1);
        let reprojected = scene.camera.project(moved).unwrap();
        assert!((reprojected - (center + Vec2::new(100.0, 0.0))).length() < 0.5);
    }

    #[test]
    fn test_begin_drag_off_handle() {
        let (scene, key) = scene_with_box();
        let mut gizmos = GizmoSet::default();
        gizmos.attach(key);
        assert!(!gizmos.begin_drag(&scene, Vec2::new(5.0, 5.0)));
        assert!(!gizmos.is_dragging());
    }

    #[test]
    fn test_double_dispose_errors() {
        let mut gizmos = GizmoSet::default();
        assert!(gizmos.dispose_widgets().is_ok());
        assert_eq!(
            gizmos.dispose_widgets(),
            Err(GizmoError::AlreadyDisposed("bounding box gizmo"))
        );
        assert!(gizmos.dispose_layer().is_ok());
        assert!(gizmos.dispose_layer().is_err());
        assert!(gizmos.is_disposed());
    }
}
