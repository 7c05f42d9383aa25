//! Selection and gizmo attachment
//!
//! The [`SelectionController`] turns a raw pick into the object that should
//! be manipulated and drives the gizmos. Its state is `Detached` or
//! `Attached(node)`.
//!
//! Picks resolve as follows:
//! - reserved scenery (ground, sky) is never manipulable
//! - a node with its own custom id is an asset root and is returned as is
//! - a node with a root asset id is a child; the root is looked up in the
//!   registry
//! - anything else is not managed

use std::time::Duration;

use blockstage_math::Vec3;

use crate::camera::{Camera, CameraCapability};
use crate::camera_transition::{CameraTransition, DEFAULT_TRANSITION_DURATION};
use crate::gizmo::GizmoSet;
use crate::node::{NodeKey, ObjectKind};
use crate::registry::Registry;
use crate::scene::{is_reserved_name, Scene};

/// Resolve a picked node to the object that should be manipulated
pub fn resolve_manipulation_target(scene: &Scene, registry: &Registry, picked: NodeKey) -> Option<NodeKey> {
    let node = scene.node(picked)?;
    if is_reserved_name(&node.name) {
        return None;
    }
    if node.metadata.custom_id.is_some() {
        return Some(picked);
    }
    if let Some(root_id) = &node.metadata.root_asset_id {
        let root = registry.lookup(root_id);
        if root.is_none() {
            log::warn!("Node '{}' points at unregistered root {}", node.name, root_id);
        }
        return root;
    }
    log::warn!("Node '{}' has no identity metadata; not manageable", node.name);
    None
}

/// Attaches and detaches gizmos, and focuses the camera on new selections
#[derive(Debug)]
pub struct SelectionController {
    attached: Option<NodeKey>,
    last_focused: Option<NodeKey>,
    transition: Option<CameraTransition>,
    transition_duration: Duration,
    keyboard_observer: bool,
    pointer_wired: bool,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSITION_DURATION)
    }
}

impl SelectionController {
    /// Create a controller with its pointer observer wired
    pub fn new(transition_duration: Duration) -> Self {
        Self {
            attached: None,
            last_focused: None,
            transition: None,
            transition_duration,
            keyboard_observer: false,
            pointer_wired: true,
        }
    }

    /// Currently attached node
    pub fn attached(&self) -> Option<NodeKey> {
        self.attached
    }

    /// Whether the delete-key observer is installed
    pub fn has_keyboard_observer(&self) -> bool {
        self.keyboard_observer
    }

    /// Whether the pointer observer is wired
    pub fn is_pointer_wired(&self) -> bool {
        self.pointer_wired
    }

    /// Remove the pointer observer
    pub fn unwire_pointer(&mut self) {
        self.pointer_wired = false;
    }

    /// Whether a camera focus move is in flight
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Attach the gizmos to `key`
    ///
    /// Orbit cameras glide toward a newly selected object, keeping their
    /// offset from the target.
    pub fn attach(&mut self, scene: &Scene, gizmos: &mut GizmoSet, key: NodeKey) {
        let Some(world) = scene.world_position(key) else {
            log::warn!("Cannot attach to missing node {:?}", key);
            return;
        };
        gizmos.attach(key);
        self.attached = Some(key);
        self.keyboard_observer = true;

        if self.last_focused != Some(key) {
            self.focus_camera(&scene.camera, world);
        }
        self.last_focused = Some(key);
    }

    fn focus_camera(&mut self, camera: &Camera, world: Vec3) {
        if camera.capability() != CameraCapability::OrbitTarget {
            return;
        }
        self.transition = CameraTransition::focus(camera, world, self.transition_duration);
    }

    /// Clear the gizmo targets and the attached node
    pub fn detach(&mut self, gizmos: &mut GizmoSet) {
        gizmos.detach();
        self.attached = None;
        self.keyboard_observer = false;
    }

    /// Delete the attached object if it is static
    ///
    /// Static objects are unregistered and disposed along with their physics
    /// bodies. Dynamic objects belong to the block program and are left
    /// alone. Returns true if something was deleted.
    pub fn delete_attached(&mut self, scene: &mut Scene, registry: &mut Registry, gizmos: &mut GizmoSet) -> bool {
        if !self.keyboard_observer {
            return false;
        }
        let Some(key) = self.attached else {
            return false;
        };
        let Some(node) = scene.node(key) else {
            self.detach(gizmos);
            return false;
        };

        match node.metadata.kind {
            Some(ObjectKind::Static) => {
                if let Some(id) = node.metadata.custom_id.clone() {
                    registry.unregister(&id);
                    log::info!("Deleted static object {}", id);
                }
                scene.dispose_node(key);
                self.detach(gizmos);
                true
            }
            Some(ObjectKind::Dynamic) => {
                log::debug!("Delete ignored: dynamic objects are owned by the program");
                false
            }
            _ => false,
        }
    }

    /// Advance the camera focus move
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        if let Some(transition) = self.transition.as_mut() {
            if transition.update(camera, dt) {
                self.transition = None;
            }
        }
    }
}
