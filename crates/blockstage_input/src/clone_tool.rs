//! Two-click clone placement
//!
//! The first click picks an object and creates a translucent, unpickable
//! preview that follows the pointer across the ground. The second click
//! commits it as a new static object with its own id and its own copies of
//! the source's materials. Escape or a right click throws the preview away.

use blockstage_core::{tag_descendants, NodeKey, ObjectKind, SceneSession};
use blockstage_math::Vec2;
use winit::event::MouseButton;

use crate::pointer::{PointerEvent, ToolEvent};
use crate::select_tool::resolve_at;

/// Visibility of the preview while it follows the pointer
pub const DEFAULT_PREVIEW_VISIBILITY: f32 = 0.5;

/// State of the clone tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneState {
    /// Waiting for the first click
    Idle,
    /// A preview of `source` follows the pointer
    Previewing { source: NodeKey, preview: NodeKey },
}

/// The clone tool
#[derive(Debug)]
pub struct CloneTool {
    state: CloneState,
    just_committed: bool,
    preview_visibility: f32,
}

impl Default for CloneTool {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_VISIBILITY)
    }
}

impl CloneTool {
    pub fn new(preview_visibility: f32) -> Self {
        Self {
            state: CloneState::Idle,
            just_committed: false,
            preview_visibility,
        }
    }

    /// Current state
    pub fn state(&self) -> CloneState {
        self.state
    }

    /// Whether a preview is live
    pub fn is_previewing(&self) -> bool {
        matches!(self.state, CloneState::Previewing { .. })
    }

    /// Drop all state without touching the scene (the scene is gone)
    pub fn reset(&mut self) {
        self.state = CloneState::Idle;
        self.just_committed = false;
    }

    /// Consume the one-shot flag set by a commit
    pub fn take_just_committed(&mut self) -> bool {
        std::mem::take(&mut self.just_committed)
    }

    pub fn pointer_down(&mut self, session: &mut SceneSession, event: PointerEvent) -> ToolEvent {
        if self.take_just_committed() {
            log::debug!("Swallowed pointer down after clone commit");
            return ToolEvent::None;
        }

        match (self.state, event.button) {
            (CloneState::Previewing { .. }, MouseButton::Right) => self.cancel(session),
            (CloneState::Previewing { source, preview }, MouseButton::Left) => self.commit(session, source, preview),
            (CloneState::Idle, MouseButton::Left) => self.start(session, event.position),
            _ => ToolEvent::None,
        }
    }

    pub fn pointer_move(&mut self, session: &mut SceneSession, position: Vec2) -> ToolEvent {
        let CloneState::Previewing { preview, .. } = self.state else {
            return ToolEvent::None;
        };
        let point = session.scene.placement_point(position);
        session.scene.set_position(preview, point);
        ToolEvent::PreviewMoved
    }

    fn start(&mut self, session: &mut SceneSession, position: Vec2) -> ToolEvent {
        let Some(source) = resolve_at(session, position) else {
            return ToolEvent::None;
        };
        match session.registry.kind_of(&session.scene, source) {
            Some(ObjectKind::Static) | Some(ObjectKind::Dynamic) => {}
            other => {
                log::debug!("Clone aborted: source kind is {:?}", other);
                return ToolEvent::None;
            }
        }

        let Some(preview) = session.scene.clone_hierarchy(source) else {
            return ToolEvent::None;
        };
        let scene = &mut session.scene;
        scene.detach_from_parent(preview);
        scene.set_visibility_recursive(preview, self.preview_visibility);
        scene.set_pickable_recursive(preview, false);
        for key in std::iter::once(preview).chain(scene.descendants(preview)) {
            if let Some(node) = scene.node_mut(key) {
                node.metadata.clear_identity();
            }
        }

        self.state = CloneState::Previewing { source, preview };
        ToolEvent::PreviewStarted(preview)
    }

    fn commit(&mut self, session: &mut SceneSession, source: NodeKey, preview: NodeKey) -> ToolEvent {
        self.state = CloneState::Idle;
        if !session.scene.contains(preview) {
            log::warn!("Clone preview vanished before commit");
            return ToolEvent::None;
        }

        let scene = &mut session.scene;
        scene.set_visibility_recursive(preview, 1.0);
        scene.set_pickable_recursive(preview, true);
        scene.duplicate_materials_from(source, preview);

        let source_url = scene.node(preview).and_then(|n| n.metadata.source_url.clone());
        let id = match session.registry.register(scene, preview, ObjectKind::Static, source_url) {
            Ok(id) => id,
            Err(err) => {
                log::warn!("Failed to register clone: {}", err);
                scene.dispose_node(preview);
                return ToolEvent::None;
            }
        };
        tag_descendants(scene, preview, &id);
        if scene.is_physics_enabled() {
            scene.add_physics_body(preview, true);
        }

        self.just_committed = true;
        log::info!("Placed clone {}", id);
        ToolEvent::CloneCommitted { root: preview, id }
    }

    /// Throw the preview away; the registry is untouched
    pub fn cancel(&mut self, session: &mut SceneSession) -> ToolEvent {
        let CloneState::Previewing { preview, .. } = self.state else {
            return ToolEvent::None;
        };
        session.scene.dispose_node(preview);
        self.state = CloneState::Idle;
        ToolEvent::CloneCancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockstage_core::{
        Material, Node, PhysicsBackend, SceneManager, SceneOptions, SceneSettings, Vec3,
    };

    struct Fixture {
        manager: SceneManager,
        source: NodeKey,
        screen: Vec2,
    }

    fn fixture() -> Fixture {
        let mut manager = SceneManager::new(PhysicsBackend::initialize(), SceneSettings::default());
        let session = manager.create_scene(SceneOptions::default());
        let wood = session.scene.add_material(Material::from_rgb("wood", 0.6, 0.4, 0.2));
        let source = session
            .scene
            .add_node(Node::with_geometry("chair", Vec3::splat(0.5)).with_material(wood));
        session.scene.add_child(source, Node::with_geometry("leg", Vec3::splat(0.1)).with_material(wood));
        session
            .registry
            .register(&mut session.scene, source, ObjectKind::Static, Some("https://x/chair.glb".into()))
            .unwrap();
        let screen = session.scene.camera.project(Vec3::ZERO).unwrap();
        Fixture { manager, source, screen }
    }

    #[test]
    fn test_first_click_starts_preview() {
        let mut f = fixture();
        let session = f.manager.session_mut().unwrap();
        let mut tool = CloneTool::default();

        let preview = match tool.pointer_down(session, PointerEvent::left(f.screen.x, f.screen.y)) {
            ToolEvent::PreviewStarted(preview) => preview,
            other => panic!("expected a preview, got {:?}", other),
        };
        let node = session.scene.node(preview).unwrap();
        assert_eq!(node.visibility, DEFAULT_PREVIEW_VISIBILITY);
        assert!(!node.is_pickable());
        assert!(node.metadata.custom_id.is_none());
        assert_eq!(session.registry.len(), 1);
        assert_eq!(tool.state(), CloneState::Previewing { source: f.source, preview });
    }

    #[test]
    fn test_move_follows_pointer() {
        let mut f = fixture();
        let session = f.manager.session_mut().unwrap();
        let mut tool = CloneTool::default();
        tool.pointer_down(session, PointerEvent::left(f.screen.x, f.screen.y));
        let CloneState::Previewing { preview, .. } = tool.state() else {
            panic!("not previewing");
        };

        let target = f.screen + Vec2::new(120.0, 40.0);
        assert_eq!(tool.pointer_move(session, target), ToolEvent::PreviewMoved);
        let expected = session.scene.placement_point(target);
        assert_eq!(session.scene.node(preview).unwrap().transform.position, expected);
    }

    #[test]
    fn test_commit_registers_new_static() {
        let mut f = fixture();
        let session = f.manager.session_mut().unwrap();
        let source_id = session.scene.node(f.source).unwrap().metadata.custom_id.clone().unwrap();
        let mut tool = CloneTool::default();

        tool.pointer_down(session, PointerEvent::left(f.screen.x, f.screen.y));
        tool.pointer_move(session, Vec2::new(900.0, 500.0));
        let (root, id) = match tool.pointer_down(session, PointerEvent::left(900.0, 500.0)) {
            ToolEvent::CloneCommitted { root, id } => (root, id),
            other => panic!("expected a commit, got {:?}", other),
        };

        assert_ne!(id, source_id);
        assert_eq!(session.registry.len(), 2);
        assert_eq!(session.registry.lookup(&id), Some(root));

        let node = session.scene.node(root).unwrap();
        assert_eq!(node.visibility, 1.0);
        assert!(node.is_pickable());
        assert_eq!(node.metadata.kind, Some(ObjectKind::Static));
        assert_eq!(node.metadata.source_url.as_deref(), Some("https://x/chair.glb"));

        let source_material = session.scene.node(f.source).unwrap().material;
        assert_ne!(node.material, source_material);

        let leg = session.scene.descendants(root)[0];
        let leg_node = session.scene.node(leg).unwrap();
        assert_eq!(leg_node.metadata.root_asset_id.as_ref(), Some(&id));
        assert!(leg_node.metadata.custom_id.is_none());
        assert!(leg_node.is_pickable());
        assert_ne!(leg_node.material, source_material);
    }

    #[test]
    fn test_redelivered_click_is_swallowed() {
        let mut f = fixture();
        let session = f.manager.session_mut().unwrap();
        let mut tool = CloneTool::default();

        tool.pointer_down(session, PointerEvent::left(f.screen.x, f.screen.y));
        tool.pointer_down(session, PointerEvent::left(900.0, 500.0));
        assert_eq!(tool.pointer_down(session, PointerEvent::left(f.screen.x, f.screen.y)), ToolEvent::None);
        assert_eq!(tool.state(), CloneState::Idle);
    }

    #[test]
    fn test_escape_style_cancel_leaves_registry() {
        let mut f = fixture();
        let session = f.manager.session_mut().unwrap();
        let before = session.registry.len();
        let nodes_before = session.scene.node_count();
        let mut tool = CloneTool::default();

        tool.pointer_down(session, PointerEvent::left(f.screen.x, f.screen.y));
        assert_eq!(tool.cancel(session), ToolEvent::CloneCancelled);
        assert_eq!(session.registry.len(), before);
        assert_eq!(session.scene.node_count(), nodes_before);
        assert!(!tool.is_previewing());
    }

    #[test]
    fn test_right_click_cancels() {
        let mut f = fixture();
        let session = f.manager.session_mut().unwrap();
        let mut tool = CloneTool::default();

        tool.pointer_down(session, PointerEvent::left(f.screen.x, f.screen.y));
        let event = tool.pointer_down(session, PointerEvent::right(10.0, 10.0));
        assert_eq!(event, ToolEvent::CloneCancelled);
        assert_eq!(session.registry.len(), 1);
    }

    #[test]
    fn test_child_pick_clones_root() {
        let mut f = fixture();
        let session = f.manager.session_mut().unwrap();
        let root_id = session.scene.node(f.source).unwrap().metadata.custom_id.clone().unwrap();
        let leg = session.scene.descendants(f.source)[0];
        tag_descendants(&mut session.scene, f.source, &root_id);
        session.scene.node_mut(f.source).unwrap().half_extents = None;
        session.scene.node_mut(leg).unwrap().half_extents = Some(Vec3::splat(0.5));
        let mut tool = CloneTool::default();

        tool.pointer_down(session, PointerEvent::left(f.screen.x, f.screen.y));
        assert!(matches!(tool.state(), CloneState::Previewing { source, .. } if source == f.source));
    }

    #[test]
    fn test_unmanaged_pick_aborts() {
        let mut f = fixture();
        let session = f.manager.session_mut().unwrap();
        let mut tool = CloneTool::default();
        assert_eq!(tool.pointer_down(session, PointerEvent::left(10.0, 10.0)), ToolEvent::None);

        let placeholder = session
            .scene
            .add_node(Node::with_geometry("pending", Vec3::splat(0.5)).with_position(Vec3::new(3.0, 0.0, 0.0)));
        session
            .registry
            .register(&mut session.scene, placeholder, ObjectKind::Placeholder, None)
            .unwrap();
        let screen = session.scene.camera.project(Vec3::new(3.0, 0.0, 0.0)).unwrap();
        assert_eq!(tool.pointer_down(session, PointerEvent::left(screen.x, screen.y)), ToolEvent::None);
        assert!(!tool.is_previewing());
    }
}
