//! Single owner of canvas input
//!
//! Exactly one tool receives pointer events at a time. Tool changes go
//! through [`next_tool`], and every change cancels any clone preview and
//! drops the selection before the new tool takes over.

use blockstage_core::SceneSession;
use blockstage_math::Vec2;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

use crate::clone_tool::{CloneTool, DEFAULT_PREVIEW_VISIBILITY};
use crate::pointer::{EditorKey, PointerEvent, ToolEvent};
use crate::select_tool::{SelectTool, DEFAULT_DRAG_THRESHOLD_SQ};

/// Which tool owns the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    /// Click to select, drag the gizmo to move
    #[default]
    Select,
    /// Two-click clone placement
    Clone,
}

/// Reasons to change tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolRequest {
    /// The user picked a tool
    Activate(ToolKind),
    /// The clone tool placed its object
    CloneCommitted,
}

/// Tool transition table
pub fn next_tool(current: ToolKind, request: ToolRequest) -> ToolKind {
    match (current, request) {
        (_, ToolRequest::Activate(kind)) => kind,
        (ToolKind::Clone, ToolRequest::CloneCommitted) => ToolKind::Select,
        (current, ToolRequest::CloneCommitted) => current,
    }
}

/// Tunables for the tools
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    /// Squared pixel distance separating a click from a drag
    pub drag_threshold_sq: f32,
    /// Visibility of the clone preview
    pub preview_visibility: f32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            drag_threshold_sq: DEFAULT_DRAG_THRESHOLD_SQ,
            preview_visibility: DEFAULT_PREVIEW_VISIBILITY,
        }
    }
}

/// Routes canvas input to the active tool
#[derive(Debug)]
pub struct InputDispatcher {
    tool: ToolKind,
    select: SelectTool,
    clone: CloneTool,
    generation: u64,
}

impl Default for InputDispatcher {
    fn default() -> Self {
        Self::new(ToolSettings::default())
    }
}

impl InputDispatcher {
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            tool: ToolKind::Select,
            select: SelectTool::new(settings.drag_threshold_sq),
            clone: CloneTool::new(settings.preview_visibility),
            generation: 0,
        }
    }

    /// Active tool
    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// The select tool
    pub fn select_tool(&self) -> &SelectTool {
        &self.select
    }

    /// The clone tool
    pub fn clone_tool(&self) -> &CloneTool {
        &self.clone
    }

    /// Reset tool state when the session was rebuilt underneath us
    fn sync(&mut self, session: &SceneSession) {
        if session.generation() != self.generation {
            if self.generation != 0 {
                log::debug!(
                    "Scene rebuilt (generation {} -> {}); resetting tools",
                    self.generation,
                    session.generation()
                );
            }
            self.select.reset();
            self.clone.reset();
            self.generation = session.generation();
        }
    }

    /// Apply a tool change request
    pub fn request(&mut self, session: &mut SceneSession, request: ToolRequest) -> ToolKind {
        self.sync(session);
        let next = next_tool(self.tool, request);
        if next != self.tool || matches!(request, ToolRequest::Activate(_)) {
            self.clone.cancel(session);
            self.select.reset();
            session.detach();
        }
        if next != self.tool {
            log::info!("Tool changed: {:?} -> {:?}", self.tool, next);
        }
        self.tool = next;
        next
    }

    /// Switch to a tool
    pub fn set_tool(&mut self, session: &mut SceneSession, kind: ToolKind) -> ToolKind {
        self.request(session, ToolRequest::Activate(kind))
    }

    pub fn pointer_down(&mut self, session: &mut SceneSession, event: PointerEvent) -> ToolEvent {
        self.sync(session);
        // The committing click may be redelivered after the switch to select
        if self.clone.take_just_committed() {
            log::debug!("Swallowed pointer down after clone commit");
            return ToolEvent::None;
        }
        let result = match self.tool {
            ToolKind::Select => self.select.pointer_down(session, event),
            ToolKind::Clone => self.clone.pointer_down(session, event),
        };
        if let ToolEvent::CloneCommitted { root, .. } = &result {
            let root = *root;
            self.request(session, ToolRequest::CloneCommitted);
            session.attach(root);
        }
        result
    }

    pub fn pointer_move(&mut self, session: &mut SceneSession, position: Vec2) -> ToolEvent {
        self.sync(session);
        match self.tool {
            ToolKind::Select => self.select.pointer_move(session, position),
            ToolKind::Clone => self.clone.pointer_move(session, position),
        }
    }

    pub fn pointer_up(&mut self, session: &mut SceneSession, event: PointerEvent) -> ToolEvent {
        self.sync(session);
        match self.tool {
            ToolKind::Select => self.select.pointer_up(session, event),
            ToolKind::Clone => ToolEvent::None,
        }
    }

    /// Handle an editing key
    pub fn key(&mut self, session: &mut SceneSession, key: EditorKey) -> ToolEvent {
        self.sync(session);
        match key {
            EditorKey::Cancel if self.clone.is_previewing() => self.clone.cancel(session),
            EditorKey::Cancel if session.attached().is_some() => {
                session.detach();
                ToolEvent::Detached
            }
            EditorKey::Delete if session.controller.has_keyboard_observer() => {
                if session.delete_attached() {
                    ToolEvent::Deleted
                } else {
                    ToolEvent::None
                }
            }
            _ => ToolEvent::None,
        }
    }

    /// Route a winit mouse button event at `position`
    pub fn handle_mouse_button(
        &mut self,
        session: &mut SceneSession,
        button: MouseButton,
        state: ElementState,
        position: Vec2,
    ) -> ToolEvent {
        let event = PointerEvent { position, button };
        match state {
            ElementState::Pressed => self.pointer_down(session, event),
            ElementState::Released => self.pointer_up(session, event),
        }
    }

    /// Route a winit keyboard event
    pub fn handle_keyboard(&mut self, session: &mut SceneSession, key: KeyCode, state: ElementState) -> ToolEvent {
        match EditorKey::from_keyboard(key, state) {
            Some(key) => self.key(session, key),
            None => ToolEvent::None,
        }
    }
}
