//! Click-to-select tool
//!
//! Clicks, camera drags and gizmo drags all arrive as the same down/up pair
//! on the canvas. The tool tells them apart:
//! - a down on the gizmo handle starts a gizmo drag, which owns the gesture
//! - moving further than the drag threshold turns the gesture into a drag,
//!   which never changes the selection
//! - anything else is a click, resolved through the selection controller

use blockstage_core::{NodeKey, SceneSession};
use blockstage_math::{screen_distance_sq, Vec2};
use winit::event::MouseButton;

use crate::pointer::{PointerEvent, ToolEvent};

/// Squared pixel distance a press may travel and still count as a click
pub const DEFAULT_DRAG_THRESHOLD_SQ: f32 = 25.0;

/// Gesture state of the select tool
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectState {
    /// No button held
    Idle,
    /// Button held, not yet moved past the threshold
    PotentialClick { down: Vec2 },
    /// Button held and moved past the threshold
    Dragging,
    /// Dragging the position gizmo
    GizmoInteracting,
}

/// The select tool
#[derive(Debug)]
pub struct SelectTool {
    state: SelectState,
    potential_deselect: bool,
    drag_threshold_sq: f32,
}

impl Default for SelectTool {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD_SQ)
    }
}

impl SelectTool {
    pub fn new(drag_threshold_sq: f32) -> Self {
        Self {
            state: SelectState::Idle,
            potential_deselect: false,
            drag_threshold_sq,
        }
    }

    /// Current gesture state
    pub fn state(&self) -> SelectState {
        self.state
    }

    /// Whether the current press will deselect if it ends off-target
    pub fn potential_deselect(&self) -> bool {
        self.potential_deselect
    }

    /// Forget any gesture in progress
    pub fn reset(&mut self) {
        self.state = SelectState::Idle;
        self.potential_deselect = false;
    }

    pub fn pointer_down(&mut self, session: &mut SceneSession, event: PointerEvent) -> ToolEvent {
        if event.button != MouseButton::Left {
            return ToolEvent::None;
        }

        if session.gizmos.begin_drag(&session.scene, event.position) {
            self.state = SelectState::GizmoInteracting;
            self.potential_deselect = false;
            return ToolEvent::None;
        }

        self.state = SelectState::PotentialClick { down: event.position };
        self.potential_deselect = match session.attached() {
            Some(attached) => resolve_at(session, event.position) != Some(attached),
            None => false,
        };
        ToolEvent::None
    }

    pub fn pointer_move(&mut self, session: &mut SceneSession, position: Vec2) -> ToolEvent {
        match self.state {
            SelectState::GizmoInteracting => {
                session.gizmos.drag_to(&mut session.scene, position);
            }
            SelectState::PotentialClick { down } => {
                if screen_distance_sq(down, position) > self.drag_threshold_sq {
                    self.state = SelectState::Dragging;
                    self.potential_deselect = false;
                }
            }
            SelectState::Idle | SelectState::Dragging => {}
        }
        ToolEvent::None
    }

    pub fn pointer_up(&mut self, session: &mut SceneSession, event: PointerEvent) -> ToolEvent {
        if event.button != MouseButton::Left {
            return ToolEvent::None;
        }

        let state = self.state;
        let potential_deselect = self.potential_deselect;
        self.reset();

        let down = match state {
            SelectState::GizmoInteracting => {
                session.gizmos.end_drag();
                return ToolEvent::None;
            }
            SelectState::Dragging | SelectState::Idle => return ToolEvent::None,
            SelectState::PotentialClick { down } => down,
        };

        // A fast drag can end before any move event crossed the threshold
        if screen_distance_sq(down, event.position) > self.drag_threshold_sq {
            return ToolEvent::None;
        }

        // Off-target means nothing manageable under the release point;
        // landing on another object selects it instead
        let target = resolve_at(session, event.position);
        if potential_deselect && target.is_none() {
            session.detach();
            return ToolEvent::Detached;
        }

        match target {
            Some(key) => {
                session.attach(key);
                ToolEvent::Attached(key)
            }
            None if session.attached().is_some() => {
                session.detach();
                ToolEvent::Detached
            }
            None => ToolEvent::None,
        }
    }
}

/// Managed object under a screen point, if any
pub(crate) fn resolve_at(session: &SceneSession, position: Vec2) -> Option<NodeKey> {
    session
        .scene
        .pick(position)
        .and_then(|hit| session.resolve(hit.node))
}
