//! Pointer and keyboard events as the tools see them

use blockstage_core::{CustomId, NodeKey};
use blockstage_math::Vec2;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

/// A pointer press or release on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Canvas position in pixels (origin top-left)
    pub position: Vec2,
    /// Button that changed state
    pub button: MouseButton,
}

impl PointerEvent {
    /// Left-button event at (x, y)
    pub fn left(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            button: MouseButton::Left,
        }
    }

    /// Right-button event at (x, y)
    pub fn right(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            button: MouseButton::Right,
        }
    }
}

/// Editing keys the tools react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    /// Cancel a clone preview or drop the selection (Escape)
    Cancel,
    /// Delete the selected static object (Delete / Backspace)
    Delete,
}

impl EditorKey {
    /// Map a key press to an editing key; releases and other keys map to None
    pub fn from_keyboard(key: KeyCode, state: ElementState) -> Option<Self> {
        if state != ElementState::Pressed {
            return None;
        }
        match key {
            KeyCode::Escape => Some(EditorKey::Cancel),
            KeyCode::Delete | KeyCode::Backspace => Some(EditorKey::Delete),
            _ => None,
        }
    }
}

/// What a tool did in response to an event
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    /// Nothing changed
    None,
    /// Gizmos attached to a node
    Attached(NodeKey),
    /// Gizmos detached
    Detached,
    /// A clone preview was created
    PreviewStarted(NodeKey),
    /// The clone preview followed the pointer
    PreviewMoved,
    /// A clone was placed and registered
    CloneCommitted {
        /// Root node of the new object
        root: NodeKey,
        /// Its fresh id
        id: CustomId,
    },
    /// The clone preview was thrown away
    CloneCancelled,
    /// The selected object was deleted
    Deleted,
}
