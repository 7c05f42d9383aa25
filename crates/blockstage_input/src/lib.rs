//! Canvas input for the blockstage editor
//!
//! Two pointer tools edit the scene, and one dispatcher decides which of
//! them sees the input:
//!
//! - [`SelectTool`] - click to select, drag the gizmo to move, drag elsewhere to orbit
//! - [`CloneTool`] - click an object, move the preview, click again to place
//! - [`InputDispatcher`] - owns the canvas, switches tools through [`next_tool`]

mod pointer;
mod select_tool;
mod clone_tool;
mod dispatcher;

pub use pointer::{EditorKey, PointerEvent, ToolEvent};
pub use select_tool::{SelectState, SelectTool, DEFAULT_DRAG_THRESHOLD_SQ};
pub use clone_tool::{CloneState, CloneTool, DEFAULT_PREVIEW_VISIBILITY};
pub use dispatcher::{next_tool, InputDispatcher, ToolKind, ToolRequest, ToolSettings};
