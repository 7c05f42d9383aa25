//! Blockstage - scene editor core
//!
//! Objects placed in the editor keep a stable id while the scene underneath
//! them is torn down and rebuilt on every run, reset and physics toggle.
//!
//! - [`config::AppConfig`] - Layered configuration
//! - [`program::BlockProgram`] - Creation calls from the block editor
//! - [`editor::Editor`] - Run, reset, physics toggle, save/load, external drops

pub mod config;
pub mod editor;
pub mod program;

pub use config::{AppConfig, ConfigError};
pub use editor::{DroppedAsset, Editor, EditorError, LogNotifier, ModelDirectoryResolver, Notifier, RunReport};
pub use program::{BlockProgram, CreateCall, PendingModel, Primitive};
