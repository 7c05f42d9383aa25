//! Physics plugin for blockstage scenes
//!
//! Solver quality is not a goal here. The plugin exists so that scenes can be
//! built with or without physics, bodies can be attached to and removed with
//! scene nodes, and the scene lifecycle can enable and disable the engine.
//!
//! - [`PhysicsBackend`] - Pre-initialized backend that plugins bind to
//! - [`PhysicsWorld`] - Per-scene plugin instance with a fixed gravity vector
//! - [`RigidBody`] / [`BodyKey`] - Bodies and their generational keys

pub mod body;
pub mod world;

pub use body::{BodyKey, RigidBody};
pub use world::{PhysicsBackend, PhysicsConfig, PhysicsWorld};
