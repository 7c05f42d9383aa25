//! Core types for the blockstage scene editor
//!
//! This crate holds everything that lives inside a scene session:
//!
//! - [`Scene`] - Node graph with picking, shallow clones and a physics plugin
//! - [`Node`] / [`NodeKey`] - A scene node and its engine-internal key
//! - [`CustomId`] - Stable object id that survives scene rebuilds
//! - [`Registry`] - Map from custom id to the live node carrying it
//! - [`SelectionController`] - Resolves picks and drives the [`GizmoSet`]
//! - [`SceneManager`] - Tears scenes down and builds fresh [`SceneSession`]s
//! - [`AssetTemplate`] / [`AssetSource`] - Loadable assets
//! - [`SavedObject`] - Persisted record of a user-placed object

mod id;
mod transform;
mod node;
mod camera;
mod camera_transition;
mod asset;
mod asset_error;
mod scene;
mod registry;
mod gizmo;
mod xr;
mod selection;
mod scene_manager;
mod storage;
mod persistence;

pub use id::CustomId;
pub use transform::{Orientation, Transform};
pub use node::{Material, MaterialKey, Node, NodeFlags, NodeKey, NodeMetadata, ObjectKind};
pub use camera::{Camera, CameraCapability, CameraPose, CameraRig};
pub use camera_transition::{CameraTransition, DEFAULT_TRANSITION_DURATION};
pub use asset::{AssetSource, AssetTemplate, AssetUrlResolver, FileAssetSource, MemoryAssetSource, NodeTemplate};
pub use asset_error::AssetError;
pub use scene::{is_reserved_name, Environment, PickHit, Scene, FALLBACK_PLANE_DISTANCE, GROUND_NAME, RESERVED_NAMES};
pub use registry::{tag_descendants, Registry, RegistryError};
pub use gizmo::{BoundingBoxGizmo, GizmoError, GizmoSet, PositionGizmo, UtilityLayer, DEFAULT_HANDLE_RADIUS};
pub use xr::{XrError, XrExperience};
pub use selection::{resolve_manipulation_target, SelectionController};
pub use scene_manager::{
    AdoptedAsset, LifecycleError, LoadTicket, SceneManager, SceneOptions, SceneSession, SceneSettings,
};
pub use storage::{FileStorage, MemoryStorage, SceneStorage, StorageError};
pub use persistence::{
    load_records, restore, save_records, snapshot, PersistenceError, QuatRecord, RestoreReport, SavedObject,
    SavedTransform, Vec3Record,
};

// Re-export commonly used types from the math and physics crates
pub use blockstage_math::{Quat, Vec2, Vec3};
pub use blockstage_physics::{BodyKey, PhysicsBackend, PhysicsConfig, PhysicsWorld};
