//! Saving and restoring user-placed objects
//!
//! Only static objects with a source URL are saved. Each becomes a
//! [`SavedObject`] holding its id, source and transform; restoring loads the
//! asset again and registers it under the saved id, so ids stay stable
//! across reloads.
//!
//! The JSON shape is:
//! ```json
//! [{ "customID": "...", "sourceModelUrl": "...",
//!    "transforms": [{ "position": {"x":0,"y":0,"z":0},
//!                     "rotationQuaternion": {"x":0,"y":0,"z":0,"w":1},
//!                     "scaling": {"x":1,"y":1,"z":1} }] }]
//! ```

use std::cell::RefCell;

use blockstage_math::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::AssetSource;
use crate::node::ObjectKind;
use crate::scene_manager::{SceneManager, SceneSession};
use crate::storage::{SceneStorage, StorageError};
use crate::{CustomId, Transform};

/// Errors from saving or loading records
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The storage backend failed
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The stored text is not a valid record list
    #[error("invalid saved scene: {0}")]
    Json(#[from] serde_json::Error),
}

/// A vector as `{x, y, z}`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3Record {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Record {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Vec3Record> for Vec3 {
    fn from(r: Vec3Record) -> Self {
        Vec3::new(r.x, r.y, r.z)
    }
}

/// A quaternion as `{x, y, z, w}`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuatRecord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl From<Quat> for QuatRecord {
    fn from(q: Quat) -> Self {
        Self { x: q.x, y: q.y, z: q.z, w: q.w }
    }
}

impl From<QuatRecord> for Quat {
    fn from(r: QuatRecord) -> Self {
        Quat::from_xyzw(r.x, r.y, r.z, r.w)
    }
}

/// One saved placement of an object
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTransform {
    pub position: Vec3Record,
    pub rotation_quaternion: QuatRecord,
    pub scaling: Vec3Record,
}

impl From<Transform> for SavedTransform {
    fn from(t: Transform) -> Self {
        Self {
            position: t.position.into(),
            rotation_quaternion: t.rotation().into(),
            scaling: t.scale.into(),
        }
    }
}

impl From<SavedTransform> for Transform {
    fn from(t: SavedTransform) -> Self {
        Transform::from_parts(t.position.into(), t.rotation_quaternion.into(), t.scaling.into())
    }
}

/// A saved static object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedObject {
    #[serde(rename = "customID")]
    pub custom_id: CustomId,
    pub source_model_url: String,
    pub transforms: Vec<SavedTransform>,
}

/// Outcome of a restore
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Objects placed back into the scene
    pub restored: Vec<CustomId>,
    /// Objects whose asset failed to load or instantiate
    pub failed: Vec<CustomId>,
    /// Objects whose load finished after the scene was rebuilt
    pub stale: Vec<CustomId>,
}

/// Records for every static object with a source URL, sorted by id
pub fn snapshot(session: &SceneSession) -> Vec<SavedObject> {
    session
        .objects_of_kind(ObjectKind::Static)
        .into_iter()
        .filter_map(|(id, key)| {
            let node = session.scene.node(key)?;
            let url = node.metadata.source_url.as_deref().filter(|u| !u.is_empty())?;
            let transform = session.scene.world_transform(key)?;
            Some(SavedObject {
                custom_id: id,
                source_model_url: url.to_string(),
                transforms: vec![transform.into()],
            })
        })
        .collect()
}

/// Load every record's asset and register it under its saved id
///
/// Records are restored one at a time. A failed load is logged and skipped.
/// No borrow of the manager is held while a load is pending.
pub async fn restore<S: AssetSource>(
    manager: &RefCell<SceneManager>,
    source: &S,
    records: &[SavedObject],
) -> RestoreReport {
    let mut report = RestoreReport::default();

    for record in records {
        let id = record.custom_id.clone();
        let url = record.source_model_url.as_str();
        let ticket = manager.borrow().begin_load();

        let template = match source.load(url).await {
            Ok(template) => template,
            Err(err) => {
                log::warn!("Failed to load {} for {}: {}", url, id, err);
                report.failed.push(id);
                continue;
            }
        };

        let mut guard = manager.borrow_mut();
        let Some(session) = guard.session_for(&ticket) else {
            report.stale.push(id);
            continue;
        };

        let transform = match record.transforms.first() {
            Some(saved) => Transform::from(*saved),
            None => {
                log::warn!("Saved object {} has no transform; using identity", id);
                Transform::identity()
            }
        };
        match session.adopt_asset(&template, transform, Some(id.clone()), ObjectKind::Static, Some(url.to_string())) {
            Ok(_) => report.restored.push(id),
            Err(err) => {
                log::warn!("Failed to place {} from {}: {}", id, url, err);
                report.failed.push(id);
            }
        }
    }

    log::info!(
        "Restored {} objects ({} failed, {} stale)",
        report.restored.len(),
        report.failed.len(),
        report.stale.len()
    );
    report
}

/// Write records to a storage slot as JSON
pub fn save_records(storage: &mut dyn SceneStorage, slot: &str, records: &[SavedObject]) -> Result<(), PersistenceError> {
    let json = serde_json::to_string(records)?;
    storage.set_item(slot, &json)?;
    Ok(())
}

/// Read records from a storage slot; an empty slot yields no records
pub fn load_records(storage: &dyn SceneStorage, slot: &str) -> Result<Vec<SavedObject>, PersistenceError> {
    match storage.get_item(slot)? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(Vec::new()),
    }
}
