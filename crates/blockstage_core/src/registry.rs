//! Identity registry
//!
//! Maps stable [`CustomId`]s to the live [`NodeKey`] currently carrying them.
//! The registry belongs to one scene session: the [`SceneManager`] clears it
//! at the start of every rebuild and objects re-register as they are
//! recreated. It is never persisted.
//!
//! [`SceneManager`]: crate::SceneManager

use std::collections::HashMap;

use thiserror::Error;

use crate::node::{NodeKey, ObjectKind};
use crate::scene::Scene;
use crate::CustomId;

/// Errors from registry operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The node to register is not live in the scene
    #[error("cannot register node {0:?}: not in the scene")]
    MissingNode(NodeKey),
}

/// Map from custom id to live node
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<CustomId, NodeKey>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node as a managed object
    ///
    /// If the node already carries a custom id, that id is reused and the
    /// entry is repointed at this node. Otherwise a fresh id is generated and
    /// written onto the node. The kind is always written; the source URL is
    /// only replaced when `source_url` is given.
    pub fn register(
        &mut self,
        scene: &mut Scene,
        key: NodeKey,
        kind: ObjectKind,
        source_url: Option<String>,
    ) -> Result<CustomId, RegistryError> {
        let node = scene.node_mut(key).ok_or(RegistryError::MissingNode(key))?;
        let metadata = &mut node.metadata;

        let id = match &metadata.custom_id {
            Some(existing) => existing.clone(),
            None => {
                let id = CustomId::generate();
                metadata.custom_id = Some(id.clone());
                id
            }
        };
        metadata.kind = Some(kind);
        metadata.root_asset_id = None;
        if source_url.is_some() {
            metadata.source_url = source_url;
        }

        if let Some(previous) = self.entries.insert(id.clone(), key) {
            if previous != key {
                log::debug!("Repointed {} from {:?} to {:?}", id, previous, key);
            }
        }
        log::debug!("Registered {} ({}) as {:?}", id, kind, key);
        Ok(id)
    }

    /// Remove an entry; the node itself is left alone
    pub fn unregister(&mut self, id: &CustomId) -> Option<NodeKey> {
        self.entries.remove(id)
    }

    /// Node currently carrying `id`
    pub fn lookup(&self, id: &CustomId) -> Option<NodeKey> {
        self.entries.get(id).copied()
    }

    /// Kind recorded on a node, if it has one
    pub fn kind_of(&self, scene: &Scene, key: NodeKey) -> Option<ObjectKind> {
        scene.node(key).and_then(|n| n.metadata.kind)
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = (&CustomId, NodeKey)> {
        self.entries.iter().map(|(id, key)| (id, *key))
    }
}

/// Mark every descendant of `root` as belonging to the asset `root_id`
///
/// Any root-style identity a descendant carried (for instance from a clone)
/// is stripped. Returns the number of nodes tagged.
pub fn tag_descendants(scene: &mut Scene, root: NodeKey, root_id: &CustomId) -> usize {
    let descendants = scene.descendants(root);
    for key in &descendants {
        if let Some(node) = scene.node_mut(*key) {
            node.metadata.clear_identity();
            node.metadata.root_asset_id = Some(root_id.clone());
        }
    }
    descendants.len()
}
