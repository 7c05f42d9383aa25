//! Scene nodes, their identity metadata, and materials
//!
//! A [`Node`] is one element of the scene graph. Managed objects carry their
//! identity in [`NodeMetadata`]: asset roots hold a `custom_id`, children of
//! a loaded asset hold a `root_asset_id` pointing back at their root.

use std::fmt;

use bitflags::bitflags;
use blockstage_math::Vec3;
use blockstage_physics::BodyKey;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::{CustomId, Transform};

new_key_type! {
    /// Engine-internal id of a node. Not stable across scene rebuilds.
    pub struct NodeKey;

    /// Key to a material owned by a scene
    pub struct MaterialKey;
}

bitflags! {
    /// Boolean node state
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        /// Node takes part in rendering, picking and physics
        const ENABLED = 1 << 0;
        /// Node can be hit by pointer picks
        const PICKABLE = 1 << 1;
        /// Default state for new nodes
        const DEFAULT = Self::ENABLED.bits() | Self::PICKABLE.bits();
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        NodeFlags::DEFAULT
    }
}

/// Who owns a managed object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Created by the block program; recreated on every run
    Dynamic,
    /// Placed by the user; persisted across sessions
    Static,
    /// Stand-in shown while the real asset loads
    Placeholder,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Dynamic => write!(f, "dynamic"),
            ObjectKind::Static => write!(f, "static"),
            ObjectKind::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// Identity data attached to a node
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeMetadata {
    /// Stable id; present only on asset roots
    pub custom_id: Option<CustomId>,
    /// Ownership of the object
    pub kind: Option<ObjectKind>,
    /// URL the asset was loaded from
    pub source_url: Option<String>,
    /// Set on children of a multi-node asset; names the root's `custom_id`
    pub root_asset_id: Option<CustomId>,
}

impl NodeMetadata {
    /// Whether this node is an asset root (carries its own id)
    pub fn is_asset_root(&self) -> bool {
        self.custom_id.is_some()
    }

    /// Strip the identity fields, keeping the source URL
    pub fn clear_identity(&mut self) {
        self.custom_id = None;
        self.kind = None;
        self.root_asset_id = None;
    }
}

/// A simple material with a name and base color
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name
    pub name: String,
    /// Base color as RGBA (each component 0.0-1.0)
    pub base_color: [f32; 4],
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", [1.0, 1.0, 1.0, 1.0])
    }
}

impl Material {
    /// Create a material
    pub fn new(name: impl Into<String>, base_color: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            base_color,
        }
    }

    /// Create an opaque material from RGB
    pub fn from_rgb(name: impl Into<String>, r: f32, g: f32, b: f32) -> Self {
        Self::new(name, [r, g, b, 1.0])
    }
}

/// A node in the scene graph
#[derive(Clone, Debug)]
pub struct Node {
    /// Display name; reserved names mark non-manipulable scenery
    pub name: String,
    /// Parent node, if any
    pub parent: Option<NodeKey>,
    /// Child nodes in creation order
    pub children: Vec<NodeKey>,
    /// Transform relative to the parent
    pub transform: Transform,
    /// Enabled / pickable state
    pub flags: NodeFlags,
    /// Visibility (0.0 = invisible, 1.0 = opaque)
    pub visibility: f32,
    /// Material reference (shared between shallow clones)
    pub material: Option<MaterialKey>,
    /// Local half extents used for picking; None = not pickable geometry
    pub half_extents: Option<Vec3>,
    /// Identity metadata
    pub metadata: NodeMetadata,
    /// Physics body linked to this node
    pub physics_body: Option<BodyKey>,
}

impl Node {
    /// Create an empty transform node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            transform: Transform::identity(),
            flags: NodeFlags::DEFAULT,
            visibility: 1.0,
            material: None,
            half_extents: None,
            metadata: NodeMetadata::default(),
            physics_body: None,
        }
    }

    /// Create a node with box geometry of the given half extents
    pub fn with_geometry(name: impl Into<String>, half_extents: Vec3) -> Self {
        Self {
            half_extents: Some(half_extents),
            ..Self::new(name)
        }
    }

    /// Set the transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Set the material
    pub fn with_material(mut self, material: MaterialKey) -> Self {
        self.material = Some(material);
        self
    }

    /// Set the identity metadata
    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the node is enabled
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(NodeFlags::ENABLED)
    }

    /// Whether the node can be picked
    #[inline]
    pub fn is_pickable(&self) -> bool {
        self.flags.contains(NodeFlags::PICKABLE)
    }

    /// Enable or disable the node
    pub fn set_enabled(&mut self, enabled: bool) {
        self.flags.set(NodeFlags::ENABLED, enabled);
    }

    /// Allow or forbid picking
    pub fn set_pickable(&mut self, pickable: bool) {
        self.flags.set(NodeFlags::PICKABLE, pickable);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_defaults() {
        let node = Node::new("root");
        assert!(node.is_enabled());
        assert!(node.is_pickable());
        assert_eq!(node.visibility, 1.0);
        assert!(node.metadata.custom_id.is_none());
        assert!(node.half_extents.is_none());
    }

    #[test]
    fn test_flags_toggle() {
        let mut node = Node::new("n");
        node.set_pickable(false);
        assert!(!node.is_pickable());
        assert!(node.is_enabled());
        node.set_enabled(false);
        assert!(!node.is_enabled());
    }

    #[test]
    fn test_clear_identity_keeps_source() {
        let mut meta = NodeMetadata {
            custom_id: Some(CustomId::new("a")),
            kind: Some(ObjectKind::Static),
            source_url: Some("https://x/model.glb".to_string()),
            root_asset_id: Some(CustomId::new("b")),
        };
        meta.clear_identity();
        assert!(!meta.is_asset_root());
        assert!(meta.kind.is_none());
        assert!(meta.root_asset_id.is_none());
        assert_eq!(meta.source_url.as_deref(), Some("https://x/model.glb"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ObjectKind::Static.to_string(), "static");
        assert_eq!(ObjectKind::Dynamic.to_string(), "dynamic");
        assert_eq!(ObjectKind::Placeholder.to_string(), "placeholder");
    }

    #[test]
    fn test_with_geometry() {
        let node = Node::with_geometry("box", Vec3::splat(0.5)).with_position(Vec3::Y);
        assert_eq!(node.half_extents, Some(Vec3::splat(0.5)));
        assert_eq!(node.transform.position, Vec3::Y);
    }
}
