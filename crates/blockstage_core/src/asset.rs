//! Loadable assets
//!
//! An [`AssetTemplate`] describes a (possibly multi-node) model: node 0 is
//! the asset root, every other node names an earlier node as its parent.
//! Templates are fetched asynchronously through an [`AssetSource`] and
//! instantiated into a scene with [`Scene::instantiate`](crate::Scene::instantiate).

use std::collections::HashMap;
use std::future::{ready, Future};
use std::path::{Path, PathBuf};

use blockstage_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::asset_error::AssetError;
use crate::node::Material;
use crate::Transform;

/// One node of an asset template
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeTemplate {
    /// Node name
    pub name: String,
    /// Index of the parent node within the template (None only for the root)
    #[serde(default)]
    pub parent: Option<usize>,
    /// Transform relative to the parent
    #[serde(default)]
    pub transform: Transform,
    /// Box half extents for picking, if the node has geometry
    #[serde(default)]
    pub half_extents: Option<Vec3>,
    /// Material for this node
    #[serde(default)]
    pub material: Option<Material>,
}

impl NodeTemplate {
    /// Create a template node without geometry
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            transform: Transform::identity(),
            half_extents: None,
            material: None,
        }
    }

    /// Set the parent index
    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Give the node box geometry
    pub fn with_half_extents(mut self, half_extents: Vec3) -> Self {
        self.half_extents = Some(half_extents);
        self
    }

    /// Give the node a material
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }
}

/// A loadable model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssetTemplate {
    /// Asset name
    pub name: String,
    /// Nodes; index 0 is the root
    pub nodes: Vec<NodeTemplate>,
}

impl AssetTemplate {
    /// Create a template with a single root node
    pub fn new(name: impl Into<String>, root: NodeTemplate) -> Self {
        Self {
            name: name.into(),
            nodes: vec![root],
        }
    }

    /// Single box-shaped node with a material
    pub fn single_box(name: impl Into<String>, half_extents: Vec3, material: Material) -> Self {
        let name = name.into();
        let root = NodeTemplate::new(name.clone())
            .with_half_extents(half_extents)
            .with_material(material);
        Self::new(name, root)
    }

    /// Append a node
    pub fn with_node(mut self, node: NodeTemplate) -> Self {
        self.nodes.push(node);
        self
    }

    /// Check the structural rules: non-empty, root has no parent, every
    /// other node's parent comes before it
    pub fn validate(&self) -> Result<(), AssetError> {
        let root = self
            .nodes
            .first()
            .ok_or_else(|| AssetError::Parse(format!("asset '{}' has no nodes", self.name)))?;
        if root.parent.is_some() {
            return Err(AssetError::Parse(format!("root of asset '{}' has a parent", self.name)));
        }
        for (index, node) in self.nodes.iter().enumerate().skip(1) {
            match node.parent {
                Some(parent) if parent < index => {}
                _ => {
                    return Err(AssetError::Parse(format!(
                        "node '{}' of asset '{}' must name an earlier parent",
                        node.name, self.name
                    )))
                }
            }
        }
        Ok(())
    }
}

/// Something that can fetch asset templates by URL
///
/// Loading is asynchronous; the returned future is the only suspension
/// point in restore and spawn paths.
pub trait AssetSource {
    /// Fetch and parse the asset at `url`
    fn load(&self, url: &str) -> impl Future<Output = Result<AssetTemplate, AssetError>>;
}

/// Resolves a logical asset name (as used by blocks and drag-drop) to a URL
pub trait AssetUrlResolver {
    /// URL for `logical_name`, or None if the name is unknown
    fn resolve(&self, logical_name: &str) -> Option<String>;
}

impl<F> AssetUrlResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, logical_name: &str) -> Option<String> {
        self(logical_name)
    }
}

/// Asset source backed by an in-memory table
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetSource {
    assets: HashMap<String, AssetTemplate>,
}

impl MemoryAssetSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add an asset under `url`
    pub fn with_asset(mut self, url: impl Into<String>, template: AssetTemplate) -> Self {
        self.insert(url, template);
        self
    }

    /// Add or replace an asset
    pub fn insert(&mut self, url: impl Into<String>, template: AssetTemplate) {
        self.assets.insert(url.into(), template);
    }
}

impl AssetSource for MemoryAssetSource {
    fn load(&self, url: &str) -> impl Future<Output = Result<AssetTemplate, AssetError>> {
        let result = self
            .assets
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(url.to_string()))
            .and_then(|template| template.validate().map(|_| template));
        ready(result)
    }
}

/// Asset source reading RON templates from a directory
///
/// `file://` URLs and relative URLs are resolved against the root
/// directory; other schemes are not served.
#[derive(Clone, Debug)]
pub struct FileAssetSource {
    root: PathBuf,
}

impl FileAssetSource {
    /// Create a source rooted at `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Map a URL to a path under the root directory
    pub fn path_for(&self, url: &str) -> Result<PathBuf, AssetError> {
        let relative = match url.split_once("://") {
            Some(("file", rest)) => rest,
            Some(_) => return Err(AssetError::NotFound(url.to_string())),
            None => url,
        };
        Ok(self.root.join(relative.trim_start_matches('/')))
    }

    fn read(&self, url: &str) -> Result<AssetTemplate, AssetError> {
        let path = self.path_for(url)?;
        let contents = std::fs::read_to_string(&path)?;
        let template: AssetTemplate = ron::from_str(&contents)?;
        template.validate()?;
        Ok(template)
    }
}

impl AssetSource for FileAssetSource {
    fn load(&self, url: &str) -> impl Future<Output = Result<AssetTemplate, AssetError>> {
        ready(self.read(url))
    }
}
