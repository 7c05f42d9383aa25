//! BlockProgram - Declarative scene construction
//!
//! The block editor's generated code talks to the scene through a short list
//! of creation calls, each keyed by the stable id of the block that made it.
//! Applying a program to a fresh session creates primitives immediately and
//! puts a placeholder where every model will go; the models are swapped in
//! once their assets finish loading.

use blockstage_core::{
    AssetError, AssetTemplate, AssetUrlResolver, CustomId, Material, Node, NodeKey, ObjectKind, SceneSession,
    Transform, Vec3, GROUND_NAME,
};
use serde::{Deserialize, Serialize};

const GROUND_THICKNESS: f32 = 0.1;
const PLACEHOLDER_VISIBILITY: f32 = 0.3;
const PLACEHOLDER_HALF_EXTENT: f32 = 0.5;

/// Built-in shapes a block can create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    /// Axis-aligned box
    Box,
    /// Sphere (picked by its bounding box)
    Sphere,
    /// Flat ground slab; scenery, never managed
    Ground,
}

/// One creation call from the generated program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CreateCall {
    /// Create a primitive shape
    Primitive {
        /// Stable block id; becomes the object's custom id
        block_id: String,
        shape: Primitive,
        /// Full size along each axis
        size: Vec3,
        transform: Transform,
        /// Base color [r, g, b]
        #[serde(default)]
        color: Option<[f32; 3]>,
    },
    /// Load a named model
    Model {
        /// Stable block id; becomes the object's custom id
        block_id: String,
        /// Logical model name, resolved to a URL by the host
        model: String,
        transform: Transform,
    },
}

impl CreateCall {
    /// Block id of the call
    pub fn block_id(&self) -> &str {
        match self {
            CreateCall::Primitive { block_id, .. } | CreateCall::Model { block_id, .. } => block_id,
        }
    }
}

/// A generated program: creation calls in block order
///
/// # Example
/// ```ignore
/// let program = BlockProgram::new()
///     .add_ground(20.0)
///     .add_box("block-1", Vec3::new(0.0, 0.5, 0.0), Vec3::ONE)
///     .add_model("block-2", "chair", Vec3::new(2.0, 0.0, 0.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockProgram {
    pub calls: Vec<CreateCall>,
}

impl BlockProgram {
    /// Create an empty program
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call
    pub fn with_call(mut self, call: CreateCall) -> Self {
        self.calls.push(call);
        self
    }

    /// Add a square ground slab of the given edge length, top face at y = 0
    pub fn add_ground(self, size: f32) -> Self {
        self.with_call(CreateCall::Primitive {
            block_id: GROUND_NAME.to_string(),
            shape: Primitive::Ground,
            size: Vec3::new(size, GROUND_THICKNESS, size),
            transform: Transform::from_position(Vec3::new(0.0, -GROUND_THICKNESS / 2.0, 0.0)),
            color: Some([0.4, 0.4, 0.4]),
        })
    }

    /// Add a box
    pub fn add_box(self, block_id: impl Into<String>, position: Vec3, size: Vec3) -> Self {
        self.with_call(CreateCall::Primitive {
            block_id: block_id.into(),
            shape: Primitive::Box,
            size,
            transform: Transform::from_position(position),
            color: None,
        })
    }

    /// Add a sphere
    pub fn add_sphere(self, block_id: impl Into<String>, position: Vec3, diameter: f32) -> Self {
        self.with_call(CreateCall::Primitive {
            block_id: block_id.into(),
            shape: Primitive::Sphere,
            size: Vec3::splat(diameter),
            transform: Transform::from_position(position),
            color: None,
        })
    }

    /// Add a named model
    pub fn add_model(self, block_id: impl Into<String>, model: impl Into<String>, position: Vec3) -> Self {
        self.with_call(CreateCall::Model {
            block_id: block_id.into(),
            model: model.into(),
            transform: Transform::from_position(position),
        })
    }

    /// Number of calls
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether the program creates nothing
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// A model waiting for its asset
#[derive(Debug, Clone, PartialEq)]
pub struct PendingModel {
    /// Id shared by the placeholder and the final object
    pub id: CustomId,
    /// Resolved asset URL
    pub url: String,
    /// Placeholder standing in for the model
    pub placeholder: NodeKey,
}

/// Run every call against a fresh session
///
/// Primitives are complete when this returns; each model is represented by
/// a registered placeholder and listed in the returned pending loads.
pub fn apply(
    session: &mut SceneSession,
    program: &BlockProgram,
    resolver: &dyn AssetUrlResolver,
) -> Vec<PendingModel> {
    let mut pending = Vec::new();
    for call in &program.calls {
        match call {
            CreateCall::Primitive {
                block_id,
                shape,
                size,
                transform,
                color,
            } => {
                create_primitive(session, block_id, *shape, *size, *transform, *color);
            }
            CreateCall::Model {
                block_id,
                model,
                transform,
            } => {
                let Some(url) = resolver.resolve(model) else {
                    log::warn!("Block {}: unknown model '{}', skipping", block_id, model);
                    continue;
                };
                match create_placeholder(session, block_id, &url, *transform) {
                    Some(placeholder) => pending.push(PendingModel {
                        id: CustomId::new(block_id.as_str()),
                        url,
                        placeholder,
                    }),
                    None => log::warn!("Block {}: could not register placeholder", block_id),
                }
            }
        }
    }
    log::debug!(
        "Applied program: {} calls, {} model loads pending",
        program.len(),
        pending.len()
    );
    pending
}

fn create_primitive(
    session: &mut SceneSession,
    block_id: &str,
    shape: Primitive,
    size: Vec3,
    transform: Transform,
    color: Option<[f32; 3]>,
) -> Option<NodeKey> {
    let [r, g, b] = color.unwrap_or([0.8, 0.8, 0.8]);
    let name = match shape {
        Primitive::Ground => GROUND_NAME.to_string(),
        Primitive::Box | Primitive::Sphere => block_id.to_string(),
    };
    let material = session
        .scene
        .add_material(Material::from_rgb(format!("{}_material", name), r, g, b));
    let key = session.scene.add_node(
        Node::with_geometry(name, size / 2.0)
            .with_transform(transform)
            .with_material(material),
    );

    if shape == Primitive::Ground {
        return Some(key);
    }

    if let Some(node) = session.scene.node_mut(key) {
        node.metadata.custom_id = Some(CustomId::new(block_id));
    }
    if let Err(err) = session.registry.register(&mut session.scene, key, ObjectKind::Dynamic, None) {
        log::warn!("Block {}: {}", block_id, err);
        session.scene.dispose_node(key);
        return None;
    }
    if session.scene.is_physics_enabled() {
        session.scene.add_physics_body(key, false);
    }
    Some(key)
}

fn create_placeholder(session: &mut SceneSession, block_id: &str, url: &str, transform: Transform) -> Option<NodeKey> {
    let mut node = Node::with_geometry(format!("{}_placeholder", block_id), Vec3::splat(PLACEHOLDER_HALF_EXTENT))
        .with_transform(transform);
    node.visibility = PLACEHOLDER_VISIBILITY;
    node.metadata.custom_id = Some(CustomId::new(block_id));
    let key = session.scene.add_node(node);

    match session
        .registry
        .register(&mut session.scene, key, ObjectKind::Placeholder, Some(url.to_string()))
    {
        Ok(_) => Some(key),
        Err(err) => {
            log::warn!("Block {}: {}", block_id, err);
            session.scene.dispose_node(key);
            None
        }
    }
}

/// Swap a placeholder for its loaded model, or drop it if the load failed
///
/// The model takes the placeholder's current transform and id, so a
/// placeholder the user moved while the load was pending keeps its place.
/// Returns the model root on success.
pub fn complete_model(
    session: &mut SceneSession,
    pending: &PendingModel,
    loaded: Result<AssetTemplate, AssetError>,
) -> Option<NodeKey> {
    let was_attached = session.attached() == Some(pending.placeholder);
    if was_attached {
        session.detach();
    }
    let transform = session
        .scene
        .world_transform(pending.placeholder)
        .unwrap_or_else(Transform::identity);

    let template = match loaded {
        Ok(template) => template,
        Err(err) => {
            log::warn!("Failed to load {} for block {}: {}", pending.url, pending.id, err);
            discard_placeholder(session, pending);
            return None;
        }
    };

    session.scene.dispose_node(pending.placeholder);
    match session.adopt_asset(
        &template,
        transform,
        Some(pending.id.clone()),
        ObjectKind::Dynamic,
        Some(pending.url.clone()),
    ) {
        Ok(adopted) => {
            if was_attached {
                session.attach(adopted.root);
            }
            Some(adopted.root)
        }
        Err(err) => {
            log::warn!("Failed to place {} for block {}: {}", pending.url, pending.id, err);
            if session.registry.lookup(&pending.id) == Some(pending.placeholder) {
                session.registry.unregister(&pending.id);
            }
            None
        }
    }
}

fn discard_placeholder(session: &mut SceneSession, pending: &PendingModel) {
    if session.registry.lookup(&pending.id) == Some(pending.placeholder) {
        session.registry.unregister(&pending.id);
    }
    session.scene.dispose_node(pending.placeholder);
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockstage_core::{PhysicsBackend, SceneManager, SceneOptions, SceneSettings};

    fn resolver(name: &str) -> Option<String> {
        (name == "chair").then(|| "models/chair.ron".to_string())
    }

    fn fresh(manager: &mut SceneManager) -> &mut SceneSession {
        manager.create_scene(SceneOptions::default())
    }

    fn chair() -> AssetTemplate {
        AssetTemplate::single_box("chair", Vec3::splat(0.4), Material::default())
    }

    #[test]
    fn test_primitives_are_dynamic_and_keyed_by_block() {
        let mut manager = SceneManager::new(PhysicsBackend::initialize(), SceneSettings::default());
        let session = fresh(&mut manager);
        let program = BlockProgram::new()
            .add_ground(20.0)
            .add_box("block-1", Vec3::new(0.0, 0.5, 0.0), Vec3::ONE)
            .add_sphere("block-2", Vec3::new(2.0, 0.5, 0.0), 1.0);

        let pending = apply(session, &program, &resolver);

        assert!(pending.is_empty());
        assert_eq!(session.registry.len(), 2);
        let key = session.registry.lookup(&CustomId::new("block-1")).unwrap();
        assert_eq!(session.registry.kind_of(&session.scene, key), Some(ObjectKind::Dynamic));
        assert!(session.scene.find_by_name(GROUND_NAME).is_some());
    }

    #[test]
    fn test_ground_is_not_registered() {
        let mut manager = SceneManager::new(PhysicsBackend::initialize(), SceneSettings::default());
        let session = fresh(&mut manager);
        apply(session, &BlockProgram::new().add_ground(10.0), &resolver);

        let ground = session.scene.find_by_name(GROUND_NAME).unwrap();
        assert_eq!(session.registry.len(), 0);
        assert!(session.scene.node(ground).unwrap().metadata.custom_id.is_none());
    }

    #[test]
    fn test_model_starts_as_placeholder() {
        let mut manager = SceneManager::new(PhysicsBackend::initialize(), SceneSettings::default());
        let session = fresh(&mut manager);
        let program = BlockProgram::new().add_model("block-3", "chair", Vec3::new(1.0, 0.0, 0.0));

        let pending = apply(session, &program, &resolver);

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].url, "models/chair.ron");
        let key = session.registry.lookup(&pending[0].id).unwrap();
        assert_eq!(key, pending[0].placeholder);
        assert_eq!(session.registry.kind_of(&session.scene, key), Some(ObjectKind::Placeholder));
    }

    #[test]
    fn test_unknown_model_is_skipped() {
        let mut manager = SceneManager::new(PhysicsBackend::initialize(), SceneSettings::default());
        let session = fresh(&mut manager);
        let pending = apply(session, &BlockProgram::new().add_model("block-4", "piano", Vec3::ZERO), &resolver);
        assert!(pending.is_empty());
        assert_eq!(session.registry.len(), 0);
    }

    #[test]
    fn test_completed_model_replaces_placeholder() {
        let mut manager = SceneManager::new(PhysicsBackend::initialize(), SceneSettings::default());
        let session = fresh(&mut manager);
        let pending = apply(
            session,
            &BlockProgram::new().add_model("block-3", "chair", Vec3::new(1.0, 0.0, 0.0)),
            &resolver,
        );
        let pending = &pending[0];

        let root = complete_model(session, pending, Ok(chair())).unwrap();

        assert!(!session.scene.contains(pending.placeholder));
        assert_eq!(session.registry.lookup(&pending.id), Some(root));
        assert_eq!(session.registry.len(), 1);
        let node = session.scene.node(root).unwrap();
        assert_eq!(node.metadata.kind, Some(ObjectKind::Dynamic));
        assert_eq!(node.metadata.source_url.as_deref(), Some("models/chair.ron"));
        assert!((session.scene.world_position(root).unwrap() - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_failed_load_drops_placeholder() {
        let mut manager = SceneManager::new(PhysicsBackend::initialize(), SceneSettings::default());
        let session = fresh(&mut manager);
        let pending = apply(
            session,
            &BlockProgram::new().add_model("block-3", "chair", Vec3::ZERO),
            &resolver,
        );
        let pending = &pending[0];

        let result = complete_model(session, pending, Err(AssetError::NotFound(pending.url.clone())));

        assert!(result.is_none());
        assert!(!session.scene.contains(pending.placeholder));
        assert!(session.registry.is_empty());
    }

    #[test]
    fn test_physics_bodies_for_primitives() {
        let mut manager = SceneManager::new(PhysicsBackend::initialize(), SceneSettings::default());
        let session = manager.create_scene(SceneOptions {
            initialize_environment: true,
            physics_enabled: true,
        });
        apply(
            session,
            &BlockProgram::new()
                .add_ground(10.0)
                .add_box("block-1", Vec3::new(0.0, 2.0, 0.0), Vec3::ONE),
            &resolver,
        );
        assert_eq!(session.scene.physics().unwrap().body_count(), 1);
    }

    #[test]
    fn test_program_ron_roundtrip() {
        let program = BlockProgram::new()
            .add_ground(10.0)
            .add_model("block-3", "chair", Vec3::new(1.0, 0.0, 0.0));
        let text = ron::ser::to_string(&program).unwrap();
        let parsed: BlockProgram = ron::from_str(&text).unwrap();
        assert_eq!(parsed, program);
    }
}
