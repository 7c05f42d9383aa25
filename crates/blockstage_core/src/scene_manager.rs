//! Scene lifecycle management
//!
//! The [`SceneManager`] is the only owner allowed to dispose a scene. Every
//! call to [`SceneManager::create_scene`] tears the previous session down in
//! a fixed order and builds a fresh [`SceneSession`]:
//!
//! 1. clear the identity registry
//! 2. unwire the gizmo pointer observer
//! 3. dispose the gizmo widgets
//! 4. dispose the gizmo utility layer
//! 5. exit any XR session, then dispose the XR experience
//! 6. stop physics if the next scene runs without it, then dispose the scene
//!
//! A failing step is logged and the remaining steps still run, so a new
//! scene is always built.
//!
//! Each session gets a generation number. Async work captures a
//! [`LoadTicket`] before suspending and asks [`SceneManager::session_for`]
//! for the session when it resumes; a ticket from a torn-down session gets
//! nothing back.
//!
//! # Example
//! ```ignore
//! let mut manager = SceneManager::new(PhysicsBackend::initialize(), SceneSettings::default());
//! manager.create_scene(SceneOptions::default());
//!
//! let ticket = manager.begin_load();
//! let template = source.load(url).await?;
//! if let Some(session) = manager.session_for(&ticket) {
//!     session.adopt_asset(&template, transform, None, ObjectKind::Static, Some(url.into()))?;
//! }
//! ```

use std::time::Duration;

use blockstage_math::Vec3;
use blockstage_physics::{PhysicsBackend, PhysicsConfig, PhysicsWorld};
use thiserror::Error;

use crate::asset::AssetTemplate;
use crate::asset_error::AssetError;
use crate::camera::Camera;
use crate::camera_transition::DEFAULT_TRANSITION_DURATION;
use crate::gizmo::{GizmoError, GizmoSet, DEFAULT_HANDLE_RADIUS};
use crate::node::{NodeKey, ObjectKind};
use crate::registry::{tag_descendants, Registry};
use crate::scene::{Environment, Scene};
use crate::selection::{resolve_manipulation_target, SelectionController};
use crate::xr::{XrError, XrExperience};
use crate::{CustomId, Transform};

/// Errors from a teardown step
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// A gizmo part failed to dispose
    #[error("gizmo teardown failed: {0}")]
    Gizmo(#[from] GizmoError),
    /// The XR experience failed to exit or dispose
    #[error("XR teardown failed: {0}")]
    Xr(#[from] XrError),
    /// An input observer could not be removed
    #[error("observer teardown failed: {0}")]
    Observer(String),
    /// The scene was already disposed
    #[error("scene already disposed")]
    SceneDisposed,
}

/// Settings applied to every scene the manager builds
#[derive(Clone, Debug)]
pub struct SceneSettings {
    /// Camera a fresh scene starts with
    pub camera: Camera,
    /// Gravity for the physics plugin
    pub gravity: Vec3,
    /// Height of the physics ground plane, if any
    pub ground_y: Option<f32>,
    /// Ambient light intensity for initialized environments
    pub ambient_intensity: f32,
    /// Background texture for initialized environments
    pub background_texture: Option<String>,
    /// Duration of the camera focus move on selection
    pub transition_duration: Duration,
    /// Screen radius of the position gizmo handle
    pub gizmo_handle_radius: f32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        let physics = PhysicsConfig::default();
        Self {
            camera: Camera::default(),
            gravity: physics.gravity,
            ground_y: physics.ground_y,
            ambient_intensity: Environment::default().ambient_intensity,
            background_texture: None,
            transition_duration: DEFAULT_TRANSITION_DURATION,
            gizmo_handle_radius: DEFAULT_HANDLE_RADIUS,
        }
    }
}

/// Per-call scene options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneOptions {
    /// Create ambient light and background
    pub initialize_environment: bool,
    /// Attach a physics plugin
    pub physics_enabled: bool,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            initialize_environment: true,
            physics_enabled: false,
        }
    }
}

/// Generation captured when an async load starts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    /// Generation of the session the load started in
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// An asset placed into a session
#[derive(Clone, Debug, PartialEq)]
pub struct AdoptedAsset {
    /// Root node of the instantiated asset
    pub root: NodeKey,
    /// Id the root was registered under
    pub id: CustomId,
}

/// Everything that lives exactly as long as one scene
pub struct SceneSession {
    generation: u64,
    /// The scene graph
    pub scene: Scene,
    /// Identity registry for this scene
    pub registry: Registry,
    /// Transform gizmos
    pub gizmos: GizmoSet,
    /// Selection state
    pub controller: SelectionController,
    /// XR experience
    pub xr: XrExperience,
}

impl SceneSession {
    /// Generation number of this session
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolve a picked node to the object to manipulate
    pub fn resolve(&self, picked: NodeKey) -> Option<NodeKey> {
        resolve_manipulation_target(&self.scene, &self.registry, picked)
    }

    /// Attach the gizmos to a node
    pub fn attach(&mut self, key: NodeKey) {
        self.controller.attach(&self.scene, &mut self.gizmos, key);
    }

    /// Detach the gizmos
    pub fn detach(&mut self) {
        self.controller.detach(&mut self.gizmos);
    }

    /// Currently attached node
    pub fn attached(&self) -> Option<NodeKey> {
        self.controller.attached()
    }

    /// Delete the attached object if it is static
    pub fn delete_attached(&mut self) -> bool {
        self.controller
            .delete_attached(&mut self.scene, &mut self.registry, &mut self.gizmos)
    }

    /// Step physics and the camera focus move
    pub fn update(&mut self, dt: Duration) {
        self.scene.update(dt.as_secs_f32());
        self.controller.update(&mut self.scene.camera, dt);
    }

    /// Place a loaded asset into the scene as a managed object
    ///
    /// The root gets `transform` and is registered under `id` (or a fresh
    /// id); descendants are tagged with that id. With physics on, the root
    /// also gets a body.
    pub fn adopt_asset(
        &mut self,
        template: &AssetTemplate,
        transform: Transform,
        id: Option<CustomId>,
        kind: ObjectKind,
        source_url: Option<String>,
    ) -> Result<AdoptedAsset, AssetError> {
        let root = self.scene.instantiate(template)?;
        self.scene.set_transform(root, transform);
        if let Some(node) = self.scene.node_mut(root) {
            node.metadata.custom_id = id;
        }

        let id = self.registry.register(&mut self.scene, root, kind, source_url)?;
        tag_descendants(&mut self.scene, root, &id);
        if self.scene.is_physics_enabled() {
            self.scene.add_physics_body(root, kind == ObjectKind::Static);
        }
        Ok(AdoptedAsset { root, id })
    }

    /// Registered objects of the given kind, sorted by id
    pub fn objects_of_kind(&self, kind: ObjectKind) -> Vec<(CustomId, NodeKey)> {
        let mut out: Vec<(CustomId, NodeKey)> = self
            .registry
            .iter()
            .filter(|(_, key)| self.registry.kind_of(&self.scene, *key) == Some(kind))
            .map(|(id, key)| (id.clone(), key))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

/// Owns the scene session and rebuilds it on demand
pub struct SceneManager {
    backend: PhysicsBackend,
    settings: SceneSettings,
    generation: u64,
    session: Option<SceneSession>,
    last_teardown_failures: usize,
}

impl SceneManager {
    /// Create a manager over a pre-initialized physics backend
    pub fn new(backend: PhysicsBackend, settings: SceneSettings) -> Self {
        Self {
            backend,
            settings,
            generation: 0,
            session: None,
            last_teardown_failures: 0,
        }
    }

    /// Settings used for new scenes
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// The physics backend
    pub fn backend(&self) -> &PhysicsBackend {
        &self.backend
    }

    /// Current generation (0 before the first scene)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of teardown steps that failed during the last rebuild
    pub fn last_teardown_failures(&self) -> usize {
        self.last_teardown_failures
    }

    /// Tear down the current session and build a new one
    pub fn create_scene(&mut self, options: SceneOptions) -> &mut SceneSession {
        self.last_teardown_failures = match self.session.take() {
            Some(old) => Self::teardown(old, options.physics_enabled),
            None => 0,
        };

        let mut scene = Scene::new(self.settings.camera.clone());
        if options.initialize_environment {
            scene.set_environment(Environment {
                ambient_intensity: self.settings.ambient_intensity,
                background_texture: self.settings.background_texture.clone(),
            });
        }
        if options.physics_enabled {
            let config = PhysicsConfig::new(self.settings.gravity).with_ground(self.settings.ground_y);
            scene.enable_physics(PhysicsWorld::new(&self.backend, config));
        }

        self.generation += 1;
        log::info!(
            "Created scene generation {} (environment: {}, physics: {})",
            self.generation,
            options.initialize_environment,
            options.physics_enabled
        );

        self.session.insert(SceneSession {
            generation: self.generation,
            scene,
            registry: Registry::new(),
            gizmos: GizmoSet::new(self.settings.gizmo_handle_radius),
            controller: SelectionController::new(self.settings.transition_duration),
            xr: XrExperience::new(),
        })
    }

    fn teardown(mut old: SceneSession, physics_next: bool) -> usize {
        let mut failures = 0;
        let mut step = |name: &str, result: Result<(), LifecycleError>| {
            if let Err(err) = result {
                log::warn!("Teardown step '{}' failed: {}", name, err);
                failures += 1;
            }
        };

        old.registry.clear();

        let observer = if old.controller.is_pointer_wired() {
            old.controller.unwire_pointer();
            Ok(())
        } else {
            Err(LifecycleError::Observer("pointer observer was not wired".into()))
        };
        step("pointer observer", observer);

        step("gizmo widgets", old.gizmos.dispose_widgets().map_err(LifecycleError::from));
        step("gizmo layer", old.gizmos.dispose_layer().map_err(LifecycleError::from));

        let xr = if old.xr.in_session() {
            old.xr.exit_session().and_then(|_| old.xr.dispose())
        } else {
            old.xr.dispose()
        };
        step("xr", xr.map_err(LifecycleError::from));

        let scene = if old.scene.is_disposed() {
            Err(LifecycleError::SceneDisposed)
        } else {
            if !physics_next && old.scene.is_physics_enabled() {
                old.scene.disable_physics();
                log::debug!("Disabled physics on outgoing scene");
            }
            old.scene.dispose();
            Ok(())
        };
        step("scene", scene);

        failures
    }

    /// Current session
    pub fn session(&self) -> Option<&SceneSession> {
        self.session.as_ref()
    }

    /// Current session, mutably
    pub fn session_mut(&mut self) -> Option<&mut SceneSession> {
        self.session.as_mut()
    }

    /// Capture the current generation before starting async work
    pub fn begin_load(&self) -> LoadTicket {
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Whether a ticket still refers to the live session
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.session.is_some() && ticket.generation == self.generation
    }

    /// Session a load may write into; None if the ticket is stale
    pub fn session_for(&mut self, ticket: &LoadTicket) -> Option<&mut SceneSession> {
        if !self.is_current(ticket) {
            log::debug!(
                "Discarding load from generation {} (current {})",
                ticket.generation,
                self.generation
            );
            return None;
        }
        self.session.as_mut()
    }
}
