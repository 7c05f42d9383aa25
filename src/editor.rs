//! Editor facade
//!
//! Ties the scene manager, the input dispatcher, storage and the asset
//! source together behind the operations the host UI calls: run, reset,
//! physics toggle, save, load and external drops.
//!
//! Every rebuild follows the same sequence: capture the camera pose and the
//! static objects, build a fresh scene, replay the block program, put the
//! camera back, then restore the statics. The manager sits in a `RefCell`
//! so that no borrow is held while an asset load is pending; loads that
//! finish after another rebuild are discarded by the manager's generation
//! check.

use std::cell::{Cell, Ref, RefCell};
use std::time::Duration;

use blockstage_core::{
    load_records, restore, save_records, snapshot, AdoptedAsset, AssetSource, AssetUrlResolver, CameraPose,
    ObjectKind, PersistenceError, PhysicsBackend, RestoreReport, SavedObject, SceneManager, SceneOptions,
    SceneSession, SceneStorage, Transform, Vec2, Vec3,
};
use blockstage_input::{EditorKey, InputDispatcher, PointerEvent, ToolEvent, ToolKind};
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

use crate::config::{AppConfig, AssetsConfig};
use crate::program::{self, BlockProgram};

/// Errors surfaced by editor operations
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// No scene has been built yet
    #[error("no scene session")]
    NoSession,
    /// A dropped asset could not be used
    #[error("unusable asset source: {0}")]
    UnusableSource(String),
    /// Reading or writing the saved scene failed
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Shows failures the user has to acknowledge
pub trait Notifier {
    /// Present `message` and block until it is dismissed
    fn notify_blocking(&self, message: &str);
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_blocking(&self, message: &str) {
        log::error!("{}", message);
    }
}

/// Maps a model name to `<models_dir>/<name>.<extension>`
#[derive(Debug, Clone)]
pub struct ModelDirectoryResolver {
    models_dir: String,
    extension: String,
}

impl ModelDirectoryResolver {
    pub fn new(models_dir: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            models_dir: models_dir.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &AssetsConfig) -> Self {
        Self::new(config.models_dir.clone(), config.extension.clone())
    }
}

impl AssetUrlResolver for ModelDirectoryResolver {
    fn resolve(&self, logical_name: &str) -> Option<String> {
        let valid = !logical_name.is_empty()
            && logical_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| format!("{}/{}.{}", self.models_dir, logical_name, self.extension))
    }
}

/// An asset dragged onto the canvas from outside
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedAsset {
    /// Logical model name
    pub name: String,
    /// Direct URL, when the drop carried one
    pub url: Option<String>,
}

impl DroppedAsset {
    /// Drop of a named model
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }

    /// Drop carrying its own URL
    pub fn with_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
        }
    }
}

/// What a rebuild produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Generation of the scene that was built
    pub generation: u64,
    /// Models swapped in for their placeholders
    pub models_loaded: usize,
    /// Models whose load failed
    pub models_failed: usize,
    /// Model loads that finished after a newer rebuild
    pub models_stale: usize,
    /// Outcome of putting the static objects back
    pub statics: RestoreReport,
}

/// The scene editor
pub struct Editor<S> {
    manager: RefCell<SceneManager>,
    input: RefCell<InputDispatcher>,
    storage: RefCell<Box<dyn SceneStorage>>,
    source: S,
    resolver: Box<dyn AssetUrlResolver>,
    notifier: Box<dyn Notifier>,
    options: Cell<SceneOptions>,
    program: RefCell<BlockProgram>,
    slot: String,
}

impl<S: AssetSource> Editor<S> {
    /// Create an editor and build its first, empty scene
    pub fn new(config: &AppConfig, source: S, storage: Box<dyn SceneStorage>) -> Self {
        let options = config.to_scene_options();
        let mut manager = SceneManager::new(PhysicsBackend::initialize(), config.to_scene_settings());
        manager.create_scene(options);

        Self {
            manager: RefCell::new(manager),
            input: RefCell::new(InputDispatcher::new(config.to_tool_settings())),
            storage: RefCell::new(storage),
            source,
            resolver: Box::new(ModelDirectoryResolver::from_config(&config.assets)),
            notifier: Box::new(LogNotifier),
            options: Cell::new(options),
            program: RefCell::new(BlockProgram::new()),
            slot: config.storage.slot.clone(),
        }
    }

    /// Replace the model name resolver
    pub fn with_resolver(mut self, resolver: impl AssetUrlResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Replace the notifier
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// The scene manager
    pub fn manager(&self) -> Ref<'_, SceneManager> {
        self.manager.borrow()
    }

    /// The live session
    pub fn session(&self) -> Option<Ref<'_, SceneSession>> {
        Ref::filter_map(self.manager.borrow(), |manager| manager.session()).ok()
    }

    /// Active tool
    pub fn tool(&self) -> ToolKind {
        self.input.borrow().tool()
    }

    /// Whether scenes are built with physics
    pub fn physics_enabled(&self) -> bool {
        self.options.get().physics_enabled
    }

    /// Storage slot used by save and load
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Run a block program
    ///
    /// Dynamic objects from the previous run are dropped with the old scene;
    /// static objects are kept.
    pub async fn run(&self, program: BlockProgram) -> RunReport {
        log::info!("Running program with {} calls", program.len());
        *self.program.borrow_mut() = program;
        self.rebuild(true).await
    }

    /// Clear the program and rebuild, optionally keeping static objects
    pub async fn reset(&self, keep_static: bool) -> RunReport {
        log::info!("Resetting scene (keep static objects: {})", keep_static);
        *self.program.borrow_mut() = BlockProgram::new();
        self.rebuild(keep_static).await
    }

    /// Rebuild with physics on or off; does nothing if already in that state
    pub async fn set_physics_enabled(&self, enabled: bool) -> Option<RunReport> {
        if self.physics_enabled() == enabled {
            return None;
        }
        let mut options = self.options.get();
        options.physics_enabled = enabled;
        self.options.set(options);
        log::info!("Physics {}", if enabled { "enabled" } else { "disabled" });
        Some(self.rebuild(true).await)
    }

    /// Flip physics and rebuild
    pub async fn toggle_physics(&self) -> RunReport {
        let options = SceneOptions {
            physics_enabled: !self.physics_enabled(),
            ..self.options.get()
        };
        self.options.set(options);
        log::info!("Physics toggled {}", if options.physics_enabled { "on" } else { "off" });
        self.rebuild(true).await
    }

    /// Write the static objects to the storage slot; returns how many were saved
    pub fn save(&self) -> Result<usize, EditorError> {
        let records = {
            let manager = self.manager.borrow();
            let session = manager.session().ok_or(EditorError::NoSession)?;
            snapshot(session)
        };
        let mut storage = self.storage.borrow_mut();
        save_records(storage.as_mut(), &self.slot, &records)?;
        log::info!("Saved {} objects to '{}'", records.len(), self.slot);
        Ok(records.len())
    }

    /// Rebuild with the static objects stored in the slot
    ///
    /// Statics currently in the scene are replaced by the saved set.
    pub async fn load(&self) -> Result<RunReport, EditorError> {
        let records = {
            let storage = self.storage.borrow();
            load_records(storage.as_ref(), &self.slot)?
        };
        log::info!("Loading {} objects from '{}'", records.len(), self.slot);
        let pose = self.session().map(|session| session.scene.camera.pose());
        Ok(self.rebuild_with(pose, records).await)
    }

    /// Place a dropped asset at a screen point as a new static object
    ///
    /// The point is resolved by picking, falling back to the placement
    /// raycast. An asset with no usable URL, or one that fails to load, is
    /// reported through the notifier. Returns `Ok(None)` when the scene was
    /// rebuilt while the asset loaded.
    pub async fn spawn_from_external_drop(
        &self,
        asset: &DroppedAsset,
        x: f32,
        y: f32,
    ) -> Result<Option<AdoptedAsset>, EditorError> {
        let url = asset
            .url
            .clone()
            .filter(|url| !url.is_empty())
            .or_else(|| self.resolver.resolve(&asset.name));
        let Some(url) = url else {
            return Err(self.user_facing(EditorError::UnusableSource(format!(
                "no model URL for '{}'",
                asset.name
            ))));
        };

        let (ticket, position) = {
            let manager = self.manager.borrow();
            let session = manager.session().ok_or(EditorError::NoSession)?;
            (manager.begin_load(), drop_point(session, Vec2::new(x, y)))
        };

        let template = match self.source.load(&url).await {
            Ok(template) => template,
            Err(err) => {
                log::warn!("Failed to load dropped asset {}: {}", url, err);
                return Err(self.user_facing(EditorError::UnusableSource(format!("{}: {}", url, err))));
            }
        };

        let mut manager = self.manager.borrow_mut();
        let Some(session) = manager.session_for(&ticket) else {
            return Ok(None);
        };
        match session.adopt_asset(
            &template,
            Transform::from_position(position),
            None,
            ObjectKind::Static,
            Some(url.clone()),
        ) {
            Ok(adopted) => {
                log::info!("Dropped {} as {} at {:?}", url, adopted.id, position);
                Ok(Some(adopted))
            }
            Err(err) => Err(self.user_facing(EditorError::UnusableSource(format!("{}: {}", url, err)))),
        }
    }

    /// Switch tools
    pub fn set_tool(&self, kind: ToolKind) -> ToolKind {
        let mut manager = self.manager.borrow_mut();
        let mut input = self.input.borrow_mut();
        match manager.session_mut() {
            Some(session) => input.set_tool(session, kind),
            None => input.tool(),
        }
    }

    pub fn pointer_down(&self, event: PointerEvent) -> ToolEvent {
        self.route(|input, session| input.pointer_down(session, event))
    }

    pub fn pointer_move(&self, position: Vec2) -> ToolEvent {
        self.route(|input, session| input.pointer_move(session, position))
    }

    pub fn pointer_up(&self, event: PointerEvent) -> ToolEvent {
        self.route(|input, session| input.pointer_up(session, event))
    }

    pub fn key(&self, key: EditorKey) -> ToolEvent {
        self.route(|input, session| input.key(session, key))
    }

    /// Route a winit mouse button event at `position`
    pub fn handle_mouse_button(&self, button: MouseButton, state: ElementState, position: Vec2) -> ToolEvent {
        self.route(|input, session| input.handle_mouse_button(session, button, state, position))
    }

    /// Route a winit keyboard event
    pub fn handle_keyboard(&self, key: KeyCode, state: ElementState) -> ToolEvent {
        self.route(|input, session| input.handle_keyboard(session, key, state))
    }

    /// Advance physics and camera animation
    pub fn tick(&self, dt: Duration) {
        if let Some(session) = self.manager.borrow_mut().session_mut() {
            session.update(dt);
        }
    }

    fn route(&self, f: impl FnOnce(&mut InputDispatcher, &mut SceneSession) -> ToolEvent) -> ToolEvent {
        let mut manager = self.manager.borrow_mut();
        let Some(session) = manager.session_mut() else {
            return ToolEvent::None;
        };
        f(&mut self.input.borrow_mut(), session)
    }

    fn user_facing(&self, err: EditorError) -> EditorError {
        self.notifier.notify_blocking(&err.to_string());
        err
    }

    async fn rebuild(&self, keep_static: bool) -> RunReport {
        let (pose, statics) = match self.session() {
            Some(session) => {
                let statics = if keep_static { snapshot(&session) } else { Vec::new() };
                (Some(session.scene.camera.pose()), statics)
            }
            None => (None, Vec::new()),
        };
        self.rebuild_with(pose, statics).await
    }

    async fn rebuild_with(&self, pose: Option<CameraPose>, statics: Vec<SavedObject>) -> RunReport {
        let (ticket, pending) = {
            let mut manager = self.manager.borrow_mut();
            let session = manager.create_scene(self.options.get());
            let pending = program::apply(session, &self.program.borrow(), self.resolver.as_ref());
            if let Some(pose) = pose {
                session.scene.camera.set_pose(pose);
            }
            (manager.begin_load(), pending)
        };

        let mut report = RunReport {
            generation: ticket.generation(),
            ..RunReport::default()
        };

        for model in &pending {
            let loaded = self.source.load(&model.url).await;
            let mut manager = self.manager.borrow_mut();
            let Some(session) = manager.session_for(&ticket) else {
                report.models_stale += 1;
                continue;
            };
            match program::complete_model(session, model, loaded) {
                Some(_) => report.models_loaded += 1,
                None => report.models_failed += 1,
            }
        }

        report.statics = restore(&self.manager, &self.source, &statics).await;
        log::info!(
            "Scene generation {} ready: {} models loaded, {} failed, {} statics restored",
            report.generation,
            report.models_loaded,
            report.models_failed,
            report.statics.restored.len()
        );
        report
    }
}

/// World point under a screen position for a drop
fn drop_point(session: &SceneSession, screen: Vec2) -> Vec3 {
    match session.scene.pick(screen) {
        Some(hit) => hit.point,
        None => session.scene.placement_point(screen),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockstage_core::{AssetTemplate, Material, MemoryAssetSource, MemoryStorage};
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct RecordingNotifier {
        messages: Rc<RefCell<Vec<String>>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify_blocking(&self, message: &str) {
            self.messages.borrow_mut().push(message.to_string());
        }
    }

    fn editor() -> Editor<MemoryAssetSource> {
        let source = MemoryAssetSource::new().with_asset(
            "models/chair.ron",
            AssetTemplate::single_box("chair", Vec3::splat(0.4), Material::default()),
        );
        Editor::new(&AppConfig::default(), source, Box::new(MemoryStorage::new()))
    }

    #[test]
    fn test_resolver() {
        let resolver = ModelDirectoryResolver::new("models", "ron");
        assert_eq!(resolver.resolve("chair").as_deref(), Some("models/chair.ron"));
        assert_eq!(resolver.resolve(""), None);
        assert_eq!(resolver.resolve("../secret"), None);
    }

    #[test]
    fn test_new_editor_has_empty_scene() {
        let editor = editor();
        assert_eq!(editor.manager().generation(), 1);
        assert!(editor.session().unwrap().registry.is_empty());
        assert_eq!(editor.tool(), ToolKind::Select);
        assert_eq!(editor.slot(), "savedScene");
    }

    #[test]
    fn test_drop_without_url_notifies() {
        let notifier = RecordingNotifier::default();
        let editor = editor().with_notifier(notifier.clone());

        let result = pollster::block_on(editor.spawn_from_external_drop(&DroppedAsset::named("bad name!"), 640.0, 360.0));

        assert!(matches!(result, Err(EditorError::UnusableSource(_))));
        assert_eq!(notifier.messages.borrow().len(), 1);
    }

    #[test]
    fn test_drop_places_static() {
        let editor = editor();
        let adopted = pollster::block_on(editor.spawn_from_external_drop(&DroppedAsset::named("chair"), 640.0, 360.0))
            .unwrap()
            .unwrap();

        let session = editor.session().unwrap();
        assert_eq!(session.registry.lookup(&adopted.id), Some(adopted.root));
        assert_eq!(session.registry.kind_of(&session.scene, adopted.root), Some(ObjectKind::Static));
    }

    #[test]
    fn test_save_without_statics_writes_empty_list() {
        let editor = editor();
        assert_eq!(editor.save().unwrap(), 0);
        let report = pollster::block_on(editor.load()).unwrap();
        assert!(report.statics.restored.is_empty());
    }

    #[test]
    fn test_set_physics_same_state_is_noop() {
        let editor = editor();
        let generation = editor.manager().generation();
        assert!(pollster::block_on(editor.set_physics_enabled(false)).is_none());
        assert_eq!(editor.manager().generation(), generation);
    }
}
