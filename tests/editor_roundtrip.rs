//! Integration tests for the editor facade
//!
//! Tests that verify objects keep their identity through:
//! 1. Re-running the block program
//! 2. Physics toggles (including the camera pose)
//! 3. Save, reset and load through file storage
//! 4. Pointer-driven select, delete and clone

use blockstage::{AppConfig, BlockProgram, DroppedAsset, Editor};
use blockstage_core::{
    AdoptedAsset, AssetTemplate, CustomId, FileStorage, Material, MemoryAssetSource, NodeTemplate, ObjectKind,
    Transform, Vec2, Vec3,
};
use blockstage_input::{PointerEvent, ToolEvent, ToolKind};
use tempfile::TempDir;
use winit::event::ElementState;
use winit::keyboard::KeyCode;

fn chair() -> AssetTemplate {
    AssetTemplate::single_box("chair", Vec3::splat(0.4), Material::from_rgb("oak", 0.6, 0.4, 0.2)).with_node(
        NodeTemplate::new("back")
            .with_parent(0)
            .with_transform(Transform::from_position(Vec3::new(0.0, 0.5, -0.35)))
            .with_half_extents(Vec3::new(0.4, 0.4, 0.05)),
    )
}

fn setup() -> (TempDir, Editor<MemoryAssetSource>) {
    let dir = tempfile::tempdir().unwrap();
    let source = MemoryAssetSource::new().with_asset("models/chair.ron", chair());
    let editor = Editor::new(&AppConfig::default(), source, Box::new(FileStorage::new(dir.path())));
    (dir, editor)
}

fn program() -> BlockProgram {
    BlockProgram::new()
        .add_ground(20.0)
        .add_box("block-box", Vec3::new(-3.0, 0.5, 0.0), Vec3::ONE)
        .add_model("block-chair", "chair", Vec3::new(0.0, 0.0, -3.0))
}

fn drop_chair(editor: &Editor<MemoryAssetSource>) -> AdoptedAsset {
    pollster::block_on(editor.spawn_from_external_drop(&DroppedAsset::named("chair"), 900.0, 450.0))
        .unwrap()
        .unwrap()
}

fn position_of(editor: &Editor<MemoryAssetSource>, id: &CustomId) -> Option<Vec3> {
    let session = editor.session()?;
    let key = session.registry.lookup(id)?;
    session.scene.world_position(key)
}

fn kind_of(editor: &Editor<MemoryAssetSource>, id: &str) -> Option<ObjectKind> {
    let session = editor.session()?;
    let key = session.registry.lookup(&CustomId::new(id))?;
    session.registry.kind_of(&session.scene, key)
}

fn screen_of(editor: &Editor<MemoryAssetSource>, id: &CustomId) -> Vec2 {
    let position = position_of(editor, id).unwrap();
    editor.session().unwrap().scene.camera.project(position).unwrap()
}

// ==================== Program runs ====================

#[test]
fn test_run_creates_dynamic_objects() {
    let (_dir, editor) = setup();
    let report = pollster::block_on(editor.run(program()));

    assert_eq!(report.models_loaded, 1);
    assert_eq!(report.models_failed, 0);
    assert_eq!(kind_of(&editor, "block-box"), Some(ObjectKind::Dynamic));
    assert_eq!(kind_of(&editor, "block-chair"), Some(ObjectKind::Dynamic));

    let session = editor.session().unwrap();
    assert_eq!(session.registry.len(), 2);
    assert!(session.scene.find_by_name("block-chair_placeholder").is_none());
}

#[test]
fn test_failed_model_leaves_no_placeholder() {
    let (_dir, editor) = setup();
    let report = pollster::block_on(editor.run(BlockProgram::new().add_model("block-lamp", "lamp", Vec3::ZERO)));

    assert_eq!(report.models_failed, 1);
    assert_eq!(kind_of(&editor, "block-lamp"), None);
    assert!(editor.session().unwrap().scene.find_by_name("block-lamp_placeholder").is_none());
}

#[test]
fn test_rerun_keeps_static_identity() {
    let (_dir, editor) = setup();
    pollster::block_on(editor.run(program()));
    let dropped = drop_chair(&editor);
    let before = position_of(&editor, &dropped.id).unwrap();

    let report = pollster::block_on(editor.run(program()));

    assert_eq!(report.statics.restored, vec![dropped.id.clone()]);
    let after = position_of(&editor, &dropped.id).unwrap();
    assert!((after - before).length() < 1e-5);
    assert_eq!(kind_of(&editor, dropped.id.as_str()), Some(ObjectKind::Static));
    assert_eq!(editor.session().unwrap().registry.len(), 3);
}

#[test]
fn test_reset_keep_static() {
    let (_dir, editor) = setup();
    pollster::block_on(editor.run(program()));
    let dropped = drop_chair(&editor);

    pollster::block_on(editor.reset(true));
    assert_eq!(kind_of(&editor, "block-box"), None);
    assert!(position_of(&editor, &dropped.id).is_some());

    pollster::block_on(editor.reset(false));
    assert!(editor.session().unwrap().registry.is_empty());
}

// ==================== Physics toggle ====================

#[test]
fn test_toggle_physics_keeps_statics_and_camera() {
    let (_dir, editor) = setup();
    pollster::block_on(editor.run(program()));
    let dropped = drop_chair(&editor);
    let position = position_of(&editor, &dropped.id).unwrap();

    // Selecting focuses the camera on the object
    let screen = screen_of(&editor, &dropped.id);
    assert_eq!(editor.pointer_down(PointerEvent::left(screen.x, screen.y)), ToolEvent::None);
    assert_eq!(
        editor.pointer_up(PointerEvent::left(screen.x, screen.y)),
        ToolEvent::Attached(dropped.root)
    );
    editor.tick(std::time::Duration::from_secs(1));
    let pose = editor.session().unwrap().scene.camera.pose();
    assert!((pose.target.unwrap() - position).length() < 1e-4);

    let report = pollster::block_on(editor.toggle_physics());

    assert!(editor.physics_enabled());
    assert_eq!(report.statics.restored, vec![dropped.id.clone()]);
    let session = editor.session().unwrap();
    assert!(session.scene.is_physics_enabled());
    assert!((session.scene.camera.pose().target.unwrap() - position).length() < 1e-4);
    assert_eq!(session.attached(), None);
}

#[test]
fn test_physics_off_again() {
    let (_dir, editor) = setup();
    pollster::block_on(editor.run(program()));
    assert!(pollster::block_on(editor.set_physics_enabled(true)).is_some());
    assert!(pollster::block_on(editor.set_physics_enabled(true)).is_none());
    assert!(pollster::block_on(editor.set_physics_enabled(false)).is_some());

    let session = editor.session().unwrap();
    assert!(!session.scene.is_physics_enabled());
    assert_eq!(session.registry.len(), 2);
}

// ==================== Save / load ====================

#[test]
fn test_save_reset_load_restores_ids() {
    let (dir, editor) = setup();
    pollster::block_on(editor.run(program()));
    let dropped = drop_chair(&editor);
    let position = position_of(&editor, &dropped.id).unwrap();

    assert_eq!(editor.save().unwrap(), 1);
    assert!(dir.path().join("savedScene.json").exists());

    pollster::block_on(editor.reset(false));
    assert!(position_of(&editor, &dropped.id).is_none());

    let report = pollster::block_on(editor.load()).unwrap();
    assert_eq!(report.statics.restored, vec![dropped.id.clone()]);
    assert!((position_of(&editor, &dropped.id).unwrap() - position).length() < 1e-5);

    // Children point back at the restored root
    let session = editor.session().unwrap();
    let root = session.registry.lookup(&dropped.id).unwrap();
    let child = session.scene.node(root).unwrap().children[0];
    assert_eq!(
        session.scene.node(child).unwrap().metadata.root_asset_id.as_ref(),
        Some(&dropped.id)
    );
}

#[test]
fn test_load_empty_slot() {
    let (_dir, editor) = setup();
    let report = pollster::block_on(editor.load()).unwrap();
    assert!(report.statics.restored.is_empty());
}

// ==================== Pointer tools ====================

#[test]
fn test_select_then_delete() {
    let (_dir, editor) = setup();
    pollster::block_on(editor.run(program()));
    let dropped = drop_chair(&editor);
    let screen = screen_of(&editor, &dropped.id);

    editor.pointer_down(PointerEvent::left(screen.x, screen.y));
    editor.pointer_up(PointerEvent::left(screen.x, screen.y));
    assert_eq!(editor.handle_keyboard(KeyCode::Delete, ElementState::Pressed), ToolEvent::Deleted);

    assert!(position_of(&editor, &dropped.id).is_none());
    assert_eq!(editor.save().unwrap(), 0);
}

#[test]
fn test_clone_through_editor() {
    let (_dir, editor) = setup();
    pollster::block_on(editor.run(program()));
    let dropped = drop_chair(&editor);
    let screen = screen_of(&editor, &dropped.id);

    editor.set_tool(ToolKind::Clone);
    assert!(matches!(
        editor.pointer_down(PointerEvent::left(screen.x, screen.y)),
        ToolEvent::PreviewStarted(_)
    ));
    let place = screen + Vec2::new(120.0, 30.0);
    assert_eq!(editor.pointer_move(place), ToolEvent::PreviewMoved);
    let id = match editor.pointer_down(PointerEvent::left(place.x, place.y)) {
        ToolEvent::CloneCommitted { id, .. } => id,
        other => panic!("expected commit, got {:?}", other),
    };

    assert_ne!(id, dropped.id);
    assert_eq!(editor.tool(), ToolKind::Select);
    assert_eq!(kind_of(&editor, id.as_str()), Some(ObjectKind::Static));
    assert_eq!(editor.save().unwrap(), 2);
}
