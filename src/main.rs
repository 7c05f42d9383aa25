//! Blockstage - headless editor demo
//!
//! Builds an editor over the asset directory and the save directory from
//! the configuration, runs a small block program, drops and clones a model
//! through pointer events, then saves and reloads the scene.

use std::time::Duration;

use blockstage::{AppConfig, BlockProgram, DroppedAsset, Editor};
use blockstage_core::{FileAssetSource, FileStorage, Vec2, Vec3};
use blockstage_input::{ToolEvent, ToolKind};
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.debug.log_level.as_str())).init();
    if let Some(e) = config_error {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }
    log::info!("Starting Blockstage");

    let source = FileAssetSource::new(&config.assets.root);
    let storage = FileStorage::new(&config.storage.directory);
    let editor = Editor::new(&config, source, Box::new(storage));

    let program = BlockProgram::new()
        .add_ground(30.0)
        .add_box("block-crate", Vec3::new(-3.0, 0.5, 0.0), Vec3::ONE)
        .add_sphere("block-ball", Vec3::new(3.0, 0.5, 0.0), 1.0)
        .add_model("block-chair", "chair", Vec3::new(0.0, 0.0, -3.0));
    let report = pollster::block_on(editor.run(program));
    log::info!("Run: {:?}", report);

    // Drop a model in front of the camera, then clone it a little to the right
    let center = Vec2::new(config.camera.viewport[0] / 2.0, config.camera.viewport[1] / 2.0);
    let dropped = pollster::block_on(editor.spawn_from_external_drop(&DroppedAsset::named("chair"), center.x, center.y))?;
    if let Some(dropped) = dropped {
        let target = editor
            .session()
            .and_then(|session| session.scene.world_position(dropped.root).and_then(|p| session.scene.camera.project(p)));
        if let Some(target) = target {
            editor.set_tool(ToolKind::Clone);
            editor.handle_mouse_button(MouseButton::Left, ElementState::Pressed, target);
            editor.handle_mouse_button(MouseButton::Left, ElementState::Released, target);
            let place = target + Vec2::new(150.0, 40.0);
            editor.pointer_move(place);
            if let ToolEvent::CloneCommitted { id, .. } =
                editor.handle_mouse_button(MouseButton::Left, ElementState::Pressed, place)
            {
                log::info!("Cloned {} into {}", dropped.id, id);
            }
            editor.handle_mouse_button(MouseButton::Left, ElementState::Released, place);
            editor.handle_keyboard(KeyCode::Escape, ElementState::Pressed);
        }
    }

    for _ in 0..30 {
        editor.tick(Duration::from_millis(16));
    }

    let report = pollster::block_on(editor.toggle_physics());
    log::info!("Physics on: {:?}", report);
    for _ in 0..60 {
        editor.tick(Duration::from_millis(16));
    }

    let saved = editor.save()?;
    let report = pollster::block_on(editor.load())?;
    log::info!(
        "Saved {} objects to '{}', restored {}",
        saved,
        editor.slot(),
        report.statics.restored.len()
    );

    Ok(())
}
