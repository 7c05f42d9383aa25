//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`BSTAGE_SECTION__KEY`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use blockstage_core::{Camera, SceneOptions, SceneSettings, Vec3};
use blockstage_input::ToolSettings;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tool and gizmo tuning
    #[serde(default)]
    pub editor: EditorConfig,
    /// Scene build options
    #[serde(default)]
    pub scene: SceneConfig,
    /// Physics configuration
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Camera configuration
    #[serde(default)]
    pub camera: CameraConfig,
    /// Saved scene storage
    #[serde(default)]
    pub storage: StorageConfig,
    /// Asset lookup
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`BSTAGE_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // BSTAGE_STORAGE__SLOT=demo -> storage.slot = "demo"
        figment = figment.merge(Env::prefixed("BSTAGE_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }

    /// Settings the scene manager applies to every scene it builds
    pub fn to_scene_settings(&self) -> SceneSettings {
        SceneSettings {
            camera: self.camera.to_camera(),
            gravity: Vec3::from_array(self.physics.gravity),
            ground_y: self.physics.ground_y,
            ambient_intensity: self.scene.ambient_intensity,
            background_texture: self.scene.background_texture.clone(),
            transition_duration: Duration::from_millis(self.editor.camera_transition_ms),
            gizmo_handle_radius: self.editor.gizmo_handle_radius,
        }
    }

    /// Options for the first scene
    pub fn to_scene_options(&self) -> SceneOptions {
        SceneOptions {
            initialize_environment: self.scene.initialize_environment,
            physics_enabled: self.scene.physics_enabled,
        }
    }

    /// Tunables for the select and clone tools
    pub fn to_tool_settings(&self) -> ToolSettings {
        ToolSettings {
            drag_threshold_sq: self.editor.drag_threshold_sq,
            preview_visibility: self.editor.preview_visibility,
        }
    }
}

/// Tool and gizmo configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Squared pixel distance separating a click from a drag
    pub drag_threshold_sq: f32,
    /// Visibility of the clone preview (0.0-1.0)
    pub preview_visibility: f32,
    /// Camera focus animation length in milliseconds
    pub camera_transition_ms: u64,
    /// Screen radius of the position gizmo handle in pixels
    pub gizmo_handle_radius: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_threshold_sq: 25.0,
            preview_visibility: 0.5,
            camera_transition_ms: 300,
            gizmo_handle_radius: 24.0,
        }
    }
}

/// Scene build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Create ambient light and background
    pub initialize_environment: bool,
    /// Start with physics on
    pub physics_enabled: bool,
    /// Ambient light intensity
    pub ambient_intensity: f32,
    /// Background texture path, if any
    #[serde(default)]
    pub background_texture: Option<String>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            initialize_environment: true,
            physics_enabled: false,
            ambient_intensity: 0.7,
            background_texture: None,
        }
    }
}

/// Physics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Gravity vector [x, y, z]
    pub gravity: [f32; 3],
    /// Height of the physics ground plane
    #[serde(default)]
    pub ground_y: Option<f32>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            ground_y: Some(0.0),
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Orbit target [x, y, z]
    pub target: [f32; 3],
    /// Longitude in radians
    pub alpha: f32,
    /// Colatitude in radians
    pub beta: f32,
    /// Distance from the target
    pub radius: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Viewport size [width, height] in pixels
    pub viewport: [f32; 2],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            target: [0.0, 0.0, 0.0],
            alpha: -std::f32::consts::FRAC_PI_2,
            beta: 1.2,
            radius: 10.0,
            fov: 45.0,
            viewport: [1280.0, 720.0],
        }
    }
}

impl CameraConfig {
    /// Build the orbit camera a fresh scene starts with
    pub fn to_camera(&self) -> Camera {
        Camera::orbit(Vec3::from_array(self.target), self.alpha, self.beta, self.radius)
            .with_fov(self.fov.to_radians())
            .with_viewport(self.viewport[0], self.viewport[1])
    }
}

/// Saved scene storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Slot the scene is saved under
    pub slot: String,
    /// Directory holding one JSON file per slot
    pub directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            slot: "savedScene".to_string(),
            directory: PathBuf::from("saves"),
        }
    }
}

/// Asset lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Root directory for `file://` and relative asset URLs
    pub root: PathBuf,
    /// Directory (relative to the root) holding named models
    pub models_dir: String,
    /// File extension of model templates
    pub extension: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            models_dir: "models".to_string(),
            extension: "ron".to_string(),
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
#[error("Configuration error: {message}")]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}
