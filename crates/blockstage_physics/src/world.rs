//! Physics backend and per-scene physics world

use std::sync::atomic::{AtomicU64, Ordering};

use crate::body::{BodyKey, RigidBody};
use blockstage_math::Vec3;
use slotmap::SlotMap;

/// Configuration for the physics simulation
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    /// Gravity acceleration vector
    pub gravity: Vec3,
    /// Height of the implicit ground plane bodies rest on (None = fall forever)
    pub ground_y: Option<f32>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            ground_y: Some(0.0),
        }
    }
}

impl PhysicsConfig {
    /// Create a config with the given gravity vector
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }

    /// Set the ground plane height
    pub fn with_ground(mut self, ground_y: Option<f32>) -> Self {
        self.ground_y = ground_y;
        self
    }
}

static BACKEND_IDS: AtomicU64 = AtomicU64::new(1);

/// A physics backend initialized once per process
///
/// Initializing the backend is the expensive part; every scene build creates
/// a fresh [`PhysicsWorld`] bound to the same backend.
#[derive(Debug)]
pub struct PhysicsBackend {
    id: u64,
    plugins_created: AtomicU64,
}

impl PhysicsBackend {
    /// Initialize the backend
    pub fn initialize() -> Self {
        let id = BACKEND_IDS.fetch_add(1, Ordering::Relaxed);
        log::info!("Physics backend {} initialized", id);
        Self {
            id,
            plugins_created: AtomicU64::new(0),
        }
    }

    /// Identifier of this backend instance
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of plugin instances created from this backend
    pub fn plugins_created(&self) -> u64 {
        self.plugins_created.load(Ordering::Relaxed)
    }
}

/// The physics plugin attached to one scene
pub struct PhysicsWorld {
    bodies: SlotMap<BodyKey, RigidBody>,
    backend_id: u64,
    enabled: bool,
    /// Physics configuration
    pub config: PhysicsConfig,
}

impl PhysicsWorld {
    /// Create a fresh plugin instance bound to the backend
    pub fn new(backend: &PhysicsBackend, config: PhysicsConfig) -> Self {
        backend.plugins_created.fetch_add(1, Ordering::Relaxed);
        Self {
            bodies: SlotMap::with_key(),
            backend_id: backend.id,
            enabled: true,
            config,
        }
    }

    /// Backend this plugin is bound to
    pub fn backend_id(&self) -> u64 {
        self.backend_id
    }

    /// Whether the engine is currently stepping
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stop stepping the simulation
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Add a body to the world and return its key
    pub fn add_body(&mut self, body: RigidBody) -> BodyKey {
        self.bodies.insert(body)
    }

    /// Remove a body from the world and return it
    pub fn remove_body(&mut self, key: BodyKey) -> Option<RigidBody> {
        self.bodies.remove(key)
    }

    /// Get an immutable reference to a body by key
    pub fn get_body(&self, key: BodyKey) -> Option<&RigidBody> {
        self.bodies.get(key)
    }

    /// Get a mutable reference to a body by key
    pub fn get_body_mut(&mut self, key: BodyKey) -> Option<&mut RigidBody> {
        self.bodies.get_mut(key)
    }

    /// Get the number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Step the simulation forward by dt seconds
    ///
    /// Integrates gravity and velocity for non-static bodies, then keeps
    /// them resting on the ground plane. Disabled worlds do nothing.
    pub fn step(&mut self, dt: f32) {
        if !self.enabled || dt <= 0.0 {
            return;
        }

        for (_key, body) in &mut self.bodies {
            if body.is_static {
                continue;
            }

            if body.affected_by_gravity {
                body.velocity += self.config.gravity * dt;
            }
            body.position += body.velocity * dt;

            if let Some(ground_y) = self.config.ground_y {
                let bottom = body.position.y - body.half_extents.y;
                if bottom < ground_y {
                    body.position.y = ground_y + body.half_extents.y;
                    body.velocity.y = 0.0;
                }
            }
        }
    }
}
