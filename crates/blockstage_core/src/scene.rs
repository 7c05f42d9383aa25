//! The scene graph
//!
//! A [`Scene`] owns nodes and materials (both slotmap-keyed), the camera, the
//! environment and an optional physics plugin. It plays the part of the
//! rendering engine: hierarchy, world transforms, picking, shallow clones
//! and disposal all live here.

use blockstage_math::{Aabb, Mat4, Plane, Ray, Vec2, Vec3};
use blockstage_physics::{PhysicsWorld, RigidBody};
use slotmap::SlotMap;

use crate::asset::AssetTemplate;
use crate::asset_error::AssetError;
use crate::camera::Camera;
use crate::node::{Material, MaterialKey, Node, NodeKey};
use crate::Transform;

/// Name of the ground node placement raycasts aim at
pub const GROUND_NAME: &str = "ground";

/// Names reserved for scenery that is never manipulated
pub const RESERVED_NAMES: &[&str] = &[GROUND_NAME, "sky", "skybox"];

/// Distance of the camera-facing fallback plane used when the ground is missed
pub const FALLBACK_PLANE_DISTANCE: f32 = 10.0;

/// Ambient light and background
#[derive(Clone, Debug, PartialEq)]
pub struct Environment {
    /// Ambient light intensity
    pub ambient_intensity: f32,
    /// Optional background texture URL
    pub background_texture: Option<String>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.7,
            background_texture: None,
        }
    }
}

/// Result of a successful pick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickHit {
    /// Node that was hit
    pub node: NodeKey,
    /// World-space hit point
    pub point: Vec3,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Whether a node name is reserved for scenery
pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// A live scene
pub struct Scene {
    nodes: SlotMap<NodeKey, Node>,
    materials: SlotMap<MaterialKey, Material>,
    /// The active camera
    pub camera: Camera,
    environment: Option<Environment>,
    physics: Option<PhysicsWorld>,
    disposed: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Camera::default())
    }
}

impl Scene {
    /// Create an empty scene with the given camera
    pub fn new(camera: Camera) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            materials: SlotMap::with_key(),
            camera,
            environment: None,
            physics: None,
            disposed: false,
        }
    }

    // --- Nodes ---

    /// Add a root node
    pub fn add_node(&mut self, mut node: Node) -> NodeKey {
        node.parent = None;
        node.children.clear();
        self.nodes.insert(node)
    }

    /// Add a node under `parent`; falls back to a root node if the parent is gone
    pub fn add_child(&mut self, parent: NodeKey, mut node: Node) -> NodeKey {
        node.children.clear();
        if !self.nodes.contains_key(parent) {
            log::warn!("Parent node {:?} no longer exists; adding as root", parent);
            return self.add_node(node);
        }
        node.parent = Some(parent);
        let key = self.nodes.insert(node);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(key);
        }
        key
    }

    /// Get a node
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Get a node mutably
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Whether the node is live
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over all nodes
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes.iter()
    }

    /// First node with the given name
    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        self.nodes.iter().find(|(_, n)| n.name == name).map(|(k, _)| k)
    }

    /// All descendants of `key` in depth-first order (excluding `key`)
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = match self.nodes.get(key) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                out.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// World matrix of a node (parent chain applied)
    pub fn world_matrix(&self, key: NodeKey) -> Option<Mat4> {
        let mut node = self.nodes.get(key)?;
        let mut matrix = node.transform.to_matrix();
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(p)) {
            matrix = parent.transform.to_matrix() * matrix;
            node = parent;
        }
        Some(matrix)
    }

    /// World-space position of a node
    pub fn world_position(&self, key: NodeKey) -> Option<Vec3> {
        self.world_matrix(key).map(|m| m.w_axis.truncate())
    }

    /// World transform of a node
    ///
    /// Root nodes report their own transform untouched, with any Euler
    /// orientation converted to a quaternion.
    pub fn world_transform(&self, key: NodeKey) -> Option<Transform> {
        let node = self.nodes.get(key)?;
        if node.parent.is_none() {
            let t = node.transform;
            return Some(Transform::from_parts(t.position, t.rotation(), t.scale));
        }
        self.world_matrix(key).map(|m| Transform::from_matrix(&m))
    }

    /// Set a node's local position, keeping its physics body in sync
    pub fn set_position(&mut self, key: NodeKey, position: Vec3) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        node.transform.position = position;
        let body_key = node.physics_body;
        let is_root = node.parent.is_none();
        if let (Some(body_key), Some(physics)) = (body_key, self.physics.as_mut()) {
            if is_root {
                if let Some(body) = physics.get_body_mut(body_key) {
                    body.set_position(position);
                }
            }
        }
    }

    /// Replace a node's local transform, keeping its physics body in sync
    pub fn set_transform(&mut self, key: NodeKey, transform: Transform) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.transform = transform;
        }
        self.set_position(key, transform.position);
    }

    /// Detach a node from its parent, baking the parent chain into its transform
    pub fn detach_from_parent(&mut self, key: NodeKey) {
        let Some(parent) = self.nodes.get(key).and_then(|n| n.parent) else {
            return;
        };
        let Some(world) = self.world_matrix(key) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|c| *c != key);
        }
        if let Some(node) = self.nodes.get_mut(key) {
            node.parent = None;
            node.transform = Transform::from_matrix(&world);
        }
    }

    /// Set visibility on a node and all its descendants
    pub fn set_visibility_recursive(&mut self, key: NodeKey, visibility: f32) {
        for k in std::iter::once(key).chain(self.descendants(key)) {
            if let Some(node) = self.nodes.get_mut(k) {
                node.visibility = visibility;
            }
        }
    }

    /// Set pickability on a node and all its descendants
    pub fn set_pickable_recursive(&mut self, key: NodeKey, pickable: bool) {
        for k in std::iter::once(key).chain(self.descendants(key)) {
            if let Some(node) = self.nodes.get_mut(k) {
                node.set_pickable(pickable);
            }
        }
    }

    /// Dispose a node, its descendants and their physics bodies
    ///
    /// Returns the number of nodes removed.
    pub fn dispose_node(&mut self, key: NodeKey) -> usize {
        if !self.nodes.contains_key(key) {
            return 0;
        }
        if let Some(parent) = self.nodes.get(key).and_then(|n| n.parent) {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|c| *c != key);
            }
        }

        let mut removed = 0;
        for k in std::iter::once(key).chain(self.descendants(key)).collect::<Vec<_>>() {
            if let Some(node) = self.nodes.remove(k) {
                if let (Some(body), Some(physics)) = (node.physics_body, self.physics.as_mut()) {
                    physics.remove_body(body);
                }
                removed += 1;
            }
        }
        removed
    }

    /// Shallow-clone a hierarchy
    ///
    /// Geometry, transforms, metadata and hierarchy are copied; material
    /// keys are shared with the source and physics bodies are not cloned.
    /// The clone keeps the source root's parent.
    pub fn clone_hierarchy(&mut self, key: NodeKey) -> Option<NodeKey> {
        let source = self.nodes.get(key)?.clone();
        let children = source.children.clone();
        let mut copy = source;
        copy.name = format!("{}_clone", copy.name);
        copy.physics_body = None;

        let root = match copy.parent {
            Some(parent) => self.add_child(parent, copy),
            None => self.add_node(copy),
        };
        for child in children {
            self.clone_subtree(child, root);
        }
        Some(root)
    }

    fn clone_subtree(&mut self, source: NodeKey, new_parent: NodeKey) {
        let Some(node) = self.nodes.get(source).cloned() else {
            return;
        };
        let children = node.children.clone();
        let mut copy = node;
        copy.physics_body = None;
        let key = self.add_child(new_parent, copy);
        for child in children {
            self.clone_subtree(child, key);
        }
    }

    /// Give `target` and its descendants their own copies of the materials
    /// used by the matching nodes of `source`
    ///
    /// Both hierarchies are walked in parallel (child `i` of a source node
    /// matches child `i` of the target node). Returns the number of
    /// materials duplicated.
    pub fn duplicate_materials_from(&mut self, source: NodeKey, target: NodeKey) -> usize {
        let mut duplicated = 0;
        let mut pairs = vec![(source, target)];
        while let Some((src, dst)) = pairs.pop() {
            let (Some(src_node), Some(dst_node)) = (self.nodes.get(src), self.nodes.get(dst)) else {
                continue;
            };
            let src_children = src_node.children.clone();
            let dst_children = dst_node.children.clone();
            if src_children.len() != dst_children.len() {
                log::warn!(
                    "Hierarchy mismatch while copying materials ({} vs {} children)",
                    src_children.len(),
                    dst_children.len()
                );
            }

            if let Some(material) = src_node.material.and_then(|m| self.materials.get(m)).cloned() {
                let copy = Material {
                    name: format!("{}_copy", material.name),
                    ..material
                };
                let new_key = self.materials.insert(copy);
                if let Some(node) = self.nodes.get_mut(dst) {
                    node.material = Some(new_key);
                }
                duplicated += 1;
            }

            pairs.extend(src_children.into_iter().zip(dst_children));
        }
        duplicated
    }

    /// Instantiate an asset template; returns the root node
    pub fn instantiate(&mut self, template: &AssetTemplate) -> Result<NodeKey, AssetError> {
        template.validate()?;
        let mut keys: Vec<NodeKey> = Vec::with_capacity(template.nodes.len());
        for node_template in &template.nodes {
            let mut node = Node::new(node_template.name.clone()).with_transform(node_template.transform);
            node.half_extents = node_template.half_extents;
            if let Some(material) = &node_template.material {
                node.material = Some(self.add_material(material.clone()));
            }
            let key = match node_template.parent {
                Some(parent) => self.add_child(keys[parent], node),
                None => self.add_node(node),
            };
            keys.push(key);
        }
        Ok(keys[0])
    }

    // --- Materials ---

    /// Add a material
    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    /// Get a material
    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    /// Number of materials
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    // --- Picking ---

    /// World-space bounds of a node with geometry
    pub fn world_bounds(&self, key: NodeKey) -> Option<Aabb> {
        let node = self.nodes.get(key)?;
        let half = node.half_extents?;
        let (scale, _, translation) = self.world_matrix(key)?.to_scale_rotation_translation();
        Some(Aabb::from_center_half_extents(translation, half * scale.abs()))
    }

    /// Nearest enabled, pickable node hit by the ray that passes `filter`
    pub fn pick_ray_with(&self, ray: &Ray, filter: impl Fn(NodeKey, &Node) -> bool) -> Option<PickHit> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.is_enabled() && node.is_pickable() && node.half_extents.is_some())
            .filter(|(key, node)| filter(*key, node))
            .filter_map(|(key, _)| {
                let distance = self.world_bounds(key)?.intersect_ray(ray)?;
                Some(PickHit {
                    node: key,
                    point: ray.at(distance),
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Pick the nearest node under a screen point
    pub fn pick(&self, screen: Vec2) -> Option<PickHit> {
        let ray = self.camera.screen_ray(screen);
        self.pick_ray_with(&ray, |_, _| true)
    }

    /// Pick under a screen point, considering only nodes that pass `filter`
    pub fn pick_with(&self, screen: Vec2, filter: impl Fn(NodeKey, &Node) -> bool) -> Option<PickHit> {
        let ray = self.camera.screen_ray(screen);
        self.pick_ray_with(&ray, filter)
    }

    /// World point for placing something under a screen point
    ///
    /// Casts against the ground node; if the ground is missing or missed,
    /// falls back to a camera-facing plane in front of the camera.
    pub fn placement_point(&self, screen: Vec2) -> Vec3 {
        let ray = self.camera.screen_ray(screen);
        let ground_hit = self.pick_ray_with(&ray, |_, node| node.name == GROUND_NAME);
        if let Some(hit) = ground_hit {
            let top = self.world_bounds(hit.node).map(|b| b.max.y).unwrap_or(hit.point.y);
            let plane = Plane::horizontal(top);
            return ray.intersect_plane(&plane).map(|t| ray.at(t)).unwrap_or(hit.point);
        }

        let forward = self.camera.forward();
        let plane = Plane::from_point_normal(self.camera.position() + forward * FALLBACK_PLANE_DISTANCE, forward);
        ray.intersect_plane(&plane)
            .map(|t| ray.at(t))
            .unwrap_or_else(|| ray.at(FALLBACK_PLANE_DISTANCE))
    }

    // --- Environment ---

    /// Set ambient light and background
    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = Some(environment);
    }

    /// Current environment, if initialized
    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    // --- Physics ---

    /// Attach a physics plugin
    pub fn enable_physics(&mut self, physics: PhysicsWorld) {
        self.physics = Some(physics);
    }

    /// Explicitly stop the physics engine
    pub fn disable_physics(&mut self) {
        if let Some(physics) = self.physics.as_mut() {
            physics.disable();
        }
    }

    /// Whether physics is attached and stepping
    pub fn is_physics_enabled(&self) -> bool {
        self.physics.as_ref().map(|p| p.is_enabled()).unwrap_or(false)
    }

    /// The physics plugin, if attached
    pub fn physics(&self) -> Option<&PhysicsWorld> {
        self.physics.as_ref()
    }

    /// Attach a box body to a root node, sized from its geometry
    pub fn add_physics_body(&mut self, key: NodeKey, is_static: bool) -> bool {
        let Some(physics) = self.physics.as_mut() else {
            return false;
        };
        let Some(node) = self.nodes.get_mut(key) else {
            return false;
        };
        if node.physics_body.is_some() || node.parent.is_some() {
            return false;
        }
        let half = node.half_extents.unwrap_or(Vec3::splat(0.5)) * node.transform.scale.abs();
        let body = RigidBody::new_box(node.transform.position, half).with_static(is_static);
        node.physics_body = Some(physics.add_body(body));
        true
    }

    /// Step physics and copy body positions back to their nodes
    pub fn update(&mut self, dt: f32) {
        let Some(physics) = self.physics.as_mut() else {
            return;
        };
        physics.step(dt);
        for (_, node) in self.nodes.iter_mut() {
            if let Some(body) = node.physics_body.and_then(|b| physics.get_body(b)) {
                node.transform.position = body.position;
            }
        }
    }

    // --- Lifecycle ---

    /// Dispose the whole scene
    pub fn dispose(&mut self) {
        self.nodes.clear();
        self.materials.clear();
        self.physics = None;
        self.environment = None;
        self.disposed = true;
    }

    /// Whether the scene has been disposed
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
