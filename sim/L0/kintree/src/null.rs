//! Reference backends that simulate nothing.
//!
//! The null adapters record whatever the core pushes and report it back
//! unchanged, which makes them useful for headless runs and for checking
//! the adapter protocol. Dropping a null backend drops its adapters; every
//! entity bound to them then reads as detached.

use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::{Vector3, Vector4};
use sim_types::{BodyId, InertialData, JointLimits, Pose};

use crate::adapter::{
    Adapter, BodyAdapter, ColliderAdapter, DrawableAdapter, JointAdapter, KintreeAdapter,
};
use crate::backend::{Backend, BackendKind};
use crate::error::{KintreeError, Result};
use crate::lifecycle::Lifecycle;
use crate::tree::KinematicTree;

/// Body state as last pushed.
#[derive(Debug, Clone, Default)]
pub struct NullBodyAdapter {
    /// Owning body, cleared on detach.
    pub owner: Option<BodyId>,
    /// World pose.
    pub transform: Pose,
    /// Force at the center of mass.
    pub force: Vector3<f64>,
    /// Torque about the center of mass.
    pub torque: Vector3<f64>,
    /// Mass properties.
    pub inertia: InertialData,
    /// Times `initialize` was called.
    pub initialized: usize,
    /// Times `reset` was called.
    pub resets: usize,
}

impl Adapter for NullBodyAdapter {
    fn on_detach(&mut self) {
        self.owner = None;
    }
}

impl BodyAdapter for NullBodyAdapter {
    fn initialize(&mut self) {
        self.initialized += 1;
    }

    fn reset(&mut self) {
        self.resets += 1;
        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
    }

    fn set_transform(&mut self, pose: &Pose) {
        self.transform = *pose;
    }

    fn transform(&self) -> Pose {
        self.transform
    }

    fn set_force_com(&mut self, force: &Vector3<f64>) {
        self.force = *force;
    }

    fn set_torque_com(&mut self, torque: &Vector3<f64>) {
        self.torque = *torque;
    }

    fn set_inertia(&mut self, inertia: &InertialData) {
        self.inertia = *inertia;
    }
}

/// Joint state as last pushed.
#[derive(Debug, Clone, Default)]
pub struct NullJointAdapter {
    /// Body owning the joint, cleared on detach.
    pub owner: Option<BodyId>,
    /// Generalized positions.
    pub qpos: Vec<f64>,
    /// Generalized velocities.
    pub qvel: Vec<f64>,
    /// Pose relative to the owning body.
    pub local: Pose,
    /// Spring stiffness.
    pub stiffness: f64,
    /// Armature inertia.
    pub armature: f64,
    /// Damping.
    pub damping: f64,
    /// Axis.
    pub axis: Vector3<f64>,
    /// Range.
    pub limits: Option<JointLimits>,
}

impl Adapter for NullJointAdapter {
    fn on_detach(&mut self) {
        self.owner = None;
    }
}

impl JointAdapter for NullJointAdapter {
    fn set_qpos(&mut self, qpos: &[f64]) {
        self.qpos = qpos.to_vec();
    }

    fn set_qvel(&mut self, qvel: &[f64]) {
        self.qvel = qvel.to_vec();
    }

    fn qpos(&self) -> Vec<f64> {
        self.qpos.clone()
    }

    fn qvel(&self) -> Vec<f64> {
        self.qvel.clone()
    }

    fn set_local_transform(&mut self, local: &Pose) {
        self.local = *local;
    }

    fn set_stiffness(&mut self, stiffness: f64) {
        self.stiffness = stiffness;
    }

    fn set_armature(&mut self, armature: f64) {
        self.armature = armature;
    }

    fn set_damping(&mut self, damping: f64) {
        self.damping = damping;
    }

    fn set_axis(&mut self, axis: &Vector3<f64>) {
        self.axis = *axis;
    }

    fn set_limits(&mut self, limits: &JointLimits) {
        self.limits = Some(*limits);
    }
}

/// Collider parameters as last pushed.
#[derive(Debug, Clone, Default)]
pub struct NullColliderAdapter {
    /// Owning body, cleared on detach.
    pub owner: Option<BodyId>,
    /// Pose relative to the owning body.
    pub local: Pose,
    /// Size vector.
    pub size: Vector3<f64>,
    /// Heightfield samples.
    pub heights: Vec<f64>,
    /// Collision group.
    pub group: i32,
    /// Collision mask.
    pub mask: i32,
    /// Friction coefficients.
    pub friction: Vector3<f64>,
}

impl Adapter for NullColliderAdapter {
    fn on_detach(&mut self) {
        self.owner = None;
    }
}

impl ColliderAdapter for NullColliderAdapter {
    fn set_local_transform(&mut self, local: &Pose) {
        self.local = *local;
    }

    fn set_size(&mut self, size: &Vector3<f64>) {
        self.size = *size;
    }

    fn set_elevation_data(&mut self, heights: &[f64]) {
        self.heights = heights.to_vec();
    }

    fn set_collision_group(&mut self, group: i32) {
        self.group = group;
    }

    fn set_collision_mask(&mut self, mask: i32) {
        self.mask = mask;
    }

    fn set_friction(&mut self, friction: &Vector3<f64>) {
        self.friction = *friction;
    }
}

/// Tree frame state as last pushed.
#[derive(Debug, Clone, Default)]
pub struct NullTreeAdapter {
    /// Owning tree name, cleared on detach.
    pub owner: Option<String>,
    /// World pose of the tree frame.
    pub transform: Pose,
    /// Linear velocity.
    pub linear_velocity: Vector3<f64>,
    /// Angular velocity.
    pub angular_velocity: Vector3<f64>,
}

impl Adapter for NullTreeAdapter {
    fn on_detach(&mut self) {
        self.owner = None;
    }
}

impl KintreeAdapter for NullTreeAdapter {
    fn set_transform(&mut self, pose: &Pose) {
        self.transform = *pose;
    }

    fn transform(&self) -> Pose {
        self.transform
    }

    fn set_linear_velocity(&mut self, velocity: &Vector3<f64>) {
        self.linear_velocity = *velocity;
    }

    fn set_angular_velocity(&mut self, velocity: &Vector3<f64>) {
        self.angular_velocity = *velocity;
    }

    fn linear_velocity(&self) -> Vector3<f64> {
        self.linear_velocity
    }

    fn angular_velocity(&self) -> Vector3<f64> {
        self.angular_velocity
    }
}

/// Drawable appearance as last pushed.
#[derive(Debug, Clone)]
pub struct NullDrawableAdapter {
    /// Owning body, cleared on detach.
    pub owner: Option<BodyId>,
    /// World pose.
    pub transform: Pose,
    /// Pose relative to the owning body.
    pub local: Pose,
    /// Rgba tint.
    pub rgba: Vector4<f64>,
    /// Ambient color.
    pub ambient: Vector3<f64>,
    /// Diffuse color.
    pub diffuse: Vector3<f64>,
    /// Specular color.
    pub specular: Vector3<f64>,
    /// Specular exponent.
    pub shininess: f64,
    /// Texture reference.
    pub texture: Option<String>,
    /// Size vector.
    pub size: Vector3<f64>,
    /// Whether shown.
    pub visible: bool,
    /// Whether drawn as wireframe.
    pub wireframe: bool,
    /// Number of transform updates received.
    pub frames: usize,
}

impl Default for NullDrawableAdapter {
    fn default() -> Self {
        Self {
            owner: None,
            transform: Pose::identity(),
            local: Pose::identity(),
            rgba: Vector4::new(1.0, 1.0, 1.0, 1.0),
            ambient: Vector3::zeros(),
            diffuse: Vector3::zeros(),
            specular: Vector3::zeros(),
            shininess: 0.0,
            texture: None,
            size: Vector3::zeros(),
            visible: true,
            wireframe: false,
            frames: 0,
        }
    }
}

impl Adapter for NullDrawableAdapter {
    fn on_detach(&mut self) {
        self.owner = None;
    }
}

impl DrawableAdapter for NullDrawableAdapter {
    fn set_transform(&mut self, pose: &Pose) {
        self.transform = *pose;
        self.frames += 1;
    }

    fn set_local_transform(&mut self, local: &Pose) {
        self.local = *local;
    }

    fn set_color(&mut self, rgb: &Vector3<f64>) {
        self.ambient = *rgb;
        self.diffuse = *rgb;
        self.specular = *rgb;
    }

    fn set_ambient_color(&mut self, rgb: &Vector3<f64>) {
        self.ambient = *rgb;
    }

    fn set_diffuse_color(&mut self, rgb: &Vector3<f64>) {
        self.diffuse = *rgb;
    }

    fn set_specular_color(&mut self, rgb: &Vector3<f64>) {
        self.specular = *rgb;
    }

    fn set_rgba(&mut self, rgba: &Vector4<f64>) {
        self.rgba = *rgba;
    }

    fn set_shininess(&mut self, shininess: f64) {
        self.shininess = shininess;
    }

    fn set_texture(&mut self, texture: &str) {
        self.texture = Some(texture.to_string());
    }

    fn set_size(&mut self, size: &Vector3<f64>) {
        self.size = *size;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn set_wireframe(&mut self, wireframe: bool) {
        self.wireframe = wireframe;
    }
}

/// Physics backend that records pushed state and advances only a clock.
#[derive(Debug, Default)]
pub struct NullPhysics {
    tree: Option<Rc<RefCell<NullTreeAdapter>>>,
    bodies: Vec<Rc<RefCell<NullBodyAdapter>>>,
    joints: Vec<Rc<RefCell<NullJointAdapter>>>,
    colliders: Vec<Rc<RefCell<NullColliderAdapter>>>,
    time: f64,
    steps: u64,
}

impl NullPhysics {
    /// Create an unbound backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated time in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of steps taken.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Tree adapter, once built.
    #[must_use]
    pub fn tree_adapter(&self) -> Option<&Rc<RefCell<NullTreeAdapter>>> {
        self.tree.as_ref()
    }

    /// Body adapters in arena order.
    #[must_use]
    pub fn body_adapters(&self) -> &[Rc<RefCell<NullBodyAdapter>>] {
        &self.bodies
    }

    /// Joint adapters in arena order of their bodies.
    #[must_use]
    pub fn joint_adapters(&self) -> &[Rc<RefCell<NullJointAdapter>>] {
        &self.joints
    }

    /// Collider adapters in arena order of their bodies.
    #[must_use]
    pub fn collider_adapters(&self) -> &[Rc<RefCell<NullColliderAdapter>>] {
        &self.colliders
    }
}

impl Backend for NullPhysics {
    fn id(&self) -> &str {
        "null"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Physics
    }

    fn build(&mut self, tree: &mut KinematicTree) -> Result<()> {
        if tree.is_empty() {
            return Err(KintreeError::EmptyTree);
        }
        let adapter = Rc::new(RefCell::new(NullTreeAdapter {
            owner: Some(tree.name().to_string()),
            transform: *tree.transform(),
            ..NullTreeAdapter::default()
        }));
        let shared: Rc<RefCell<dyn KintreeAdapter>> = adapter.clone();
        tree.attach_adapter(&shared);
        self.tree = Some(adapter);

        for body in tree.bodies_mut() {
            let owner = Some(body.id());
            let adapter = Rc::new(RefCell::new(NullBodyAdapter {
                owner,
                transform: *body.transform(),
                inertia: *body.inertia(),
                ..NullBodyAdapter::default()
            }));
            let shared: Rc<RefCell<dyn BodyAdapter>> = adapter.clone();
            body.attach_adapter(&shared);
            self.bodies.push(adapter);

            if let Some(joint) = body.joint_mut() {
                let adapter = Rc::new(RefCell::new(NullJointAdapter {
                    owner,
                    qpos: joint.qpos().to_vec(),
                    qvel: joint.qvel().to_vec(),
                    local: *joint.local_transform(),
                    stiffness: joint.stiffness(),
                    armature: joint.armature(),
                    damping: joint.damping(),
                    axis: *joint.axis(),
                    limits: Some(*joint.limits()),
                }));
                let shared: Rc<RefCell<dyn JointAdapter>> = adapter.clone();
                joint.attach_adapter(&shared);
                self.joints.push(adapter);
            }

            for collider in body.colliders_mut() {
                let adapter = Rc::new(RefCell::new(NullColliderAdapter {
                    owner,
                    local: *collider.local_transform(),
                    size: collider.shape().size,
                    heights: collider
                        .shape()
                        .heightfield
                        .as_ref()
                        .map(|h| h.heights.clone())
                        .unwrap_or_default(),
                    group: collider.collision_group(),
                    mask: collider.collision_mask(),
                    friction: *collider.friction(),
                }));
                let shared: Rc<RefCell<dyn ColliderAdapter>> = adapter.clone();
                collider.attach_adapter(&shared);
                self.colliders.push(adapter);
            }
        }
        tracing::debug!(
            tree = %tree.name(),
            bodies = self.bodies.len(),
            joints = self.joints.len(),
            colliders = self.colliders.len(),
            "null physics built"
        );
        Ok(())
    }

    fn step(&mut self, dt: f64) {
        self.time += dt;
        self.steps += 1;
    }

    fn teardown(&mut self, tree: &mut KinematicTree) {
        tree.detach_sim();
        self.tree = None;
        self.bodies.clear();
        self.joints.clear();
        self.colliders.clear();
    }
}

/// Visualizer backend that records pushed appearance.
#[derive(Debug, Default)]
pub struct NullVisualizer {
    drawables: Vec<Rc<RefCell<NullDrawableAdapter>>>,
    frames: u64,
}

impl NullVisualizer {
    /// Create an unbound backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rendered frames.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Drawable adapters in arena order of their bodies.
    #[must_use]
    pub fn drawable_adapters(&self) -> &[Rc<RefCell<NullDrawableAdapter>>] {
        &self.drawables
    }
}

impl Backend for NullVisualizer {
    fn id(&self) -> &str {
        "null-viz"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Visualizer
    }

    fn build(&mut self, tree: &mut KinematicTree) -> Result<()> {
        for body in tree.bodies_mut() {
            let owner = Some(body.id());
            for drawable in body.drawables_mut() {
                let material = *drawable.material();
                let adapter = Rc::new(RefCell::new(NullDrawableAdapter {
                    owner,
                    local: *drawable.local_transform(),
                    rgba: *drawable.rgba(),
                    ambient: material.ambient,
                    diffuse: material.diffuse,
                    specular: material.specular,
                    shininess: material.shininess,
                    texture: drawable.texture().map(str::to_string),
                    size: drawable.shape().size,
                    visible: drawable.visible(),
                    wireframe: drawable.wireframe(),
                    ..NullDrawableAdapter::default()
                }));
                let shared: Rc<RefCell<dyn DrawableAdapter>> = adapter.clone();
                drawable.attach_adapter(&shared);
                self.drawables.push(adapter);
            }
        }
        tracing::debug!(tree = %tree.name(), drawables = self.drawables.len(), "null visualizer built");
        Ok(())
    }

    fn step(&mut self, _dt: f64) {
        self.frames += 1;
    }

    fn teardown(&mut self, tree: &mut KinematicTree) {
        tree.detach_viz();
        self.drawables.clear();
    }
}
