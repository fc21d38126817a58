//! Collision shapes attached to bodies.

use nalgebra::Vector3;
use sim_types::Pose;

use crate::adapter::ColliderAdapter;
use crate::lifecycle::{AdapterSlot, Lifecycle, LifecycleState};
use crate::shape::ShapeDescriptor;

/// Default friction coefficients (sliding, torsional, rolling).
pub const DEFAULT_FRICTION: [f64; 3] = [1.0, 0.005, 0.0001];

/// Default density in kg/m³.
pub const DEFAULT_DENSITY: f64 = 1000.0;

/// Collision geometry owned by a body.
///
/// Two colliders interact when `(a.group & b.mask) != 0` and
/// `(b.group & a.mask) != 0`.
#[derive(Debug, Clone)]
pub struct Collider {
    name: String,
    shape: ShapeDescriptor,
    group: i32,
    mask: i32,
    friction: Vector3<f64>,
    density: f64,
    visible: bool,
    wireframe: bool,
    local0: Pose,
    world: Pose,
    state: LifecycleState,
    adapter: AdapterSlot<dyn ColliderAdapter>,
}

impl Collider {
    /// Create a collider with default contact parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, shape: ShapeDescriptor) -> Self {
        Self {
            name: name.into(),
            shape,
            group: 1,
            mask: 1,
            friction: Vector3::from(DEFAULT_FRICTION),
            density: DEFAULT_DENSITY,
            visible: true,
            wireframe: false,
            local0: Pose::identity(),
            world: Pose::identity(),
            state: LifecycleState::Uninitialized,
            adapter: AdapterSlot::empty(),
        }
    }

    /// Set collision group and mask.
    #[must_use]
    pub fn with_filter(mut self, group: i32, mask: i32) -> Self {
        self.group = group;
        self.mask = mask;
        self
    }

    /// Set friction coefficients.
    #[must_use]
    pub fn with_friction(mut self, friction: Vector3<f64>) -> Self {
        self.friction = friction;
        self
    }

    /// Set density.
    #[must_use]
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Shape description.
    #[must_use]
    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    /// Pose relative to the owning body.
    #[must_use]
    pub fn local_transform(&self) -> &Pose {
        &self.shape.local
    }

    /// World poses of the leaf parts of a compound shape, or of the shape
    /// itself for any other kind.
    #[must_use]
    pub fn part_transforms(&self) -> Vec<(&ShapeDescriptor, Pose)> {
        self.shape.part_poses(&self.world)
    }

    /// Collision group bits.
    #[must_use]
    pub fn collision_group(&self) -> i32 {
        self.group
    }

    /// Collision mask bits.
    #[must_use]
    pub fn collision_mask(&self) -> i32 {
        self.mask
    }

    /// Friction coefficients.
    #[must_use]
    pub fn friction(&self) -> &Vector3<f64> {
        &self.friction
    }

    /// Density.
    #[must_use]
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Whether debug drawing shows this collider.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Whether debug drawing uses wireframe.
    #[must_use]
    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// Whether the filters of two colliders let them touch.
    #[must_use]
    pub fn can_collide_with(&self, other: &Self) -> bool {
        (self.group & other.mask) != 0 && (other.group & self.mask) != 0
    }

    /// Bind a physics adapter.
    pub fn attach_adapter(&mut self, adapter: &std::rc::Rc<std::cell::RefCell<dyn ColliderAdapter>>) {
        self.adapter.attach(adapter);
    }

    /// Whether a live physics adapter is bound.
    #[must_use]
    pub fn has_adapter(&self) -> bool {
        self.adapter.is_attached()
    }

    /// Change the pose relative to the owning body.
    ///
    /// The world pose follows at the next step of the owning body.
    pub fn set_local_transform(&mut self, local: Pose) {
        self.shape.local = local;
        self.adapter.with(|a| a.set_local_transform(&local));
    }

    /// World poses follow the owning body and cannot be set directly.
    pub fn set_transform(&mut self, _pose: Pose) {
        tracing::warn!(collider = %self.name, "collider world pose is derived from its body, ignoring");
    }

    /// Change the size vector.
    pub fn set_size(&mut self, size: Vector3<f64>) {
        self.shape.size = size;
        self.adapter.with(|a| a.set_size(&size));
    }

    /// Replace heightfield samples. Ignored with a warning for other shapes
    /// or when the sample count does not match the grid.
    pub fn set_elevation_data(&mut self, heights: &[f64]) {
        let Some(field) = self.shape.heightfield.as_mut() else {
            tracing::warn!(collider = %self.name, "elevation data on a non-heightfield collider, ignoring");
            return;
        };
        if heights.len() != field.heights.len() {
            tracing::warn!(
                collider = %self.name,
                expected = field.heights.len(),
                got = heights.len(),
                "elevation data size mismatch, ignoring"
            );
            return;
        }
        field.heights.copy_from_slice(heights);
        self.adapter.with(|a| a.set_elevation_data(heights));
    }

    /// Change the collision group.
    pub fn set_collision_group(&mut self, group: i32) {
        self.group = group;
        self.adapter.with(|a| a.set_collision_group(group));
    }

    /// Change the collision mask.
    pub fn set_collision_mask(&mut self, mask: i32) {
        self.mask = mask;
        self.adapter.with(|a| a.set_collision_mask(mask));
    }

    /// Change friction coefficients.
    pub fn set_friction(&mut self, friction: Vector3<f64>) {
        self.friction = friction;
        self.adapter.with(|a| a.set_friction(&friction));
    }

    /// Show or hide in debug drawing.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Toggle wireframe debug drawing.
    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.wireframe = wireframe;
    }

    fn update_world(&mut self, parent: &Pose) {
        self.world = parent.compose(&self.shape.local);
    }
}

impl Lifecycle for Collider {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self) -> &Pose {
        &self.world
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn initialize(&mut self, parent: &Pose) {
        self.local0 = self.shape.local;
        self.update_world(parent);
        self.adapter.with(|a| a.initialize());
        self.state = LifecycleState::Initialized;
    }

    fn pre_step(&mut self) {}

    fn post_step(&mut self, parent: &Pose) {
        self.update_world(parent);
    }

    fn reset(&mut self, parent: &Pose) {
        self.shape.local = self.local0;
        self.update_world(parent);
        let local = self.local0;
        self.adapter.with(|a| {
            a.reset();
            a.set_local_transform(&local);
        });
    }

    fn detach_sim(&mut self) {
        self.adapter.detach();
    }

    fn detach_viz(&mut self) {}
}
