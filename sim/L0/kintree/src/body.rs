//! Rigid bodies of a kinematic tree.

use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::Vector3;
use sim_types::{BodyId, InertialData, Pose};

use crate::adapter::BodyAdapter;
use crate::collider::Collider;
use crate::drawable::Drawable;
use crate::joint::Joint;
use crate::lifecycle::{AdapterSlot, Lifecycle, LifecycleState};

/// One rigid link of a kinematic tree.
///
/// A body owns its colliders, drawables and the joint connecting it to its
/// parent. Parent and children are arena ids inside the owning
/// [`KinematicTree`](crate::KinematicTree); they are assigned when the body
/// is inserted.
#[derive(Debug, Clone)]
pub struct Body {
    name: String,
    id: BodyId,
    parent: Option<BodyId>,
    children: Vec<BodyId>,
    local: Pose,
    local0: Pose,
    world: Pose,
    world0: Pose,
    inertia: InertialData,
    joint: Option<Joint>,
    colliders: Vec<Collider>,
    drawables: Vec<Drawable>,
    force: Vector3<f64>,
    torque: Vector3<f64>,
    state: LifecycleState,
    adapter: AdapterSlot<dyn BodyAdapter>,
}

impl Body {
    /// Create a detached body with default inertia at its parent's origin.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: BodyId::new(0),
            parent: None,
            children: Vec::new(),
            local: Pose::identity(),
            local0: Pose::identity(),
            world: Pose::identity(),
            world0: Pose::identity(),
            inertia: InertialData::default(),
            joint: None,
            colliders: Vec::new(),
            drawables: Vec::new(),
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
            state: LifecycleState::Uninitialized,
            adapter: AdapterSlot::empty(),
        }
    }

    /// Set the pose relative to the parent body.
    #[must_use]
    pub fn with_local(mut self, local: Pose) -> Self {
        self.local = local;
        self.world = local;
        self
    }

    /// Set the mass properties.
    #[must_use]
    pub fn with_inertia(mut self, inertia: InertialData) -> Self {
        self.inertia = inertia;
        self
    }

    /// Set the joint connecting this body to its parent.
    #[must_use]
    pub fn with_joint(mut self, joint: Joint) -> Self {
        self.joint = Some(joint);
        self
    }

    /// Add a collider.
    #[must_use]
    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.colliders.push(collider);
        self
    }

    /// Add a drawable.
    #[must_use]
    pub fn with_drawable(mut self, drawable: Drawable) -> Self {
        self.drawables.push(drawable);
        self
    }

    /// Arena id inside the owning tree.
    #[must_use]
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Parent id (`None` for the root).
    #[must_use]
    pub fn parent(&self) -> Option<BodyId> {
        self.parent
    }

    /// Child ids in insertion order.
    #[must_use]
    pub fn children(&self) -> &[BodyId] {
        &self.children
    }

    /// Pose relative to the parent body.
    #[must_use]
    pub fn local_transform(&self) -> &Pose {
        &self.local
    }

    /// Pose at initialization time.
    #[must_use]
    pub fn initial_transform(&self) -> &Pose {
        &self.world0
    }

    /// Mass properties.
    #[must_use]
    pub fn inertia(&self) -> &InertialData {
        &self.inertia
    }

    /// Joint to the parent, if any.
    #[must_use]
    pub fn joint(&self) -> Option<&Joint> {
        self.joint.as_ref()
    }

    /// Mutable joint to the parent, if any.
    pub fn joint_mut(&mut self) -> Option<&mut Joint> {
        self.joint.as_mut()
    }

    /// Colliders in declaration order.
    #[must_use]
    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    /// Mutable colliders.
    pub fn colliders_mut(&mut self) -> &mut [Collider] {
        &mut self.colliders
    }

    /// Drawables in declaration order.
    #[must_use]
    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    /// Mutable drawables.
    pub fn drawables_mut(&mut self) -> &mut [Drawable] {
        &mut self.drawables
    }

    /// Force accumulated for the next step.
    #[must_use]
    pub fn force_com(&self) -> &Vector3<f64> {
        &self.force
    }

    /// Torque accumulated for the next step.
    #[must_use]
    pub fn torque_com(&self) -> &Vector3<f64> {
        &self.torque
    }

    /// Bind a physics adapter.
    pub fn attach_adapter(&mut self, adapter: &Rc<RefCell<dyn BodyAdapter>>) {
        self.adapter.attach(adapter);
    }

    /// Whether a live physics adapter is bound.
    #[must_use]
    pub fn has_adapter(&self) -> bool {
        self.adapter.is_attached()
    }

    /// Accumulate a force at the center of mass for the next step.
    pub fn add_force_com(&mut self, force: Vector3<f64>) {
        self.force += force;
    }

    /// Accumulate a torque about the center of mass for the next step.
    pub fn add_torque_com(&mut self, torque: Vector3<f64>) {
        self.torque += torque;
    }

    /// Drop accumulated force and torque.
    pub fn clear_forces(&mut self) {
        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
    }

    /// Change mass properties.
    pub fn set_inertia(&mut self, inertia: InertialData) {
        self.inertia = inertia;
        self.adapter.with(|a| a.set_inertia(&inertia));
    }

    pub(crate) fn bind(&mut self, id: BodyId, parent: Option<BodyId>) {
        self.id = id;
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: BodyId) {
        self.children.push(child);
    }

    pub(crate) fn set_local(&mut self, local: Pose) {
        self.local = local;
    }

    /// Recompute the world pose from the parent frame and joint coordinates,
    /// then carry attachments along.
    pub(crate) fn forward(&mut self, parent: &Pose) {
        let motion = self.joint.as_mut().map_or_else(Pose::identity, Joint::motion);
        self.world = parent.compose(&self.local).compose(&motion);
        self.place_attachments();
    }

    /// Push the current world pose to the adapter.
    pub(crate) fn push_transform(&self) {
        let world = self.world;
        self.adapter.with(|a| a.set_transform(&world));
    }

    fn place_attachments(&mut self) {
        let world = self.world;
        if let Some(joint) = self.joint.as_mut() {
            joint.update_world(&world);
        }
        for collider in &mut self.colliders {
            collider.post_step(&world);
        }
        for drawable in &mut self.drawables {
            drawable.post_step(&world);
        }
    }
}

impl Lifecycle for Body {
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
        self.local0 = self.local;
        self.world = parent.compose(&self.local);
        self.world0 = self.world;
        let world = self.world;

        if let Some(joint) = self.joint.as_mut() {
            joint.initialize(&world);
        }
        for collider in &mut self.colliders {
            collider.initialize(&world);
        }
        for drawable in &mut self.drawables {
            drawable.initialize(&world);
        }
        let inertia = self.inertia;
        self.adapter.with(|a| {
            a.initialize();
            a.set_inertia(&inertia);
            a.set_transform(&world);
        });
        self.state = LifecycleState::Initialized;
    }

    fn pre_step(&mut self) {
        let (force, torque) = (self.force, self.torque);
        self.adapter.with(|a| {
            a.set_force_com(&force);
            a.set_torque_com(&torque);
        });
        if let Some(joint) = self.joint.as_mut() {
            joint.pre_step();
        }
        for collider in &mut self.colliders {
            collider.pre_step();
        }
    }

    fn post_step(&mut self, parent: &Pose) {
        if let Some(joint) = self.joint.as_mut() {
            joint.sync_from_adapter();
        }
        match self.adapter.read(|a| a.transform()) {
            Some(world) => {
                self.world = world;
                self.place_attachments();
            }
            None => self.forward(parent),
        }
        self.clear_forces();
    }

    fn reset(&mut self, _parent: &Pose) {
        self.local = self.local0;
        self.world = self.world0;
        self.clear_forces();
        let world = self.world;

        if let Some(joint) = self.joint.as_mut() {
            joint.reset(&world);
        }
        for collider in &mut self.colliders {
            collider.reset(&world);
        }
        for drawable in &mut self.drawables {
            drawable.reset(&world);
        }
        self.adapter.with(|a| {
            a.reset();
            a.set_transform(&world);
        });
    }

    fn detach_sim(&mut self) {
        self.adapter.detach();
        if let Some(joint) = self.joint.as_mut() {
            joint.detach_sim();
        }
        for collider in &mut self.colliders {
            collider.detach_sim();
        }
    }

    fn detach_viz(&mut self) {
        for drawable in &mut self.drawables {
            drawable.detach_viz();
        }
    }
}
