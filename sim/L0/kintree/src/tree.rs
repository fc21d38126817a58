//! Arena-backed kinematic tree.

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};
use sim_types::{BodyId, Pose};

use crate::adapter::KintreeAdapter;
use crate::body::Body;
use crate::collider::Collider;
use crate::drawable::Drawable;
use crate::error::{KintreeError, Result};
use crate::joint::Joint;
use crate::lifecycle::{AdapterSlot, Lifecycle, LifecycleState};

/// An articulated model: bodies connected by joints, rooted at one body.
///
/// Bodies live in an arena and refer to each other by [`BodyId`]. A parent
/// is always inserted before its children, so arena order is a valid
/// topological order and no cycle can be formed.
///
/// # Example
///
/// ```
/// use sim_kintree::{Body, Joint, KinematicTree};
/// use sim_types::{JointType, Pose};
/// use nalgebra::Point3;
///
/// let mut tree = KinematicTree::new("pendulum");
/// let base = tree.add_root(Body::new("base")).unwrap();
/// let arm = Body::new("arm")
///     .with_local(Pose::from_position(Point3::new(0.0, 0.0, -1.0)))
///     .with_joint(Joint::new("hinge", JointType::Revolute));
/// tree.add_body(base, arm).unwrap();
///
/// tree.initialize();
/// assert_eq!(tree.len(), 2);
/// assert!(tree.joint_by_name("hinge").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct KinematicTree {
    name: String,
    bodies: Vec<Body>,
    root: Option<BodyId>,
    body_index: HashMap<String, BodyId>,
    joint_index: HashMap<String, BodyId>,
    collider_index: HashMap<String, (BodyId, usize)>,
    drawable_index: HashMap<String, (BodyId, usize)>,
    tf: Pose,
    tf0: Pose,
    linear_velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
    state: LifecycleState,
    adapter: AdapterSlot<dyn KintreeAdapter>,
}

impl KinematicTree {
    /// Create an empty tree placed at the world origin.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bodies: Vec::new(),
            root: None,
            body_index: HashMap::new(),
            joint_index: HashMap::new(),
            collider_index: HashMap::new(),
            drawable_index: HashMap::new(),
            tf: Pose::identity(),
            tf0: Pose::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            state: LifecycleState::Uninitialized,
            adapter: AdapterSlot::empty(),
        }
    }

    /// Tree name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lifecycle state of the tree as a whole.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Insert the root body.
    ///
    /// # Errors
    ///
    /// Returns an error if a root exists or any name is already taken.
    pub fn add_root(&mut self, body: Body) -> Result<BodyId> {
        if let Some(root) = self.root {
            return Err(KintreeError::RootAlreadySet(
                self.bodies[root.index()].name().to_string(),
            ));
        }
        let id = self.insert(None, body)?;
        self.root = Some(id);
        Ok(id)
    }

    /// Insert a body below `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is not in this tree or any name of the
    /// body, its joint, colliders or drawables is already taken.
    pub fn add_body(&mut self, parent: BodyId, body: Body) -> Result<BodyId> {
        if parent.index() >= self.bodies.len() {
            return Err(KintreeError::UnknownBody(parent));
        }
        let id = self.insert(Some(parent), body)?;
        self.bodies[parent.index()].push_child(id);
        Ok(id)
    }

    fn insert(&mut self, parent: Option<BodyId>, mut body: Body) -> Result<BodyId> {
        self.check_names(&body)?;
        let id = BodyId::new(u32::try_from(self.bodies.len()).map_err(|_| {
            KintreeError::build("tree", "body arena exceeds u32 ids")
        })?);
        body.bind(id, parent);

        self.body_index.insert(body.name().to_string(), id);
        if let Some(joint) = body.joint() {
            self.joint_index.insert(joint.name().to_string(), id);
        }
        for (slot, collider) in body.colliders().iter().enumerate() {
            self.collider_index
                .insert(collider.name().to_string(), (id, slot));
        }
        for (slot, drawable) in body.drawables().iter().enumerate() {
            self.drawable_index
                .insert(drawable.name().to_string(), (id, slot));
        }
        tracing::debug!(tree = %self.name, body = %body.name(), %id, "body added");
        self.bodies.push(body);
        Ok(id)
    }

    fn check_names(&self, body: &Body) -> Result<()> {
        if self.body_index.contains_key(body.name()) {
            return Err(KintreeError::duplicate("body", body.name()));
        }
        if let Some(joint) = body.joint() {
            if self.joint_index.contains_key(joint.name()) {
                return Err(KintreeError::duplicate("joint", joint.name()));
            }
        }
        let mut seen = hashbrown::HashSet::new();
        for collider in body.colliders() {
            if self.collider_index.contains_key(collider.name()) || !seen.insert(collider.name()) {
                return Err(KintreeError::duplicate("collider", collider.name()));
            }
        }
        seen.clear();
        for drawable in body.drawables() {
            if self.drawable_index.contains_key(drawable.name()) || !seen.insert(drawable.name()) {
                return Err(KintreeError::duplicate("drawable", drawable.name()));
            }
        }
        Ok(())
    }

    // ==================== Queries ====================

    /// Root body id.
    #[must_use]
    pub fn root(&self) -> Option<BodyId> {
        self.root
    }

    /// Root body.
    #[must_use]
    pub fn root_body(&self) -> Option<&Body> {
        self.root.map(|id| &self.bodies[id.index()])
    }

    /// Number of bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the tree has no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Number of joints.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joint_index.len()
    }

    /// Number of colliders.
    #[must_use]
    pub fn collider_count(&self) -> usize {
        self.collider_index.len()
    }

    /// Number of drawables.
    #[must_use]
    pub fn drawable_count(&self) -> usize {
        self.drawable_index.len()
    }

    /// Body by id.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.index())
    }

    /// Mutable body by id.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.index())
    }

    /// Id of the body with this name.
    #[must_use]
    pub fn body_id(&self, name: &str) -> Option<BodyId> {
        self.body_index.get(name).copied()
    }

    /// Body by name.
    #[must_use]
    pub fn body_by_name(&self, name: &str) -> Option<&Body> {
        self.body_id(name).and_then(|id| self.body(id))
    }

    /// Mutable body by name.
    pub fn body_by_name_mut(&mut self, name: &str) -> Option<&mut Body> {
        let id = self.body_id(name)?;
        self.body_mut(id)
    }

    /// Joint by name.
    #[must_use]
    pub fn joint_by_name(&self, name: &str) -> Option<&Joint> {
        let id = self.joint_index.get(name)?;
        self.bodies[id.index()].joint()
    }

    /// Mutable joint by name.
    pub fn joint_by_name_mut(&mut self, name: &str) -> Option<&mut Joint> {
        let id = *self.joint_index.get(name)?;
        self.bodies[id.index()].joint_mut()
    }

    /// Collider by name.
    #[must_use]
    pub fn collider_by_name(&self, name: &str) -> Option<&Collider> {
        let (id, slot) = *self.collider_index.get(name)?;
        self.bodies[id.index()].colliders().get(slot)
    }

    /// Mutable collider by name.
    pub fn collider_by_name_mut(&mut self, name: &str) -> Option<&mut Collider> {
        let (id, slot) = *self.collider_index.get(name)?;
        self.bodies[id.index()].colliders_mut().get_mut(slot)
    }

    /// Drawable by name.
    #[must_use]
    pub fn drawable_by_name(&self, name: &str) -> Option<&Drawable> {
        let (id, slot) = *self.drawable_index.get(name)?;
        self.bodies[id.index()].drawables().get(slot)
    }

    /// Mutable drawable by name.
    pub fn drawable_by_name_mut(&mut self, name: &str) -> Option<&mut Drawable> {
        let (id, slot) = *self.drawable_index.get(name)?;
        self.bodies[id.index()].drawables_mut().get_mut(slot)
    }

    /// Children of a body, in insertion order.
    #[must_use]
    pub fn children(&self, id: BodyId) -> &[BodyId] {
        match self.body(id) {
            Some(body) => body.children(),
            None => &[],
        }
    }

    /// Body ids in depth-first pre-order from the root.
    #[must_use]
    pub fn dfs_order(&self) -> Vec<BodyId> {
        let mut order = Vec::with_capacity(self.bodies.len());
        let mut stack: Vec<BodyId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.bodies[id.index()].children().iter().rev());
        }
        order
    }

    /// Bodies in depth-first pre-order from the root.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.dfs_order()
            .into_iter()
            .map(move |id| &self.bodies[id.index()])
    }

    /// Mutable bodies in arena order (parents before children).
    pub fn bodies_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.bodies.iter_mut()
    }

    /// Ids of `id` and everything below it, depth-first.
    fn subtree(&self, id: BodyId) -> Vec<BodyId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.bodies[id.index()].children().iter().rev());
        }
        order
    }

    fn parent_frame(&self, id: BodyId) -> Pose {
        self.bodies[id.index()]
            .parent()
            .map_or(self.tf, |parent| *self.bodies[parent.index()].transform())
    }

    // ==================== Tree pose and velocity ====================

    /// World pose of the tree frame.
    #[must_use]
    pub fn transform(&self) -> &Pose {
        &self.tf
    }

    /// World pose of the tree frame at initialization.
    #[must_use]
    pub fn initial_transform(&self) -> &Pose {
        &self.tf0
    }

    /// Linear velocity of the tree frame.
    #[must_use]
    pub fn linear_velocity(&self) -> &Vector3<f64> {
        &self.linear_velocity
    }

    /// Angular velocity of the tree frame.
    #[must_use]
    pub fn angular_velocity(&self) -> &Vector3<f64> {
        &self.angular_velocity
    }

    /// Bind a physics adapter for the tree as a whole.
    pub fn attach_adapter(&mut self, adapter: &Rc<RefCell<dyn KintreeAdapter>>) {
        self.adapter.attach(adapter);
    }

    /// Whether a live tree adapter is bound.
    #[must_use]
    pub fn has_adapter(&self) -> bool {
        self.adapter.is_attached()
    }

    /// Move the tree frame, carrying every body along.
    pub fn set_transform(&mut self, pose: Pose) {
        self.tf = pose;
        self.adapter.with(|a| a.set_transform(&pose));
        if let Some(root) = self.root {
            self.propagate(root);
        }
    }

    /// Move the tree frame, keeping its orientation.
    pub fn set_position(&mut self, position: Point3<f64>) {
        self.set_transform(Pose::from_position_rotation(position, self.tf.rotation));
    }

    /// Rotate the tree frame, keeping its position.
    pub fn set_rotation(&mut self, rotation: UnitQuaternion<f64>) {
        self.set_transform(Pose::from_position_rotation(self.tf.position, rotation));
    }

    /// Rotate the tree frame from roll, pitch and yaw in radians.
    pub fn set_euler(&mut self, roll: f64, pitch: f64, yaw: f64) {
        self.set_rotation(UnitQuaternion::from_euler_angles(roll, pitch, yaw));
    }

    /// Rotate the tree frame from a quaternion `(w, x, y, z)`; the input is
    /// normalized.
    pub fn set_quaternion(&mut self, w: f64, x: f64, y: f64, z: f64) {
        let q = Quaternion::new(w, x, y, z);
        if q.norm() <= f64::EPSILON {
            tracing::warn!(tree = %self.name, "zero quaternion, ignoring");
            return;
        }
        self.set_rotation(UnitQuaternion::from_quaternion(q));
    }

    /// Set the linear velocity of the tree frame.
    pub fn set_linear_velocity(&mut self, velocity: Vector3<f64>) {
        self.linear_velocity = velocity;
        self.adapter.with(|a| a.set_linear_velocity(&velocity));
    }

    /// Set the angular velocity of the tree frame.
    pub fn set_angular_velocity(&mut self, velocity: Vector3<f64>) {
        self.angular_velocity = velocity;
        self.adapter.with(|a| a.set_angular_velocity(&velocity));
    }

    /// Change a body's pose relative to its parent and recompute the world
    /// poses of its subtree.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not in this tree.
    pub fn set_local_transform(&mut self, id: BodyId, local: Pose) -> Result<()> {
        let body = self
            .bodies
            .get_mut(id.index())
            .ok_or(KintreeError::UnknownBody(id))?;
        body.set_local(local);
        self.propagate(id);
        Ok(())
    }

    /// Recompute world poses of `from` and its subtree and push them to the
    /// body adapters.
    fn propagate(&mut self, from: BodyId) {
        for id in self.subtree(from) {
            let parent = self.parent_frame(id);
            let body = &mut self.bodies[id.index()];
            body.forward(&parent);
            body.push_transform();
        }
    }

    // ==================== Lifecycle ====================

    /// Record initial poses and coordinates and notify adapters.
    pub fn initialize(&mut self) {
        self.tf0 = self.tf;
        let (tf, lin, ang) = (self.tf, self.linear_velocity, self.angular_velocity);
        self.adapter.with(|a| {
            a.initialize();
            a.set_transform(&tf);
            a.set_linear_velocity(&lin);
            a.set_angular_velocity(&ang);
        });
        for id in self.dfs_order() {
            let parent = self.parent_frame(id);
            self.bodies[id.index()].initialize(&parent);
        }
        self.state = LifecycleState::Initialized;
        tracing::debug!(tree = %self.name, bodies = self.bodies.len(), "tree initialized");
    }

    /// Push accumulated state to the adapters.
    pub fn pre_step(&mut self) {
        for body in &mut self.bodies {
            body.pre_step();
        }
    }

    /// Pull state from the adapters, or run forward kinematics where there
    /// are none.
    pub fn post_step(&mut self) {
        if let Some((tf, lin, ang)) = self
            .adapter
            .read(|a| (a.transform(), a.linear_velocity(), a.angular_velocity()))
        {
            self.tf = tf;
            self.linear_velocity = lin;
            self.angular_velocity = ang;
        }
        for id in self.dfs_order() {
            let parent = self.parent_frame(id);
            self.bodies[id.index()].post_step(&parent);
        }
    }

    /// Restore the initialize-time state.
    pub fn reset(&mut self) {
        self.tf = self.tf0;
        self.linear_velocity = Vector3::zeros();
        self.angular_velocity = Vector3::zeros();
        let tf = self.tf;
        self.adapter.with(|a| {
            a.reset();
            a.set_transform(&tf);
            a.set_linear_velocity(&Vector3::zeros());
            a.set_angular_velocity(&Vector3::zeros());
        });
        for id in self.dfs_order() {
            let parent = self.parent_frame(id);
            self.bodies[id.index()].reset(&parent);
        }
    }

    /// Release every physics binding.
    pub fn detach_sim(&mut self) {
        self.adapter.detach();
        for body in &mut self.bodies {
            body.detach_sim();
        }
    }

    /// Release every visualizer binding.
    pub fn detach_viz(&mut self) {
        for body in &mut self.bodies {
            body.detach_viz();
        }
    }
}
