//! Joints connecting a body to its parent.

use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};
use sim_types::{JointLimits, JointType, Pose};

use crate::adapter::JointAdapter;
use crate::lifecycle::{AdapterSlot, Lifecycle, LifecycleState};

/// Degree-of-freedom connection between a body and its parent.
///
/// The joint frame is expressed relative to the owning body. Generalized
/// coordinates follow [`JointType::nqpos`] and [`JointType::nqvel`]; free
/// and spherical joints store orientations as `w x y z` quaternions.
#[derive(Debug, Clone)]
pub struct Joint {
    name: String,
    joint_type: JointType,
    axis: Vector3<f64>,
    limits: JointLimits,
    local: Pose,
    local0: Pose,
    stiffness: f64,
    armature: f64,
    damping: f64,
    qpos: Vec<f64>,
    qvel: Vec<f64>,
    qpos0: Vec<f64>,
    qvel0: Vec<f64>,
    world: Pose,
    state: LifecycleState,
    warned_unsupported: bool,
    adapter: AdapterSlot<dyn JointAdapter>,
}

impl Joint {
    /// Create a joint at rest with axis +Z and no limits.
    #[must_use]
    pub fn new(name: impl Into<String>, joint_type: JointType) -> Self {
        let qpos0 = joint_type.rest_qpos();
        let qvel0 = vec![0.0; joint_type.nqvel()];
        Self {
            name: name.into(),
            joint_type,
            axis: Vector3::z(),
            limits: JointLimits::continuous(),
            local: Pose::identity(),
            local0: Pose::identity(),
            stiffness: 0.0,
            armature: 0.0,
            damping: 0.0,
            qpos: qpos0.clone(),
            qvel: qvel0.clone(),
            qpos0,
            qvel0,
            world: Pose::identity(),
            state: LifecycleState::Uninitialized,
            warned_unsupported: false,
            adapter: AdapterSlot::empty(),
        }
    }

    /// Set the axis (normalized; a zero vector keeps the current axis).
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3<f64>) -> Self {
        if let Some(unit) = normalized(&axis) {
            self.axis = unit;
        }
        self
    }

    /// Set the limits.
    #[must_use]
    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the joint frame relative to the owning body.
    #[must_use]
    pub fn with_local(mut self, local: Pose) -> Self {
        self.local = local;
        self
    }

    /// Set stiffness, armature and damping.
    #[must_use]
    pub fn with_dynamics(mut self, stiffness: f64, armature: f64, damping: f64) -> Self {
        self.stiffness = stiffness;
        self.armature = armature;
        self.damping = damping;
        self
    }

    /// Set the initial generalized position. Ignored with a warning on a
    /// size mismatch.
    #[must_use]
    pub fn with_initial_qpos(mut self, qpos0: Vec<f64>) -> Self {
        if self.check_len("qpos0", qpos0.len(), self.joint_type.nqpos()) {
            self.qpos.clone_from(&qpos0);
            self.qpos0 = qpos0;
        }
        self
    }

    /// Joint kind.
    #[must_use]
    pub fn joint_type(&self) -> JointType {
        self.joint_type
    }

    /// Unit axis in the joint frame.
    #[must_use]
    pub fn axis(&self) -> &Vector3<f64> {
        &self.axis
    }

    /// Motion range.
    #[must_use]
    pub fn limits(&self) -> &JointLimits {
        &self.limits
    }

    /// Joint frame relative to the owning body.
    #[must_use]
    pub fn local_transform(&self) -> &Pose {
        &self.local
    }

    /// Stiffness.
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Armature.
    #[must_use]
    pub fn armature(&self) -> f64 {
        self.armature
    }

    /// Damping.
    #[must_use]
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Generalized positions.
    #[must_use]
    pub fn qpos(&self) -> &[f64] {
        &self.qpos
    }

    /// Generalized velocities.
    #[must_use]
    pub fn qvel(&self) -> &[f64] {
        &self.qvel
    }

    /// Initial generalized positions.
    #[must_use]
    pub fn qpos0(&self) -> &[f64] {
        &self.qpos0
    }

    /// Initial generalized velocities.
    #[must_use]
    pub fn qvel0(&self) -> &[f64] {
        &self.qvel0
    }

    /// Bind a physics adapter.
    pub fn attach_adapter(&mut self, adapter: &std::rc::Rc<std::cell::RefCell<dyn JointAdapter>>) {
        self.adapter.attach(adapter);
    }

    /// Whether a live physics adapter is bound.
    #[must_use]
    pub fn has_adapter(&self) -> bool {
        self.adapter.is_attached()
    }

    /// Set generalized positions. Ignored with a warning on a size mismatch.
    pub fn set_qpos(&mut self, qpos: &[f64]) {
        if self.check_len("qpos", qpos.len(), self.joint_type.nqpos()) {
            self.qpos.copy_from_slice(qpos);
            self.adapter.with(|a| a.set_qpos(qpos));
        }
    }

    /// Set generalized velocities. Ignored with a warning on a size mismatch.
    pub fn set_qvel(&mut self, qvel: &[f64]) {
        if self.check_len("qvel", qvel.len(), self.joint_type.nqvel()) {
            self.qvel.copy_from_slice(qvel);
            self.adapter.with(|a| a.set_qvel(qvel));
        }
    }

    /// Change the joint frame relative to the owning body.
    pub fn set_local_transform(&mut self, local: Pose) {
        self.local = local;
        self.adapter.with(|a| a.set_local_transform(&local));
    }

    /// Change the stiffness.
    pub fn set_stiffness(&mut self, stiffness: f64) {
        self.stiffness = stiffness;
        self.adapter.with(|a| a.set_stiffness(stiffness));
    }

    /// Change the armature.
    pub fn set_armature(&mut self, armature: f64) {
        self.armature = armature;
        self.adapter.with(|a| a.set_armature(armature));
    }

    /// Change the damping.
    pub fn set_damping(&mut self, damping: f64) {
        self.damping = damping;
        self.adapter.with(|a| a.set_damping(damping));
    }

    /// Change the axis. A zero vector is ignored with a warning.
    pub fn set_axis(&mut self, axis: Vector3<f64>) {
        let Some(unit) = normalized(&axis) else {
            tracing::warn!(joint = %self.name, "zero-length joint axis, ignoring");
            return;
        };
        self.axis = unit;
        self.adapter.with(|a| a.set_axis(&unit));
    }

    /// Change the limits.
    pub fn set_limits(&mut self, limits: JointLimits) {
        self.limits = limits;
        self.adapter.with(|a| a.set_limits(&limits));
    }

    /// Displacement of the owning body caused by the current coordinates,
    /// relative to the initial configuration, expressed in the body frame.
    ///
    /// Planar joints have no unique motion here; they stay rigid and log a
    /// warning once.
    pub fn motion(&mut self) -> Pose {
        let delta = match self.joint_type {
            JointType::Fixed => return Pose::identity(),
            JointType::Revolute => {
                let angle = self.qpos[0] - self.qpos0[0];
                let axis = Unit::new_unchecked(self.axis);
                Pose::from_position_rotation(
                    nalgebra::Point3::origin(),
                    UnitQuaternion::from_axis_angle(&axis, angle),
                )
            }
            JointType::Prismatic => {
                Pose::from_translation(self.axis * (self.qpos[0] - self.qpos0[0]))
            }
            JointType::Spherical => Pose::from_position_rotation(
                nalgebra::Point3::origin(),
                quat_delta(&self.qpos[0..4], &self.qpos0[0..4]),
            ),
            JointType::Free => Pose::from_position_rotation(
                nalgebra::Point3::from(
                    Vector3::from_column_slice(&self.qpos[0..3])
                        - Vector3::from_column_slice(&self.qpos0[0..3]),
                ),
                quat_delta(&self.qpos[3..7], &self.qpos0[3..7]),
            ),
            JointType::Planar => {
                if !self.warned_unsupported {
                    tracing::warn!(
                        joint = %self.name,
                        joint_type = %self.joint_type,
                        "forward kinematics not supported for this joint type, treating as rigid"
                    );
                    self.warned_unsupported = true;
                }
                return Pose::identity();
            }
        };
        // Conjugate by the joint frame so the motion happens about it.
        self.local.compose(&delta).compose(&self.local.inverse())
    }

    /// Pull coordinates from the adapter, if any.
    pub(crate) fn sync_from_adapter(&mut self) {
        let expected = (self.joint_type.nqpos(), self.joint_type.nqvel());
        let Some((qpos, qvel)) = self.adapter.read(|a| (a.qpos(), a.qvel())) else {
            return;
        };
        if qpos.len() == expected.0 {
            self.qpos = qpos;
        }
        if qvel.len() == expected.1 {
            self.qvel = qvel;
        }
    }

    pub(crate) fn update_world(&mut self, body_world: &Pose) {
        self.world = body_world.compose(&self.local);
    }

    fn check_len(&self, what: &str, got: usize, expected: usize) -> bool {
        if got == expected {
            return true;
        }
        tracing::warn!(joint = %self.name, what, got, expected, "size mismatch, ignoring");
        false
    }
}

impl Lifecycle for Joint {
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
        self.qpos.clone_from(&self.qpos0);
        self.qvel.clone_from(&self.qvel0);
        self.update_world(parent);
        let (qpos, qvel) = (&self.qpos, &self.qvel);
        self.adapter.with(|a| {
            a.initialize();
            a.set_qpos(qpos);
            a.set_qvel(qvel);
        });
        self.state = LifecycleState::Initialized;
    }

    fn pre_step(&mut self) {}

    fn post_step(&mut self, parent: &Pose) {
        self.sync_from_adapter();
        self.update_world(parent);
    }

    fn reset(&mut self, parent: &Pose) {
        self.local = self.local0;
        self.qpos.clone_from(&self.qpos0);
        self.qvel.clone_from(&self.qvel0);
        self.update_world(parent);
        let (local, qpos, qvel) = (self.local, &self.qpos, &self.qvel);
        self.adapter.with(|a| {
            a.reset();
            a.set_local_transform(&local);
            a.set_qpos(qpos);
            a.set_qvel(qvel);
        });
    }

    fn detach_sim(&mut self) {
        self.adapter.detach();
    }

    fn detach_viz(&mut self) {}
}

fn normalized(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = v.norm();
    (norm > 1e-12).then(|| v / norm)
}

// Rotation taking the initial orientation `q0` to `q`, both `w x y z`.
fn quat_delta(q: &[f64], q0: &[f64]) -> UnitQuaternion<f64> {
    let to_unit = |c: &[f64]| {
        UnitQuaternion::from_quaternion(Quaternion::new(c[0], c[1], c[2], c[3]))
    };
    to_unit(q) * to_unit(q0).inverse()
}
