//! Backend adapter interfaces.
//!
//! A backend creates one adapter per entity it manages and keeps it in an
//! `Rc<RefCell<_>>`. The entity only holds a `Weak` reference (see
//! [`AdapterSlot`](crate::AdapterSlot)), so the backend stays the single
//! owner and may drop its adapters at any time.
//!
//! Each trait is flat: [`Adapter`] supplies detachment, everything else is
//! specific to one entity kind. Setters that a backend cannot honor have
//! empty default bodies.
//!
//! Implementations must forget their owner inside [`Adapter::on_detach`] so
//! that neither side can reach the other after teardown.

use nalgebra::{Vector3, Vector4};
use sim_types::{InertialData, JointLimits, Pose};

/// Detachment hook shared by every adapter kind.
pub trait Adapter {
    /// The entity released this adapter. Clear any back-reference to it.
    fn on_detach(&mut self);
}

/// Backend view of a body.
pub trait BodyAdapter: Adapter {
    /// Called once when the owning body is initialized.
    fn initialize(&mut self) {}

    /// Called when the owning body returns to its initial state.
    fn reset(&mut self) {}

    /// Push a world pose.
    fn set_transform(&mut self, pose: &Pose);

    /// Current world pose as computed by the backend.
    fn transform(&self) -> Pose;

    /// Push the force applied at the center of mass for the next step.
    fn set_force_com(&mut self, force: &Vector3<f64>);

    /// Push the torque applied about the center of mass for the next step.
    fn set_torque_com(&mut self, torque: &Vector3<f64>);

    /// Push new mass properties.
    fn set_inertia(&mut self, _inertia: &InertialData) {}
}

/// Backend view of a joint.
pub trait JointAdapter: Adapter {
    /// Called once when the owning joint is initialized.
    fn initialize(&mut self) {}

    /// Called when the owning joint returns to its initial state.
    fn reset(&mut self) {}

    /// Push generalized positions.
    fn set_qpos(&mut self, qpos: &[f64]);

    /// Push generalized velocities.
    fn set_qvel(&mut self, qvel: &[f64]);

    /// Generalized positions as computed by the backend.
    fn qpos(&self) -> Vec<f64>;

    /// Generalized velocities as computed by the backend.
    fn qvel(&self) -> Vec<f64>;

    /// Push the joint frame relative to its body.
    fn set_local_transform(&mut self, _local: &Pose) {}

    /// Push a new stiffness.
    fn set_stiffness(&mut self, _stiffness: f64) {}

    /// Push a new armature.
    fn set_armature(&mut self, _armature: f64) {}

    /// Push a new damping.
    fn set_damping(&mut self, _damping: f64) {}

    /// Push a new axis.
    fn set_axis(&mut self, _axis: &Vector3<f64>) {}

    /// Push new limits.
    fn set_limits(&mut self, _limits: &JointLimits) {}
}

/// Backend view of a collider.
pub trait ColliderAdapter: Adapter {
    /// Called once when the owning collider is initialized.
    fn initialize(&mut self) {}

    /// Called when the owning collider returns to its initial state.
    fn reset(&mut self) {}

    /// Push the pose relative to the owning body.
    fn set_local_transform(&mut self, _local: &Pose) {}

    /// Push a new size.
    fn set_size(&mut self, _size: &Vector3<f64>) {}

    /// Push new heightfield samples.
    fn set_elevation_data(&mut self, _heights: &[f64]) {}

    /// Push a new collision group.
    fn set_collision_group(&mut self, _group: i32) {}

    /// Push a new collision mask.
    fn set_collision_mask(&mut self, _mask: i32) {}

    /// Push new friction coefficients.
    fn set_friction(&mut self, _friction: &Vector3<f64>) {}
}

/// Renderer view of a drawable.
pub trait DrawableAdapter: Adapter {
    /// Push a world pose for drawing.
    fn set_transform(&mut self, pose: &Pose);

    /// Push the pose relative to the owning body.
    fn set_local_transform(&mut self, _local: &Pose) {}

    /// Push one color for ambient, diffuse and specular terms.
    fn set_color(&mut self, _rgb: &Vector3<f64>) {}

    /// Push the ambient color.
    fn set_ambient_color(&mut self, _rgb: &Vector3<f64>) {}

    /// Push the diffuse color.
    fn set_diffuse_color(&mut self, _rgb: &Vector3<f64>) {}

    /// Push the specular color.
    fn set_specular_color(&mut self, _rgb: &Vector3<f64>) {}

    /// Push the rgba tint.
    fn set_rgba(&mut self, _rgba: &Vector4<f64>) {}

    /// Push the shininess.
    fn set_shininess(&mut self, _shininess: f64) {}

    /// Push a texture reference.
    fn set_texture(&mut self, _texture: &str) {}

    /// Push a new size.
    fn set_size(&mut self, _size: &Vector3<f64>) {}

    /// Push new heightfield samples.
    fn set_elevation_data(&mut self, _heights: &[f64]) {}

    /// Show or hide.
    fn set_visible(&mut self, _visible: bool) {}

    /// Toggle wireframe rendering.
    fn set_wireframe(&mut self, _wireframe: bool) {}
}

/// Backend view of a whole tree.
pub trait KintreeAdapter: Adapter {
    /// Called once when the tree is initialized.
    fn initialize(&mut self) {}

    /// Called when the tree returns to its initial state.
    fn reset(&mut self) {}

    /// Push the tree's world pose.
    fn set_transform(&mut self, pose: &Pose);

    /// Tree world pose as computed by the backend.
    fn transform(&self) -> Pose;

    /// Push the root's linear velocity.
    fn set_linear_velocity(&mut self, velocity: &Vector3<f64>);

    /// Push the root's angular velocity.
    fn set_angular_velocity(&mut self, velocity: &Vector3<f64>);

    /// Root linear velocity as computed by the backend.
    fn linear_velocity(&self) -> Vector3<f64>;

    /// Root angular velocity as computed by the backend.
    fn angular_velocity(&self) -> Vector3<f64>;
}
