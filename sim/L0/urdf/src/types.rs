//! Intermediate representation of URDF joints.
//!
//! Links are turned into [`Body`](sim_kintree::Body) values right away;
//! joints are kept in this form until the link graph is resolved, because a
//! joint is owned by its child link and that link may be declared anywhere.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use sim_schema::Element;
use sim_types::{JointLimits, JointType, Pose};

/// Joint type keywords of URDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrdfJointType {
    /// Revolute joint with limits.
    Revolute,
    /// Continuous (unlimited revolute) joint.
    Continuous,
    /// Prismatic (sliding) joint.
    Prismatic,
    /// Fixed (welded) joint.
    Fixed,
    /// Floating (6-DOF) joint.
    Floating,
    /// Planar joint; the axis is the plane normal.
    Planar,
}

impl UrdfJointType {
    /// Parse a joint type keyword.
    #[must_use]
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "revolute" => Some(Self::Revolute),
            "continuous" => Some(Self::Continuous),
            "prismatic" => Some(Self::Prismatic),
            "fixed" => Some(Self::Fixed),
            "floating" => Some(Self::Floating),
            "planar" => Some(Self::Planar),
            _ => None,
        }
    }

    /// Tree joint type this keyword maps to.
    #[must_use]
    pub fn joint_type(self) -> JointType {
        match self {
            Self::Revolute | Self::Continuous => JointType::Revolute,
            Self::Prismatic => JointType::Prismatic,
            Self::Fixed => JointType::Fixed,
            Self::Floating => JointType::Free,
            Self::Planar => JointType::Planar,
        }
    }

    /// Whether a `<limit>` element applies to this type.
    #[must_use]
    pub fn accepts_limits(self) -> bool {
        matches!(self, Self::Revolute | Self::Prismatic)
    }
}

/// Pose read from an `<origin xyz rpy>` element.
///
/// `rpy` is roll, pitch and yaw about the fixed X, Y and Z axes, so the
/// rotation is `Rz(yaw) * Ry(pitch) * Rx(roll)`. A missing element is the
/// identity.
#[must_use]
pub fn origin_pose(origin: Option<&Element>) -> Pose {
    let Some(origin) = origin else {
        return Pose::identity();
    };
    let xyz = origin.get_vec3("xyz", Vector3::zeros());
    let rpy = origin.get_vec3("rpy", Vector3::zeros());
    Pose::from_position_rotation(
        Point3::from(xyz),
        UnitQuaternion::from_euler_angles(rpy.x, rpy.y, rpy.z),
    )
}

/// A parsed `<joint>` together with the connection it makes.
#[derive(Debug, Clone, PartialEq)]
pub struct UrdfJoint {
    /// Joint name.
    pub name: String,
    /// Joint type keyword.
    pub joint_type: UrdfJointType,
    /// Parent link name.
    pub parent: String,
    /// Child link name.
    pub child: String,
    /// Child link frame relative to the parent link frame.
    pub origin: Pose,
    /// Motion axis in the child frame.
    pub axis: Vector3<f64>,
    /// Position limits.
    pub limits: JointLimits,
    /// Viscous damping.
    pub damping: f64,
}

impl UrdfJoint {
    /// Create a joint between two links with default axis, limits and
    /// dynamics.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        joint_type: UrdfJointType,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            joint_type,
            parent: parent.into(),
            child: child.into(),
            origin: Pose::identity(),
            axis: Vector3::x(),
            limits: JointLimits::continuous(),
            damping: 0.0,
        }
    }

    /// Set the origin.
    #[must_use]
    pub fn with_origin(mut self, origin: Pose) -> Self {
        self.origin = origin;
        self
    }

    /// Set the axis.
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3<f64>) -> Self {
        self.axis = axis;
        self
    }

    /// Set the limits.
    #[must_use]
    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the damping.
    #[must_use]
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Kinematic tree joint. Its frame coincides with the child link frame.
    #[must_use]
    pub fn to_joint(&self) -> sim_kintree::Joint {
        let joint_type = self.joint_type.joint_type();
        let mut joint = sim_kintree::Joint::new(self.name.clone(), joint_type)
            .with_limits(self.limits)
            .with_dynamics(0.0, 0.0, self.damping);
        if joint_type.uses_axis() {
            joint = joint.with_axis(self.axis);
        }
        joint
    }
}
