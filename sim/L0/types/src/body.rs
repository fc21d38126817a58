//! Rigid body frame and inertia types.
//!
//! This module provides the spatial primitives shared by every entity of a
//! kinematic tree: arena ids, poses (position + orientation), twists, and the
//! inertial description of a body.

use nalgebra::{Isometry3, Matrix3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a body inside a kinematic tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u32);

impl BodyId {
    /// Create a new body ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Position of the body in its arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for BodyId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Position and orientation of a frame.
///
/// A pose is used both for world transforms and for transforms relative to a
/// parent frame. Composition follows the usual convention: `a.compose(&b)`
/// maps points of frame `b` (expressed in `a`) into the frame `a` lives in.
///
/// # Example
///
/// ```
/// use sim_types::Pose;
/// use nalgebra::Point3;
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let world = pose.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(world, Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position of the frame origin.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from a translation vector.
    #[must_use]
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::from_position(Point3::from(translation))
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Create a pose from an isometry.
    #[must_use]
    pub fn from_isometry(iso: Isometry3<f64>) -> Self {
        Self {
            position: Point3::from(iso.translation.vector),
            rotation: iso.rotation,
        }
    }

    /// Convert to an isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(self.position.coords.into(), self.rotation)
    }

    /// Transform a point from local to parent coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Transform a vector from local to parent coordinates (rotation only).
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Compute the inverse pose.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            position: Point3::from(-(inv_rotation * self.position.coords)),
            rotation: inv_rotation,
        }
    }

    /// Compose two poses: `self * other`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(&other.position),
            rotation: self.rotation * other.rotation,
        }
    }

    /// Express `world` relative to this frame: `self⁻¹ * world`.
    ///
    /// This is the conversion applied to documents written in global
    /// coordinates, where `self` is the parent's world pose.
    #[must_use]
    pub fn relative(&self, world: &Self) -> Self {
        self.inverse().compose(world)
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }

    /// Approximate equality on both translation and rotation.
    ///
    /// Quaternions `q` and `-q` describe the same rotation and compare equal.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.position - other.position).norm() <= epsilon
            && self.rotation.angle_to(&other.rotation) <= epsilon
    }
}

/// Mass, rotational inertia and center-of-mass frame of a body.
///
/// The inertia tensor is stored by its six independent components, the way
/// both description formats declare it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InertialData {
    /// Mass (kg).
    pub mass: f64,
    /// Moment of inertia about x.
    pub ixx: f64,
    /// Moment of inertia about y.
    pub iyy: f64,
    /// Moment of inertia about z.
    pub izz: f64,
    /// Product of inertia xy.
    pub ixy: f64,
    /// Product of inertia xz.
    pub ixz: f64,
    /// Product of inertia yz.
    pub iyz: f64,
    /// Center-of-mass frame relative to the body frame.
    pub frame: Pose,
}

impl Default for InertialData {
    fn default() -> Self {
        Self {
            mass: 1.0,
            ixx: 0.1,
            iyy: 0.1,
            izz: 0.1,
            ixy: 0.0,
            ixz: 0.0,
            iyz: 0.0,
            frame: Pose::identity(),
        }
    }
}

impl InertialData {
    /// Inertial data with a diagonal inertia tensor.
    #[must_use]
    pub fn diagonal(mass: f64, diag: Vector3<f64>) -> Self {
        Self {
            mass,
            ixx: diag.x,
            iyy: diag.y,
            izz: diag.z,
            ixy: 0.0,
            ixz: 0.0,
            iyz: 0.0,
            frame: Pose::identity(),
        }
    }

    /// Massless placeholder used for synthesized intermediate bodies.
    #[must_use]
    pub fn massless() -> Self {
        Self::diagonal(0.0, Vector3::zeros())
    }

    /// Set the center-of-mass frame.
    #[must_use]
    pub fn with_frame(mut self, frame: Pose) -> Self {
        self.frame = frame;
        self
    }

    /// Full symmetric inertia tensor.
    #[must_use]
    pub fn tensor(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.ixx, self.ixy, self.ixz, //
            self.ixy, self.iyy, self.iyz, //
            self.ixz, self.iyz, self.izz,
        )
    }
}
