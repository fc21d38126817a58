//! Shape descriptors and the normalization shared by both dialect parsers.
//!
//! Every collider and drawable stores a [`ShapeDescriptor`]: a primitive
//! kind, a size vector whose meaning depends on the kind (see
//! [`ShapeType`]), and a pose relative to the owning body.
//!
//! Segment-style declarations (two end points plus a radius) are converted
//! here, so that both parsers produce identical descriptors:
//!
//! - the pose sits at the segment midpoint, rotated so local +Z points from
//!   the first end point to the second;
//! - capsules and cylinders get `(radius, length, 0)`;
//! - boxes get `(2r, 2r, length)`;
//! - ellipsoids get `(r, r, length / 2)`.

use std::path::PathBuf;

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use sim_types::{Pose, ShapeType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-10;

/// Reference to a mesh file. Only the path is recorded, never the bytes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshRef {
    /// Resolved file path.
    pub path: PathBuf,
    /// Per-axis scale.
    pub scale: Vector3<f64>,
}

/// Height samples of a heightfield shape, row-major.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeightfieldData {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// `rows * cols` samples.
    pub heights: Vec<f64>,
}

impl HeightfieldData {
    /// Flat field of the given resolution.
    #[must_use]
    pub fn flat(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            heights: vec![0.0; rows * cols],
        }
    }

    /// Whether the sample count matches the resolution.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.heights.len() == self.rows * self.cols
    }
}

/// Standard description of one shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeDescriptor {
    /// Primitive kind.
    pub shape: ShapeType,
    /// Kind-dependent size.
    pub size: Vector3<f64>,
    /// Pose relative to the owning body.
    pub local: Pose,
    /// Mesh file, for [`ShapeType::Mesh`].
    pub mesh: Option<MeshRef>,
    /// Samples, for [`ShapeType::Heightfield`].
    pub heightfield: Option<HeightfieldData>,
    /// Parts, for [`ShapeType::Compound`].
    pub children: Vec<ShapeDescriptor>,
}

impl ShapeDescriptor {
    /// Create a descriptor at the body origin.
    #[must_use]
    pub fn new(shape: ShapeType, size: Vector3<f64>) -> Self {
        Self {
            shape,
            size,
            local: Pose::identity(),
            mesh: None,
            heightfield: None,
            children: Vec::new(),
        }
    }

    /// Box with full extents.
    #[must_use]
    pub fn cuboid(extents: Vector3<f64>) -> Self {
        Self::new(ShapeType::Box, extents)
    }

    /// Sphere.
    #[must_use]
    pub fn sphere(radius: f64) -> Self {
        Self::new(ShapeType::Sphere, Vector3::new(radius, 0.0, 0.0))
    }

    /// Capsule along local +Z.
    #[must_use]
    pub fn capsule(radius: f64, length: f64) -> Self {
        Self::new(ShapeType::Capsule, Vector3::new(radius, length, 0.0))
    }

    /// Cylinder along local +Z.
    #[must_use]
    pub fn cylinder(radius: f64, length: f64) -> Self {
        Self::new(ShapeType::Cylinder, Vector3::new(radius, length, 0.0))
    }

    /// Mesh reference with scale.
    #[must_use]
    pub fn mesh(path: impl Into<PathBuf>, scale: Vector3<f64>) -> Self {
        let mut desc = Self::new(ShapeType::Mesh, scale);
        desc.mesh = Some(MeshRef {
            path: path.into(),
            scale,
        });
        desc
    }

    /// Heightfield with `(width, depth, max height)` extents.
    #[must_use]
    pub fn heightfield(size: Vector3<f64>, data: HeightfieldData) -> Self {
        let mut desc = Self::new(ShapeType::Heightfield, size);
        desc.heightfield = Some(data);
        desc
    }

    /// Union of parts, each with its own pose relative to this descriptor.
    #[must_use]
    pub fn compound(children: Vec<Self>) -> Self {
        let mut desc = Self::new(ShapeType::Compound, Vector3::zeros());
        desc.children = children;
        desc
    }

    /// Set the pose relative to the owning body.
    #[must_use]
    pub fn with_local(mut self, local: Pose) -> Self {
        self.local = local;
        self
    }

    /// Leaf parts of a compound with their poses in the frame that `frame`
    /// places this descriptor in. Nested compounds are flattened; any other
    /// shape is its own single part.
    #[must_use]
    pub fn part_poses(&self, frame: &Pose) -> Vec<(&Self, Pose)> {
        let mut parts = Vec::new();
        self.collect_parts(frame, &mut parts);
        parts
    }

    fn collect_parts<'a>(&'a self, frame: &Pose, parts: &mut Vec<(&'a Self, Pose)>) {
        if self.shape != ShapeType::Compound {
            parts.push((self, *frame));
            return;
        }
        for child in &self.children {
            child.collect_parts(&frame.compose(&child.local), parts);
        }
    }
}

/// Rotation taking direction `from` onto direction `to` by the smallest angle.
///
/// Aligned inputs give the identity, opposite inputs a half turn about an
/// axis orthogonal to `from`. A zero-length input gives the identity.
#[must_use]
pub fn shortest_arc(from: &Vector3<f64>, to: &Vector3<f64>) -> UnitQuaternion<f64> {
    if from.norm() < EPSILON || to.norm() < EPSILON {
        return UnitQuaternion::identity();
    }
    let a = from.normalize();
    let b = to.normalize();

    if (a - b).norm() < EPSILON {
        return UnitQuaternion::identity();
    }
    if (a + b).norm() < EPSILON {
        // Any axis orthogonal to `a` works; pick the one least aligned with it.
        let helper = if a.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
        let axis = Unit::new_normalize(a.cross(&helper));
        return UnitQuaternion::from_axis_angle(&axis, std::f64::consts::PI);
    }

    let axis = Unit::new_normalize(a.cross(&b));
    let angle = a.dot(&b).clamp(-1.0, 1.0).acos();
    UnitQuaternion::from_axis_angle(&axis, angle)
}

/// Frame at the middle of a segment with local +Z along it.
#[must_use]
pub fn segment_pose(from: &Point3<f64>, to: &Point3<f64>) -> Pose {
    let center = nalgebra::center(from, to);
    Pose::from_position_rotation(center, shortest_arc(&Vector3::z(), &(to - from)))
}

/// Descriptor for a shape spanning a segment.
///
/// A non-positive radius falls back to a quarter of the segment length.
/// Kinds without a segment form (see [`ShapeType::supports_segment`]) keep
/// the segment pose with a zero size and log a warning.
#[must_use]
pub fn normalize_segment(
    shape: ShapeType,
    from: &Point3<f64>,
    to: &Point3<f64>,
    radius: f64,
) -> ShapeDescriptor {
    let length = (to - from).norm();
    let radius = if radius > 0.0 {
        radius
    } else {
        tracing::warn!(radius, length, "non-positive segment radius, using a quarter of the length");
        0.25 * length
    };

    let size = match shape {
        ShapeType::Capsule | ShapeType::Cylinder => Vector3::new(radius, length, 0.0),
        ShapeType::Box => Vector3::new(2.0 * radius, 2.0 * radius, length),
        ShapeType::Ellipsoid => Vector3::new(radius, radius, 0.5 * length),
        other => {
            tracing::warn!(shape = %other, "shape has no segment form");
            Vector3::zeros()
        }
    };
    ShapeDescriptor::new(shape, size).with_local(segment_pose(from, to))
}

/// Axis-aligned box spanning two opposite corners.
#[must_use]
pub fn box_from_corners(a: &Point3<f64>, b: &Point3<f64>) -> ShapeDescriptor {
    let extents = (b - a).abs();
    ShapeDescriptor::cuboid(extents).with_local(Pose::from_position(nalgebra::center(a, b)))
}
