//! Shape kinds shared by colliders and drawables.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Geometric primitive of a shape descriptor.
///
/// The meaning of a descriptor's `size` depends on the kind:
///
/// | Kind | size |
/// |------|------|
/// | `Plane` | (width, depth, 0) |
/// | `Box` | full extents (x, y, z) |
/// | `Sphere` | (radius, 0, 0) |
/// | `Cylinder`, `Capsule` | (radius, full length, 0), axis along local +Z |
/// | `Ellipsoid` | radii (x, y, z) |
/// | `Mesh` | scale (x, y, z) |
/// | `Heightfield` | (width, depth, max height) |
/// | `Compound` | unused, children carry their own sizes |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeType {
    /// Infinite plane (finite extents only for drawing).
    Plane,
    /// Rectangular box.
    Box,
    /// Sphere.
    Sphere,
    /// Cylinder.
    Cylinder,
    /// Capsule (cylinder with hemispherical caps).
    Capsule,
    /// Ellipsoid.
    Ellipsoid,
    /// Triangle mesh loaded from a file.
    Mesh,
    /// Height-field grid.
    Heightfield,
    /// Union of child shapes.
    Compound,
}

impl ShapeType {
    /// Whether a segment (from/to) description makes sense for this kind.
    #[must_use]
    pub const fn supports_segment(self) -> bool {
        matches!(
            self,
            Self::Capsule | Self::Cylinder | Self::Box | Self::Ellipsoid
        )
    }
}

impl std::fmt::Display for ShapeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Plane => "plane",
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Capsule => "capsule",
            Self::Ellipsoid => "ellipsoid",
            Self::Mesh => "mesh",
            Self::Heightfield => "hfield",
            Self::Compound => "compound",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ShapeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plane" => Ok(Self::Plane),
            "box" => Ok(Self::Box),
            "sphere" => Ok(Self::Sphere),
            "cylinder" => Ok(Self::Cylinder),
            "capsule" => Ok(Self::Capsule),
            "ellipsoid" => Ok(Self::Ellipsoid),
            "mesh" => Ok(Self::Mesh),
            "hfield" | "heightfield" => Ok(Self::Heightfield),
            "compound" => Ok(Self::Compound),
            other => Err(format!("unknown shape type '{other}'")),
        }
    }
}
