//! Joint kinds and limits.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of joint connecting a body to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointType {
    /// Floating base: 3 translations + 3 rotations.
    Free,
    /// Rotation around a single axis.
    Revolute,
    /// Translation along a single axis.
    Prismatic,
    /// Rotation around all axes (ball joint).
    Spherical,
    /// Translation in a plane.
    Planar,
    /// No relative motion.
    Fixed,
}

impl JointType {
    /// Number of degrees of freedom.
    #[must_use]
    pub const fn dof(self) -> usize {
        match self {
            Self::Free => 6,
            Self::Revolute | Self::Prismatic => 1,
            Self::Spherical => 3,
            Self::Planar => 2,
            Self::Fixed => 0,
        }
    }

    /// Number of generalized position coordinates.
    ///
    /// Rotational parts are stored as quaternions (w, x, y, z), so free and
    /// spherical joints carry one more coordinate than degrees of freedom.
    #[must_use]
    pub const fn nqpos(self) -> usize {
        match self {
            Self::Free => 7,
            Self::Spherical => 4,
            other => other.dof(),
        }
    }

    /// Number of generalized velocity coordinates.
    #[must_use]
    pub const fn nqvel(self) -> usize {
        self.dof()
    }

    /// Whether the joint axis carries meaning for this kind.
    #[must_use]
    pub const fn uses_axis(self) -> bool {
        !matches!(self, Self::Free | Self::Fixed)
    }

    /// Rest configuration: zeros, with identity quaternions for rotational parts.
    #[must_use]
    pub fn rest_qpos(self) -> Vec<f64> {
        match self {
            Self::Free => vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            Self::Spherical => vec![1.0, 0.0, 0.0, 0.0],
            other => vec![0.0; other.nqpos()],
        }
    }
}

impl std::fmt::Display for JointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Revolute => write!(f, "revolute"),
            Self::Prismatic => write!(f, "prismatic"),
            Self::Spherical => write!(f, "spherical"),
            Self::Planar => write!(f, "planar"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

/// Range of motion of a joint.
///
/// The relation between `low` and `high` encodes the limit mode:
/// `low > high` is continuous (unlimited), `low == high` locks the joint,
/// `low < high` bounds it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointLimits {
    /// Lower bound.
    pub low: f64,
    /// Upper bound.
    pub high: f64,
}

/// How a [`JointLimits`] value constrains motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitMode {
    /// No limits.
    Continuous,
    /// Joint locked at a single value.
    Locked,
    /// Motion bounded to `[low, high]`.
    Bounded,
}

impl Default for JointLimits {
    fn default() -> Self {
        Self::continuous()
    }
}

impl JointLimits {
    /// Create limits with explicit bounds.
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Unlimited range, encoded as `(1, -1)`.
    #[must_use]
    pub const fn continuous() -> Self {
        Self {
            low: 1.0,
            high: -1.0,
        }
    }

    /// Limit mode implied by the bounds.
    #[must_use]
    pub fn mode(&self) -> LimitMode {
        if self.low > self.high {
            LimitMode::Continuous
        } else if self.low == self.high {
            LimitMode::Locked
        } else {
            LimitMode::Bounded
        }
    }

    /// Whether the joint moves freely.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.mode() == LimitMode::Continuous
    }

    /// Clamp a position into range. Continuous limits return it unchanged.
    #[must_use]
    pub fn clamp(&self, position: f64) -> f64 {
        match self.mode() {
            LimitMode::Continuous => position,
            LimitMode::Locked | LimitMode::Bounded => position.clamp(self.low, self.high),
        }
    }
}
