//! Core data types for kinematic-tree descriptions.
//!
//! This crate provides the foundational vocabulary shared by the document
//! loader, both dialect parsers and the runtime tree:
//!
//! - [`Pose`] - rigid frames
//! - [`BodyId`] - arena index of a body inside a kinematic tree
//! - [`InertialData`] - mass, inertia tensor, center-of-mass frame
//! - [`JointType`] / [`JointLimits`] - joint kinds and range encoding
//! - [`ShapeType`] - primitives used by colliders and drawables
//! - [`ParseConfig`] / [`RuntimeConfig`] - loader and backend configuration
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They carry no adapter references, no
//! parsing state and no backend behavior.
//!
//! # Coordinate System
//!
//! Right-handed, Z up. Cylinders and capsules are aligned with local +Z.
//!
//! # Example
//!
//! ```
//! use sim_types::{JointLimits, JointType, Pose};
//! use nalgebra::Point3;
//!
//! let pose = Pose::from_position(Point3::new(0.0, 0.0, 1.0));
//! assert_eq!(pose.inverse().position.z, -1.0);
//!
//! assert_eq!(JointType::Spherical.dof(), 3);
//! assert!(JointLimits::continuous().is_continuous());
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod body;
mod config;
mod error;
mod joint;
mod shape;

pub use body::{BodyId, InertialData, Pose};
pub use config::{ParseConfig, RuntimeConfig, SchemaPolicy};
pub use error::ConfigError;
pub use joint::{JointLimits, JointType, LimitMode};
pub use shape::ShapeType;

/// Result type for configuration validation.
pub type Result<T> = std::result::Result<T, ConfigError>;
