//! URDF robot description parser producing kinematic trees.
//!
//! This crate reads [URDF](http://wiki.ros.org/urdf) (Unified Robot
//! Description Format) documents through the [`sim_schema`] document model
//! and assembles a backend-agnostic [`KinematicTree`].
//!
//! # Features
//!
//! - Parse URDF from files, strings, loaded documents or a
//!   [`ModelCache`](sim_schema::ModelCache)
//! - Links become bodies with mass properties, colliders and drawables
//! - Flat link/joint lists are resolved into one rooted tree, with
//!   descriptive errors for loops, orphans and multiple roots
//! - Top-level and inline materials
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. Physics engines
//! and renderers bind to the resulting tree through the adapters of
//! [`sim_kintree`].
//!
//! # Example
//!
//! ```
//! use sim_urdf::load_kintree_str;
//!
//! let urdf = r#"
//!     <robot name="simple">
//!         <link name="base_link">
//!             <inertial>
//!                 <mass value="1.0"/>
//!                 <inertia ixx="0.1" iyy="0.1" izz="0.1"/>
//!             </inertial>
//!         </link>
//!     </robot>
//! "#;
//!
//! let tree = load_kintree_str(urdf).expect("should parse");
//! assert_eq!(tree.name(), "simple");
//! assert_eq!(tree.len(), 1);
//! ```
//!
//! # Supported URDF Elements
//!
//! ## Links
//!
//! - `<link name="...">` - Rigid body
//! - `<inertial>` - Mass, inertia tensor and its frame
//! - `<collision>` - One collider each
//! - `<visual>` - One drawable each, with `<material>`
//!
//! ## Joints
//!
//! - `<joint name="..." type="...">` - `revolute`, `continuous`, `prismatic`,
//!   `fixed`, `floating`, `planar`
//! - `<parent>`, `<child>` - Connected links
//! - `<origin>` - Child link frame relative to the parent link
//! - `<axis>` - Motion axis, `(1, 0, 0)` when omitted
//! - `<limit>` - `lower`/`upper` for revolute and prismatic joints
//! - `<dynamics>` - Damping
//!
//! ## Geometry
//!
//! - `<box size>`, `<sphere radius>`, `<cylinder radius length>`,
//!   `<capsule radius length>`
//! - `<mesh filename scale>` - Only the resolved path is recorded;
//!   `package://<pkg>/` prefixes are stripped
//!
//! # Limitations
//!
//! - `<mimic>`, `<calibration>` and `<safety_controller>` are accepted and
//!   ignored
//! - Effort and velocity limits are not stored

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

mod error;
mod materials;
mod parser;
mod topology;
mod types;

use std::path::Path;

use sim_kintree::KinematicTree;
use sim_types::ParseConfig;

pub use error::{Result, UrdfError};
pub use materials::{
    MaterialTable, UrdfMaterial, DEFAULT_RGBA, DEFAULT_SHININESS, DEFAULT_SPECULAR,
};
pub use parser::{strip_package_prefix, UrdfParser};
pub use topology::{resolve_tree, ResolvedTree};
pub use types::{origin_pose, UrdfJoint, UrdfJointType};

/// Parse URDF text with the default (lenient) configuration.
pub fn load_kintree_str(urdf: &str) -> Result<KinematicTree> {
    UrdfParser::new(ParseConfig::default()).parse_str(urdf)
}

/// Parse a URDF file with the default (lenient) configuration.
///
/// Relative mesh paths resolve against the file's folder.
pub fn load_kintree_file(path: impl AsRef<Path>) -> Result<KinematicTree> {
    UrdfParser::new(ParseConfig::default()).parse_file(path)
}
