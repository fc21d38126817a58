//! MJCF (MuJoCo XML Format) parser producing kinematic trees.
//!
//! This crate reads [MJCF](https://mujoco.readthedocs.io/en/stable/XMLreference.html)
//! documents through the [`sim_schema`] document model and assembles a
//! backend-agnostic [`KinematicTree`].
//!
//! # Features
//!
//! - Parse MJCF from files, strings, already loaded documents or a
//!   [`ModelCache`](sim_schema::ModelCache)
//! - Default class inheritance (`<default class>`, `class`, `childclass`)
//! - Local and global coordinates, degrees and radians, euler sequences
//! - Primitive, mesh and heightfield geoms; each geom becomes one collider
//!   and one drawable
//! - Mesh, material, texture and heightfield assets
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
//! use sim_mjcf::load_kintree_str;
//!
//! let mjcf = r#"
//!     <mujoco model="simple">
//!         <worldbody>
//!             <body name="base" pos="0 0 1">
//!                 <freejoint/>
//!                 <geom type="sphere" size="0.1"/>
//!             </body>
//!         </worldbody>
//!     </mujoco>
//! "#;
//!
//! let mut tree = load_kintree_str(mjcf).expect("should parse");
//! assert_eq!(tree.name(), "simple");
//! assert_eq!(tree.len(), 1);
//!
//! tree.initialize();
//! ```
//!
//! # Supported MJCF Elements
//!
//! ## Model Structure
//!
//! - `<mujoco model="...">` - Root element, tree name
//! - `<compiler>` - `coordinate`, `angle`, `eulerseq`, `meshdir`, `texturedir`
//! - `<default>` - Default parameter classes, nested for inheritance
//! - `<asset>` - `<mesh>`, `<material>`, `<texture>`, `<hfield>`
//! - `<worldbody>` - Top-level bodies and static geoms
//!
//! ## Bodies
//!
//! - `<body>` - `name`, `pos`, orientation, `childclass`
//! - `<inertial>` - `mass`, `diaginertia` or `fullinertia`, frame
//! - `<joint>` - hinge, slide, ball, free, planar, fixed
//! - `<freejoint>` - floating base
//! - `<geom>` - plane, box, sphere, capsule, cylinder, ellipsoid, mesh, hfield
//!
//! A body with several joints is split into a chain of massless bodies
//! named `<body>_dof<i>`, one joint each. A `<worldbody>` holding more than
//! one body, or static geoms, gets a synthetic root body named `world`.
//!
//! Sites, cameras, lights, actuators and contact exclusions are accepted by
//! the schema and ignored.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::unused_self
)]

mod assets;
mod compiler;
mod defaults;
mod error;
pub mod orientation;
mod parser;

use std::path::Path;

use sim_kintree::KinematicTree;
use sim_types::ParseConfig;

pub use assets::{
    AssetTable, HeightfieldAsset, MaterialAsset, MeshAsset, TextureAsset,
    DEFAULT_MATERIAL_SHININESS, DEFAULT_MATERIAL_SPECULAR, SHININESS_SCALE,
};
pub use compiler::{AngleUnit, CompilerSettings};
pub use defaults::{DefaultResolver, ROOT_CLASS};
pub use error::{MjcfError, Result};
pub use parser::{MjcfParser, WORLD_BODY};

/// Parse MJCF text with the default (lenient) configuration.
pub fn load_kintree_str(mjcf: &str) -> Result<KinematicTree> {
    MjcfParser::new(ParseConfig::default()).parse_str(mjcf)
}

/// Parse an MJCF file with the default (lenient) configuration.
///
/// Relative asset paths resolve against the file's folder.
pub fn load_kintree_file(path: impl AsRef<Path>) -> Result<KinematicTree> {
    MjcfParser::new(ParseConfig::default()).parse_file(path)
}
