//! Backend-agnostic kinematic tree model.
//!
//! A [`KinematicTree`] is an arena of [`Body`] nodes. Each body owns its
//! [`Collider`]s and [`Drawable`]s and at most one [`Joint`] to its parent.
//! Parsers produce trees; physics engines and visualizers consume them
//! through adapters.
//!
//! # Lifecycle
//!
//! Every entity implements [`Lifecycle`]:
//!
//! ```text
//! initialize -> (pre_step -> backend step -> post_step)* -> reset -> ...
//! ```
//!
//! `pre_step` pushes core state (forces, coordinates) to the adapters,
//! `post_step` pulls the backend's answer back, and `reset` restores the
//! state recorded at `initialize`. Without adapters every operation is a
//! pure data update and `post_step` runs forward kinematics.
//!
//! # Adapters
//!
//! Backends create one adapter per entity and keep ownership of it
//! (`Rc<RefCell<_>>`). Entities only hold a weak reference in an
//! [`AdapterSlot`], so a dropped backend simply reads as detached:
//!
//! | Entity | Adapter trait |
//! |--------|---------------|
//! | [`KinematicTree`] | [`KintreeAdapter`] |
//! | [`Body`] | [`BodyAdapter`] |
//! | [`Joint`] | [`JointAdapter`] |
//! | [`Collider`] | [`ColliderAdapter`] |
//! | [`Drawable`] | [`DrawableAdapter`] |
//!
//! # Backends
//!
//! [`BackendRegistry`] creates backends by id. The built-in `null` and
//! `null-viz` backends record pushed state and are used in tests and
//! headless runs.
//!
//! ```
//! use sim_kintree::{Body, BackendRegistry, Joint, KinematicTree};
//! use sim_types::{JointType, RuntimeConfig};
//!
//! let mut tree = KinematicTree::new("door");
//! let frame = tree.add_root(Body::new("frame")).unwrap();
//! tree.add_body(frame, Body::new("leaf").with_joint(Joint::new("hinge", JointType::Revolute)))
//!     .unwrap();
//!
//! let mut backends = BackendRegistry::with_builtin()
//!     .create_from_config(&RuntimeConfig::headless())
//!     .unwrap();
//! backends.build(&mut tree).unwrap();
//! tree.joint_by_name_mut("hinge").unwrap().set_qpos(&[0.5]);
//! backends.step(&mut tree);
//! assert_eq!(tree.joint_by_name("hinge").unwrap().qpos(), &[0.5]);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::similar_names
)]

mod adapter;
mod backend;
mod body;
mod collider;
mod drawable;
mod error;
mod joint;
mod lifecycle;
mod null;
pub mod shape;
mod terrain;
mod tree;

pub use adapter::{
    Adapter, BodyAdapter, ColliderAdapter, DrawableAdapter, JointAdapter, KintreeAdapter,
};
pub use backend::{Backend, BackendFactory, BackendKind, BackendRegistry, BackendSet};
pub use body::Body;
pub use collider::{Collider, DEFAULT_DENSITY, DEFAULT_FRICTION};
pub use drawable::{Drawable, Material};
pub use error::{KintreeError, Result};
pub use joint::Joint;
pub use lifecycle::{AdapterSlot, Lifecycle, LifecycleState};
pub use null::{
    NullBodyAdapter, NullColliderAdapter, NullDrawableAdapter, NullJointAdapter, NullPhysics,
    NullTreeAdapter, NullVisualizer,
};
pub use shape::{HeightfieldData, MeshRef, ShapeDescriptor};
pub use terrain::{TerrainCell, TerrainGenerator, CELL_BLOCKED, CELL_EMPTY};
pub use tree::KinematicTree;
