//! Schema-validated document model for kinematic-tree descriptions.
//!
//! Both description dialects are read into the same generic tree of
//! [`Element`]s. Each element carries typed attributes and ordered children,
//! and is checked against a per-dialect [`Schema`] that lists which
//! attributes (with which types) and which child elements each element type
//! may have.
//!
//! # Loading
//!
//! ```
//! use sim_schema::{Dialect, Element};
//! use nalgebra::Vector3;
//!
//! let doc = Element::parse(
//!     r#"<robot name="arm">
//!            <link name="base">
//!                <visual><origin xyz="0 0 0.5"/></visual>
//!            </link>
//!        </robot>"#,
//!     Dialect::Urdf,
//! )
//! .unwrap();
//!
//! let origin = &doc.children()[0].children()[0].children()[0];
//! assert_eq!(origin.get_vec3("xyz", Vector3::zeros()).z, 0.5);
//! ```
//!
//! # Unknown Elements and Attributes
//!
//! Loading follows [`SchemaPolicy`](sim_types::SchemaPolicy):
//!
//! - **Lenient** (default): an unknown attribute is dropped and an unknown
//!   or misplaced element is dropped together with its subtree. Each skip is
//!   logged with `tracing::warn!`.
//! - **Strict**: the first unknown item fails the load with an error naming
//!   the element path, e.g. `robot(arm)/link(base)`.
//!
//! Malformed numbers always fail the load, whatever the policy.
//!
//! # Caching
//!
//! [`ModelCache`] keeps loaded documents by dialect and name, with explicit
//! invalidation and reload.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod attribute;
mod cache;
mod element;
mod error;
mod schema;
mod xml;

pub use attribute::{AttributeType, AttributeValue};
pub use cache::ModelCache;
pub use element::Element;
pub use error::{Result, SchemaError};
pub use schema::{Dialect, ElementSpec, Schema};
