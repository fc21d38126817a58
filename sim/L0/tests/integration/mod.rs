//! Integration tests for the kinematic-tree pipeline.
//!
//! These tests verify end-to-end behavior across crates:
//! - document round trips through the schema model
//! - MJCF default classes, coordinate modes and angle units
//! - URDF connectivity resolution
//! - shape normalization shared by both parsers
//! - lifecycle and adapter binding through configured backends
//! - the document cache

pub mod backends;
pub mod connectivity;
pub mod coordinates;
pub mod default_classes;
pub mod lifecycle;
pub mod model_cache;
pub mod round_trip;
pub mod shape_normalization;
