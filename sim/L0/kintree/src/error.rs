//! Error types for tree assembly and backend management.

use sim_types::{BodyId, ConfigError};
use thiserror::Error;

/// Errors that can occur while assembling a tree or binding backends.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KintreeError {
    /// Two entities of the same kind share a name.
    #[error("duplicate {kind} name: {name}")]
    DuplicateName {
        /// Entity kind ("body", "joint", "collider", "drawable").
        kind: &'static str,
        /// The repeated name.
        name: String,
    },

    /// Body id does not belong to this tree.
    #[error("unknown body id: {0}")]
    UnknownBody(BodyId),

    /// No entity with this name.
    #[error("no {kind} named '{name}'")]
    UnknownName {
        /// Entity kind.
        kind: &'static str,
        /// The requested name.
        name: String,
    },

    /// Operation needs a root body but the tree is empty.
    #[error("kinematic tree has no root body")]
    EmptyTree,

    /// A root body was added to a tree that already has one.
    #[error("kinematic tree already has root body '{0}'")]
    RootAlreadySet(String),

    /// Backend id not registered.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    /// Backend registered under a slot of the wrong kind.
    #[error("backend '{id}' is a {found} backend, expected {expected}")]
    BackendKindMismatch {
        /// Backend id.
        id: String,
        /// Kind the slot needs.
        expected: &'static str,
        /// Kind the backend reports.
        found: &'static str,
    },

    /// Backend failed to build adapters for a tree.
    #[error("backend '{backend}' failed to build: {reason}")]
    Build {
        /// Backend id.
        backend: String,
        /// Description of the failure.
        reason: String,
    },

    /// Invalid runtime configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl KintreeError {
    /// Create a duplicate name error.
    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
        }
    }

    /// Create an unknown name error.
    pub fn unknown_name(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownName {
            kind,
            name: name.into(),
        }
    }

    /// Create a backend build error.
    pub fn build(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Build {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, KintreeError>;
