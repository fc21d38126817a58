//! Error types for MJCF parsing and tree assembly.

use sim_kintree::KintreeError;
use sim_schema::SchemaError;
use sim_types::ConfigError;
use thiserror::Error;

/// Errors that can occur while turning an MJCF document into a tree.
#[derive(Debug, Error)]
pub enum MjcfError {
    /// Document could not be loaded or violates the schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Parse configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Assembled bodies could not be inserted into the tree.
    #[error(transparent)]
    Kintree(#[from] KintreeError),

    /// Document is not an MJCF model.
    #[error("expected an MJCF <mujoco> document, found <{0}>")]
    WrongDialect(String),

    /// Missing required element.
    #[error("missing required element: {element} in {context}")]
    MissingElement {
        /// The missing element name.
        element: &'static str,
        /// Where the element was expected.
        context: String,
    },

    /// Invalid attribute value.
    #[error("invalid value for {attribute} on {element}: {message}")]
    InvalidAttribute {
        /// The attribute with the invalid value.
        attribute: &'static str,
        /// The element containing the attribute.
        element: String,
        /// Description of why the value is invalid.
        message: String,
    },

    /// Unknown joint type.
    #[error("unknown joint type: {0}")]
    UnknownJointType(String),

    /// Unknown geom type.
    #[error("unknown geom type: {0}")]
    UnknownGeomType(String),
}

impl MjcfError {
    /// Create a missing element error.
    pub fn missing_element(element: &'static str, context: impl Into<String>) -> Self {
        Self::MissingElement {
            element,
            context: context.into(),
        }
    }

    /// Create an invalid attribute error.
    pub fn invalid_attribute(
        attribute: &'static str,
        element: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            attribute,
            element: element.into(),
            message: message.into(),
        }
    }
}

/// Result type for MJCF operations.
pub type Result<T> = std::result::Result<T, MjcfError>;
