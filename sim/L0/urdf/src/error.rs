//! Error types for URDF parsing and connectivity resolution.

use sim_kintree::KintreeError;
use sim_schema::SchemaError;
use sim_types::ConfigError;
use thiserror::Error;

/// Errors that can occur while turning a URDF document into a tree.
#[derive(Debug, Error)]
pub enum UrdfError {
    /// Document could not be loaded or violates the schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Parse configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Assembled bodies could not be inserted into the tree.
    #[error(transparent)]
    Kintree(#[from] KintreeError),

    /// Document is not a URDF robot.
    #[error("expected a URDF <robot> document, found <{0}>")]
    WrongDialect(String),

    /// Missing required element.
    #[error("missing required element: <{element}> in {context}")]
    MissingElement {
        /// The missing element name.
        element: &'static str,
        /// Where the element was expected.
        context: String,
    },

    /// Missing required attribute.
    #[error("missing required attribute: {attribute} on {element}")]
    MissingAttribute {
        /// The missing attribute name.
        attribute: &'static str,
        /// The element that should carry it.
        element: String,
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
    #[error("unknown joint type '{joint_type}' on joint {joint}")]
    UnknownJointType {
        /// Joint name.
        joint: String,
        /// The unrecognized type string.
        joint_type: String,
    },

    /// Two links share a name.
    #[error("duplicate link name: {0}")]
    DuplicateLink(String),

    /// Two joints share a name.
    #[error("duplicate joint name: {0}")]
    DuplicateJoint(String),

    /// A joint references a link that is not declared.
    #[error("joint {joint} references undefined link {link}")]
    UndefinedLink {
        /// Joint name.
        joint: String,
        /// The missing link.
        link: String,
    },

    /// Every link is the child of some joint.
    #[error("no root link found (every link has a parent)")]
    NoRootLink,

    /// More than one link has no parent.
    #[error("multiple root links: {}", .0.join(", "))]
    MultipleRootLinks(Vec<String>),

    /// A link is the child of more than one joint.
    #[error("link {link} has multiple parents (joints {first} and {second})")]
    MultipleParents {
        /// The link with two parents.
        link: String,
        /// First joint naming it as child.
        first: String,
        /// Second joint naming it as child.
        second: String,
    },

    /// Joints form a cycle that is not reachable from the root.
    #[error("kinematic loop through joints: {}", .0.join(", "))]
    KinematicLoop(Vec<String>),

    /// Links not reachable from the root.
    #[error("links not connected to the root: {}", .0.join(", "))]
    DisconnectedLinks(Vec<String>),
}

impl UrdfError {
    /// Create a missing element error.
    pub fn missing_element(element: &'static str, context: impl Into<String>) -> Self {
        Self::MissingElement {
            element,
            context: context.into(),
        }
    }

    /// Create a missing attribute error.
    pub fn missing_attribute(attribute: &'static str, element: impl Into<String>) -> Self {
        Self::MissingAttribute {
            attribute,
            element: element.into(),
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

    /// Create an undefined link error.
    pub fn undefined_link(joint: impl Into<String>, link: impl Into<String>) -> Self {
        Self::UndefinedLink {
            joint: joint.into(),
            link: link.into(),
        }
    }

    /// Whether the error comes from the link/joint topology rather than
    /// from a malformed element.
    #[must_use]
    pub fn is_topology(&self) -> bool {
        matches!(
            self,
            Self::UndefinedLink { .. }
                | Self::NoRootLink
                | Self::MultipleRootLinks(_)
                | Self::MultipleParents { .. }
                | Self::KinematicLoop(_)
                | Self::DisconnectedLinks(_)
        )
    }
}

/// Result type for URDF operations.
pub type Result<T> = std::result::Result<T, UrdfError>;
