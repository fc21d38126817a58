//! Error types for document loading, validation and serialization.

use thiserror::Error;

use crate::attribute::AttributeType;

/// Errors that can occur while loading, editing or saving documents.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The markup itself is not well-formed.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// Element type not declared by the schema.
    #[error("unknown element <{element}> at {path}")]
    UnknownElement {
        /// The offending element type.
        element: String,
        /// Path of the parent element.
        path: String,
    },

    /// Element type declared, but not permitted under this parent.
    #[error("element <{child}> is not allowed inside {path}")]
    DisallowedChild {
        /// The offending child type.
        child: String,
        /// Path of the parent element.
        path: String,
    },

    /// Attribute not declared for the element type.
    #[error("unknown attribute '{attribute}' on {path}")]
    UnknownAttribute {
        /// The offending attribute name.
        attribute: String,
        /// Path of the element carrying the attribute.
        path: String,
    },

    /// Text that cannot be converted to the declared attribute type.
    #[error("malformed {expected} literal '{raw}' for attribute '{attribute}' on {element}")]
    MalformedLiteral {
        /// Path of the element carrying the attribute.
        element: String,
        /// The attribute name.
        attribute: String,
        /// The raw text.
        raw: String,
        /// The declared type.
        expected: AttributeType,
    },

    /// A typed setter was used against an attribute declared with another type.
    #[error("attribute '{attribute}' on <{element}> is declared as {declared}, cannot store {given}")]
    TypeMismatch {
        /// Element type.
        element: String,
        /// The attribute name.
        attribute: String,
        /// The schema's declared type.
        declared: AttributeType,
        /// The kind handed to the setter.
        given: AttributeType,
    },

    /// Document root does not match the schema's root element.
    #[error("document root <{found}> does not match the {dialect} schema root <{expected}>")]
    RootMismatch {
        /// Dialect name.
        dialect: String,
        /// Root type required by the schema.
        expected: String,
        /// Root type found in the document.
        found: String,
    },

    /// Document contains no root element.
    #[error("document is empty")]
    EmptyDocument,

    /// Schema description file is invalid.
    #[error("invalid schema description: {0}")]
    InvalidSchema(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Create a malformed literal error.
    pub fn malformed_literal(
        element: impl Into<String>,
        attribute: impl Into<String>,
        raw: impl Into<String>,
        expected: AttributeType,
    ) -> Self {
        Self::MalformedLiteral {
            element: element.into(),
            attribute: attribute.into(),
            raw: raw.into(),
            expected,
        }
    }

    /// Create an unknown attribute error.
    pub fn unknown_attribute(attribute: impl Into<String>, path: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            attribute: attribute.into(),
            path: path.into(),
        }
    }

    /// Create an unknown element error.
    pub fn unknown_element(element: impl Into<String>, path: impl Into<String>) -> Self {
        Self::UnknownElement {
            element: element.into(),
            path: path.into(),
        }
    }

    /// Create a disallowed child error.
    pub fn disallowed_child(child: impl Into<String>, path: impl Into<String>) -> Self {
        Self::DisallowedChild {
            child: child.into(),
            path: path.into(),
        }
    }

    /// Whether this error is a schema violation (as opposed to syntax or I/O).
    #[must_use]
    pub fn is_schema_violation(&self) -> bool {
        matches!(
            self,
            Self::UnknownElement { .. }
                | Self::DisallowedChild { .. }
                | Self::UnknownAttribute { .. }
                | Self::TypeMismatch { .. }
                | Self::RootMismatch { .. }
        )
    }
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
