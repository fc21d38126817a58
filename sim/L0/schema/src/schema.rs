//! Per-dialect schemas.
//!
//! A [`Schema`] declares, for every element type of a dialect, the attributes
//! it may carry (with their types) and the element types it may contain.
//! Schemas are read once from a description file and never change afterwards;
//! the two built-in schemas are shared process-wide.
//!
//! # Description format
//!
//! ```xml
//! <schema dialect="urdf" root="robot">
//!     <element name="robot">
//!         <attribute name="name" type="string"/>
//!         <child name="link"/>
//!     </element>
//!     <element name="origin">
//!         <attribute name="xyz" type="array" array_type="float"/>
//!     </element>
//! </schema>
//! ```
//!
//! Attribute types are `int`, `float`, `string`, `keyword` (stored as a
//! string) and `array` with `array_type` of `int` or `float`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::attribute::AttributeType;
use crate::error::{Result, SchemaError};

const MJCF_SCHEMA: &str = include_str!("../schemas/mjcf.xml");
const URDF_SCHEMA: &str = include_str!("../schemas/urdf.xml");

/// The two supported description dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dialect {
    /// Class-cascading defaults style (`<mujoco>` root).
    Mjcf,
    /// Flat link/joint list style (`<robot>` root).
    Urdf,
}

impl Dialect {
    /// Conventional file extension for documents of this dialect.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Mjcf => "xml",
            Self::Urdf => "urdf",
        }
    }

    /// Short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mjcf => "mjcf",
            Self::Urdf => "urdf",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Dialect {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mjcf" => Ok(Self::Mjcf),
            "urdf" => Ok(Self::Urdf),
            other => Err(SchemaError::InvalidSchema(format!(
                "unknown dialect '{other}'"
            ))),
        }
    }
}

/// Declaration of one element type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSpec {
    attributes: BTreeMap<String, AttributeType>,
    children: BTreeSet<String>,
}

impl ElementSpec {
    /// Declared attributes and their types.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, AttributeType> {
        &self.attributes
    }

    /// Permitted child element types.
    #[must_use]
    pub fn children(&self) -> &BTreeSet<String> {
        &self.children
    }
}

/// Read-only description of the legal shape of a dialect's documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    dialect: Dialect,
    root: String,
    elements: BTreeMap<String, ElementSpec>,
}

impl Schema {
    /// The built-in schema for a dialect, shared for the life of the process.
    pub fn builtin(dialect: Dialect) -> Result<Arc<Self>> {
        static MJCF: OnceLock<std::result::Result<Arc<Schema>, String>> = OnceLock::new();
        static URDF: OnceLock<std::result::Result<Arc<Schema>, String>> = OnceLock::new();

        let (cell, text) = match dialect {
            Dialect::Mjcf => (&MJCF, MJCF_SCHEMA),
            Dialect::Urdf => (&URDF, URDF_SCHEMA),
        };
        cell.get_or_init(|| {
            Self::from_description(text)
                .map(Arc::new)
                .map_err(|e| e.to_string())
        })
        .clone()
        .map_err(SchemaError::InvalidSchema)
    }

    /// Read a schema description file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_description(&text)
    }

    /// Parse a schema description.
    pub fn from_description(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut header: Option<(Dialect, String)> = None;
        let mut elements: BTreeMap<String, ElementSpec> = BTreeMap::new();
        let mut current: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    match e.name().as_ref() {
                        b"schema" => {
                            let dialect = required(e, "dialect")?.parse::<Dialect>()?;
                            header = Some((dialect, required(e, "root")?));
                        }
                        b"element" => {
                            let name = required(e, "name")?;
                            elements.entry(name.clone()).or_default();
                            current = Some(name);
                        }
                        b"attribute" => {
                            let owner = current.as_ref().ok_or_else(|| {
                                SchemaError::InvalidSchema("<attribute> outside <element>".into())
                            })?;
                            let name = required(e, "name")?;
                            let type_name = required(e, "type")?;
                            let array_type = optional(e, "array_type");
                            let ty = AttributeType::from_schema_names(
                                &type_name,
                                array_type.as_deref(),
                            )
                            .ok_or_else(|| {
                                SchemaError::InvalidSchema(format!(
                                    "attribute '{name}' of <{owner}> has unknown type '{type_name}'"
                                ))
                            })?;
                            if let Some(spec) = elements.get_mut(owner) {
                                spec.attributes.insert(name, ty);
                            }
                        }
                        b"child" => {
                            let owner = current.as_ref().ok_or_else(|| {
                                SchemaError::InvalidSchema("<child> outside <element>".into())
                            })?;
                            let name = required(e, "name")?;
                            if let Some(spec) = elements.get_mut(owner) {
                                spec.children.insert(name);
                            }
                        }
                        other => {
                            return Err(SchemaError::InvalidSchema(format!(
                                "unexpected <{}> in schema description",
                                String::from_utf8_lossy(other)
                            )));
                        }
                    }
                }
                Ok(Event::End(ref e)) if e.name().as_ref() == b"element" => current = None,
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(SchemaError::Xml(e.to_string())),
            }
        }

        let (dialect, root) = header
            .ok_or_else(|| SchemaError::InvalidSchema("missing <schema> header".into()))?;
        if !elements.contains_key(&root) {
            return Err(SchemaError::InvalidSchema(format!(
                "root element <{root}> is not declared"
            )));
        }
        for (name, spec) in &elements {
            if let Some(missing) = spec.children.iter().find(|c| !elements.contains_key(*c)) {
                return Err(SchemaError::InvalidSchema(format!(
                    "<{name}> lists undeclared child <{missing}>"
                )));
            }
        }

        Ok(Self {
            dialect,
            root,
            elements,
        })
    }

    /// Dialect this schema describes.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Element type every document must start with.
    #[must_use]
    pub fn root_type(&self) -> &str {
        &self.root
    }

    /// Declaration of an element type.
    #[must_use]
    pub fn element(&self, element_type: &str) -> Option<&ElementSpec> {
        self.elements.get(element_type)
    }

    /// Whether an element type is declared.
    #[must_use]
    pub fn has_element(&self, element_type: &str) -> bool {
        self.elements.contains_key(element_type)
    }

    /// Whether `attribute` is declared for `element_type`.
    #[must_use]
    pub fn has_attribute(&self, element_type: &str, attribute: &str) -> bool {
        self.attribute_type(element_type, attribute).is_some()
    }

    /// Whether `child` may appear inside `element_type`.
    #[must_use]
    pub fn has_child(&self, element_type: &str, child: &str) -> bool {
        self.elements
            .get(element_type)
            .is_some_and(|spec| spec.children.contains(child))
    }

    /// Declared type of an attribute.
    #[must_use]
    pub fn attribute_type(&self, element_type: &str, attribute: &str) -> Option<AttributeType> {
        self.elements
            .get(element_type)
            .and_then(|spec| spec.attributes.get(attribute).copied())
    }

    /// Declared attributes of an element type (empty if undeclared).
    pub fn possible_attributes(
        &self,
        element_type: &str,
    ) -> impl Iterator<Item = (&str, AttributeType)> {
        self.elements
            .get(element_type)
            .into_iter()
            .flat_map(|spec| spec.attributes.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    /// Permitted children of an element type (empty if undeclared).
    pub fn possible_children(&self, element_type: &str) -> impl Iterator<Item = &str> {
        self.elements
            .get(element_type)
            .into_iter()
            .flat_map(|spec| spec.children.iter().map(String::as_str))
    }

    /// Number of declared element types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether no element type is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} schema (root <{}>)", self.dialect, self.root)?;
        for (name, spec) in &self.elements {
            writeln!(f, "  <{name}>")?;
            for (attr, ty) in &spec.attributes {
                writeln!(f, "    @{attr}: {ty}")?;
            }
            for child in &spec.children {
                writeln!(f, "    <{child}>")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn optional(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name.as_bytes())
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn required(e: &BytesStart, name: &str) -> Result<String> {
    optional(e, name).ok_or_else(|| {
        SchemaError::InvalidSchema(format!(
            "<{}> is missing '{name}'",
            String::from_utf8_lossy(e.name().as_ref())
        ))
    })
}
