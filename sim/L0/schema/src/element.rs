//! The generic typed document node.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nalgebra::{Vector2, Vector3, Vector4};
use sim_types::{ParseConfig, SchemaPolicy};

use crate::attribute::{AttributeType, AttributeValue};
use crate::error::{Result, SchemaError};
use crate::schema::{Dialect, Schema};
use crate::xml;

/// One node of a description document.
///
/// An element owns its children exclusively; dropping the root drops the
/// whole document. Attributes keep their insertion order so that a saved
/// document reads like the one that was loaded.
///
/// # Example
///
/// ```
/// use sim_schema::{Dialect, Element};
///
/// let mut robot = Element::root(Dialect::Urdf).unwrap();
/// robot.set_string("name", "arm").unwrap();
/// robot.add("link").set_string("name", "base").unwrap();
///
/// assert_eq!(robot.children_of_type("link").count(), 1);
/// assert_eq!(robot.get_float("missing", 0.5), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Element {
    element_type: String,
    attributes: Vec<(String, AttributeValue)>,
    children: Vec<Element>,
    schema: Arc<Schema>,
    source_dir: Option<PathBuf>,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.element_type == other.element_type
            && self.schema.dialect() == other.schema.dialect()
            && self.attributes == other.attributes
            && self.children == other.children
    }
}

impl Element {
    /// Create a detached element of the given type.
    #[must_use]
    pub fn new(element_type: impl Into<String>, schema: Arc<Schema>) -> Self {
        Self {
            element_type: element_type.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            schema,
            source_dir: None,
        }
    }

    /// Create an empty document root for a dialect's built-in schema.
    pub fn root(dialect: Dialect) -> Result<Self> {
        let schema = Schema::builtin(dialect)?;
        let root = schema.root_type().to_string();
        Ok(Self::new(root, schema))
    }

    /// Load a document from text with the default (lenient) configuration.
    pub fn parse(text: &str, dialect: Dialect) -> Result<Self> {
        Self::from_str_with(text, dialect, &ParseConfig::default())
    }

    /// Load a document from text.
    pub fn from_str_with(text: &str, dialect: Dialect, config: &ParseConfig) -> Result<Self> {
        Self::from_str_with_schema(text, Schema::builtin(dialect)?, config.policy)
    }

    /// Load a document from text against a custom schema.
    pub fn from_str_with_schema(
        text: &str,
        schema: Arc<Schema>,
        policy: SchemaPolicy,
    ) -> Result<Self> {
        let root = xml::load(text, schema, policy)?;
        tracing::debug!(
            root = %root.element_type,
            children = root.children.len(),
            "document loaded"
        );
        Ok(root)
    }

    /// Load a document from a file.
    ///
    /// The file's folder is recorded as [`source_dir`](Self::source_dir).
    pub fn from_file(path: impl AsRef<Path>, dialect: Dialect, config: &ParseConfig) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut root = Self::from_str_with(&text, dialect, config)?;
        root.source_dir = path.parent().map(Path::to_path_buf);
        Ok(root)
    }

    /// Element type name.
    #[must_use]
    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    /// Dialect of the schema this element belongs to.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.schema.dialect()
    }

    /// Schema this element is checked against.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Folder of the file this document was loaded from.
    #[must_use]
    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    /// The `name` attribute, if set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self.attribute("name") {
            Some(AttributeValue::String(s)) => Some(s),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// All attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Raw typed value of an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Whether the attribute is set.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Whether the attribute is set with the given kind.
    #[must_use]
    pub fn has_attribute_of(&self, name: &str, kind: AttributeType) -> bool {
        self.attribute(name).is_some_and(|v| v.kind() == kind)
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeValue> {
        let index = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// Store a typed value.
    ///
    /// When the schema declares the attribute, the value is widened to the
    /// declared kind if that loses nothing and rejected otherwise.
    /// Undeclared attributes are stored as given and reported by
    /// [`validate`](Self::validate).
    pub fn set_value(&mut self, name: &str, value: AttributeValue) -> Result<&mut Self> {
        let value = match self.schema.attribute_type(&self.element_type, name) {
            Some(declared) => {
                let given = value.kind();
                value.coerce(declared).ok_or_else(|| SchemaError::TypeMismatch {
                    element: self.element_type.clone(),
                    attribute: name.to_string(),
                    declared,
                    given,
                })?
            }
            None => value,
        };
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((name.to_string(), value)),
        }
        Ok(self)
    }

    /// Set an integer attribute.
    pub fn set_int(&mut self, name: &str, value: i64) -> Result<&mut Self> {
        self.set_value(name, AttributeValue::Int(value))
    }

    /// Set a float attribute.
    pub fn set_float(&mut self, name: &str, value: f64) -> Result<&mut Self> {
        self.set_value(name, AttributeValue::Float(value))
    }

    /// Set an integer-array attribute.
    pub fn set_int_array(&mut self, name: &str, values: &[i64]) -> Result<&mut Self> {
        self.set_value(name, AttributeValue::IntArray(values.to_vec()))
    }

    /// Set a float-array attribute.
    pub fn set_float_array(&mut self, name: &str, values: &[f64]) -> Result<&mut Self> {
        self.set_value(name, AttributeValue::FloatArray(values.to_vec()))
    }

    /// Set a string attribute.
    pub fn set_string(&mut self, name: &str, value: impl Into<String>) -> Result<&mut Self> {
        self.set_value(name, AttributeValue::String(value.into()))
    }

    /// Set a three-component float-array attribute.
    pub fn set_vec3(&mut self, name: &str, value: &Vector3<f64>) -> Result<&mut Self> {
        self.set_float_array(name, value.as_slice())
    }

    /// Set a four-component float-array attribute.
    pub fn set_vec4(&mut self, name: &str, value: &Vector4<f64>) -> Result<&mut Self> {
        self.set_float_array(name, value.as_slice())
    }

    /// Integer attribute, or `default` when absent or not an integer.
    #[must_use]
    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        match self.attribute(name) {
            Some(AttributeValue::Int(i)) => *i,
            Some(AttributeValue::IntArray(v)) if v.len() == 1 => v[0],
            _ => default,
        }
    }

    /// Float attribute, or `default` when absent or not numeric.
    #[must_use]
    pub fn get_float(&self, name: &str, default: f64) -> f64 {
        match self.attribute(name).and_then(AttributeValue::as_floats) {
            Some(v) if v.len() == 1 => v[0],
            _ => default,
        }
    }

    /// Integer-array attribute, or `default` when absent or not integral.
    #[must_use]
    pub fn get_int_array(&self, name: &str, default: &[i64]) -> Vec<i64> {
        match self.attribute(name) {
            Some(AttributeValue::IntArray(v)) => v.clone(),
            Some(AttributeValue::Int(i)) => vec![*i],
            _ => default.to_vec(),
        }
    }

    /// Float-array attribute, or `default` when absent or not numeric.
    #[must_use]
    pub fn get_float_array(&self, name: &str, default: &[f64]) -> Vec<f64> {
        self.attribute(name)
            .and_then(AttributeValue::as_floats)
            .unwrap_or_else(|| default.to_vec())
    }

    /// String attribute, or `default` when absent.
    ///
    /// Numeric attributes are returned in their markup text form.
    #[must_use]
    pub fn get_string(&self, name: &str, default: &str) -> String {
        self.attribute(name)
            .map_or_else(|| default.to_string(), AttributeValue::to_text)
    }

    /// Two-component vector, or `default` unless exactly two numbers are set.
    #[must_use]
    pub fn get_vec2(&self, name: &str, default: Vector2<f64>) -> Vector2<f64> {
        self.fixed_floats::<2>(name)
            .map_or(default, |[x, y]| Vector2::new(x, y))
    }

    /// Three-component vector, or `default` unless exactly three numbers are set.
    #[must_use]
    pub fn get_vec3(&self, name: &str, default: Vector3<f64>) -> Vector3<f64> {
        self.fixed_floats::<3>(name)
            .map_or(default, |[x, y, z]| Vector3::new(x, y, z))
    }

    /// Four-component vector, or `default` unless exactly four numbers are set.
    #[must_use]
    pub fn get_vec4(&self, name: &str, default: Vector4<f64>) -> Vector4<f64> {
        self.fixed_floats::<4>(name)
            .map_or(default, |[x, y, z, w]| Vector4::new(x, y, z, w))
    }

    fn fixed_floats<const N: usize>(&self, name: &str) -> Option<[f64; N]> {
        let values = self.attribute(name)?.as_floats()?;
        values.try_into().ok()
    }

    // ------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------

    /// Append a new child of the given type and return it.
    ///
    /// The child shares this element's schema. Whether the parent permits
    /// the child type is checked by [`validate`](Self::validate).
    pub fn add(&mut self, child_type: impl Into<String>) -> &mut Self {
        let child = Self::new(child_type, Arc::clone(&self.schema));
        self.push_child(child)
    }

    /// Append an existing element as the last child and return it.
    pub fn push_child(&mut self, child: Self) -> &mut Self {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Children in document order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Mutable child by position.
    pub fn child_mut(&mut self, index: usize) -> Option<&mut Self> {
        self.children.get_mut(index)
    }

    /// Children of one type, in document order.
    pub fn children_of_type<'a>(
        &'a self,
        child_type: &'a str,
    ) -> impl Iterator<Item = &'a Self> + 'a {
        self.children
            .iter()
            .filter(move |c| c.element_type == child_type)
    }

    /// First child of one type.
    #[must_use]
    pub fn first_child_of_type(&self, child_type: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.element_type == child_type)
    }

    /// Mutable first child of one type.
    pub fn first_child_of_type_mut(&mut self, child_type: &str) -> Option<&mut Self> {
        self.children
            .iter_mut()
            .find(|c| c.element_type == child_type)
    }

    /// Whether any child has the given type.
    #[must_use]
    pub fn has_child_of_type(&self, child_type: &str) -> bool {
        self.first_child_of_type(child_type).is_some()
    }

    /// Depth-first pre-order traversal.
    ///
    /// `visit` receives each element and its ancestors, root first.
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a Self, &[&'a Self]),
    {
        let mut ancestors = Vec::new();
        self.walk_inner(visit, &mut ancestors);
    }

    fn walk_inner<'a, F>(&'a self, visit: &mut F, ancestors: &mut Vec<&'a Self>)
    where
        F: FnMut(&'a Self, &[&'a Self]),
    {
        visit(self, ancestors);
        ancestors.push(self);
        for child in &self.children {
            child.walk_inner(visit, ancestors);
        }
        ancestors.pop();
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Every schema violation in this subtree, in document order.
    #[must_use]
    pub fn violations(&self) -> Vec<SchemaError> {
        let schema = &self.schema;
        let mut found = Vec::new();
        self.walk(&mut |element, ancestors| {
            let path = element_path(element, ancestors);
            match ancestors.last() {
                None if element.element_type != schema.root_type() => {
                    found.push(SchemaError::RootMismatch {
                        dialect: schema.dialect().to_string(),
                        expected: schema.root_type().to_string(),
                        found: element.element_type.clone(),
                    });
                }
                Some(parent) if !schema.has_element(&element.element_type) => {
                    found.push(SchemaError::unknown_element(
                        &element.element_type,
                        element_path(parent, &ancestors[..ancestors.len() - 1]),
                    ));
                }
                Some(parent) if !schema.has_child(&parent.element_type, &element.element_type) => {
                    found.push(SchemaError::disallowed_child(
                        &element.element_type,
                        element_path(parent, &ancestors[..ancestors.len() - 1]),
                    ));
                }
                _ => {}
            }
            for (name, value) in &element.attributes {
                match schema.attribute_type(&element.element_type, name) {
                    None => found.push(SchemaError::unknown_attribute(name, &path)),
                    Some(declared) if declared != value.kind() => {
                        found.push(SchemaError::TypeMismatch {
                            element: path.clone(),
                            attribute: name.clone(),
                            declared,
                            given: value.kind(),
                        });
                    }
                    Some(_) => {}
                }
            }
        });
        found
    }

    /// Check the subtree against the schema.
    ///
    /// Strict policy fails on the first violation. Lenient policy logs each
    /// violation and succeeds.
    pub fn validate(&self, policy: SchemaPolicy) -> Result<()> {
        let mut violations = self.violations().into_iter();
        if policy.is_strict() {
            return violations.next().map_or(Ok(()), Err);
        }
        for violation in violations {
            tracing::warn!(%violation, "schema violation ignored");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Write the document to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_xml_string()?)?;
        Ok(())
    }

    /// Render the document as indented markup.
    pub fn to_xml_string(&self) -> Result<String> {
        xml::save(self)
    }

    pub(crate) fn push_parsed(&mut self, name: String, value: AttributeValue) {
        self.attributes.push((name, value));
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_xml_string() {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

/// Human-readable location such as `mujoco/worldbody/body(torso)`.
pub(crate) fn element_path(element: &Element, ancestors: &[&Element]) -> String {
    ancestors
        .iter()
        .copied()
        .chain(std::iter::once(element))
        .map(path_segment)
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn path_segment(element: &Element) -> String {
    match element.name() {
        Some(name) => format!("{}({name})", element.element_type),
        None => element.element_type.clone(),
    }
}
