//! Typed attribute values and their text encoding.
//!
//! Every attribute stored on an [`Element`](crate::Element) holds exactly one
//! of five kinds. The conversion between markup text and typed values lives
//! here and nowhere else: numbers are decimal literals, arrays are
//! whitespace-separated lists.

use crate::error::{Result, SchemaError};

/// Declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Signed integer.
    Int,
    /// Floating point number.
    Float,
    /// Whitespace-separated integers.
    IntArray,
    /// Whitespace-separated floats.
    FloatArray,
    /// Free text or keyword.
    String,
}

impl AttributeType {
    /// Parse the type names used by schema description files.
    ///
    /// `array` needs the element type (`int` or `float`) in `array_type`.
    pub fn from_schema_names(type_name: &str, array_type: Option<&str>) -> Option<Self> {
        match (type_name, array_type) {
            ("int", _) => Some(Self::Int),
            ("float", _) => Some(Self::Float),
            ("array", Some("int")) => Some(Self::IntArray),
            ("array", Some("float") | None) => Some(Self::FloatArray),
            ("string" | "keyword", _) => Some(Self::String),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::IntArray => "int array",
            Self::FloatArray => "float array",
            Self::String => "string",
        };
        f.write_str(name)
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Integer list.
    IntArray(Vec<i64>),
    /// Float list.
    FloatArray(Vec<f64>),
    /// Free text or keyword.
    String(String),
}

impl AttributeValue {
    /// Kind of this value.
    #[must_use]
    pub fn kind(&self) -> AttributeType {
        match self {
            Self::Int(_) => AttributeType::Int,
            Self::Float(_) => AttributeType::Float,
            Self::IntArray(_) => AttributeType::IntArray,
            Self::FloatArray(_) => AttributeType::FloatArray,
            Self::String(_) => AttributeType::String,
        }
    }

    /// Convert to `target` when no information is lost.
    ///
    /// Integers widen to floats and scalars widen to one-element arrays.
    /// Any other kind change yields `None`.
    #[must_use]
    pub fn coerce(self, target: AttributeType) -> Option<Self> {
        match (self, target) {
            (v, t) if v.kind() == t => Some(v),
            (Self::Int(i), AttributeType::Float) => Some(Self::Float(i as f64)),
            (Self::Int(i), AttributeType::IntArray) => Some(Self::IntArray(vec![i])),
            (Self::Int(i), AttributeType::FloatArray) => Some(Self::FloatArray(vec![i as f64])),
            (Self::Float(f), AttributeType::FloatArray) => Some(Self::FloatArray(vec![f])),
            (Self::IntArray(v), AttributeType::FloatArray) => {
                Some(Self::FloatArray(v.into_iter().map(|i| i as f64).collect()))
            }
            _ => None,
        }
    }

    /// Numeric view as a float list (scalars become one-element lists).
    #[must_use]
    pub fn as_floats(&self) -> Option<Vec<f64>> {
        match self {
            Self::Int(i) => Some(vec![*i as f64]),
            Self::Float(f) => Some(vec![*f]),
            Self::IntArray(v) => Some(v.iter().map(|i| *i as f64).collect()),
            Self::FloatArray(v) => Some(v.clone()),
            Self::String(_) => None,
        }
    }

    /// Markup text for this value.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format_float(*f),
            Self::IntArray(v) => join(v.iter().map(ToString::to_string)),
            Self::FloatArray(v) => join(v.iter().map(|f| format_float(*f))),
            Self::String(s) => s.clone(),
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Parse markup text into a value of the declared type.
///
/// `element` and `attribute` only feed the error message.
pub(crate) fn parse_literal(
    raw: &str,
    expected: AttributeType,
    element: &str,
    attribute: &str,
) -> Result<AttributeValue> {
    let malformed = || SchemaError::malformed_literal(element, attribute, raw, expected);
    let text = raw.trim();
    match expected {
        AttributeType::Int => parse_int(text).map(AttributeValue::Int).ok_or_else(malformed),
        AttributeType::Float => text
            .parse::<f64>()
            .map(AttributeValue::Float)
            .map_err(|_| malformed()),
        AttributeType::IntArray => text
            .split_whitespace()
            .map(parse_int)
            .collect::<Option<Vec<_>>>()
            .map(AttributeValue::IntArray)
            .ok_or_else(malformed),
        AttributeType::FloatArray => text
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(AttributeValue::FloatArray)
            .map_err(|_| malformed()),
        AttributeType::String => Ok(AttributeValue::String(raw.to_string())),
    }
}

// Integer attributes in the wild are sometimes written as "1.0".
#[allow(clippy::cast_possible_truncation)]
fn parse_int(text: &str) -> Option<i64> {
    // 2^63; `i64::MAX as f64` rounds up to it, so the range is half-open.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    text.parse::<i64>().ok().or_else(|| {
        let f = text.parse::<f64>().ok()?;
        (f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then_some(f as i64)
    })
}

// `Display` for f64 is the shortest text that parses back to the same bits.
fn format_float(f: f64) -> String {
    f.to_string()
}

fn join(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}
