//! Default class resolution and application.
//!
//! In MJCF, `<default>` elements define classes of attribute values. The
//! top-level `<default>` holds the class-less defaults; each nested
//! `<default class="X">` declares class `X` whose parent is the enclosing
//! default. An element picks its class through its own `class` attribute or
//! the `childclass` of the nearest enclosing body.
//!
//! # Example
//!
//! ```xml
//! <default>
//!     <joint damping="0.5"/>
//!     <default class="arm">
//!         <joint damping="1.0" armature="0.1"/>
//!     </default>
//! </default>
//! ```
//!
//! A joint with `class="arm"` gets `damping="1.0"` and `armature="0.1"`.
//! A joint without a class gets `damping="0.5"`.
//!
//! Attributes the element declares itself always win. Values are resolved
//! once, when the resolver is built, by walking each class's parent chain
//! from the root down.

use std::collections::HashMap;

use sim_schema::{AttributeValue, Element};

use crate::error::Result;
use crate::orientation::ORIENTATION_ATTRIBUTES;

/// Name of the class-less root class.
pub const ROOT_CLASS: &str = "";

/// One `<default>` block before inheritance is applied.
#[derive(Debug, Clone)]
struct RawClass {
    parent: Option<String>,
    templates: HashMap<String, Element>,
}

/// Resolves and applies default classes to MJCF elements.
#[derive(Debug, Clone, Default)]
pub struct DefaultResolver {
    /// Class name to element type to fully inherited template.
    resolved: HashMap<String, HashMap<String, Element>>,
}

impl DefaultResolver {
    /// Build a resolver from the `<default>` children of a `<mujoco>` root.
    ///
    /// The root class always exists, even without any `<default>`.
    pub fn from_model(root: &Element) -> Result<Self> {
        let mut raw = HashMap::new();
        raw.insert(
            ROOT_CLASS.to_string(),
            RawClass {
                parent: None,
                templates: HashMap::new(),
            },
        );
        for default in root.children_of_type("default") {
            let name = default.get_string("class", ROOT_CLASS);
            let parent = (name != ROOT_CLASS).then(|| ROOT_CLASS.to_string());
            collect(default, name, parent, &mut raw)?;
        }

        let mut resolved = HashMap::with_capacity(raw.len());
        for name in raw.keys() {
            resolved.insert(name.clone(), resolve_chain(name, &raw)?);
        }
        tracing::debug!(classes = resolved.len(), "default classes resolved");
        Ok(Self { resolved })
    }

    /// Whether a class of this name is declared.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.resolved.contains_key(class)
    }

    /// Number of classes, the root class included.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.resolved.len()
    }

    /// Fully inherited template for an element type in a class.
    #[must_use]
    pub fn template(&self, class: &str, element_type: &str) -> Option<&Element> {
        self.resolved.get(class)?.get(element_type)
    }

    /// Class that applies to `element`: its own `class` attribute, else the
    /// `childclass` in effect, else the root class.
    #[must_use]
    pub fn class_of<'a>(element: &'a Element, childclass: Option<&'a str>) -> &'a str {
        match element.attribute("class") {
            Some(AttributeValue::String(class)) => class,
            _ => childclass.unwrap_or(ROOT_CLASS),
        }
    }

    /// Copy of `element` with the class defaults filled in.
    ///
    /// An unknown class logs a warning and falls back to the root class.
    pub fn apply(&self, element: &Element, childclass: Option<&str>) -> Result<Element> {
        let class = Self::class_of(element, childclass);
        let class = if self.has_class(class) {
            class
        } else {
            tracing::warn!(
                class,
                element = element.element_type(),
                "unknown default class, using root defaults"
            );
            ROOT_CLASS
        };

        let mut out = element.clone();
        if let Some(template) = self.template(class, element.element_type()) {
            fill_missing(&mut out, template)?;
        }
        Ok(out)
    }
}

fn collect(
    default: &Element,
    name: String,
    parent: Option<String>,
    raw: &mut HashMap<String, RawClass>,
) -> Result<()> {
    let entry = raw.entry(name.clone()).or_insert_with(|| RawClass {
        parent: parent.clone(),
        templates: HashMap::new(),
    });
    if entry.parent.is_none() {
        entry.parent = parent;
    }

    let mut nested = Vec::new();
    for child in default.children() {
        if child.element_type() == "default" {
            nested.push(child);
            continue;
        }
        match entry.templates.get_mut(child.element_type()) {
            // Repeated blocks for the same type: later attributes win.
            Some(existing) => {
                for (key, value) in child.attributes() {
                    existing.set_value(key, value.clone())?;
                }
            }
            None => {
                entry
                    .templates
                    .insert(child.element_type().to_string(), child.clone());
            }
        }
    }

    for child in nested {
        let child_name = child.get_string("class", ROOT_CLASS);
        if child_name == ROOT_CLASS {
            tracing::warn!(parent = %name, "nested default without class, ignoring");
            continue;
        }
        collect(child, child_name, Some(name.clone()), raw)?;
    }
    Ok(())
}

/// Merge a class's templates over its ancestors', root first.
fn resolve_chain(
    name: &str,
    raw: &HashMap<String, RawClass>,
) -> Result<HashMap<String, Element>> {
    let mut chain = Vec::new();
    let mut current = Some(name);
    while let Some(class_name) = current {
        if chain.contains(&class_name) {
            tracing::warn!(class = name, "cyclic default class chain, truncating");
            break;
        }
        chain.push(class_name);
        current = raw.get(class_name).and_then(|c| c.parent.as_deref());
    }

    let mut merged: HashMap<String, Element> = HashMap::new();
    for class_name in chain.into_iter().rev() {
        let Some(class) = raw.get(class_name) else {
            continue;
        };
        for (element_type, template) in &class.templates {
            let mut child = template.clone();
            if let Some(inherited) = merged.get(element_type) {
                fill_missing(&mut child, inherited)?;
            }
            merged.insert(element_type.clone(), child);
        }
    }
    Ok(merged)
}

/// Copy attributes of `template` that `target` does not declare.
///
/// The orientation group is copied only when `target` declares none of it,
/// and `class` itself never propagates.
fn fill_missing(target: &mut Element, template: &Element) -> Result<()> {
    let has_orientation = ORIENTATION_ATTRIBUTES
        .iter()
        .any(|attr| target.has_attribute(attr));
    for (key, value) in template.attributes() {
        if key == "class" || target.has_attribute(key) {
            continue;
        }
        if has_orientation && ORIENTATION_ATTRIBUTES.contains(&key) {
            continue;
        }
        target.set_value(key, value.clone())?;
    }
    Ok(())
}
