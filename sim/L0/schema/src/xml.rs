//! Markup reading and writing.
//!
//! `collect_attributes` and `insert_attributes` are the only places that
//! convert between markup text and typed attribute values.

use std::sync::Arc;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use sim_types::SchemaPolicy;

use crate::attribute::parse_literal;
use crate::element::{path_segment, Element};
use crate::error::{Result, SchemaError};
use crate::schema::Schema;

/// Parse markup into an element tree checked against `schema`.
pub(crate) fn load(text: &str, schema: Arc<Schema>, policy: SchemaPolicy) -> Result<Element> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    // Depth inside an ignored subtree; zero when not skipping.
    let mut skip_depth = 0usize;

    loop {
        let (event, empty) = match reader.read_event() {
            Ok(Event::Start(e)) => (e, false),
            Ok(Event::Empty(e)) => (e, true),
            Ok(Event::End(_)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                } else if let Some(done) = stack.pop() {
                    attach(done, &mut stack, &mut root);
                }
                continue;
            }
            Ok(Event::Eof) => break,
            Ok(_) => continue,
            Err(e) => return Err(SchemaError::Xml(e.to_string())),
        };

        if skip_depth > 0 {
            if !empty {
                skip_depth += 1;
            }
            continue;
        }

        let name = String::from_utf8_lossy(event.name().as_ref()).into_owned();
        let parent_path = stack.iter().map(path_segment).collect::<Vec<_>>().join("/");

        match stack.last() {
            None if root.is_some() => {
                return Err(SchemaError::Xml(format!(
                    "second root element <{name}>"
                )));
            }
            None if name != schema.root_type() => {
                return Err(SchemaError::RootMismatch {
                    dialect: schema.dialect().to_string(),
                    expected: schema.root_type().to_string(),
                    found: name,
                });
            }
            None => {}
            Some(parent) => {
                let violation = if !schema.has_element(&name) {
                    Some(SchemaError::unknown_element(&name, &parent_path))
                } else if !schema.has_child(parent.element_type(), &name) {
                    Some(SchemaError::disallowed_child(&name, &parent_path))
                } else {
                    None
                };
                if let Some(violation) = violation {
                    if policy.is_strict() {
                        return Err(violation);
                    }
                    tracing::warn!(%violation, "skipping element subtree");
                    if !empty {
                        skip_depth = 1;
                    }
                    continue;
                }
            }
        }

        let mut element = Element::new(name, Arc::clone(&schema));
        let path = if parent_path.is_empty() {
            element.element_type().to_string()
        } else {
            format!("{parent_path}/{}", element.element_type())
        };
        collect_attributes(&event, &mut element, &path, policy)?;

        if empty {
            attach(element, &mut stack, &mut root);
        } else {
            stack.push(element);
        }
    }

    if let Some(open) = stack.last() {
        return Err(SchemaError::Xml(format!(
            "unclosed element <{}>",
            open.element_type()
        )));
    }
    root.ok_or(SchemaError::EmptyDocument)
}

fn attach(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_child(element);
        }
        None => *root = Some(element),
    }
}

/// Convert the markup attributes of `event` into typed values on `element`.
fn collect_attributes(
    event: &BytesStart,
    element: &mut Element,
    path: &str,
    policy: SchemaPolicy,
) -> Result<()> {
    let schema = Arc::clone(element.schema());
    for attr in event.attributes() {
        let attr = attr.map_err(|e| SchemaError::Xml(format!("{path}: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = attr
            .unescape_value()
            .map_err(|e| SchemaError::Xml(e.to_string()))?;

        let Some(declared) = schema.attribute_type(element.element_type(), &key) else {
            let violation = SchemaError::unknown_attribute(&key, path);
            if policy.is_strict() {
                return Err(violation);
            }
            tracing::warn!(%violation, "skipping attribute");
            continue;
        };

        let value = parse_literal(&raw, declared, path, &key)?;
        element.push_parsed(key, value);
    }
    Ok(())
}

/// Render typed attribute values into markup text on `start`.
fn insert_attributes(element: &Element, start: &mut BytesStart) {
    for (name, value) in element.attributes() {
        let text = value.to_text();
        start.push_attribute((name, text.as_str()));
    }
}

/// Render an element tree as indented markup.
pub(crate) fn save(root: &Element) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
        .map_err(|e| SchemaError::Xml(e.to_string()))?;
    write_element(&mut writer, root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| SchemaError::Xml(e.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.element_type());
    insert_attributes(element, &mut start);

    if element.children().is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| SchemaError::Xml(e.to_string()))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| SchemaError::Xml(e.to_string()))?;
    for child in element.children() {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.element_type())))
        .map_err(|e| SchemaError::Xml(e.to_string()))?;
    Ok(())
}
