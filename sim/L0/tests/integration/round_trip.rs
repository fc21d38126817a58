//! Document round trips through the schema model.
//!
//! Documents built in code, saved and loaded again must compare equal and
//! parse into the same trees as their text form.

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3, Vector4};
use sim_conformance_tests::{ARM_MJCF, ARM_URDF};
use sim_mjcf::MjcfParser;
use sim_schema::{Dialect, Element, SchemaError};
use sim_types::{ParseConfig, SchemaPolicy};

fn build_pendulum() -> Element {
    let mut root = Element::root(Dialect::Mjcf).expect("root");
    root.set_string("model", "pendulum").expect("model");
    let worldbody = root.add("worldbody");
    let body = worldbody.add("body");
    body.set_string("name", "pole")
        .and_then(|b| b.set_vec3("pos", &Vector3::new(0.0, 0.0, 1.0)))
        .expect("body attributes");
    body.add("joint")
        .set_string("name", "swing")
        .and_then(|j| j.set_string("type", "hinge"))
        .and_then(|j| j.set_vec3("axis", &Vector3::y()))
        .expect("joint attributes");
    body.add("geom")
        .set_string("type", "sphere")
        .and_then(|g| g.set_float_array("size", &[0.1]))
        .and_then(|g| g.set_vec4("rgba", &Vector4::new(1.0, 0.0, 0.0, 1.0)))
        .expect("geom attributes");
    root
}

/// Test: A document built in code survives text serialization unchanged.
#[test]
fn test_built_document_round_trips_through_text() {
    let root = build_pendulum();
    let text = root.to_xml_string().expect("serialize");
    let reparsed = Element::parse(&text, Dialect::Mjcf).expect("reparse");
    assert_eq!(reparsed, root);
    assert!(root.violations().is_empty());
}

/// Test: Saving and loading a file keeps the document and records its folder.
#[test]
fn test_save_and_load_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pendulum.xml");
    let root = build_pendulum();
    root.save(&path).expect("save");

    let loaded = Element::from_file(&path, Dialect::Mjcf, &ParseConfig::default()).expect("load");
    assert_eq!(loaded, root);
    assert_eq!(loaded.source_dir(), Some(dir.path()));
}

/// Test: A built document parses into the same tree as its text form.
#[test]
fn test_built_document_parses_like_text() {
    let root = build_pendulum();
    let parser = MjcfParser::new(ParseConfig::default());
    let from_element = parser.parse_element(&root).expect("parse element");
    let from_text = parser
        .parse_str(&root.to_xml_string().expect("serialize"))
        .expect("parse text");

    assert_eq!(from_element.name(), "pendulum");
    assert_eq!(from_element.len(), from_text.len());
    let a = from_element.body_by_name("pole").expect("pole");
    let b = from_text.body_by_name("pole").expect("pole");
    assert_relative_eq!(a.local_transform().position, Point3::new(0.0, 0.0, 1.0));
    assert_relative_eq!(a.local_transform().position, b.local_transform().position);
    assert_relative_eq!(
        *from_element.joint_by_name("swing").expect("swing").axis(),
        Vector3::y()
    );
}

/// Test: Fixture documents of both dialects round trip.
#[test]
fn test_fixtures_round_trip() {
    for (text, dialect) in [(ARM_MJCF, Dialect::Mjcf), (ARM_URDF, Dialect::Urdf)] {
        let doc = Element::parse(text, dialect).expect("parse");
        let again = Element::parse(&doc.to_xml_string().expect("serialize"), dialect)
            .expect("reparse");
        assert_eq!(again, doc);
    }
}

/// Test: Typed values are read back with their declared types.
#[test]
fn test_typed_attributes_after_round_trip() {
    let doc = Element::parse(ARM_MJCF, Dialect::Mjcf).expect("parse");
    let text = doc.to_xml_string().expect("serialize");
    let doc = Element::parse(&text, Dialect::Mjcf).expect("reparse");

    let base = doc.children()[0].children()[0].clone();
    assert_eq!(base.get_vec3("pos", Vector3::zeros()), Vector3::new(0.0, 0.0, 0.1));
    let geom = base.first_child_of_type("geom").expect("geom");
    assert_eq!(geom.get_float_array("size", &[]), vec![0.1, 0.1, 0.05]);
    assert_eq!(geom.get_string("type", ""), "box");
}

/// Test: Malformed numbers fail the load with the offending attribute.
#[test]
fn test_malformed_literal() {
    let text = r#"<mujoco><worldbody><geom size="0.1 abc"/></worldbody></mujoco>"#;
    let err = Element::parse(text, Dialect::Mjcf).unwrap_err();
    match err {
        SchemaError::MalformedLiteral { attribute, .. } => assert_eq!(attribute, "size"),
        other => panic!("unexpected error: {other}"),
    }
}

/// Test: Unknown attributes are skipped leniently and rejected strictly.
#[test]
fn test_unknown_attribute_policy() {
    let text = r#"<robot name="r"><link name="a" color="red"/></robot>"#;
    let lenient = Element::parse(text, Dialect::Urdf).expect("lenient");
    assert!(!lenient.children()[0].has_attribute("color"));

    let strict = ParseConfig::default().policy(SchemaPolicy::Strict);
    let err = Element::from_str_with(text, Dialect::Urdf, &strict).unwrap_err();
    assert!(matches!(err, SchemaError::UnknownAttribute { .. }));
}
