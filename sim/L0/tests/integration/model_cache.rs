//! The document cache shared by both parsers.

use std::path::Path;
use std::sync::Arc;

use sim_conformance_tests::{ARM_MJCF, ARM_URDF};
use sim_kintree::Lifecycle;
use sim_mjcf::{MjcfError, MjcfParser};
use sim_schema::{Dialect, Element, ModelCache, SchemaError};
use sim_types::ParseConfig;
use sim_urdf::UrdfParser;
use tempfile::TempDir;

fn model_root() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "mjcf/arm.xml", ARM_MJCF);
    write(dir.path(), "urdf/arm.urdf", ARM_URDF);
    dir
}

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(path, text).expect("write");
}

/// Test: The second request for a document is served from the cache.
#[test]
fn test_get_loads_once() {
    let dir = model_root();
    let mut cache = ModelCache::new(dir.path(), ParseConfig::default());
    assert!(cache.is_empty());

    let first = cache.get(Dialect::Mjcf, "arm").expect("load");
    assert!(cache.contains(Dialect::Mjcf, "arm"));
    assert!(!cache.contains(Dialect::Urdf, "arm"));

    // Edits on disk are invisible until the entry is reloaded.
    write(dir.path(), "mjcf/arm.xml", r#"<mujoco model="changed"><worldbody/></mujoco>"#);
    let second = cache.get(Dialect::Mjcf, "arm").expect("hit");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.source_dir(), Some(dir.path().join("mjcf").as_path()));
}

/// Test: Both parsers assemble trees from cached documents.
#[test]
fn test_parse_cached() {
    let dir = model_root();
    let mut cache = ModelCache::new(dir.path(), ParseConfig::default());

    let mjcf = MjcfParser::new(ParseConfig::default())
        .parse_cached(&mut cache, "arm")
        .expect("mjcf");
    let urdf = UrdfParser::new(ParseConfig::default())
        .parse_cached(&mut cache, "arm")
        .expect("urdf");

    assert_eq!(mjcf.len(), 3);
    assert_eq!(urdf.len(), 3);
    assert_eq!(mjcf.root_body().unwrap().name(), "base");
    assert_eq!(urdf.root_body().unwrap().name(), "base");
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.names(Dialect::Urdf), ["arm"]);
}

/// Test: A missing document is an I/O error and leaves the cache unchanged.
#[test]
fn test_missing_document() {
    let dir = model_root();
    let mut cache = ModelCache::new(dir.path(), ParseConfig::default());
    let err = MjcfParser::new(ParseConfig::default())
        .parse_cached(&mut cache, "ghost")
        .unwrap_err();
    assert!(matches!(err, MjcfError::Schema(SchemaError::Io(_))));
    assert!(cache.is_empty());
}

/// Test: In-memory documents can be registered and parsed by name.
#[test]
fn test_insert_in_memory_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cache = ModelCache::new(dir.path(), ParseConfig::default());
    let doc = Element::parse(ARM_URDF, Dialect::Urdf).expect("parse");
    assert!(cache.insert(Dialect::Urdf, "memory_arm", doc).is_none());

    let tree = UrdfParser::new(ParseConfig::default())
        .parse_cached(&mut cache, "memory_arm")
        .expect("parse");
    assert_eq!(tree.name(), "arm");
    assert!(tree.joint_by_name("elbow").is_some());
}

/// Test: Invalidate and reload pick up changes on disk.
#[test]
fn test_invalidate_and_reload() {
    let dir = model_root();
    let mut cache = ModelCache::new(dir.path(), ParseConfig::default());
    let old = cache.get(Dialect::Mjcf, "arm").expect("load");

    write(dir.path(), "mjcf/arm.xml", r#"<mujoco model="changed"><worldbody/></mujoco>"#);
    let reloaded = cache.reload(Dialect::Mjcf, "arm").expect("reload");
    assert_eq!(reloaded.get_string("model", ""), "changed");
    // Holders of the old entry keep a valid document.
    assert_eq!(old.get_string("model", ""), "arm");

    assert!(cache.invalidate(Dialect::Mjcf, "arm"));
    assert!(!cache.invalidate(Dialect::Mjcf, "arm"));
    assert!(cache.is_empty());
}

/// Test: A failed reload keeps the previous entry.
#[test]
fn test_failed_reload_keeps_entry() {
    let dir = model_root();
    let mut cache = ModelCache::new(dir.path(), ParseConfig::default());
    cache.get(Dialect::Urdf, "arm").expect("load");

    write(dir.path(), "urdf/arm.urdf", "<robot><link></robot>");
    assert!(matches!(
        cache.reload(Dialect::Urdf, "arm"),
        Err(SchemaError::Xml(_))
    ));
    let kept = cache.get(Dialect::Urdf, "arm").expect("hit");
    assert_eq!(kept.get_string("name", ""), "arm");
}

/// Test: Precaching loads every document of a dialect folder.
#[test]
fn test_precache() {
    let dir = model_root();
    write(dir.path(), "mjcf/pendulum.xml", r#"<mujoco model="p"><worldbody/></mujoco>"#);
    write(dir.path(), "mjcf/notes.txt", "not a model");

    let mut cache = ModelCache::new(dir.path(), ParseConfig::default());
    assert_eq!(cache.precache(Dialect::Mjcf).expect("precache"), 2);
    assert_eq!(cache.names(Dialect::Mjcf), ["arm", "pendulum"]);
    assert!(cache.names(Dialect::Urdf).is_empty());

    cache.clear();
    assert!(cache.is_empty());
}
