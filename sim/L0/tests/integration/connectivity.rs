//! URDF connectivity resolution.
//!
//! Links and joints may be declared in any order; the parser must find the
//! single root, attach children under their parents and reject documents
//! that do not describe a tree.

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use sim_conformance_tests::{ARM_MJCF, ARM_URDF};
use sim_kintree::{KinematicTree, Lifecycle};
use sim_types::JointType;
use sim_urdf::{load_kintree_str, UrdfError};

fn robot(body: &str) -> String {
    format!(r#"<robot name="r">{body}</robot>"#)
}

fn joint(name: &str, parent: &str, child: &str) -> String {
    format!(
        r#"<joint name="{name}" type="fixed"><parent link="{parent}"/><child link="{child}"/></joint>"#
    )
}

/// Test: Joints listed before their parents still build a parent-first tree.
#[test]
fn test_out_of_order_declarations() {
    let urdf = robot(&format!(
        r#"{}{}<link name="tip"/><link name="mid"/><link name="base"/>"#,
        joint("mid_to_tip", "mid", "tip"),
        joint("base_to_mid", "base", "mid"),
    ));
    let tree = load_kintree_str(&urdf).expect("should load");

    assert_eq!(tree.root_body().unwrap().name(), "base");
    let base = tree.body_id("base").unwrap();
    let mid = tree.body_id("mid").unwrap();
    assert_eq!(tree.body_by_name("mid").unwrap().parent(), Some(base));
    assert_eq!(tree.body_by_name("tip").unwrap().parent(), Some(mid));
    assert_eq!(
        tree.body_by_name("tip").unwrap().joint().unwrap().name(),
        "mid_to_tip"
    );
    assert_eq!(tree.joint_count(), 2);
}

/// Test: The root link carries no joint; every other link carries one.
#[test]
fn test_joint_attachment() {
    let tree = load_kintree_str(ARM_URDF).expect("should load");
    assert!(tree.root_body().unwrap().joint().is_none());

    let shoulder = tree.body_by_name("upper").unwrap().joint().unwrap();
    assert_eq!(shoulder.name(), "shoulder");
    assert_eq!(shoulder.joint_type(), JointType::Revolute);
    assert!(shoulder.limits().is_continuous());

    let elbow = tree.joint_by_name("elbow").unwrap();
    assert_relative_eq!(*elbow.axis(), Vector3::y());
    assert_relative_eq!(elbow.limits().high, std::f64::consts::FRAC_PI_2);
}

/// Test: The URDF and MJCF arms place every body and collider alike.
#[test]
fn test_urdf_matches_mjcf_arm() {
    let mut urdf = load_kintree_str(ARM_URDF).expect("urdf");
    let mut mjcf = sim_mjcf::load_kintree_str(ARM_MJCF).expect("mjcf");
    urdf.initialize();
    mjcf.initialize();

    // The MJCF base is lifted off the ground.
    let offset = Vector3::new(0.0, 0.0, 0.1);
    for name in ["base", "upper", "fore"] {
        let u = urdf.body_by_name(name).unwrap().transform();
        let m = mjcf.body_by_name(name).unwrap().transform();
        assert_relative_eq!(u.position + offset, m.position, epsilon = 1e-9);
        assert_relative_eq!(u.rotation, m.rotation, epsilon = 1e-9);
    }
    for name in ["base_geom", "upper_geom", "fore_geom"] {
        let u = urdf.collider_by_name(name).unwrap();
        let m = mjcf.collider_by_name(name).unwrap();
        assert_relative_eq!(
            u.transform().position + offset,
            m.transform().position,
            epsilon = 1e-9
        );
        assert_eq!(u.shape().shape, m.shape().shape);
        assert_relative_eq!(u.shape().size, m.shape().size, epsilon = 1e-9);
    }
}

/// Test: Joint motion rotates the child about the joint and reset undoes it.
#[test]
fn test_joint_motion_and_reset() {
    let mut tree: KinematicTree = load_kintree_str(ARM_URDF).expect("should load");
    tree.initialize();
    tree.joint_by_name_mut("elbow")
        .unwrap()
        .set_qpos(&[std::f64::consts::FRAC_PI_2]);
    tree.post_step();

    // The elbow sits at the fore body origin, so the body only turns.
    let upper = *tree.body_by_name("upper").unwrap().transform();
    let fore = *tree.body_by_name("fore").unwrap().transform();
    assert_relative_eq!(fore.position, Point3::new(0.0, 0.0, 0.5), epsilon = 1e-9);
    assert_relative_eq!(
        (upper.rotation.inverse() * fore.rotation).angle(),
        std::f64::consts::FRAC_PI_2,
        epsilon = 1e-9
    );

    tree.reset();
    assert_relative_eq!(
        tree.body_by_name("fore").unwrap().transform().rotation,
        upper.rotation,
        epsilon = 1e-9
    );
    assert_relative_eq!(tree.joint_by_name("elbow").unwrap().qpos()[0], 0.0);
}

/// Test: A joint naming an undeclared link is rejected.
#[test]
fn test_undefined_link() {
    let urdf = robot(&format!(r#"<link name="a"/>{}"#, joint("j", "a", "ghost")));
    match load_kintree_str(&urdf).unwrap_err() {
        UrdfError::UndefinedLink { joint, link } => {
            assert_eq!(joint, "j");
            assert_eq!(link, "ghost");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Test: Two unconnected links give two roots.
#[test]
fn test_multiple_roots() {
    let urdf = robot(r#"<link name="a"/><link name="b"/>"#);
    match load_kintree_str(&urdf).unwrap_err() {
        UrdfError::MultipleRootLinks(roots) => assert_eq!(roots, ["a", "b"]),
        other => panic!("unexpected error: {other}"),
    }
}

/// Test: A link with two parents is rejected.
#[test]
fn test_multiple_parents() {
    let urdf = robot(&format!(
        r#"<link name="a"/><link name="b"/><link name="c"/>{}{}"#,
        joint("ac", "a", "c"),
        joint("bc", "b", "c"),
    ));
    assert!(matches!(
        load_kintree_str(&urdf).unwrap_err(),
        UrdfError::MultipleParents { link, .. } if link == "c"
    ));
}

/// Test: A cycle below the root is reported as a loop.
#[test]
fn test_kinematic_loop() {
    let urdf = robot(&format!(
        r#"<link name="root"/><link name="a"/><link name="b"/>{}{}"#,
        joint("ab", "a", "b"),
        joint("ba", "b", "a"),
    ));
    let err = load_kintree_str(&urdf).unwrap_err();
    assert!(err.is_topology());
    assert!(matches!(err, UrdfError::KinematicLoop(_)));
}

/// Test: A document without links has no root.
#[test]
fn test_no_links() {
    assert!(matches!(
        load_kintree_str(&robot("")).unwrap_err(),
        UrdfError::NoRootLink
    ));
}

/// Test: Duplicate link names are rejected before connectivity is resolved.
#[test]
fn test_duplicate_link() {
    let urdf = robot(r#"<link name="a"/><link name="a"/>"#);
    assert!(matches!(
        load_kintree_str(&urdf).unwrap_err(),
        UrdfError::DuplicateLink(name) if name == "a"
    ));
}
