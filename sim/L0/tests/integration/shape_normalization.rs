//! Shape normalization shared by both parsers.
//!
//! Segment-defined MJCF geoms and origin-placed URDF geometry must end up
//! as the same standard descriptors.

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use sim_kintree::shape::{box_from_corners, normalize_segment};
use sim_kintree::KinematicTree;
use sim_types::ShapeType;

fn mjcf_geom(geom: &str) -> KinematicTree {
    let mjcf = format!(
        r#"<mujoco model="shapes"><worldbody><body name="b">{geom}</body></worldbody></mujoco>"#
    );
    sim_mjcf::load_kintree_str(&mjcf).expect("should load")
}

fn urdf_geometry(origin: &str, geometry: &str) -> KinematicTree {
    let urdf = format!(
        r#"<robot name="shapes"><link name="b">
               <collision name="g">{origin}<geometry>{geometry}</geometry></collision>
           </link></robot>"#
    );
    sim_urdf::load_kintree_str(&urdf).expect("should load")
}

/// Test: A vertical capsule segment is centered with identity rotation.
#[test]
fn test_vertical_capsule_fromto() {
    let tree = mjcf_geom(r#"<geom name="g" type="capsule" fromto="0 0 0 0 0 2" size="0.1"/>"#);
    let shape = tree.collider_by_name("g").unwrap().shape();
    assert_eq!(shape.shape, ShapeType::Capsule);
    assert_relative_eq!(shape.local.position, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    assert_relative_eq!(shape.local.rotation.angle(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(shape.size, Vector3::new(0.1, 2.0, 0.0), epsilon = 1e-12);
}

/// Test: Every segment-capable kind matches the shared normalization.
#[test]
fn test_fromto_kinds_match_shared_normalization() {
    let from = Point3::new(0.1, -0.2, 0.3);
    let to = Point3::new(0.5, 0.4, -0.1);
    for (kind, shape_type) in [
        ("capsule", ShapeType::Capsule),
        ("cylinder", ShapeType::Cylinder),
        ("box", ShapeType::Box),
        ("ellipsoid", ShapeType::Ellipsoid),
    ] {
        let tree = mjcf_geom(&format!(
            r#"<geom name="g" type="{kind}" fromto="0.1 -0.2 0.3 0.5 0.4 -0.1" size="0.05"/>"#
        ));
        let parsed = tree.collider_by_name("g").unwrap().shape();
        let expected = normalize_segment(shape_type, &from, &to, 0.05);

        assert_eq!(parsed.shape, shape_type);
        assert_relative_eq!(parsed.size, expected.size, epsilon = 1e-12);
        assert!(parsed.local.approx_eq(&expected.local, 1e-12), "{kind}");
        // Local +Z runs along the segment.
        let z = parsed.local.transform_vector(&Vector3::z());
        assert_relative_eq!(z, (to - from).normalize(), epsilon = 1e-12);
    }
}

/// Test: Half sizes become full lengths and extents.
#[test]
fn test_half_sizes_are_doubled() {
    let tree = mjcf_geom(
        r#"<geom name="c" type="capsule" size="0.1 0.3"/>
           <geom name="k" type="box" size="0.1 0.2 0.3"/>
           <geom name="e" type="ellipsoid" size="0.1 0.2 0.3"/>"#,
    );
    assert_relative_eq!(
        tree.collider_by_name("c").unwrap().shape().size,
        Vector3::new(0.1, 0.6, 0.0)
    );
    assert_relative_eq!(
        tree.collider_by_name("k").unwrap().shape().size,
        Vector3::new(0.2, 0.4, 0.6)
    );
    // Ellipsoids keep their radii.
    assert_relative_eq!(
        tree.collider_by_name("e").unwrap().shape().size,
        Vector3::new(0.1, 0.2, 0.3)
    );
}

/// Test: A fromto cylinder along X matches a URDF cylinder pitched onto X.
#[test]
fn test_mjcf_and_urdf_cylinders_agree() {
    let mjcf = mjcf_geom(r#"<geom name="g" type="cylinder" fromto="0 0 0 1 0 0" size="0.1"/>"#);
    let urdf = urdf_geometry(
        r#"<origin xyz="0.5 0 0" rpy="0 1.5707963267948966 0"/>"#,
        r#"<cylinder radius="0.1" length="1"/>"#,
    );
    let m = mjcf.collider_by_name("g").unwrap().shape();
    let u = urdf.collider_by_name("b_g").unwrap().shape();

    assert_eq!(m.shape, u.shape);
    assert_relative_eq!(m.size, u.size, epsilon = 1e-12);
    assert!(m.local.approx_eq(&u.local, 1e-12), "{:?} vs {:?}", m.local, u.local);
}

/// Test: URDF boxes are given in full extents and MJCF boxes in half extents.
#[test]
fn test_box_extents_agree() {
    let mjcf = mjcf_geom(r#"<geom name="g" type="box" size="0.5 0.25 0.1" pos="0 0 1"/>"#);
    let urdf = urdf_geometry(r#"<origin xyz="0 0 1"/>"#, r#"<box size="1 0.5 0.2"/>"#);

    let m = mjcf.collider_by_name("g").unwrap().shape();
    let u = urdf.collider_by_name("b_g").unwrap().shape();
    assert_relative_eq!(m.size, u.size, epsilon = 1e-12);
    assert!(m.local.approx_eq(&u.local, 1e-12));

    let corners = box_from_corners(&Point3::new(-0.5, -0.25, 0.9), &Point3::new(0.5, 0.25, 1.1));
    assert_relative_eq!(corners.size, m.size, epsilon = 1e-12);
    assert_relative_eq!(corners.local.position, m.local.position, epsilon = 1e-12);
}

/// Test: A missing radius falls back to a quarter of the segment length.
#[test]
fn test_missing_radius_fallback() {
    let tree = mjcf_geom(r#"<geom name="g" type="capsule" fromto="0 0 0 0 0 2"/>"#);
    assert_relative_eq!(
        tree.collider_by_name("g").unwrap().shape().size,
        Vector3::new(0.5, 2.0, 0.0),
        epsilon = 1e-12
    );
}

/// Test: Colliders and drawables of one geom share a descriptor.
#[test]
fn test_collider_and_drawable_share_shape() {
    let tree = mjcf_geom(r#"<geom name="g" type="cylinder" fromto="0 0 0 0 1 0" size="0.2"/>"#);
    let collider = tree.collider_by_name("g").unwrap().shape();
    let drawable = tree.drawable_by_name("g").unwrap().shape();
    assert_eq!(collider.shape, drawable.shape);
    assert_relative_eq!(collider.size, drawable.size);
    assert!(collider.local.approx_eq(&drawable.local, 1e-12));
}
