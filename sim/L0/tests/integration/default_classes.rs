//! Integration tests for `<default>` class resolution in the MJCF parser.
//!
//! Verifies that class defaults reach joints, geoms and assets of the
//! assembled tree, and that per-element attributes override them.

use approx::assert_relative_eq;
use nalgebra::{Vector3, Vector4};
use sim_mjcf::load_kintree_str;
use sim_types::ShapeType;

/// Root default joint damping applies to joints without explicit damping.
#[test]
fn test_root_default_joint_damping() {
    let mjcf = r#"
        <mujoco model="default_damping">
            <default>
                <joint damping="0.5"/>
            </default>
            <worldbody>
                <body name="b1" pos="0 0 1">
                    <joint name="j1" type="hinge" axis="0 1 0"/>
                    <geom type="sphere" size="0.1"/>
                </body>
            </worldbody>
        </mujoco>
    "#;

    let tree = load_kintree_str(mjcf).expect("should load");
    assert_relative_eq!(tree.joint_by_name("j1").unwrap().damping(), 0.5, epsilon = 1e-10);
}

/// Per-element attributes override class defaults.
#[test]
fn test_explicit_attribute_overrides_default() {
    let mjcf = r#"
        <mujoco model="override_test">
            <default>
                <default class="heavy">
                    <joint damping="0.5"/>
                </default>
            </default>
            <worldbody>
                <body name="b1" pos="0 0 1">
                    <joint name="j1" type="hinge" axis="0 1 0" class="heavy" damping="1.0"/>
                    <geom type="sphere" size="0.1"/>
                </body>
            </worldbody>
        </mujoco>
    "#;

    let tree = load_kintree_str(mjcf).expect("should load");
    assert_relative_eq!(tree.joint_by_name("j1").unwrap().damping(), 1.0, epsilon = 1e-10);
}

/// Nested classes inherit from their enclosing class.
#[test]
fn test_nested_class_inheritance() {
    let mjcf = r#"
        <mujoco model="nested_classes">
            <default>
                <joint damping="0.1"/>
                <default class="robot">
                    <joint damping="0.5"/>
                    <default class="arm">
                        <joint armature="0.01"/>
                    </default>
                </default>
            </default>
            <worldbody>
                <body name="b1" pos="0 0 1">
                    <joint name="j1" type="hinge" axis="0 1 0" class="arm"/>
                    <geom type="sphere" size="0.1"/>
                </body>
            </worldbody>
        </mujoco>
    "#;

    let tree = load_kintree_str(mjcf).expect("should load");
    let joint = tree.joint_by_name("j1").unwrap();
    assert_relative_eq!(joint.damping(), 0.5, epsilon = 1e-10);
    assert_relative_eq!(joint.armature(), 0.01, epsilon = 1e-10);
}

/// `childclass` applies to every descendant that names no class itself.
#[test]
fn test_childclass_propagates_to_descendants() {
    let mjcf = r#"
        <mujoco model="childclass">
            <default>
                <default class="leg">
                    <joint stiffness="3"/>
                    <geom type="capsule" size="0.02 0.2" rgba="0 1 0 1"/>
                </default>
                <default class="foot">
                    <geom type="sphere" size="0.04"/>
                </default>
            </default>
            <worldbody>
                <body name="hip" childclass="leg">
                    <joint name="hip_j" type="hinge"/>
                    <geom name="thigh"/>
                    <body name="knee" pos="0 0 -0.4">
                        <joint name="knee_j" type="hinge"/>
                        <geom name="shin"/>
                        <geom name="toe" class="foot"/>
                    </body>
                </body>
            </worldbody>
        </mujoco>
    "#;

    let tree = load_kintree_str(mjcf).expect("should load");
    assert_relative_eq!(tree.joint_by_name("knee_j").unwrap().stiffness(), 3.0);

    let shin = tree.collider_by_name("shin").unwrap();
    assert_eq!(shin.shape().shape, ShapeType::Capsule);
    assert_relative_eq!(shin.shape().size, Vector3::new(0.02, 0.4, 0.0));
    assert_eq!(
        *tree.drawable_by_name("shin").unwrap().rgba(),
        Vector4::new(0.0, 1.0, 0.0, 1.0)
    );

    let toe = tree.collider_by_name("toe").unwrap();
    assert_eq!(toe.shape().shape, ShapeType::Sphere);
    assert_relative_eq!(toe.shape().size.x, 0.04);
}

/// Geom defaults cover contact parameters as well as shapes.
#[test]
fn test_geom_contact_defaults() {
    let mjcf = r#"
        <mujoco model="contact">
            <default>
                <geom contype="2" conaffinity="4" friction="0.6"/>
            </default>
            <worldbody>
                <body name="b">
                    <geom name="g" type="sphere" size="0.1"/>
                    <geom name="h" type="sphere" size="0.1" contype="8"/>
                </body>
            </worldbody>
        </mujoco>
    "#;

    let tree = load_kintree_str(mjcf).expect("should load");
    let g = tree.collider_by_name("g").unwrap();
    assert_eq!(g.collision_group(), 2);
    assert_eq!(g.collision_mask(), 4);
    // Omitted friction coefficients keep their defaults.
    assert_relative_eq!(*g.friction(), Vector3::new(0.6, 0.005, 0.0001));

    let h = tree.collider_by_name("h").unwrap();
    assert_eq!(h.collision_group(), 8);
    assert_eq!(h.collision_mask(), 4);
}

/// An unknown class name falls back to the root defaults.
#[test]
fn test_unknown_class_uses_root_defaults() {
    let mjcf = r#"
        <mujoco model="unknown_class">
            <default>
                <joint damping="0.25"/>
            </default>
            <worldbody>
                <body name="b">
                    <joint name="j" type="hinge" class="nonexistent"/>
                    <geom type="sphere" size="0.1"/>
                </body>
            </worldbody>
        </mujoco>
    "#;

    let tree = load_kintree_str(mjcf).expect("should load");
    assert_relative_eq!(tree.joint_by_name("j").unwrap().damping(), 0.25);
}
