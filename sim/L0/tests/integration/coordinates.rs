//! Coordinate modes and angle units.
//!
//! The same model written in local or global coordinates, or with degrees
//! or radians, must produce identical world poses once initialized.

use approx::assert_relative_eq;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use sim_conformance_tests::ARM_MJCF;
use sim_kintree::{KinematicTree, Lifecycle};
use sim_mjcf::load_kintree_str;
use std::f64::consts::FRAC_PI_2;

const ARM_GLOBAL: &str = r#"
    <mujoco model="arm">
        <compiler coordinate="global"/>
        <worldbody>
            <body name="base" pos="0 0 0.1">
                <geom name="base_geom" type="box" size="0.1 0.1 0.05" pos="0 0 0.1"/>
                <body name="upper" pos="0 0 0.2" quat="0.7071067811865476 0 0 0.7071067811865476">
                    <joint name="shoulder" type="hinge" pos="0 0 0.2" axis="0 0 1"/>
                    <geom name="upper_geom" type="capsule" fromto="0 0 0.2 0 0 0.6" size="0.03"/>
                    <body name="fore" pos="0 0 0.6" quat="0.7071067811865476 0 0 0.7071067811865476">
                        <joint name="elbow" type="hinge" pos="0 0 0.6" axis="-1 0 0"
                               limited="true" range="-90 90"/>
                        <geom name="fore_geom" type="sphere" size="0.05" pos="0 0 0.6"/>
                    </body>
                </body>
            </body>
        </worldbody>
    </mujoco>
"#;

const ARM_RADIANS: &str = r#"
    <mujoco model="arm">
        <compiler angle="radian"/>
        <worldbody>
            <body name="base" pos="0 0 0.1">
                <geom name="base_geom" type="box" size="0.1 0.1 0.05"/>
                <body name="upper" pos="0 0 0.1" euler="0 0 1.5707963267948966">
                    <joint name="shoulder" type="hinge" axis="0 0 1"/>
                    <geom name="upper_geom" type="capsule" fromto="0 0 0 0 0 0.4" size="0.03"/>
                    <body name="fore" pos="0 0 0.4">
                        <joint name="elbow" type="hinge" axis="0 1 0" limited="true"
                               range="-1.5707963267948966 1.5707963267948966"/>
                        <geom name="fore_geom" type="sphere" size="0.05"/>
                    </body>
                </body>
            </body>
        </worldbody>
    </mujoco>
"#;

fn initialized(mjcf: &str) -> KinematicTree {
    let mut tree = load_kintree_str(mjcf).expect("should load");
    tree.initialize();
    tree
}

fn assert_same_world_poses(a: &KinematicTree, b: &KinematicTree) {
    for name in ["base", "upper", "fore"] {
        let pa = a.body_by_name(name).unwrap().transform();
        let pb = b.body_by_name(name).unwrap().transform();
        assert!(pa.approx_eq(pb, 1e-9), "{name}: {pa:?} vs {pb:?}");
    }
    // Geoms without an orientation are aligned with the world frame in
    // global mode, so only their placement is compared.
    for name in ["base_geom", "upper_geom", "fore_geom"] {
        let pa = a.collider_by_name(name).unwrap().transform().position;
        let pb = b.collider_by_name(name).unwrap().transform().position;
        assert_relative_eq!(pa, pb, epsilon = 1e-9);
    }
}

/// Test: World poses of the local-coordinate arm.
#[test]
fn test_local_world_poses() {
    let tree = initialized(ARM_MJCF);
    let upper = tree.body_by_name("upper").unwrap().transform();
    assert_relative_eq!(upper.position, Point3::new(0.0, 0.0, 0.2), epsilon = 1e-12);
    assert_relative_eq!(
        upper.rotation,
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
        epsilon = 1e-12
    );

    let fore = tree.body_by_name("fore").unwrap().transform();
    assert_relative_eq!(fore.position, Point3::new(0.0, 0.0, 0.6), epsilon = 1e-12);
}

/// Test: Global coordinates give the same tree as local coordinates.
#[test]
fn test_global_matches_local() {
    let local = initialized(ARM_MJCF);
    let global = initialized(ARM_GLOBAL);
    assert_same_world_poses(&local, &global);

    let elbow_local = local.joint_by_name("elbow").unwrap();
    let elbow_global = global.joint_by_name("elbow").unwrap();
    assert_relative_eq!(*elbow_global.axis(), *elbow_local.axis(), epsilon = 1e-9);
    assert!(elbow_global
        .local_transform()
        .approx_eq(elbow_local.local_transform(), 1e-9));
    assert_relative_eq!(
        global.collider_by_name("upper_geom").unwrap().shape().size,
        local.collider_by_name("upper_geom").unwrap().shape().size,
        epsilon = 1e-12
    );
}

/// Test: Radians give the same tree as degrees.
#[test]
fn test_radians_match_degrees() {
    let degrees = initialized(ARM_MJCF);
    let radians = initialized(ARM_RADIANS);
    assert_same_world_poses(&degrees, &radians);

    let a = degrees.joint_by_name("elbow").unwrap().limits();
    let b = radians.joint_by_name("elbow").unwrap().limits();
    assert_relative_eq!(a.low, -FRAC_PI_2, epsilon = 1e-12);
    assert_relative_eq!(a.high, b.high, epsilon = 1e-12);
}

/// Test: Extrinsic and intrinsic euler sequences.
#[test]
fn test_eulerseq() {
    let doc = |seq: &str| {
        format!(
            r#"<mujoco model="e"><compiler eulerseq="{seq}"/>
               <worldbody><body name="b" euler="90 90 0"><geom size="0.1"/></body></worldbody></mujoco>"#
        )
    };
    let rx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
    let ry = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);

    let intrinsic = initialized(&doc("xyz"));
    assert_relative_eq!(
        intrinsic.body_by_name("b").unwrap().transform().rotation,
        rx * ry,
        epsilon = 1e-12
    );

    let extrinsic = initialized(&doc("XYZ"));
    assert_relative_eq!(
        extrinsic.body_by_name("b").unwrap().transform().rotation,
        ry * rx,
        epsilon = 1e-12
    );
}

/// Test: Invalid compiler settings are reported.
#[test]
fn test_invalid_compiler_settings() {
    let mjcf = r#"<mujoco><compiler angle="gradian"/><worldbody/></mujoco>"#;
    assert!(load_kintree_str(mjcf).is_err());

    let mjcf = r#"<mujoco><compiler eulerseq="xyq"/><worldbody/></mujoco>"#;
    assert!(load_kintree_str(mjcf).is_err());
}
