//! Lifecycle of parsed trees bound to the null backends.
//!
//! Exercises initialize, step and reset on trees that came out of the
//! parsers, and checks that setters reach the bound adapters.

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3, Vector4};
use sim_conformance_tests::{ARM_MJCF, ARM_URDF};
use sim_kintree::{Backend, KinematicTree, Lifecycle, LifecycleState, NullPhysics, NullVisualizer};
use sim_types::Pose;

const PAINTED: &str = r#"
    <mujoco model="painted">
        <worldbody>
            <body name="box" pos="0 0 1">
                <joint name="slide" type="slide" axis="1 0 0"/>
                <geom name="shell" type="box" size="0.1 0.1 0.1" rgba="1 0 0 1"/>
            </body>
        </worldbody>
    </mujoco>
"#;

fn bound(mjcf: &str) -> (KinematicTree, NullPhysics, NullVisualizer) {
    let mut tree = sim_mjcf::load_kintree_str(mjcf).expect("should load");
    let mut physics = NullPhysics::new();
    let mut viz = NullVisualizer::new();
    physics.build(&mut tree).expect("physics");
    viz.build(&mut tree).expect("visualizer");
    tree.initialize();
    (tree, physics, viz)
}

/// Test: Parsers hand out uninitialized trees.
#[test]
fn test_parsed_tree_starts_uninitialized() {
    let mut tree = sim_urdf::load_kintree_str(ARM_URDF).expect("should load");
    assert_eq!(tree.state(), LifecycleState::Uninitialized);
    assert_eq!(
        tree.body_by_name("fore").unwrap().state(),
        LifecycleState::Uninitialized
    );

    tree.initialize();
    assert_eq!(tree.state(), LifecycleState::Initialized);
    for body in tree.bodies() {
        assert_eq!(body.state(), LifecycleState::Initialized);
    }
}

/// Test: Building creates one adapter per entity and initialize reaches them.
#[test]
fn test_adapters_bound_per_entity() {
    let (tree, physics, viz) = bound(ARM_MJCF);
    assert_eq!(physics.body_adapters().len(), tree.len());
    assert_eq!(physics.joint_adapters().len(), tree.joint_count());
    assert_eq!(physics.collider_adapters().len(), tree.collider_count());
    assert_eq!(viz.drawable_adapters().len(), tree.drawable_count());
    assert!(physics.tree_adapter().is_some());

    let fore = tree.body_by_name("fore").unwrap();
    assert!(fore.has_adapter());
    let adapter = physics.body_adapters()[2].borrow();
    assert_eq!(adapter.owner, Some(fore.id()));
    assert_eq!(adapter.initialized, 1);
    assert!(adapter.transform.approx_eq(fore.transform(), 1e-12));
}

/// Test: Joint and collider setters are forwarded to their adapters.
#[test]
fn test_setters_reach_physics_adapters() {
    let (mut tree, physics, _viz) = bound(ARM_MJCF);

    let elbow = tree.joint_by_name_mut("elbow").unwrap();
    elbow.set_damping(2.5);
    elbow.set_axis(Vector3::new(0.0, 0.0, 3.0));
    elbow.set_qpos(&[0.25]);
    {
        let adapter = physics.joint_adapters()[1].borrow();
        assert_relative_eq!(adapter.damping, 2.5);
        assert_relative_eq!(adapter.axis, Vector3::z());
        assert_eq!(adapter.qpos, vec![0.25]);
    }

    let geom = tree.collider_by_name_mut("fore_geom").unwrap();
    geom.set_friction(Vector3::new(0.3, 0.0, 0.0));
    geom.set_collision_group(4);
    let adapter = physics.collider_adapters()[2].borrow();
    assert_relative_eq!(adapter.friction.x, 0.3);
    assert_eq!(adapter.group, 4);
}

/// Test: Drawable setters are forwarded to the visualizer.
#[test]
fn test_setters_reach_drawable_adapters() {
    let (mut tree, _physics, viz) = bound(PAINTED);
    {
        let adapter = viz.drawable_adapters()[0].borrow();
        assert_relative_eq!(adapter.rgba, Vector4::new(1.0, 0.0, 0.0, 1.0));
        assert!(adapter.frames >= 1);
    }

    let shell = tree.drawable_by_name_mut("shell").unwrap();
    shell.set_rgba(Vector4::new(0.0, 0.0, 1.0, 0.5));
    shell.set_texture("checker");
    shell.set_visible(false);

    let adapter = viz.drawable_adapters()[0].borrow();
    assert_relative_eq!(adapter.rgba.w, 0.5);
    assert_eq!(adapter.texture.as_deref(), Some("checker"));
    assert!(!adapter.visible);
}

/// Test: Forces are pushed before a step and cleared after it.
#[test]
fn test_step_pushes_forces() {
    let (mut tree, mut physics, _viz) = bound(PAINTED);
    tree.body_by_name_mut("box")
        .unwrap()
        .add_force_com(Vector3::new(0.0, 0.0, 9.81));

    tree.pre_step();
    assert_relative_eq!(
        physics.body_adapters()[0].borrow().force,
        Vector3::new(0.0, 0.0, 9.81)
    );
    physics.step(0.01);
    tree.post_step();

    assert_relative_eq!(*tree.body_by_name("box").unwrap().force_com(), Vector3::zeros());
    assert_eq!(physics.steps(), 1);
    assert_relative_eq!(physics.time(), 0.01);
}

/// Test: Poses come from the adapter while one is bound.
#[test]
fn test_post_step_reads_adapter_pose() {
    let (mut tree, physics, viz) = bound(PAINTED);
    let moved = Pose::from_position(Point3::new(2.0, 0.0, 1.0));
    physics.body_adapters()[0].borrow_mut().transform = moved;

    tree.post_step();
    let body = tree.body_by_name("box").unwrap();
    assert!(body.transform().approx_eq(&moved, 1e-12));
    assert_relative_eq!(
        tree.drawable_by_name("shell").unwrap().transform().position,
        Point3::new(2.0, 0.0, 1.0),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        viz.drawable_adapters()[0].borrow().transform.position,
        Point3::new(2.0, 0.0, 1.0),
        epsilon = 1e-12
    );
}

/// Test: Reset restores coordinates and poses and notifies adapters.
#[test]
fn test_reset_restores_initial_state() {
    let (mut tree, physics, _viz) = bound(PAINTED);
    tree.joint_by_name_mut("slide").unwrap().set_qpos(&[0.4]);
    physics.body_adapters()[0].borrow_mut().transform =
        Pose::from_position(Point3::new(0.4, 0.0, 1.0));
    tree.post_step();

    tree.reset();
    assert_eq!(tree.joint_by_name("slide").unwrap().qpos(), &[0.0]);
    assert_relative_eq!(
        tree.body_by_name("box").unwrap().transform().position,
        Point3::new(0.0, 0.0, 1.0),
        epsilon = 1e-12
    );
    let body = physics.body_adapters()[0].borrow();
    assert_eq!(body.resets, 1);
    assert_relative_eq!(body.transform.position, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    assert_eq!(physics.joint_adapters()[0].borrow().qpos, vec![0.0]);
}

/// Test: Reset undoes local pose edits so later steps start from the initial pose.
#[test]
fn test_reset_restores_local_transforms() {
    let mut tree = sim_mjcf::load_kintree_str(PAINTED).expect("should load");
    tree.initialize();
    let initial = *tree.body_by_name("box").unwrap().transform();

    let id = tree.body_id("box").unwrap();
    tree.set_local_transform(id, Pose::from_position(Point3::new(5.0, 0.0, 0.0)))
        .expect("known body");
    tree.collider_by_name_mut("shell")
        .unwrap()
        .set_local_transform(Pose::from_position(Point3::new(0.0, 0.3, 0.0)));
    tree.joint_by_name_mut("slide")
        .unwrap()
        .set_local_transform(Pose::from_position(Point3::new(0.0, 0.0, 0.2)));

    tree.reset();
    tree.pre_step();
    tree.post_step();

    let body = tree.body_by_name("box").unwrap();
    assert!(body.transform().approx_eq(&initial, 1e-12));
    assert!(body.local_transform().approx_eq(&initial, 1e-12));
    assert!(body.joint().unwrap().local_transform().approx_eq(&Pose::identity(), 1e-12));
    let shell = tree.collider_by_name("shell").unwrap();
    assert!(shell.local_transform().approx_eq(&Pose::identity(), 1e-12));
    assert_relative_eq!(shell.transform().position, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
}

/// Test: Reset pushes the restored local poses to bound adapters.
#[test]
fn test_reset_restores_local_transforms_on_adapters() {
    let (mut tree, physics, viz) = bound(PAINTED);
    let id = tree.body_id("box").unwrap();
    tree.set_local_transform(id, Pose::from_position(Point3::new(5.0, 0.0, 0.0)))
        .expect("known body");
    tree.collider_by_name_mut("shell")
        .unwrap()
        .set_local_transform(Pose::from_position(Point3::new(0.0, 0.3, 0.0)));
    tree.drawable_by_name_mut("shell")
        .unwrap()
        .set_local_transform(Pose::from_position(Point3::new(0.0, 0.3, 0.0)));

    tree.reset();
    tree.pre_step();
    tree.post_step();

    assert_relative_eq!(
        tree.body_by_name("box").unwrap().local_transform().position,
        Point3::new(0.0, 0.0, 1.0),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        physics.body_adapters()[0].borrow().transform.position,
        Point3::new(0.0, 0.0, 1.0),
        epsilon = 1e-12
    );
    assert_relative_eq!(physics.collider_adapters()[0].borrow().local.position, Point3::origin());
    assert_relative_eq!(viz.drawable_adapters()[0].borrow().local.position, Point3::origin());
}

/// Test: Without adapters, stepping runs forward kinematics from qpos.
#[test]
fn test_unbound_tree_runs_forward_kinematics() {
    let mut tree = sim_mjcf::load_kintree_str(PAINTED).expect("should load");
    tree.initialize();
    tree.joint_by_name_mut("slide").unwrap().set_qpos(&[0.4]);
    tree.pre_step();
    tree.post_step();
    assert_relative_eq!(
        tree.body_by_name("box").unwrap().transform().position,
        Point3::new(0.4, 0.0, 1.0),
        epsilon = 1e-12
    );
}

/// Test: Moving a body updates its subtree and the bound adapters.
#[test]
fn test_set_local_transform_propagates() {
    let (mut tree, physics, _viz) = bound(ARM_MJCF);
    let upper = tree.body_id("upper").unwrap();
    tree.set_local_transform(upper, Pose::from_position(Point3::new(0.0, 0.0, 0.5)))
        .expect("known body");

    let fore = tree.body_by_name("fore").unwrap().transform().position;
    assert_relative_eq!(fore, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    assert_relative_eq!(
        physics.body_adapters()[2].borrow().transform.position,
        fore,
        epsilon = 1e-12
    );
}

/// Test: Detached entities keep their state and stop talking to adapters.
#[test]
fn test_detach_and_teardown() {
    let (mut tree, mut physics, mut viz) = bound(ARM_MJCF);
    tree.detach_viz();
    assert!(!tree.drawable_by_name("fore_geom").unwrap().has_adapter());
    assert!(tree.body_by_name("fore").unwrap().has_adapter());
    assert!(viz.drawable_adapters()[0].borrow().owner.is_none());

    tree.joint_by_name_mut("elbow").unwrap().set_qpos(&[0.3]);
    physics.teardown(&mut tree);
    viz.teardown(&mut tree);
    assert!(!tree.has_adapter());
    assert!(!tree.body_by_name("fore").unwrap().has_adapter());
    assert_eq!(tree.joint_by_name("elbow").unwrap().qpos(), &[0.3]);
    assert_eq!(tree.state(), LifecycleState::Initialized);
}

/// Test: Dropping a backend leaves the tree detached.
#[test]
fn test_dropped_backend_reads_as_detached() {
    let (mut tree, physics, viz) = bound(PAINTED);
    drop(physics);
    drop(viz);
    assert!(!tree.body_by_name("box").unwrap().has_adapter());
    assert!(!tree.drawable_by_name("shell").unwrap().has_adapter());

    tree.joint_by_name_mut("slide").unwrap().set_qpos(&[0.2]);
    tree.post_step();
    assert_relative_eq!(
        tree.body_by_name("box").unwrap().transform().position.x,
        0.2,
        epsilon = 1e-12
    );
}
