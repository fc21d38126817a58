//! Backend selection from runtime configuration.
//!
//! Backends are created by id through the registry and stepped together
//! with a parsed tree.

use std::cell::Cell;
use std::rc::Rc;

use approx::assert_relative_eq;
use sim_conformance_tests::ARM_MJCF;
use sim_kintree::{
    Backend, BackendKind, BackendRegistry, Body, KinematicTree, KintreeError, Lifecycle,
    LifecycleState,
};
use sim_types::{ConfigError, RuntimeConfig};

/// Physics backend that only counts steps and bindings.
struct CountingPhysics {
    steps: Rc<Cell<u32>>,
    built: Rc<Cell<u32>>,
}

impl Backend for CountingPhysics {
    fn id(&self) -> &str {
        "counting"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Physics
    }

    fn build(&mut self, _tree: &mut KinematicTree) -> sim_kintree::Result<()> {
        self.built.set(self.built.get() + 1);
        Ok(())
    }

    fn step(&mut self, _dt: f64) {
        self.steps.set(self.steps.get() + 1);
    }

    fn teardown(&mut self, tree: &mut KinematicTree) {
        tree.detach_sim();
    }
}

fn arm() -> KinematicTree {
    sim_mjcf::load_kintree_str(ARM_MJCF).expect("should load")
}

/// Test: The built-in configuration binds, steps and tears down a parsed tree.
#[test]
fn test_null_backends_from_config() {
    let registry = BackendRegistry::with_builtin();
    let mut set = registry
        .create_from_config(&RuntimeConfig::null_with_viz())
        .expect("backends");
    assert_eq!(set.physics().id(), "null");
    assert_eq!(set.visualizer().map(|v| v.id()), Some("null-viz"));
    assert_relative_eq!(set.timestep(), 1.0 / 240.0);

    let mut tree = arm();
    set.build(&mut tree).expect("build");
    assert_eq!(tree.state(), LifecycleState::Initialized);
    assert!(tree.has_adapter());
    assert!(tree.drawable_by_name("fore_geom").unwrap().has_adapter());

    tree.joint_by_name_mut("shoulder").unwrap().set_qpos(&[0.7]);
    for _ in 0..10 {
        set.step(&mut tree);
    }
    assert_eq!(tree.joint_by_name("shoulder").unwrap().qpos(), &[0.7]);

    set.teardown(&mut tree);
    assert!(!tree.has_adapter());
    assert!(!tree.body_by_name("upper").unwrap().has_adapter());
    assert!(!tree.drawable_by_name("fore_geom").unwrap().has_adapter());
}

/// Test: A headless configuration has no visualizer.
#[test]
fn test_headless_config() {
    let set = BackendRegistry::with_builtin()
        .create_from_config(&RuntimeConfig::headless().timestep(0.002))
        .expect("backends");
    assert!(set.visualizer().is_none());
    assert_relative_eq!(set.timestep(), 0.002);
}

/// Test: Unregistered ids are rejected.
#[test]
fn test_unknown_backend() {
    let registry = BackendRegistry::with_builtin();
    let err = registry
        .create_from_config(&RuntimeConfig::headless().physics("mujoco"))
        .unwrap_err();
    assert_eq!(err, KintreeError::UnknownBackend("mujoco".to_string()));

    let err = registry
        .create_from_config(&RuntimeConfig::headless().visualizer("ogre"))
        .unwrap_err();
    assert!(matches!(err, KintreeError::UnknownBackend(id) if id == "ogre"));
}

/// Test: A visualizer cannot fill the physics slot and vice versa.
#[test]
fn test_kind_mismatch() {
    let registry = BackendRegistry::with_builtin();
    let err = registry
        .create_from_config(&RuntimeConfig::headless().physics("null-viz"))
        .unwrap_err();
    assert!(matches!(
        err,
        KintreeError::BackendKindMismatch { expected: "physics", found: "visualizer", .. }
    ));

    let err = registry
        .create_from_config(&RuntimeConfig::headless().visualizer("null"))
        .unwrap_err();
    assert!(matches!(err, KintreeError::BackendKindMismatch { .. }));
}

/// Test: Invalid configurations fail before any backend is created.
#[test]
fn test_invalid_config() {
    let registry = BackendRegistry::with_builtin();
    let err = registry
        .create_from_config(&RuntimeConfig::headless().timestep(0.0))
        .unwrap_err();
    assert!(matches!(
        err,
        KintreeError::Config(ConfigError::InvalidTimestep(_))
    ));

    let err = registry
        .create_from_config(&RuntimeConfig::headless().physics("  "))
        .unwrap_err();
    assert!(matches!(err, KintreeError::Config(ConfigError::InvalidConfig { .. })));
}

/// Test: The null physics backend refuses an empty tree.
#[test]
fn test_empty_tree_rejected() {
    let mut set = BackendRegistry::with_builtin()
        .create_from_config(&RuntimeConfig::headless())
        .expect("backends");
    let mut tree = KinematicTree::new("empty");
    assert_eq!(set.build(&mut tree).unwrap_err(), KintreeError::EmptyTree);
    assert_eq!(tree.state(), LifecycleState::Uninitialized);
}

/// Test: Custom backends are created by id like the built-in ones.
#[test]
fn test_custom_backend_registration() {
    let steps = Rc::new(Cell::new(0));
    let built = Rc::new(Cell::new(0));
    let mut registry = BackendRegistry::with_builtin();
    {
        let (steps, built) = (Rc::clone(&steps), Rc::clone(&built));
        registry.register("counting", move || {
            Box::new(CountingPhysics {
                steps: Rc::clone(&steps),
                built: Rc::clone(&built),
            })
        });
    }
    assert_eq!(
        registry.ids().collect::<Vec<_>>(),
        ["counting", "null", "null-viz"]
    );

    let mut set = registry
        .create_from_config(&RuntimeConfig::null_with_viz().physics("counting"))
        .expect("backends");
    let mut tree = KinematicTree::new("single");
    tree.add_root(Body::new("only")).expect("root");
    set.build(&mut tree).expect("build");
    set.step(&mut tree);
    set.step(&mut tree);

    assert_eq!(built.get(), 1);
    assert_eq!(steps.get(), 2);
    assert_eq!(tree.root_body().unwrap().name(), "only");
}
