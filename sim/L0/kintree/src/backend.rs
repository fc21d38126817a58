//! Backend selection.
//!
//! A backend owns the adapters it binds to a tree. Backends are created by
//! id through a [`BackendRegistry`], usually from a [`RuntimeConfig`]:
//!
//! ```
//! use sim_kintree::{BackendRegistry, KinematicTree, Body};
//! use sim_types::RuntimeConfig;
//!
//! let registry = BackendRegistry::with_builtin();
//! let mut set = registry.create_from_config(&RuntimeConfig::null_with_viz()).unwrap();
//!
//! let mut tree = KinematicTree::new("box");
//! tree.add_root(Body::new("box")).unwrap();
//! set.build(&mut tree).unwrap();
//! set.step(&mut tree);
//! set.teardown(&mut tree);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use sim_types::RuntimeConfig;

use crate::error::{KintreeError, Result};
use crate::null::{NullPhysics, NullVisualizer};
use crate::tree::KinematicTree;

/// What a backend drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Steps dynamics; binds body, joint, collider and tree adapters.
    Physics,
    /// Renders; binds drawable adapters.
    Visualizer,
}

impl BackendKind {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Physics => "physics",
            Self::Visualizer => "visualizer",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physics engine or visualizer that can be bound to kinematic trees.
pub trait Backend {
    /// Registry id.
    fn id(&self) -> &str;

    /// What this backend drives.
    fn kind(&self) -> BackendKind;

    /// Create adapters for every entity of `tree` and attach them.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be represented by this backend.
    fn build(&mut self, tree: &mut KinematicTree) -> Result<()>;

    /// Advance by `dt` seconds.
    fn step(&mut self, dt: f64);

    /// Detach `tree` and release the adapters created for it.
    fn teardown(&mut self, tree: &mut KinematicTree);
}

/// Constructor stored in a [`BackendRegistry`].
pub type BackendFactory = Box<dyn Fn() -> Box<dyn Backend>>;

/// Backends available by id.
#[derive(Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("ids", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BackendRegistry {
    /// Id of the built-in physics backend.
    pub const NULL_PHYSICS: &'static str = "null";

    /// Id of the built-in visualizer backend.
    pub const NULL_VISUALIZER: &'static str = "null-viz";

    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in null backends.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Self::NULL_PHYSICS, || Box::new(NullPhysics::new()));
        registry.register(Self::NULL_VISUALIZER, || Box::new(NullVisualizer::new()));
        registry
    }

    /// Register a backend constructor, replacing any previous one with the
    /// same id.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Backend> + 'static,
    {
        let id = id.into();
        if self.factories.insert(id.clone(), Box::new(factory)).is_some() {
            tracing::warn!(backend = %id, "backend re-registered, previous factory replaced");
        }
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate the backend registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not registered.
    pub fn create(&self, id: &str) -> Result<Box<dyn Backend>> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| KintreeError::UnknownBackend(id.to_string()))?;
        Ok(factory())
    }

    fn create_kind(&self, id: &str, expected: BackendKind) -> Result<Box<dyn Backend>> {
        let backend = self.create(id)?;
        if backend.kind() != expected {
            return Err(KintreeError::BackendKindMismatch {
                id: id.to_string(),
                expected: expected.as_str(),
                found: backend.kind().as_str(),
            });
        }
        Ok(backend)
    }

    /// Instantiate the backends named by a runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, an id is not
    /// registered, or a backend is of the wrong kind for its slot.
    pub fn create_from_config(&self, config: &RuntimeConfig) -> Result<BackendSet> {
        config.validate()?;
        let physics = self.create_kind(&config.physics_backend, BackendKind::Physics)?;
        let visualizer = config
            .visualizer_backend
            .as_deref()
            .map(|id| self.create_kind(id, BackendKind::Visualizer))
            .transpose()?;
        tracing::info!(
            physics = %config.physics_backend,
            visualizer = config.visualizer_backend.as_deref().unwrap_or("none"),
            timestep = config.timestep,
            "backends created"
        );
        Ok(BackendSet {
            physics,
            visualizer,
            timestep: config.timestep,
        })
    }
}

/// One physics backend and an optional visualizer, stepped together.
pub struct BackendSet {
    physics: Box<dyn Backend>,
    visualizer: Option<Box<dyn Backend>>,
    timestep: f64,
}

impl fmt::Debug for BackendSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSet")
            .field("physics", &self.physics.id())
            .field("visualizer", &self.visualizer.as_ref().map(|v| v.id()))
            .field("timestep", &self.timestep)
            .finish()
    }
}

impl BackendSet {
    /// Physics backend.
    #[must_use]
    pub fn physics(&self) -> &dyn Backend {
        self.physics.as_ref()
    }

    /// Visualizer backend, if configured.
    #[must_use]
    pub fn visualizer(&self) -> Option<&dyn Backend> {
        self.visualizer.as_deref()
    }

    /// Step size in seconds.
    #[must_use]
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Bind every backend to `tree`, then initialize it.
    ///
    /// # Errors
    ///
    /// Returns the first backend error; adapters bound before it stay bound.
    pub fn build(&mut self, tree: &mut KinematicTree) -> Result<()> {
        self.physics.build(tree)?;
        if let Some(viz) = self.visualizer.as_mut() {
            viz.build(tree)?;
        }
        tree.initialize();
        Ok(())
    }

    /// Run one step: push state, advance physics, pull state, render.
    pub fn step(&mut self, tree: &mut KinematicTree) {
        tree.pre_step();
        self.physics.step(self.timestep);
        tree.post_step();
        if let Some(viz) = self.visualizer.as_mut() {
            viz.step(self.timestep);
        }
    }

    /// Unbind every backend from `tree`.
    pub fn teardown(&mut self, tree: &mut KinematicTree) {
        if let Some(viz) = self.visualizer.as_mut() {
            viz.teardown(tree);
        }
        self.physics.teardown(tree);
    }
}
