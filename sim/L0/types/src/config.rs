//! Configuration types for parsing and runtime.
//!
//! [`ParseConfig`] controls how documents are loaded and assembled (schema
//! policy, asset directory, tree naming). [`RuntimeConfig`] selects the
//! backends a scene binds to at simulation start.

use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What the loader does with elements or attributes the schema does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SchemaPolicy {
    /// Skip the unknown item and log a warning.
    #[default]
    Lenient,
    /// Fail the whole load with a schema violation.
    Strict,
}

impl SchemaPolicy {
    /// Whether unknown items abort the load.
    #[must_use]
    pub const fn is_strict(self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// Options shared by the document loader and both dialect parsers.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParseConfig {
    /// Unknown element/attribute handling.
    pub policy: SchemaPolicy,
    /// Directory asset paths are resolved against. When unset, the folder of
    /// the loaded file is used (or nothing, for documents parsed from text).
    pub working_dir: Option<PathBuf>,
    /// Name of the assembled tree. Defaults to the document's model/robot name.
    pub tree_name: Option<String>,
}

impl ParseConfig {
    /// Lenient configuration (the default).
    #[must_use]
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Strict configuration: unknown elements and attributes are errors.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            policy: SchemaPolicy::Strict,
            ..Default::default()
        }
    }

    /// Set the unknown-item policy.
    #[must_use]
    pub fn policy(mut self, policy: SchemaPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the asset working directory.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Override the tree name.
    #[must_use]
    pub fn tree_name(mut self, name: impl Into<String>) -> Self {
        self.tree_name = Some(name.into());
        self
    }

    /// Resolve an asset reference against the working directory.
    ///
    /// Absolute paths are returned unchanged. `fallback` is used when no
    /// working directory is configured.
    #[must_use]
    pub fn resolve_asset(&self, reference: &str, fallback: Option<&Path>) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.working_dir.as_deref().or(fallback) {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(name) = &self.tree_name {
            if name.trim().is_empty() {
                return Err(ConfigError::invalid("tree name must not be blank"));
            }
        }
        Ok(())
    }
}

/// Backend selection for a running scene.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuntimeConfig {
    /// Registry id of the physics backend.
    pub physics_backend: String,
    /// Registry id of the visualizer backend, if any.
    pub visualizer_backend: Option<String>,
    /// Step size handed to backends (seconds).
    pub timestep: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::headless()
    }
}

impl RuntimeConfig {
    /// Null physics backend, no visualizer.
    #[must_use]
    pub fn headless() -> Self {
        Self {
            physics_backend: "null".to_string(),
            visualizer_backend: None,
            timestep: 1.0 / 240.0,
        }
    }

    /// Null physics backend plus the null visualizer.
    #[must_use]
    pub fn null_with_viz() -> Self {
        Self {
            visualizer_backend: Some("null-viz".to_string()),
            ..Self::headless()
        }
    }

    /// Select the physics backend.
    #[must_use]
    pub fn physics(mut self, id: impl Into<String>) -> Self {
        self.physics_backend = id.into();
        self
    }

    /// Select the visualizer backend.
    #[must_use]
    pub fn visualizer(mut self, id: impl Into<String>) -> Self {
        self.visualizer_backend = Some(id.into());
        self
    }

    /// Set the timestep.
    #[must_use]
    pub fn timestep(mut self, timestep: f64) -> Self {
        self.timestep = timestep;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.physics_backend.trim().is_empty() {
            return Err(ConfigError::invalid("physics backend id must not be blank"));
        }
        if let Some(viz) = &self.visualizer_backend {
            if viz.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "visualizer backend id must not be blank",
                ));
            }
        }
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(ConfigError::InvalidTimestep(self.timestep));
        }
        Ok(())
    }
}
