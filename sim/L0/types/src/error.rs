//! Error types for configuration values.

use thiserror::Error;

/// Errors reported by configuration validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
