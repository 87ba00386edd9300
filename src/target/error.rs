//! Error types for target configuration and lookup.

use thiserror::Error;

/// Error type for registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A target definition is malformed, or conflicts with an already
    /// registered target of the same name.
    #[error("Invalid configuration for target '{target}': {reason}")]
    InvalidConfiguration {
        /// Name of the offending target
        target: String,
        /// What is wrong with it
        reason: String,
    },

    /// No target with this name is registered.
    #[error("Unknown target '{0}'")]
    UnknownTarget(String),
}

impl RegistryError {
    /// Creates an `InvalidConfiguration` error.
    #[must_use]
    pub fn invalid(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            target: target.into(),
            reason: reason.into(),
        }
    }
}
