//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::target::RegistryError;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Refused to overwrite an existing file (for init command).
    #[error("Config file '{}' already exists; use --force to overwrite", path.display())]
    FileExists {
        /// Path to the config file
        path: PathBuf,
    },

    /// A target definition is invalid.
    #[error(transparent)]
    Target(#[from] RegistryError),

    /// Two targets in the file share a name.
    #[error("Duplicate target name '{0}'")]
    DuplicateTarget(String),

    /// Invalid header format.
    #[error("Invalid header format '{value}': expected 'Key=Value' or 'Key: Value'")]
    InvalidHeader {
        /// The invalid header string
        value: String,
    },

    /// Invalid numeric or duration value.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}

/// Well-known field names for `InvalidValue` errors.
pub mod field {
    /// Outcome history size.
    pub const HISTORY_CAPACITY: &str = "history_capacity";
    /// Shutdown grace period.
    pub const SHUTDOWN_GRACE: &str = "shutdown_grace_ms";
}
