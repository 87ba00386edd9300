//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;
use crate::target::{TargetDefaults, TargetDefinition};

/// Root configuration structure from TOML file.
///
/// Every section is optional so a file may hold only targets, only
/// defaults, or nothing at all.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Delivery engine settings
    #[serde(default)]
    pub delivery: DeliverySection,

    /// Values applied to targets that do not set them
    #[serde(default)]
    pub defaults: TargetDefaults,

    /// Target definitions, in registration order
    #[serde(default)]
    pub targets: Vec<TargetDefinition>,
}

/// Delivery engine section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliverySection {
    /// Number of outcomes kept for diagnostic queries
    pub history_capacity: Option<usize>,

    /// Time to wait for in-flight deliveries on shutdown, in milliseconds
    pub shutdown_grace_ms: Option<u64>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# ocr-hook configuration file
#
# Priority: CLI flags > environment variables > this file > built-in defaults.

[delivery]
# Outcomes kept for diagnostic queries; oldest are evicted first (default: 1000)
history_capacity = 1000

# Time to wait for in-flight deliveries on shutdown (default: 30000)
shutdown_grace_ms = 30000

[defaults]
# Applied to every target that does not set the field itself.
# --method, --timeout-ms, --retry-max, --retry-delay-ms and --backoff override these.

# HTTP method: POST, GET or PUT (default: POST)
# method = "POST"

# Per-attempt deadline in milliseconds (default: 30000)
# timeout_ms = 30000

# Attempts including the first (default: 3)
# retry_max_attempts = 3

# Base delay between attempts in milliseconds (default: 1000)
# retry_delay_ms = 1000

# Backoff: "linear" (delay * attempt), "exponential" (delay * 2^(attempt-1))
# or "fixed" (default: linear)
# backoff = "linear"

# Headers sent to every target; a target's own headers win
# [defaults.headers]
# X-Source = "ocr"

# One [[targets]] table per receiver. Names must be unique.
#
# [[targets]]
# name = "n8n"
# url = "https://n8n.example.com/webhook/ocr"
# method = "POST"
# timeout_ms = 10000
# retry_max_attempts = 5
# retry_delay_ms = 500
# enabled = true
#
# Adds "Authorization: Bearer <token>"
# bearer = "your-token-here"
#
# Handlebars body template replacing the raw payload.
# Variables: {{payload}}, {{correlation_id}}, {{target}}, {{attempt}}, {{timestamp}}
# {{json value}} embeds any value as JSON.
# body_template = '{"text": "{{payload.full_text_content}}", "result": {{json payload}} }'
#
# [targets.headers]
# X-Api-Key = "secret"
"#
    .to_string()
}
