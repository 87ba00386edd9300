//! Validated configuration after merging CLI, environment and TOML sources.
//!
//! All validation happens during construction: a [`ValidatedConfig`] holds
//! only targets that a [`Registry`](crate::target::Registry) will accept.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use crate::target::{TargetDefaults, TargetDefinition, WebhookTarget};

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Targets in registration order: file targets, then the CLI `default`
    pub targets: Vec<WebhookTarget>,

    /// Outcome history size
    pub history_capacity: NonZeroUsize,

    /// Time to wait for in-flight deliveries on shutdown
    pub shutdown_grace: Duration,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.targets.iter().map(WebhookTarget::name).collect();

        write!(
            f,
            "Config {{ targets: [{}], history_capacity: {}, shutdown_grace: {}ms }}",
            names.join(", "),
            self.history_capacity,
            self.shutdown_grace.as_millis(),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments (and their environment variables) take precedence over
    /// TOML values; the CLI method, timeout and retry settings also replace
    /// `[defaults]` for every file target that does not set them.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Two file targets share a name
    /// - A target has an invalid URL, method, header, template, timeout or retry count
    /// - A `--header` value is not `Key=Value` or `Key: Value`
    /// - `history_capacity` or `shutdown_grace_ms` is zero
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let target_defaults = Self::merge_defaults(cli, toml);

        let mut targets = Self::resolve_file_targets(toml, &target_defaults)?;

        if let Some(target) = Self::resolve_cli_target(cli, &target_defaults)? {
            // The CLI target replaces a file target of the same name.
            targets.retain(|t| t.name() != target.name());
            targets.push(target);
        }

        let history_capacity = Self::resolve_history_capacity(cli, toml)?;
        let shutdown_grace = Self::resolve_shutdown_grace(cli, toml)?;

        Ok(Self {
            targets,
            history_capacity,
            shutdown_grace,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn merge_defaults(cli: &Cli, toml: Option<&TomlConfig>) -> TargetDefaults {
        let file = toml.map(|t| &t.defaults);

        // Priority: CLI explicit > TOML > built-in (applied in TargetDefinition::resolve)
        TargetDefaults {
            method: cli
                .method
                .clone()
                .or_else(|| file.and_then(|d| d.method.clone())),
            timeout_ms: cli.timeout_ms.or_else(|| file.and_then(|d| d.timeout_ms)),
            retry_max_attempts: cli
                .retry_max
                .or_else(|| file.and_then(|d| d.retry_max_attempts)),
            retry_delay_ms: cli
                .retry_delay_ms
                .or_else(|| file.and_then(|d| d.retry_delay_ms)),
            backoff: cli.backoff.or_else(|| file.and_then(|d| d.backoff)),
            headers: file.map(|d| d.headers.clone()).unwrap_or_default(),
        }
    }

    fn resolve_file_targets(
        toml: Option<&TomlConfig>,
        target_defaults: &TargetDefaults,
    ) -> Result<Vec<WebhookTarget>, ConfigError> {
        let Some(toml) = toml else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::new();
        toml.targets
            .iter()
            .map(|definition| {
                if !seen.insert(definition.name.as_str()) {
                    return Err(ConfigError::DuplicateTarget(definition.name.clone()));
                }
                Ok(definition.resolve(target_defaults)?)
            })
            .collect()
    }

    fn resolve_cli_target(
        cli: &Cli,
        target_defaults: &TargetDefaults,
    ) -> Result<Option<WebhookTarget>, ConfigError> {
        let Some(ref url) = cli.url else {
            return Ok(None);
        };

        let mut definition = TargetDefinition::new(defaults::DEFAULT_TARGET_NAME, url);
        definition.headers = parse_cli_headers(&cli.headers)?;
        definition.bearer.clone_from(&cli.bearer);

        Ok(Some(definition.resolve(target_defaults)?))
    }

    fn resolve_history_capacity(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<NonZeroUsize, ConfigError> {
        let Some(capacity) = cli
            .history_capacity
            .or_else(|| toml.and_then(|t| t.delivery.history_capacity))
        else {
            return Ok(defaults::HISTORY_CAPACITY);
        };

        NonZeroUsize::new(capacity).ok_or_else(|| ConfigError::InvalidValue {
            field: field::HISTORY_CAPACITY,
            reason: "must be greater than 0".to_string(),
        })
    }

    fn resolve_shutdown_grace(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Duration, ConfigError> {
        let millis = cli
            .shutdown_grace_ms
            .or_else(|| toml.and_then(|t| t.delivery.shutdown_grace_ms))
            .unwrap_or(defaults::SHUTDOWN_GRACE_MS);

        if millis == 0 {
            return Err(ConfigError::InvalidValue {
                field: field::SHUTDOWN_GRACE,
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_millis(millis))
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file exists and `force` is false, or if it
/// cannot be written.
pub fn write_default_config(path: &Path, force: bool) -> Result<(), ConfigError> {
    if !force && path.exists() {
        return Err(ConfigError::FileExists {
            path: path.to_path_buf(),
        });
    }

    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_cli_headers(raw: &[String]) -> Result<BTreeMap<String, String>, ConfigError> {
    raw.iter().map(|s| parse_header_string(s)).collect()
}

fn parse_header_string(s: &str) -> Result<(String, String), ConfigError> {
    // Try "Key=Value" format first
    if let Some((name, value)) = s.split_once('=') {
        return Ok((name.trim().to_string(), value.trim().to_string()));
    }

    // Try "Key: Value" format
    if let Some((name, value)) = s.split_once(':') {
        return Ok((name.trim().to_string(), value.trim().to_string()));
    }

    Err(ConfigError::InvalidHeader {
        value: s.to_string(),
    })
}
