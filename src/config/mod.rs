//! Configuration layer for ocr-hook.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments**
//! 2. **Environment variables** (`DEFAULT_WEBHOOK_*`, read by clap)
//! 3. **TOML config file**
//! 4. **Built-in defaults**
//!
//! # Targets
//!
//! File targets come from `[[targets]]` tables, each resolved against
//! `[defaults]`. `--url` (or `DEFAULT_WEBHOOK_URL`) adds one more target
//! named `default`, carrying `--header` and `--bearer`; it replaces a file
//! target of the same name.
//!
//! `--method`, `--timeout-ms`, `--retry-max`, `--retry-delay-ms` and
//! `--backoff` act as defaults: they apply to the `default` target and to
//! every file target that does not set the field itself. A value written on
//! a `[[targets]]` table always wins over them.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod cli_tests;
#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command};
pub use error::{ConfigError, field};
pub use toml::{DeliverySection, TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
