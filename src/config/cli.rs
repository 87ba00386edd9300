//! CLI argument parsing using clap.
//!
//! Top-level options are global so they may follow the subcommand. The
//! options describing the ad hoc `default` target also read the
//! `DEFAULT_WEBHOOK_*` environment variables.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::target::Backoff;

/// Asynchronous webhook delivery for OCR/PDF processing results
///
/// Delivers result payloads to configured HTTP targets with per-target
/// timeouts and retry with backoff.
#[derive(Debug, Parser)]
#[command(name = "ocr-hook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(long, short, global = true, env = "OCR_HOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// URL of the ad hoc `default` target
    #[arg(long, global = true, env = "DEFAULT_WEBHOOK_URL")]
    pub url: Option<String>,

    /// HTTP method (POST, GET or PUT); also the default for file targets
    #[arg(long, global = true, env = "DEFAULT_WEBHOOK_METHOD")]
    pub method: Option<String>,

    /// Per-attempt timeout in milliseconds; also the default for file targets
    #[arg(long = "timeout-ms", global = true, env = "DEFAULT_WEBHOOK_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum attempts including the first; also the default for file targets
    #[arg(long = "retry-max", global = true, env = "DEFAULT_WEBHOOK_RETRY_ATTEMPTS")]
    pub retry_max: Option<u32>,

    /// Base retry delay in milliseconds; also the default for file targets
    #[arg(
        long = "retry-delay-ms",
        global = true,
        env = "DEFAULT_WEBHOOK_RETRY_DELAY_MS"
    )]
    pub retry_delay_ms: Option<u64>,

    /// Backoff mode: linear, exponential or fixed
    #[arg(long, global = true)]
    pub backoff: Option<Backoff>,

    /// Header for the `default` target in 'Key=Value' or 'Key: Value' format (repeatable)
    #[arg(long = "header", value_name = "K=V", global = true)]
    pub headers: Vec<String>,

    /// Bearer token for the `default` target
    #[arg(long, global = true, env = "DEFAULT_WEBHOOK_BEARER")]
    pub bearer: Option<String>,

    /// Number of outcomes kept in the diagnostic history
    #[arg(long = "history-capacity", global = true)]
    pub history_capacity: Option<usize>,

    /// Time to wait for in-flight deliveries on shutdown, in milliseconds
    #[arg(long = "shutdown-grace-ms", global = true)]
    pub shutdown_grace_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for ocr-hook
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "ocr-hook.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the registered targets as JSON
    Targets,

    /// Send the sample OCR result to one target and print the outcome
    Test {
        /// Target name
        #[arg(long, short)]
        target: String,
    },

    /// Deliver a JSON result file and print the outcomes
    Send {
        /// Path to the JSON payload
        #[arg(long, short)]
        payload: PathBuf,

        /// Target name (repeatable); defaults to every enabled target
        #[arg(long = "target", short, value_name = "NAME")]
        targets: Vec<String>,

        /// Correlation id; a UUID is generated if omitted
        #[arg(long = "correlation-id")]
        correlation_id: Option<String>,

        /// Wrap the payload in the standard result envelope
        #[arg(long)]
        envelope: bool,

        /// Original file name recorded in the envelope
        #[arg(long, requires = "envelope")]
        filename: Option<String>,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Command::Init { .. })
    }
}
