//! Default values for configuration options.
//!
//! Per-target defaults (method, timeout, retry policy) live on
//! [`WebhookTarget`](crate::target::WebhookTarget) and
//! [`RetryPolicy`](crate::target::RetryPolicy).

use std::num::NonZeroUsize;

/// Name of the target defined by `--url` / `DEFAULT_WEBHOOK_URL`.
pub const DEFAULT_TARGET_NAME: &str = "default";

/// Default number of outcomes kept for diagnostic queries.
pub const HISTORY_CAPACITY: NonZeroUsize = crate::delivery::OutcomeReporter::DEFAULT_CAPACITY;

/// Default shutdown grace period in milliseconds.
pub const SHUTDOWN_GRACE_MS: u64 = 30_000;
