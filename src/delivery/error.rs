//! Errors surfaced synchronously by the dispatcher.
//!
//! Per-target delivery failures are never errors; they are recorded as
//! [`DeliveryOutcome`](super::DeliveryOutcome) values. Only the test
//! delivery entry point and shutdown report errors to their caller.

use std::time::Duration;

use thiserror::Error;

use crate::target::RegistryError;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The target could not be resolved.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The target exists but is disabled.
    #[error("Target '{0}' is disabled")]
    TargetDisabled(String),

    /// The dispatcher is shutting down and accepts no new work.
    #[error("Dispatcher is shutting down")]
    ShuttingDown,

    /// In-flight streams did not finish within the grace period.
    #[error("Shutdown timed out after {timeout:?} with deliveries still running")]
    ShutdownTimeout {
        /// Grace period that elapsed
        timeout: Duration,
    },
}
