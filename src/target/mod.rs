//! Webhook target registry.
//!
//! - Target model ([`WebhookTarget`], [`TargetMethod`])
//! - Retry policy ([`RetryPolicy`], [`Backoff`])
//! - Raw configuration form ([`TargetDefinition`], [`TargetDefaults`])
//! - Named storage ([`Registry`])
//! - Body template engine ([`template`])

mod definition;
mod error;
mod registry;
mod retry;
pub mod template;
mod webhook_target;


pub use definition::{TargetDefaults, TargetDefinition, parse_header_name, parse_header_value};
pub use error::RegistryError;
pub use registry::{Registry, RegistrySummary};
pub use retry::{Backoff, RetryPolicy};
pub use webhook_target::{TargetMethod, WebhookTarget, validate_url};
