//! Webhook delivery.
//!
//! Data flows one way:
//!
//! ```text
//! producer -> Dispatcher -> (per target) RetryScheduler -> Executor -> network
//!                 |                  |
//!                 +--------> OutcomeReporter <--------+
//! ```
//!
//! - [`Dispatcher`] fans a [`DeliveryRequest`] out into one task per target
//!   and returns immediately.
//! - [`RetryScheduler`] runs a target's attempts in sequence with backoff.
//! - [`Executor`] performs and classifies one HTTP call.
//! - [`OutcomeReporter`] keeps a bounded history of terminal outcomes for
//!   diagnostic queries.

mod attempt;
mod dispatcher;
pub mod envelope;
mod error;
mod executor;
mod outcome;
mod payload;
mod reporter;
mod request;
mod scheduler;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod scheduler_tests;

pub use attempt::{AttemptOutcome, CANCELLED_DETAIL, Classify, DeliveryAttempt, TIMEOUT_DETAIL};
pub use dispatcher::{ALL_TARGETS, Dispatcher, TestDeliveryReport};
pub use envelope::ResultEnvelope;
pub use error::DispatchError;
pub use executor::{CORRELATION_HEADER, Executor};
pub use outcome::{DeliveryOutcome, RejectReason};
pub use payload::{APPLICATION_JSON, CorrelationId, DeliveryPayload};
pub use reporter::{OutcomeRecord, OutcomeReporter, OutcomeSummary};
pub use request::{DeliveryRequest, TargetRef};
pub use scheduler::RetryScheduler;
