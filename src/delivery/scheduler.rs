//! Per-target retry loop.

use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{
    AttemptOutcome, CorrelationId, DeliveryAttempt, DeliveryOutcome, DeliveryPayload, Executor,
};
use crate::target::WebhookTarget;
use crate::time::{Clock, Sleeper, SystemClock, TokioSleeper};
use crate::webhook::HttpClient;

/// Drives one delivery stream to its terminal outcome.
///
/// Attempts run strictly one after another. A transient failure is retried
/// after the target's backoff delay until `max_attempts` is reached; success
/// and permanent failure end the stream at once.
///
/// Both the network call and the backoff wait race the shutdown token. When
/// it fires, the stream ends as [`DeliveryOutcome::Exhausted`] with the
/// attempts made so far, the interrupted call included.
pub struct RetryScheduler<H, S = TokioSleeper, C = SystemClock> {
    executor: Executor<H, C>,
    sleeper: S,
    shutdown: CancellationToken,
}

impl<H: HttpClient, C: Clock> RetryScheduler<H, TokioSleeper, C> {
    /// Creates a scheduler that sleeps on the tokio timer.
    pub fn new(executor: Executor<H, C>) -> Self {
        Self {
            executor,
            sleeper: TokioSleeper,
            shutdown: CancellationToken::new(),
        }
    }
}

impl<H, S, C> RetryScheduler<H, S, C>
where
    H: HttpClient,
    S: Sleeper,
    C: Clock,
{
    /// Replaces the backoff sleeper.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> RetryScheduler<H, S2, C> {
        RetryScheduler {
            executor: self.executor,
            sleeper,
            shutdown: self.shutdown,
        }
    }

    /// Uses an externally owned shutdown token.
    #[must_use]
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub const fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub const fn executor(&self) -> &Executor<H, C> {
        &self.executor
    }

    /// Runs attempts against `target` until a terminal outcome is reached.
    pub async fn schedule(
        &self,
        target: &Arc<WebhookTarget>,
        payload: &DeliveryPayload,
        correlation_id: &CorrelationId,
    ) -> DeliveryOutcome {
        let policy = target.retry_policy();
        let mut attempts = Vec::new();
        let mut attempt_number = 1;

        loop {
            if self.shutdown.is_cancelled() {
                return interrupted(target, attempts);
            }

            let started_at = self.executor.clock().now();
            let start = Instant::now();

            let attempt = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => {
                    attempts.push(DeliveryAttempt::interrupted(
                        Arc::clone(target),
                        attempt_number,
                        started_at,
                        start.elapsed(),
                    ));
                    return interrupted(target, attempts);
                }
                attempt = self.executor.execute(target, payload, correlation_id, attempt_number) => attempt,
            };

            match attempt.outcome {
                AttemptOutcome::Success => {
                    tracing::info!(
                        target = target.name(),
                        attempt = attempt_number,
                        failed_attempts = attempts.len(),
                        last_error = attempts.last().and_then(|a| a.error_detail.as_deref()),
                        status = attempt.http_status,
                        "Webhook delivered"
                    );
                    return DeliveryOutcome::Delivered(attempt);
                }
                AttemptOutcome::PermanentFailure => {
                    attempts.push(attempt);
                    tracing::error!(
                        target = target.name(),
                        attempt = attempt_number,
                        "Webhook delivery failed permanently"
                    );
                    return DeliveryOutcome::Exhausted(attempts);
                }
                AttemptOutcome::TransientFailure => attempts.push(attempt),
            }

            if !policy.should_retry(attempt_number) {
                tracing::error!(
                    target = target.name(),
                    attempts = attempt_number,
                    "Webhook delivery exhausted all retries"
                );
                return DeliveryOutcome::Exhausted(attempts);
            }

            let delay = policy.delay_before_retry(attempt_number);
            tracing::debug!(
                target = target.name(),
                attempt = attempt_number,
                max_attempts = policy.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retrying webhook after delay"
            );

            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return interrupted(target, attempts),
                () = self.sleeper.sleep(delay) => {}
            }

            attempt_number += 1;
        }
    }
}

fn interrupted(target: &WebhookTarget, attempts: Vec<DeliveryAttempt>) -> DeliveryOutcome {
    tracing::warn!(
        target = target.name(),
        attempts = attempts.len(),
        "Webhook delivery interrupted by shutdown"
    );
    DeliveryOutcome::Exhausted(attempts)
}
