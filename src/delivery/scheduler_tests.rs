//! Tests for `RetryScheduler`.

use super::test_support::{MockClient, Reply, path, target};
use super::*;
use crate::target::{Backoff, RetryPolicy};
use crate::time::InstantSleeper;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn payload() -> DeliveryPayload {
    DeliveryPayload::Json(json!({"text": "hello"}))
}

fn cid() -> CorrelationId {
    CorrelationId::new("corr-1")
}

fn scheduler(client: &Arc<MockClient>) -> RetryScheduler<Arc<MockClient>> {
    RetryScheduler::new(Executor::new(Arc::clone(client)))
}

/// Offsets of each call from `start`.
fn offsets(client: &MockClient, start: Instant) -> Vec<Duration> {
    client.calls().iter().map(|c| c.at - start).collect()
}

fn ms(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_millis).collect()
}

mod linear_backoff {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn recovers_on_third_attempt_at_0_100_300() {
        let client = Arc::new(MockClient::ok().route(
            &path("A"),
            [Reply::Status(503), Reply::Status(503), Reply::Status(200)],
        ));
        let start = Instant::now();

        let outcome = scheduler(&client)
            .schedule(&target("A", 3, 100), &payload(), &cid())
            .await;

        assert_eq!(offsets(&client, start), ms(&[0, 100, 300]));
        assert_eq!(outcome.attempt_count(), 3);
        match outcome {
            DeliveryOutcome::Delivered(attempt) => {
                assert_eq!(attempt.attempt_number, 3);
                assert_eq!(attempt.http_status, Some(200));
            }
            other => panic!("expected Delivered, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_makes_exactly_k_attempts() {
        let client = Arc::new(MockClient::new(Reply::Status(503)));
        let start = Instant::now();

        let outcome = scheduler(&client)
            .schedule(&target("a", 4, 50), &payload(), &cid())
            .await;

        // Delays of 50 * i between attempt i and i + 1.
        assert_eq!(offsets(&client, start), ms(&[0, 50, 150, 300]));

        let DeliveryOutcome::Exhausted(attempts) = outcome else {
            panic!("expected Exhausted");
        };
        let numbers: Vec<_> = attempts.iter().map(|a| a.attempt_number).collect();
        assert_eq!(numbers, [1, 2, 3, 4]);
        assert!(
            attempts
                .iter()
                .all(|a| a.outcome == AttemptOutcome::TransientFailure)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn network_errors_are_retried() {
        let client = Arc::new(
            MockClient::ok().route(&path("a"), [Reply::Refused, Reply::Timeout]),
        );

        let outcome = scheduler(&client)
            .schedule(&target("a", 3, 10), &payload(), &cid())
            .await;

        assert!(outcome.is_delivered());
        assert_eq!(client.calls().len(), 3);
    }
}

mod terminal_on_first_attempt {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn success_needs_one_attempt_and_no_wait() {
        let client = Arc::new(MockClient::ok());
        let start = Instant::now();

        let outcome = scheduler(&client)
            .schedule(&target("a", 5, 1000), &payload(), &cid())
            .await;

        assert!(outcome.is_delivered());
        assert_eq!(client.calls().len(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_is_not_retried() {
        let client = Arc::new(MockClient::new(Reply::Status(404)));
        let start = Instant::now();

        let outcome = scheduler(&client)
            .schedule(&target("a", 5, 1000), &payload(), &cid())
            .await;

        let DeliveryOutcome::Exhausted(attempts) = outcome else {
            panic!("expected Exhausted");
        };
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].outcome, AttemptOutcome::PermanentFailure);
        assert_eq!(attempts[0].http_status, Some(404));
        assert_eq!(client.calls().len(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_policy_never_waits() {
        let client = Arc::new(MockClient::new(Reply::Status(500)));

        let outcome = scheduler(&client)
            .schedule(&target("a", 1, 1000), &payload(), &cid())
            .await;

        assert_eq!(outcome.attempt_count(), 1);
        assert!(outcome.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_after_transient_stops_immediately() {
        let client = Arc::new(
            MockClient::ok().route(&path("a"), [Reply::Status(503), Reply::Status(422)]),
        );

        let outcome = scheduler(&client)
            .schedule(&target("a", 5, 10), &payload(), &cid())
            .await;

        assert_eq!(outcome.attempt_count(), 2);
        assert_eq!(client.calls().len(), 2);
    }
}

mod other_backoff_modes {
    use super::*;

    fn target_with(backoff: Backoff) -> Arc<crate::target::WebhookTarget> {
        Arc::new((*target("a", 4, 100)).clone().with_retry_policy(
            RetryPolicy::new()
                .with_max_attempts(4)
                .with_delay(Duration::from_millis(100))
                .with_backoff(backoff),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn exponential_doubles_each_wait() {
        let client = Arc::new(MockClient::new(Reply::Status(503)));
        let start = Instant::now();

        scheduler(&client)
            .schedule(&target_with(Backoff::Exponential), &payload(), &cid())
            .await;

        assert_eq!(offsets(&client, start), ms(&[0, 100, 300, 700]));
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_waits_the_same_each_time() {
        let client = Arc::new(MockClient::new(Reply::Status(503)));
        let start = Instant::now();

        scheduler(&client)
            .schedule(&target_with(Backoff::Fixed), &payload(), &cid())
            .await;

        assert_eq!(offsets(&client, start), ms(&[0, 100, 200, 300]));
    }

    #[tokio::test(start_paused = true)]
    async fn instant_sleeper_skips_waits() {
        let client = Arc::new(MockClient::new(Reply::Status(503)));
        let start = Instant::now();

        let outcome = scheduler(&client)
            .with_sleeper(InstantSleeper)
            .schedule(&target("a", 3, 10_000), &payload(), &cid())
            .await;

        assert_eq!(outcome.attempt_count(), 3);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

mod shutdown {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancelling_during_backoff_keeps_attempts_made() {
        let client = Arc::new(MockClient::new(Reply::Status(503)));
        let token = CancellationToken::new();
        let scheduler = Arc::new(scheduler(&client).with_shutdown(token.clone()));
        let start = Instant::now();

        let handle = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move {
                scheduler
                    .schedule(&target("a", 5, 10_000), &payload(), &cid())
                    .await
            }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
        let outcome = handle.await.unwrap();

        let DeliveryOutcome::Exhausted(attempts) = outcome else {
            panic!("expected Exhausted");
        };
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].http_status, Some(503));
        assert_eq!(client.calls().len(), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_during_call_records_interrupted_attempt() {
        let client = Arc::new(MockClient::new(Reply::Hang));
        let token = CancellationToken::new();
        let scheduler = Arc::new(scheduler(&client).with_shutdown(token.clone()));

        let handle = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move {
                scheduler
                    .schedule(&target("a", 3, 100), &payload(), &cid())
                    .await
            }
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        token.cancel();
        let outcome = handle.await.unwrap();

        let DeliveryOutcome::Exhausted(attempts) = outcome else {
            panic!("expected Exhausted");
        };
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].error_detail.as_deref(), Some(CANCELLED_DETAIL));
        assert_eq!(attempts[0].elapsed, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn already_cancelled_makes_no_attempt() {
        let client = Arc::new(MockClient::ok());
        let token = CancellationToken::new();
        token.cancel();

        let outcome = scheduler(&client)
            .with_shutdown(token)
            .schedule(&target("a", 3, 100), &payload(), &cid())
            .await;

        assert!(outcome.is_exhausted());
        assert_eq!(outcome.attempt_count(), 0);
        assert!(client.calls().is_empty());
    }
}
