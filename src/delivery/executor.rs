//! One HTTP call against one target.

use std::sync::Arc;
use std::time::SystemTime;

use handlebars::Handlebars;
use http::HeaderValue;
use http::header::{CONTENT_TYPE, HeaderName};
use serde_json::json;
use tokio::time::Instant;

use super::{AttemptOutcome, CorrelationId, DeliveryAttempt, DeliveryPayload};
use crate::target::{WebhookTarget, template};
use crate::time::{Clock, SystemClock, rfc3339};
use crate::webhook::{HttpClient, HttpError, HttpRequest};

/// Header carrying the correlation id on every outbound call.
pub const CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Performs single delivery attempts.
///
/// Stateless apart from the shared HTTP client: it never retries and never
/// touches shared state. The target's timeout is enforced as a hard deadline
/// around the whole call, independent of what the client does with the
/// timeout it is handed.
pub struct Executor<H, C = SystemClock> {
    client: H,
    clock: C,
    templates: Handlebars<'static>,
}

impl<H: HttpClient> Executor<H> {
    /// Creates an executor using the system clock.
    pub fn new(client: H) -> Self {
        Self::with_clock(client, SystemClock)
    }
}

impl<H: HttpClient, C: Clock> Executor<H, C> {
    /// Creates an executor with a custom clock for attempt timestamps.
    pub fn with_clock(client: H, clock: C) -> Self {
        Self {
            client,
            clock,
            templates: template::engine(),
        }
    }

    pub const fn client(&self) -> &H {
        &self.client
    }

    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Sends `payload` to `target` once and classifies the result.
    ///
    /// Never fails: transport errors, timeouts and unrenderable templates
    /// all become attempt records.
    pub async fn execute(
        &self,
        target: &Arc<WebhookTarget>,
        payload: &DeliveryPayload,
        correlation_id: &CorrelationId,
        attempt_number: u32,
    ) -> DeliveryAttempt {
        let started_at = self.clock.now();
        let start = Instant::now();

        let request =
            match self.build_request(target, payload, correlation_id, attempt_number, started_at) {
                Ok(request) => request,
                Err(detail) => {
                    tracing::error!(
                        target = target.name(),
                        attempt = attempt_number,
                        error = %detail,
                        "Could not build webhook request"
                    );
                    return DeliveryAttempt::rejected_locally(
                        Arc::clone(target),
                        attempt_number,
                        started_at,
                        detail,
                    );
                }
            };

        tracing::trace!(
            target = target.name(),
            attempt = attempt_number,
            method = %request.method,
            url = %request.url,
            "Sending webhook"
        );

        let result = tokio::time::timeout(target.timeout(), self.client.request(request))
            .await
            .unwrap_or(Err(HttpError::Timeout));
        let elapsed = start.elapsed();

        let attempt = match result {
            Ok(response) => DeliveryAttempt::responded(
                Arc::clone(target),
                attempt_number,
                started_at,
                elapsed,
                response.status,
            ),
            Err(ref error) => {
                DeliveryAttempt::failed(Arc::clone(target), attempt_number, started_at, elapsed, error)
            }
        };

        log_attempt(&attempt);
        attempt
    }

    fn build_request(
        &self,
        target: &WebhookTarget,
        payload: &DeliveryPayload,
        correlation_id: &CorrelationId,
        attempt_number: u32,
        started_at: SystemTime,
    ) -> Result<HttpRequest, String> {
        let mut request =
            HttpRequest::new(target.method().as_http(), target.url().clone()).with_timeout(target.timeout());

        let content_type = HeaderValue::from_str(payload.content_type())
            .map_err(|e| format!("invalid payload content type: {e}"))?;
        request.headers.insert(CONTENT_TYPE, content_type);

        // Target headers may override the payload's content type.
        for (name, value) in target.headers() {
            request.headers.insert(name.clone(), value.clone());
        }

        let correlation = HeaderValue::from_str(correlation_id.as_str())
            .map_err(|e| format!("invalid correlation id: {e}"))?;
        request.headers.insert(CORRELATION_HEADER, correlation);

        let body = match target.body_template() {
            Some(tmpl) => self
                .render(tmpl, target, payload, correlation_id, attempt_number, started_at)?
                .into_bytes(),
            None => payload.to_bytes(),
        };

        Ok(request.with_body(body))
    }

    fn render(
        &self,
        tmpl: &str,
        target: &WebhookTarget,
        payload: &DeliveryPayload,
        correlation_id: &CorrelationId,
        attempt_number: u32,
        started_at: SystemTime,
    ) -> Result<String, String> {
        let payload_value = match payload {
            DeliveryPayload::Json(value) => value.clone(),
            DeliveryPayload::Raw { body, .. } => {
                serde_json::Value::String(String::from_utf8_lossy(body).into_owned())
            }
        };

        let context = json!({
            "payload": payload_value,
            "correlation_id": correlation_id,
            "target": target.name(),
            "attempt": attempt_number,
            "timestamp": rfc3339(started_at),
        });

        self.templates
            .render_template(tmpl, &context)
            .map_err(|e| format!("body template failed to render: {e}"))
    }
}

fn log_attempt(attempt: &DeliveryAttempt) {
    let name = attempt.target.name();
    let detail = attempt.error_detail.as_deref().unwrap_or_default();
    let elapsed_ms = u64::try_from(attempt.elapsed.as_millis()).unwrap_or(u64::MAX);

    match attempt.outcome {
        AttemptOutcome::Success => tracing::debug!(
            target = name,
            attempt = attempt.attempt_number,
            status = attempt.http_status,
            elapsed_ms,
            "Webhook attempt succeeded"
        ),
        AttemptOutcome::TransientFailure => tracing::warn!(
            target = name,
            attempt = attempt.attempt_number,
            status = attempt.http_status,
            elapsed_ms,
            error = detail,
            "Webhook attempt failed, retryable"
        ),
        AttemptOutcome::PermanentFailure => tracing::error!(
            target = name,
            attempt = attempt.attempt_number,
            status = attempt.http_status,
            elapsed_ms,
            error = detail,
            "Webhook attempt rejected, not retrying"
        ),
    }
}
