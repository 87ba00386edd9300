//! Single-attempt records and status classification.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use http::StatusCode;
use serde::{Serialize, Serializer};

use crate::target::WebhookTarget;
use crate::webhook::HttpError;

/// Error detail recorded when an attempt hits its deadline.
pub const TIMEOUT_DETAIL: &str = "timeout";

/// Error detail recorded when shutdown interrupts an attempt.
pub const CANCELLED_DETAIL: &str = "cancelled by shutdown";

/// How one attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// 2xx response.
    Success,
    /// Worth retrying: network error, timeout, 408, 429 or 5xx.
    TransientFailure,
    /// Retrying cannot help: any other non-2xx status, or a request that
    /// could not be built.
    PermanentFailure,
}

/// Maps a transport result onto an [`AttemptOutcome`].
pub trait Classify {
    fn classify(&self) -> AttemptOutcome;
}

impl Classify for StatusCode {
    fn classify(&self) -> AttemptOutcome {
        if self.is_success() {
            AttemptOutcome::Success
        } else if *self == Self::REQUEST_TIMEOUT
            || *self == Self::TOO_MANY_REQUESTS
            || self.is_server_error()
        {
            AttemptOutcome::TransientFailure
        } else {
            // 4xx, plus 1xx/3xx that reqwest did not resolve itself.
            AttemptOutcome::PermanentFailure
        }
    }
}

impl Classify for HttpError {
    fn classify(&self) -> AttemptOutcome {
        match self {
            Self::Connection(_) | Self::Timeout => AttemptOutcome::TransientFailure,
            Self::InvalidUrl(_) => AttemptOutcome::PermanentFailure,
        }
    }
}

/// Record of one HTTP call against one target.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryAttempt {
    #[serde(serialize_with = "serialize_target_name")]
    pub target: Arc<WebhookTarget>,

    /// 1-based attempt number within its stream
    pub attempt_number: u32,

    #[serde(serialize_with = "crate::time::serialize_rfc3339")]
    pub started_at: SystemTime,

    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,

    pub outcome: AttemptOutcome,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl DeliveryAttempt {
    /// An attempt that got a response.
    #[must_use]
    pub fn responded(
        target: Arc<WebhookTarget>,
        attempt_number: u32,
        started_at: SystemTime,
        elapsed: Duration,
        status: StatusCode,
    ) -> Self {
        let outcome = status.classify();
        let error_detail = (outcome != AttemptOutcome::Success).then(|| {
            format!(
                "HTTP {}{}",
                status.as_u16(),
                status
                    .canonical_reason()
                    .map(|r| format!(" {r}"))
                    .unwrap_or_default()
            )
        });

        Self {
            target,
            attempt_number,
            started_at,
            elapsed,
            outcome,
            http_status: Some(status.as_u16()),
            error_detail,
        }
    }

    /// An attempt that produced no response.
    #[must_use]
    pub fn failed(
        target: Arc<WebhookTarget>,
        attempt_number: u32,
        started_at: SystemTime,
        elapsed: Duration,
        error: &HttpError,
    ) -> Self {
        let detail = match error {
            HttpError::Timeout => TIMEOUT_DETAIL.to_string(),
            other => other.to_string(),
        };

        Self {
            target,
            attempt_number,
            started_at,
            elapsed,
            outcome: error.classify(),
            http_status: None,
            error_detail: Some(detail),
        }
    }

    /// An attempt that could not be sent at all, e.g. a body template that
    /// failed to render.
    #[must_use]
    pub fn rejected_locally(
        target: Arc<WebhookTarget>,
        attempt_number: u32,
        started_at: SystemTime,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            target,
            attempt_number,
            started_at,
            elapsed: Duration::ZERO,
            outcome: AttemptOutcome::PermanentFailure,
            http_status: None,
            error_detail: Some(detail.into()),
        }
    }

    /// An attempt abandoned because the dispatcher is shutting down.
    #[must_use]
    pub fn interrupted(
        target: Arc<WebhookTarget>,
        attempt_number: u32,
        started_at: SystemTime,
        elapsed: Duration,
    ) -> Self {
        Self {
            target,
            attempt_number,
            started_at,
            elapsed,
            outcome: AttemptOutcome::TransientFailure,
            http_status: None,
            error_detail: Some(CANCELLED_DETAIL.to_string()),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == AttemptOutcome::Success
    }
}

fn serialize_target_name<S: Serializer>(
    target: &Arc<WebhookTarget>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(target.name())
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
