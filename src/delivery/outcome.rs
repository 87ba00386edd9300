//! Terminal outcomes of delivery streams.

use std::fmt;

use serde::Serialize;

use super::DeliveryAttempt;

/// Why a stream was never attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail", rename_all = "kebab-case")]
pub enum RejectReason {
    /// The request addressed no targets.
    NoTargets,
    /// The named target is not registered.
    UnknownTarget(String),
    /// The named target is registered but disabled.
    TargetDisabled(String),
    /// An inline target failed validation.
    InvalidConfiguration(String),
    /// The dispatcher had already begun shutting down.
    ShuttingDown,
}

impl RejectReason {
    /// Stable machine-readable code, e.g. `"unknown-target"`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoTargets => "no-targets",
            Self::UnknownTarget(_) => "unknown-target",
            Self::TargetDisabled(_) => "target-disabled",
            Self::InvalidConfiguration(_) => "invalid-configuration",
            Self::ShuttingDown => "shutting-down",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTarget(detail)
            | Self::TargetDisabled(detail)
            | Self::InvalidConfiguration(detail) => write!(f, "{}: {detail}", self.code()),
            Self::NoTargets | Self::ShuttingDown => f.write_str(self.code()),
        }
    }
}

/// Terminal state of one (request, target) stream. Immutable once recorded.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// The receiver accepted the payload on this attempt.
    Delivered(DeliveryAttempt),
    /// Every attempt failed, a permanent failure stopped the stream, or
    /// shutdown interrupted it. Attempts are in order.
    Exhausted(Vec<DeliveryAttempt>),
    /// The stream never started.
    Rejected(RejectReason),
}

impl DeliveryOutcome {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }

    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Number of HTTP attempts made.
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        match self {
            Self::Delivered(attempt) => usize::try_from(attempt.attempt_number).unwrap_or(usize::MAX),
            Self::Exhausted(attempts) => attempts.len(),
            Self::Rejected(_) => 0,
        }
    }

    /// The last attempt made, if any.
    #[must_use]
    pub fn last_attempt(&self) -> Option<&DeliveryAttempt> {
        match self {
            Self::Delivered(attempt) => Some(attempt),
            Self::Exhausted(attempts) => attempts.last(),
            Self::Rejected(_) => None,
        }
    }

    /// `delivered`, `exhausted` or `rejected`.
    #[must_use]
    pub const fn state(&self) -> &'static str {
        match self {
            Self::Delivered(_) => "delivered",
            Self::Exhausted(_) => "exhausted",
            Self::Rejected(_) => "rejected",
        }
    }
}
