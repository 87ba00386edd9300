//! Delivery requests as handed to the dispatcher.

use std::sync::Arc;

use super::{CorrelationId, DeliveryPayload};
use crate::target::{Registry, WebhookTarget};

/// How a request addresses one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRef {
    /// A target registered under this name.
    Named(String),
    /// An ad hoc target supplied with the request; validated at dispatch.
    Inline(WebhookTarget),
}

impl TargetRef {
    /// Name used when recording the outcome for this reference.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Inline(target) => target.name(),
        }
    }
}

impl From<&str> for TargetRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for TargetRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<WebhookTarget> for TargetRef {
    fn from(target: WebhookTarget) -> Self {
        Self::Inline(target)
    }
}

/// One completed processing event to deliver.
///
/// Each entry in `targets` becomes its own delivery stream, duplicates
/// included.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    correlation_id: CorrelationId,
    payload: Arc<DeliveryPayload>,
    targets: Vec<TargetRef>,
}

impl DeliveryRequest {
    /// Creates a request with a fresh correlation id and no targets.
    #[must_use]
    pub fn new(payload: DeliveryPayload) -> Self {
        Self {
            correlation_id: CorrelationId::generate(),
            payload: Arc::new(payload),
            targets: Vec::new(),
        }
    }

    /// Creates a request addressed to every enabled target in `registry`.
    #[must_use]
    pub fn broadcast(registry: &Registry, payload: DeliveryPayload) -> Self {
        let targets = registry
            .active()
            .map(|t| TargetRef::Named(t.name().to_string()))
            .collect();

        Self {
            targets,
            ..Self::new(payload)
        }
    }

    /// Replaces the generated correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<CorrelationId>) -> Self {
        self.correlation_id = id.into();
        self
    }

    /// Appends one target.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<TargetRef>) -> Self {
        self.targets.push(target.into());
        self
    }

    /// Appends several targets.
    #[must_use]
    pub fn with_targets<I, T>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TargetRef>,
    {
        self.targets.extend(targets.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    #[must_use]
    pub const fn payload(&self) -> &Arc<DeliveryPayload> {
        &self.payload
    }

    #[must_use]
    pub fn targets(&self) -> &[TargetRef] {
        &self.targets
    }

    pub(crate) fn into_parts(self) -> (CorrelationId, Arc<DeliveryPayload>, Vec<TargetRef>) {
        (self.correlation_id, self.payload, self.targets)
    }
}
