//! Fan-out of delivery requests into concurrent per-target streams.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use super::{
    CorrelationId, DeliveryOutcome, DeliveryPayload, DeliveryRequest, DispatchError,
    OutcomeReporter, RejectReason, RetryScheduler, TargetRef,
};
use crate::target::{Registry, WebhookTarget};
use crate::time::{Clock, Sleeper, SystemClock, TokioSleeper};
use crate::webhook::HttpClient;

/// Target name under which request-wide rejections are recorded.
pub const ALL_TARGETS: &str = "*";

/// Result of [`Dispatcher::test_delivery`].
#[derive(Debug, Clone, Serialize)]
pub struct TestDeliveryReport {
    pub correlation_id: CorrelationId,
    pub target: String,
    pub outcome: DeliveryOutcome,
}

/// Accepts delivery requests and runs one stream per addressed target.
///
/// [`dispatch`](Self::dispatch) returns as soon as every stream is spawned.
/// Streams are independent tasks: a slow or failing target never delays
/// another. Every stream ends with exactly one outcome in the
/// [`OutcomeReporter`], including rejections that never reach the network.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use ocr_hook::delivery::{
///     DeliveryPayload, DeliveryRequest, Dispatcher, Executor, OutcomeReporter, RetryScheduler,
/// };
/// use ocr_hook::target::Registry;
/// use ocr_hook::webhook::ReqwestClient;
///
/// # async fn example(registry: Registry) -> Result<(), Box<dyn std::error::Error>> {
/// let scheduler = RetryScheduler::new(Executor::new(ReqwestClient::new()?));
/// let dispatcher = Dispatcher::new(
///     Arc::new(registry),
///     scheduler,
///     Arc::new(OutcomeReporter::default()),
/// );
///
/// let request = DeliveryRequest::new(DeliveryPayload::Json(serde_json::json!({"text": "hi"})))
///     .with_target("n8n");
/// let id = dispatcher.dispatch(request);
///
/// let outcomes = dispatcher.reporter().wait_for(&id, 1).await;
/// println!("{}", outcomes[0].outcome.state());
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<H, S = TokioSleeper, C = SystemClock> {
    registry: Arc<Registry>,
    scheduler: Arc<RetryScheduler<H, S, C>>,
    reporter: Arc<OutcomeReporter>,
    tracker: TaskTracker,
}

impl<H, S, C> Dispatcher<H, S, C>
where
    H: HttpClient + 'static,
    S: Sleeper + 'static,
    C: Clock + 'static,
{
    pub fn new(
        registry: Arc<Registry>,
        scheduler: RetryScheduler<H, S, C>,
        reporter: Arc<OutcomeReporter>,
    ) -> Self {
        Self {
            registry,
            scheduler: Arc::new(scheduler),
            reporter,
            tracker: TaskTracker::new(),
        }
    }

    pub const fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub const fn reporter(&self) -> &Arc<OutcomeReporter> {
        &self.reporter
    }

    /// Number of streams still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.scheduler.shutdown_token().is_cancelled()
    }

    /// Hands a request off to concurrent per-target streams.
    ///
    /// Never blocks on delivery and never fails. Problems with individual
    /// targets are recorded as [`DeliveryOutcome::Rejected`]:
    /// - no targets at all: `no-targets`, under [`ALL_TARGETS`]
    /// - name not registered: `unknown-target`
    /// - registered but disabled: `target-disabled`
    /// - inline target fails validation: `invalid-configuration`
    /// - after shutdown began: `shutting-down`
    ///
    /// Returns the request's correlation id for later queries.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, request: DeliveryRequest) -> CorrelationId {
        let (correlation_id, payload, targets) = request.into_parts();

        if targets.is_empty() {
            tracing::warn!(%correlation_id, "Delivery request has no targets");
            self.reject(&correlation_id, ALL_TARGETS, RejectReason::NoTargets);
            return correlation_id;
        }

        if self.is_shutting_down() {
            for target in &targets {
                self.reject(&correlation_id, target.name(), RejectReason::ShuttingDown);
            }
            return correlation_id;
        }

        tracing::info!(
            %correlation_id,
            targets = targets.len(),
            "Dispatching delivery"
        );

        for target_ref in &targets {
            match self.resolve(target_ref) {
                Ok(target) => self.spawn_stream(&correlation_id, target, Arc::clone(&payload)),
                Err(reason) => self.reject(&correlation_id, target_ref.name(), reason),
            }
        }

        correlation_id
    }

    /// Delivers `payload` to one registered target and waits for the
    /// terminal outcome.
    ///
    /// The outcome is also recorded in the reporter under a fresh
    /// correlation id.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Registry`] if the target is unknown
    /// - [`DispatchError::TargetDisabled`] if it is disabled
    /// - [`DispatchError::ShuttingDown`] after shutdown began
    pub async fn test_delivery(
        &self,
        name: &str,
        payload: DeliveryPayload,
    ) -> Result<TestDeliveryReport, DispatchError> {
        if self.is_shutting_down() {
            return Err(DispatchError::ShuttingDown);
        }

        let target = self.registry.resolve(name)?;
        if !target.is_enabled() {
            return Err(DispatchError::TargetDisabled(name.to_string()));
        }

        let correlation_id = CorrelationId::generate();
        tracing::info!(%correlation_id, target = name, "Sending test delivery");

        let span = tracing::info_span!("test_delivery", %correlation_id, target = name);
        let outcome = self
            .scheduler
            .schedule(&target, &payload, &correlation_id)
            .instrument(span)
            .await;

        self.reporter.record(&correlation_id, name, outcome.clone());

        Ok(TestDeliveryReport {
            correlation_id,
            target: name.to_string(),
            outcome,
        })
    }

    /// Waits for every stream spawned so far to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancels all streams and waits up to `grace` for them to record their
    /// outcomes.
    ///
    /// Later dispatches are rejected with `shutting-down`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ShutdownTimeout`] if streams are still
    /// running when `grace` elapses.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), DispatchError> {
        tracing::info!(
            in_flight = self.tracker.len(),
            grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
            "Shutting down dispatcher"
        );

        self.scheduler.shutdown_token().cancel();
        self.tracker.close();

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            tracing::info!("Dispatcher stopped");
            Ok(())
        } else {
            tracing::error!(
                in_flight = self.tracker.len(),
                "Dispatcher shutdown timed out"
            );
            Err(DispatchError::ShutdownTimeout { timeout: grace })
        }
    }

    fn resolve(&self, target_ref: &TargetRef) -> Result<Arc<WebhookTarget>, RejectReason> {
        let target = match target_ref {
            TargetRef::Named(name) => self
                .registry
                .resolve(name)
                .map_err(|_| RejectReason::UnknownTarget(name.clone()))?,
            TargetRef::Inline(target) => {
                target
                    .validate()
                    .map_err(|e| RejectReason::InvalidConfiguration(e.to_string()))?;
                Arc::new(target.clone())
            }
        };

        if !target.is_enabled() {
            return Err(RejectReason::TargetDisabled(target.name().to_string()));
        }
        Ok(target)
    }

    fn spawn_stream(
        &self,
        correlation_id: &CorrelationId,
        target: Arc<WebhookTarget>,
        payload: Arc<DeliveryPayload>,
    ) {
        let scheduler = Arc::clone(&self.scheduler);
        let reporter = Arc::clone(&self.reporter);
        let correlation_id = correlation_id.clone();
        let span = tracing::info_span!("delivery", %correlation_id, target = target.name());

        self.tracker.spawn(
            async move {
                let outcome = scheduler.schedule(&target, &payload, &correlation_id).await;
                reporter.record(&correlation_id, target.name(), outcome);
            }
            .instrument(span),
        );
    }

    fn reject(&self, correlation_id: &CorrelationId, name: &str, reason: RejectReason) {
        tracing::warn!(%correlation_id, target = name, reason = %reason, "Delivery rejected");
        self.reporter
            .record(correlation_id, name, DeliveryOutcome::Rejected(reason));
    }
}
