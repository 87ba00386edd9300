//! Subcommand execution.
//!
//! Builds the delivery engine from validated configuration, runs one
//! subcommand and prints its result as JSON on stdout. Logs go to stderr.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use thiserror::Error;
use tokio::signal;

use ocr_hook::config::{Command, ValidatedConfig};
use ocr_hook::delivery::envelope::{self, ResultEnvelope};
use ocr_hook::delivery::{
    DeliveryPayload, DeliveryRequest, DispatchError, Dispatcher, Executor, OutcomeRecord,
    OutcomeReporter, RetryScheduler,
};
use ocr_hook::target::{Registry, RegistryError, RegistrySummary, WebhookTarget};
use ocr_hook::webhook::{HttpError, ReqwestClient};

/// Type alias for the application's dispatcher.
type AppDispatcher = Dispatcher<ReqwestClient>;

/// File name recorded in the envelope of a test delivery.
const SAMPLE_FILENAME: &str = "test_sample.jpg";

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] HttpError),

    /// A configured target was refused by the registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Failed to read the payload file.
    #[error("Failed to read payload '{}': {source}", path.display())]
    PayloadRead {
        /// Payload path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The payload file is not valid JSON.
    #[error("Failed to parse payload '{}': {source}", path.display())]
    PayloadParse {
        /// Payload path
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Failed to serialize output.
    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),

    /// The dispatcher refused a request or did not stop in time.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Nothing to deliver to.
    #[error("No delivery targets configured; use --url or a [[targets]] table")]
    NoTargets,

    /// Some targets did not receive the payload.
    #[error("{failed} of {total} deliveries did not succeed")]
    Undelivered {
        /// Outcomes other than delivered, including missing ones
        failed: usize,
        /// Outcomes expected
        total: usize,
    },
}

/// JSON printed by the `targets` subcommand.
#[derive(Debug, Serialize)]
struct TargetListing<'a> {
    summary: RegistrySummary,
    targets: Vec<&'a WebhookTarget>,
}

impl<'a> TargetListing<'a> {
    fn new(registry: &'a Registry) -> Self {
        Self {
            summary: registry.summary(),
            targets: registry.list_all().iter().map(AsRef::as_ref).collect(),
        }
    }
}

/// Executes one subcommand.
///
/// # Errors
///
/// Returns an error if:
/// - The registry rejects a configured target
/// - The payload cannot be read or parsed (`send`)
/// - The target is unknown or disabled (`test`)
/// - Any addressed target ends without a delivered outcome
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig, command: Command) -> Result<(), RunError> {
    let registry = Arc::new(Registry::from_targets(config.targets)?);

    match command {
        Command::Init { .. } => Ok(()),
        Command::Targets => print_json(&TargetListing::new(&registry)),
        Command::Test { target } => {
            let dispatcher = create_dispatcher(registry, config.history_capacity, http_client()?);
            run_test(&dispatcher, &target, config.shutdown_grace).await
        }
        Command::Send {
            payload,
            targets,
            correlation_id,
            envelope,
            filename,
        } => {
            if registry.is_empty() {
                return Err(RunError::NoTargets);
            }

            let filename = filename.or_else(|| file_name_of(&payload));
            let payload = load_payload(
                &payload,
                envelope.then_some(filename.as_deref()),
                SystemTime::now(),
            )
            .await?;
            let request = build_request(&registry, payload, targets, correlation_id);

            let dispatcher = create_dispatcher(registry, config.history_capacity, http_client()?);
            let records =
                deliver(&dispatcher, request, shutdown_signal(), config.shutdown_grace).await;
            print_json(&records.records)?;
            records.into_result()
        }
    }
}

fn http_client() -> Result<ReqwestClient, RunError> {
    ReqwestClient::new().map_err(RunError::Client)
}

/// Creates the dispatcher over a reqwest transport.
fn create_dispatcher(
    registry: Arc<Registry>,
    history_capacity: std::num::NonZeroUsize,
    client: ReqwestClient,
) -> AppDispatcher {
    let scheduler = RetryScheduler::new(Executor::new(client));
    let reporter = Arc::new(OutcomeReporter::new(history_capacity));

    Dispatcher::new(registry, scheduler, reporter)
}

/// Sends the sample OCR result to one target and prints the report.
async fn run_test(dispatcher: &AppDispatcher, name: &str, grace: Duration) -> Result<(), RunError> {
    let payload = sample_payload(SystemTime::now())?;
    let report = dispatcher.test_delivery(name, payload).await;
    dispatcher.shutdown(grace).await?;

    let report = report?;
    print_json(&report)?;

    if report.outcome.is_delivered() {
        Ok(())
    } else {
        Err(RunError::Undelivered {
            failed: 1,
            total: 1,
        })
    }
}

/// The payload used by the `test` subcommand.
fn sample_payload(now: SystemTime) -> Result<DeliveryPayload, RunError> {
    Ok(ResultEnvelope::new(envelope::sample_result(), Some(SAMPLE_FILENAME), now).into_payload()?)
}

/// Reads a JSON payload, optionally wrapping it in a result envelope.
///
/// `envelope` is `None` for a bare payload, otherwise the file name to
/// record in the envelope.
async fn load_payload(
    path: &Path,
    envelope: Option<Option<&str>>,
    now: SystemTime,
) -> Result<DeliveryPayload, RunError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| RunError::PayloadRead {
            path: path.to_path_buf(),
            source: e,
        })?;

    let value: serde_json::Value =
        serde_json::from_slice(&content).map_err(|e| RunError::PayloadParse {
            path: path.to_path_buf(),
            source: e,
        })?;

    match envelope {
        Some(filename) => Ok(ResultEnvelope::new(value, filename, now).into_payload()?),
        None => Ok(DeliveryPayload::Json(value)),
    }
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

/// Builds a request for the named targets, or every active target if none
/// are named.
fn build_request(
    registry: &Registry,
    payload: DeliveryPayload,
    targets: Vec<String>,
    correlation_id: Option<String>,
) -> DeliveryRequest {
    let request = if targets.is_empty() {
        DeliveryRequest::broadcast(registry, payload)
    } else {
        DeliveryRequest::new(payload).with_targets(targets)
    };

    match correlation_id {
        Some(id) => request.with_correlation_id(id),
        None => request,
    }
}

/// Outcomes collected for one request.
#[derive(Debug)]
struct Collected {
    records: Vec<OutcomeRecord>,
    expected: usize,
}

impl Collected {
    fn failed(&self) -> usize {
        let delivered = self
            .records
            .iter()
            .filter(|r| r.outcome.is_delivered())
            .count();
        self.expected.saturating_sub(delivered)
    }

    fn into_result(self) -> Result<(), RunError> {
        match self.failed() {
            0 => Ok(()),
            failed => Err(RunError::Undelivered {
                failed,
                total: self.expected,
            }),
        }
    }
}

/// Dispatches `request` and waits for every outcome or `shutdown`,
/// whichever comes first, then stops the dispatcher.
async fn deliver(
    dispatcher: &AppDispatcher,
    request: DeliveryRequest,
    shutdown: impl Future<Output = ()>,
    grace: Duration,
) -> Collected {
    // A request without targets still records one rejection.
    let expected = request.targets().len().max(1);
    let correlation_id = dispatcher.dispatch(request);
    let reporter = Arc::clone(dispatcher.reporter());

    tokio::select! {
        biased;

        () = shutdown => {
            tracing::info!("Shutdown signal received, stopping...");
        }

        _ = reporter.wait_for(&correlation_id, expected) => {}
    }

    if let Err(e) = dispatcher.shutdown(grace).await {
        tracing::error!("{e}");
    }

    Collected {
        records: reporter.query(&correlation_id),
        expected,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), RunError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Returns a future that completes when a shutdown signal is received.
///
/// A handler that cannot be installed never fires.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
