//! Bounded, in-memory history of terminal outcomes.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use serde::Serialize;
use tokio::sync::watch;

use super::{CorrelationId, DeliveryOutcome};
use crate::time::{Clock, SystemClock};

/// One recorded terminal outcome.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRecord {
    pub correlation_id: CorrelationId,
    /// Target name, or `*` for request-wide rejections
    pub target: String,
    pub outcome: DeliveryOutcome,
    #[serde(serialize_with = "crate::time::serialize_rfc3339")]
    pub recorded_at: SystemTime,
}

/// Outcome counts over the retained history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub retained: usize,
    pub delivered: usize,
    pub exhausted: usize,
    pub rejected: usize,
}

/// Thread-safe ring buffer of the last `capacity` outcomes.
///
/// Appends come from many delivery streams at once; queries come from
/// diagnostic callers. Once full, each append evicts the oldest record.
/// Nothing survives a restart.
pub struct OutcomeReporter {
    capacity: NonZeroUsize,
    history: Mutex<VecDeque<OutcomeRecord>>,
    recorded: watch::Sender<u64>,
    clock: Arc<dyn Clock>,
}

impl OutcomeReporter {
    /// Default number of retained outcomes.
    pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(n) => n,
        None => unreachable!(),
    };

    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(capacity: NonZeroUsize, clock: Arc<dyn Clock>) -> Self {
        Self {
            capacity,
            history: Mutex::new(VecDeque::with_capacity(capacity.get().min(1024))),
            recorded: watch::Sender::new(0),
            clock,
        }
    }

    /// Appends a terminal outcome, evicting the oldest record when full.
    pub fn record(
        &self,
        correlation_id: &CorrelationId,
        target: impl Into<String>,
        outcome: DeliveryOutcome,
    ) {
        let record = OutcomeRecord {
            correlation_id: correlation_id.clone(),
            target: target.into(),
            outcome,
            recorded_at: self.clock.now(),
        };

        {
            let mut history = self.lock();
            if history.len() == self.capacity.get() {
                history.pop_front();
            }
            history.push_back(record);
        }

        self.recorded.send_modify(|n| *n = n.wrapping_add(1));
    }

    /// Every retained `(target, outcome)` for a correlation id, oldest first.
    ///
    /// Empty if the id is unknown or its records were evicted.
    #[must_use]
    pub fn query(&self, correlation_id: &CorrelationId) -> Vec<OutcomeRecord> {
        self.lock()
            .iter()
            .filter(|r| &r.correlation_id == correlation_id)
            .cloned()
            .collect()
    }

    /// The most recent `limit` records, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<OutcomeRecord> {
        self.lock().iter().rev().take(limit).cloned().collect()
    }

    #[must_use]
    pub fn summary(&self) -> OutcomeSummary {
        let history = self.lock();
        let mut summary = OutcomeSummary {
            retained: history.len(),
            ..OutcomeSummary::default()
        };
        for record in history.iter() {
            match record.outcome {
                DeliveryOutcome::Delivered(_) => summary.delivered += 1,
                DeliveryOutcome::Exhausted(_) => summary.exhausted += 1,
                DeliveryOutcome::Rejected(_) => summary.rejected += 1,
            }
        }
        summary
    }

    /// Waits until at least `count` outcomes are retained for
    /// `correlation_id`, then returns them.
    ///
    /// Never resolves if fewer outcomes ever arrive; callers bound it with
    /// a timeout or a shutdown signal.
    pub async fn wait_for(&self, correlation_id: &CorrelationId, count: usize) -> Vec<OutcomeRecord> {
        let mut changes = self.recorded.subscribe();
        loop {
            let records = self.query(correlation_id);
            if records.len() >= count {
                return records;
            }
            if changes.changed().await.is_err() {
                return records;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<OutcomeRecord>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for OutcomeReporter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for OutcomeReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeReporter")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
