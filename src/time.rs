//! Time abstractions for testability.
//!
//! - [`Clock`] supplies wall-clock timestamps for delivery attempts.
//! - [`Sleeper`] supplies the backoff wait between attempts.
//!
//! Production code uses [`SystemClock`] and [`TokioSleeper`]; tests inject
//! controlled implementations.

use std::future::Future;
use std::time::{Duration, SystemTime};

/// Abstraction over system time for testability.
///
/// # Example
///
/// ```
/// use ocr_hook::time::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let now = clock.now();
/// assert!(now >= std::time::SystemTime::UNIX_EPOCH);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// Production clock using actual system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Abstraction over async sleeping.
///
/// The retry scheduler races the returned future against shutdown,
/// so implementations need not be cancellation-aware themselves.
pub trait Sleeper: Send + Sync {
    /// Waits for the given duration.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Sleeper backed by the tokio timer.
///
/// Under a paused tokio clock (`start_paused = true`) the wait is
/// auto-advanced, which keeps timing tests exact.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately.
///
/// Useful in tests that care about attempt counts but not timing.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Formats a timestamp as RFC 3339 UTC with millisecond precision.
///
/// ```
/// use std::time::{Duration, SystemTime};
///
/// let t = SystemTime::UNIX_EPOCH + Duration::from_millis(1_500);
/// assert_eq!(ocr_hook::time::rfc3339(t), "1970-01-01T00:00:01.500Z");
/// ```
#[must_use]
pub fn rfc3339(time: SystemTime) -> String {
    chrono::DateTime::<chrono::Utc>::from(time).to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// `serialize_with` adapter for [`SystemTime`] fields.
pub(crate) fn serialize_rfc3339<S: serde::Serializer>(
    time: &SystemTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&rfc3339(*time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_returns_current_time() {
        let before = SystemTime::now();
        let result = SystemClock.now();
        let after = SystemTime::now();

        assert!(result >= before);
        assert!(result <= after);
    }

    #[test]
    fn rfc3339_serializer_writes_utc_millis() {
        #[derive(serde::Serialize)]
        struct Stamped {
            #[serde(serialize_with = "serialize_rfc3339")]
            at: SystemTime,
        }

        let stamped = Stamped {
            at: SystemTime::UNIX_EPOCH + Duration::from_millis(86_400_250),
        };

        assert_eq!(
            serde_json::to_string(&stamped).unwrap(),
            r#"{"at":"1970-01-02T00:00:00.250Z"}"#
        );
    }

    #[test]
    fn sleepers_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TokioSleeper>();
        assert_send_sync::<InstantSleeper>();
        assert_send_sync::<SystemClock>();
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_waits_for_duration() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(250)).await;

        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn instant_sleeper_does_not_wait() {
        let start = tokio::time::Instant::now();
        InstantSleeper.sleep(Duration::from_secs(60)).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
