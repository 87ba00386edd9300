//! Retry policy for a delivery stream.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the wait between attempts grows.
///
/// `attempt` below is the number of the attempt that just failed (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// `delay * attempt`: 1x, 2x, 3x ...
    #[default]
    Linear,
    /// `delay * 2^(attempt - 1)`: 1x, 2x, 4x ...
    Exponential,
    /// `delay` every time.
    Fixed,
}

impl fmt::Display for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linear => "linear",
            Self::Exponential => "exponential",
            Self::Fixed => "fixed",
        };
        f.write_str(name)
    }
}

impl FromStr for Backoff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "exponential" | "exp" => Ok(Self::Exponential),
            "fixed" | "constant" => Ok(Self::Fixed),
            _ => Err(format!(
                "unknown backoff '{s}': expected linear, exponential, or fixed"
            )),
        }
    }
}

/// Retry behaviour of one target.
///
/// # Defaults
///
/// - `max_attempts`: 3
/// - `delay`: 1 second
/// - `backoff`: [`Backoff::Linear`]
///
/// # Example
///
/// ```
/// use ocr_hook::target::{Backoff, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_max_attempts(3)
///     .with_delay(Duration::from_millis(100));
///
/// assert_eq!(policy.delay_before_retry(1), Duration::from_millis(100));
/// assert_eq!(policy.delay_before_retry(2), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    ///
    /// A value of 1 means no retries.
    pub max_attempts: u32,

    /// Base delay between attempts.
    pub delay: Duration,

    /// Growth of the delay across attempts.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Default maximum attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Default base delay (1 second).
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    /// Minimum value for `max_attempts`.
    pub const MIN_MAX_ATTEMPTS: u32 = 1;

    /// Creates a policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            delay: Self::DEFAULT_DELAY,
            backoff: Backoff::Linear,
        }
    }

    /// Sets the maximum number of attempts.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is 0.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        assert!(
            max_attempts >= Self::MIN_MAX_ATTEMPTS,
            "max_attempts must be at least 1"
        );
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the base delay. Zero is allowed and retries immediately.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the backoff mode.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Wait after attempt number `attempt` (1-based) failed transiently.
    ///
    /// Saturates at [`Duration::MAX`] instead of overflowing.
    #[must_use]
    pub fn delay_before_retry(&self, attempt: u32) -> Duration {
        let factor = match self.backoff {
            Backoff::Linear => Some(attempt.max(1)),
            Backoff::Exponential => 2u32.checked_pow(attempt.saturating_sub(1)),
            Backoff::Fixed => Some(1),
        };

        factor
            .and_then(|f| self.delay.checked_mul(f))
            .unwrap_or(Duration::MAX)
    }

    /// Returns true if another attempt may follow attempt number `attempt`.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
