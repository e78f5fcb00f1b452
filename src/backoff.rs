//! Exponential backoff executor for rate-limited remote calls
//!
//! Wraps an arbitrary async operation and retries it only when the error is a
//! transient rate-limit signal. Delays double from the initial value up to a
//! cap, with uniform jitter added on top; a server-provided `Retry-After` hint
//! replaces the computed delay verbatim for that attempt.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default initial delay between retries, in seconds.
/// One second is long enough for most rate-limit windows to begin draining.
pub const DEFAULT_INITIAL_DELAY_SECS: u64 = 1;

/// Default cap on the doubled delay, in seconds.
pub const DEFAULT_MAX_DELAY_SECS: u64 = 60;

/// Default retry budget before giving up with a terminal error.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Classification hooks the executor needs from an operation's error type.
pub trait RetryClass {
    /// Whether this error is a transient rate-limit signal worth retrying
    fn is_rate_limit(&self) -> bool;

    /// Server-provided retry hint in seconds, if the error carried one
    fn retry_after(&self) -> Option<u64> {
        None
    }
}

/// Error returned by [`BackoffPolicy::execute`].
#[derive(Debug, thiserror::Error)]
pub enum BackoffError<E> {
    /// The operation failed with a non-retryable error; returned unchanged
    #[error(transparent)]
    Inner(E),

    /// The retry budget was exhausted while the error stayed rate-limited
    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Total attempts made, including the first
        attempts: u32,
        /// The last rate-limit error observed
        source: E,
    },
}

/// Retry policy for transient rate-limit failures.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(DEFAULT_INITIAL_DELAY_SECS),
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl BackoffPolicy {
    /// Create a policy with explicit delays and retry budget
    pub fn new(initial_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_retries,
        }
    }

    /// Override the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Execute `op`, retrying on rate-limit errors with exponential backoff.
    ///
    /// Non-rate-limit errors propagate immediately without sleeping. Once the
    /// retry budget is spent the last rate-limit error is wrapped in
    /// [`BackoffError::RetriesExhausted`].
    pub async fn execute<T, E, F, Fut>(&self, mut op: F) -> Result<T, BackoffError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryClass,
    {
        let mut retries: u32 = 0;
        let mut delay = self.initial_delay;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_rate_limit() => return Err(BackoffError::Inner(err)),
                Err(err) => {
                    if retries >= self.max_retries {
                        return Err(BackoffError::RetriesExhausted {
                            attempts: retries + 1,
                            source: err,
                        });
                    }

                    // Retry-After hint takes precedence over the doubled delay
                    // for this attempt only.
                    delay = (delay * 2).min(self.max_delay);
                    let base = match err.retry_after() {
                        Some(secs) => Duration::from_secs(secs),
                        None => delay,
                    };
                    let sleep_for = base + jitter(base);

                    retries += 1;
                    warn!(
                        retry = retries,
                        max_retries = self.max_retries,
                        sleep_ms = sleep_for.as_millis() as u64,
                        "Rate limit hit, backing off before retry"
                    );
                    tokio::time::sleep(sleep_for).await;
                }
            }
        }
    }
}

/// Uniform jitter in [0, 10% of the delay]
fn jitter(delay: Duration) -> Duration {
    let cap = delay.as_millis() as u64 / 10;
    if cap == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=cap))
}
