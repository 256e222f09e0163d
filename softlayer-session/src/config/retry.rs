//! Retry logic with exponential backoff for session calls.
//!
//! Backoff follows the
//! [gRPC connection backoff specification](https://github.com/grpc/grpc/blob/master/doc/connection-backoff.md):
//! `base * multiplier^n`, randomized by `+/- jitter` and clamped to
//! `max_delay`.
//!
//! # Retryable Errors
//!
//! Only errors whose [`SessionError::is_retryable`] is true are retried:
//! network failures, per-attempt timeouts and faults classified as
//! `unavailable`, `resource_exhausted` or `deadline_exceeded` (HTTP 429,
//! 502, 503, 504). Everything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::SessionError;

/// Default configuration values.
pub mod defaults {
    use std::time::Duration;

    /// Default initial delay before the first retry.
    pub const BASE_DELAY: Duration = Duration::from_secs(1);

    /// Default multiplier for exponential backoff.
    pub const MULTIPLIER: f64 = 1.6;

    /// Default jitter factor (0.2 means +/- 20%).
    pub const JITTER: f64 = 0.2;

    /// Default maximum delay between retries.
    pub const MAX_DELAY: Duration = Duration::from_secs(120);

    /// Default number of attempts, the first one included.
    pub const MAX_ATTEMPTS: u32 = 3;
}

/// Configuration for retry behavior.
///
/// `max_attempts` counts every attempt including the first, so a policy with
/// `max_attempts = 3` sends a request at most three times. A value of `0` is
/// rejected by [`validate`](Self::validate).
///
/// # Example
///
/// ```
/// use softlayer_session::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .max_attempts(5)
///     .base_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(30));
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Initial delay before the first retry.
    pub base_delay: Duration,

    /// Multiplier for exponential backoff. Must be >= 1.0.
    pub multiplier: f64,

    /// Jitter factor between 0.0 and 1.0.
    /// A value of 0.2 keeps the actual delay within +/- 20% of the computed one.
    pub jitter: f64,

    /// Maximum delay between retries.
    pub max_delay: Duration,

    /// Total number of attempts, the first one included.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: defaults::BASE_DELAY,
            multiplier: defaults::MULTIPLIER,
            jitter: defaults::JITTER,
            max_delay: defaults::MAX_DELAY,
            max_attempts: defaults::MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that sends every request exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Short delays for latency-sensitive callers.
    /// - Base delay: 50ms
    /// - Max delay: 1 second
    /// - Max attempts: 6
    pub fn aggressive() -> Self {
        Self {
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            max_attempts: 6,
            ..Default::default()
        }
    }

    /// Long delays for background jobs.
    /// - Base delay: 2 seconds
    /// - Max delay: 5 minutes
    /// - Max attempts: 11
    pub fn patient() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(300),
            max_attempts: 11,
            ..Default::default()
        }
    }

    /// Set the total number of attempts.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier. Checked by [`validate`](Self::validate).
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the jitter factor. Checked by [`validate`](Self::validate).
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Validate the policy configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1");
        }
        if self.base_delay > self.max_delay {
            return Err("base_delay must not exceed max_delay");
        }
        if !(self.multiplier >= 1.0 && self.multiplier.is_finite()) {
            return Err("multiplier must be >= 1.0");
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err("jitter must be between 0.0 and 1.0");
        }
        Ok(())
    }

    /// Create an ExponentialBackoff iterator from this policy.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.clone())
    }
}

/// Exponential backoff with jitter.
///
/// Tracks how many attempts have been made and yields the delay to wait
/// before each retry.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    policy: RetryPolicy,
    /// Current delay without jitter, kept as f64 to avoid rounding drift.
    current_delay_secs: f64,
    /// Attempts made so far.
    attempts: u32,
}

impl ExponentialBackoff {
    pub fn new(policy: RetryPolicy) -> Self {
        let current_delay_secs = policy.base_delay.as_secs_f64();
        Self {
            policy,
            current_delay_secs,
            attempts: 0,
        }
    }

    /// Reset to the initial state.
    pub fn reset(&mut self) {
        self.current_delay_secs = self.policy.base_delay.as_secs_f64();
        self.attempts = 0;
    }

    /// Number of attempts recorded so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record that an attempt is being made.
    pub fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    /// Whether another attempt fits in the budget.
    pub fn can_retry(&self) -> bool {
        self.attempts < self.policy.max_attempts
    }

    /// Get the next delay, applying jitter, and advance the backoff.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current_delay_secs;

        // delay * (1 + jitter * random(-1, 1))
        let jittered = if self.policy.jitter > 0.0 {
            let jitter_range = self.policy.jitter * 2.0;
            let random_factor = rand::random::<f64>() * jitter_range - self.policy.jitter;
            delay * (1.0 + random_factor)
        } else {
            delay
        };

        let max = self.policy.max_delay.as_secs_f64();
        let clamped = jittered.min(max);

        self.current_delay_secs = (self.current_delay_secs * self.policy.multiplier).min(max);

        Duration::from_secs_f64(clamped.max(0.0))
    }
}

/// Run `f` until it succeeds, fails with a non-retryable error, or the
/// policy's attempt budget is spent.
///
/// Attempts are strictly sequential. The delay between attempts is a plain
/// `tokio::time::sleep`, so dropping the returned future cancels a pending
/// retry.
///
/// ```ignore
/// use softlayer_session::{RetryPolicy, retry_with_policy};
///
/// let value = retry_with_policy(&RetryPolicy::aggressive(), || async {
///     session.call::<serde_json::Value>("SoftLayer_Account", "getObject", &[], &Options::new()).await
/// })
/// .await?;
/// ```
pub async fn retry_with_policy<F, Fut, T>(policy: &RetryPolicy, f: F) -> Result<T, SessionError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, SessionError>>,
{
    if let Err(msg) = policy.validate() {
        return Err(SessionError::Encode(softlayer_core::EncodeError::Unsupported(
            format!("invalid retry policy: {msg}"),
        )));
    }

    let mut backoff = policy.backoff();

    loop {
        backoff.record_attempt();
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && backoff.can_retry() => {
                let delay = backoff.next_delay();
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    error = %e,
                    attempt = backoff.attempts(),
                    delay_ms = delay.as_millis() as u64,
                    "retrying after transient error"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                if e.is_retryable() {
                    tracing::warn!(
                        error = %e,
                        attempts = backoff.attempts(),
                        "giving up after transient errors"
                    );
                }
                return Err(e);
            }
        }
    }
}
