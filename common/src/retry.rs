//! Backoff for network calls made while loading pacts.
//!
//! Fetching pact documents and talking to a broker crosses the network.
//! Errors classified as transient by [`PactError::is_retryable`] are retried
//! on a doubling schedule; document and configuration errors return at once.

use crate::PactError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How often and how patiently to retry transient failures.
///
/// Delays double from `initial_delay` and are capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt (default: 3)
    pub max_retries: u32,
    /// Wait before the first retry (default: 100ms)
    pub initial_delay: Duration,
    /// Cap for one wait (default: 10s)
    pub max_delay: Duration,
    /// Stretch each wait by up to a quarter at random (default: on)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Allow `max_retries` retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Wait `delay` before the first retry.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Never wait longer than `delay`.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Use the exact schedule, e.g. in tests.
    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Unjittered wait after failed attempt `attempt` (zero based).
    fn scheduled_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// The waits still available to one [`RetryPolicy::execute`] call.
///
/// Yields one delay per remaining retry, then `None`.
#[derive(Debug, Clone)]
pub struct Backoff<'a> {
    config: &'a RetryConfig,
    attempt: u32,
}

impl Backoff<'_> {
    /// Retries handed out so far.
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.attempt
    }
}

impl Iterator for Backoff<'_> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempt >= self.config.max_retries {
            return None;
        }
        let delay = RetryPolicy::jittered(self.config, self.attempt);
        self.attempt += 1;
        Some(delay)
    }
}

/// Runs fallible async operations under a [`RetryConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a policy.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create a policy with [`RetryConfig::default`].
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    fn jittered(config: &RetryConfig, attempt: u32) -> Duration {
        let delay = config.scheduled_delay(attempt);
        if config.jitter {
            delay + delay.mul_f64(rand::thread_rng().gen_range(0.0..0.25))
        } else {
            delay
        }
    }

    /// Wait after failed attempt number `attempt` (zero based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Self::jittered(&self.config, attempt)
    }

    /// Whether failed attempt number `attempt` should be retried.
    #[must_use]
    pub fn should_retry(&self, error: &PactError, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.config.max_retries
    }

    /// A fresh schedule of waits for one operation.
    #[must_use]
    pub const fn backoff(&self) -> Backoff<'_> {
        Backoff {
            config: &self.config,
            attempt: 0,
        }
    }

    /// Run `operation` until it succeeds, fails permanently or runs out of retries.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, PactError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PactError>>,
    {
        let mut backoff = self.backoff();
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() => error,
                Err(error) => return Err(error),
            };
            let Some(delay) = backoff.next() else {
                debug!(attempts = backoff.retries() + 1, %error, "giving up");
                return Err(error);
            };
            warn!(
                retry = backoff.retries(),
                max = self.config.max_retries,
                ?delay,
                %error,
                "transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
