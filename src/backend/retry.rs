//! Attempt counting, exponential backoff with jitter, and Retry-After honoring.
//!
//! [`RetryController::execute`] wraps a request closure: retryable failures
//! (network, rate limit) are retried up to `max_retries` times with a growing
//! jittered delay; fatal failures (auth, bad request, parse) surface
//! immediately regardless of remaining budget. All state is local to one
//! call, so any number of extractions can run concurrently without locking.
//!
//! The wait between attempts goes through the [`Delay`] trait rather than a
//! hard-coded sleep; production uses [`TokioDelay`], tests inject a recording
//! or instant implementation.

use crate::error::{ExtractError, Result};
use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Retry policy for one extraction call.
///
/// Constructed via [`RetryConfig::new`], which rejects inconsistent values,
/// or [`RetryConfig::default`] for the documented default policy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_factor: f64,
}

impl RetryConfig {
    /// Create a validated retry policy.
    ///
    /// Fails when `initial_delay` is zero, `initial_delay > max_delay`, or
    /// `backoff_factor < 1`.
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_factor: f64,
    ) -> Result<Self> {
        if initial_delay.is_zero() {
            return Err(ExtractError::Config(
                "initial_delay must be greater than zero".into(),
            ));
        }
        if initial_delay > max_delay {
            return Err(ExtractError::Config(format!(
                "initial_delay ({initial_delay:?}) must not exceed max_delay ({max_delay:?})"
            )));
        }
        if !backoff_factor.is_finite() || backoff_factor < 1.0 {
            return Err(ExtractError::Config(format!(
                "backoff_factor must be at least 1, got {backoff_factor}"
            )));
        }
        Ok(Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff_factor,
        })
    }

    /// Maximum number of retries after the initial attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the first retry, before backoff and jitter.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Upper bound on any single delay, including a server-mandated one.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Multiplier applied to the delay per retry.
    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }
}

impl Default for RetryConfig {
    /// Default policy: 3 retries, 1s initial delay, 30s cap, factor 2.
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
        }
    }
}

/// Suspension between retry attempts.
///
/// Injected at construction so tests can observe or skip the waits instead
/// of mutating a live controller.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production [`Delay`] backed by `tokio::time::sleep`; never blocks the
/// calling thread.
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Drives a request closure to completion under a [`RetryConfig`].
pub struct RetryController {
    config: RetryConfig,
    delay: Arc<dyn Delay>,
}

impl RetryController {
    pub fn new(config: RetryConfig) -> Self {
        Self::with_delay(config, Arc::new(TokioDelay))
    }

    /// Create a controller with an injected delay implementation.
    pub fn with_delay(config: RetryConfig, delay: Arc<dyn Delay>) -> Self {
        Self { config, delay }
    }

    /// Run `request` until it succeeds, fails fatally, or exhausts the budget.
    ///
    /// Attempt indices are zero-based. A fatal (non-retryable) error is
    /// returned as-is after its first occurrence. When the last permitted
    /// attempt fails retryably, the result is
    /// [`ExtractError::ExhaustedRetries`] naming the total attempt count and
    /// wrapping the last failure.
    pub async fn execute<T, F, Fut>(&self, mut request: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.config.max_retries + 1;
        let mut attempt: u32 = 0;

        loop {
            debug!(attempt = attempt + 1, max_attempts, "Starting attempt");

            match request().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(attempts_used = attempt + 1, "Succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.delay_for(attempt, &err);
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retryable failure, waiting before next attempt"
                    );
                    self.delay.sleep(delay).await;
                    attempt += 1;
                }
                Err(err) if err.is_retryable() => {
                    error!(
                        attempts = max_attempts,
                        error = %err,
                        "Retry budget exhausted"
                    );
                    return Err(ExtractError::ExhaustedRetries {
                        attempts: max_attempts,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    error!(error = %err, "Fatal failure, not retrying");
                    return Err(err);
                }
            }
        }
    }

    /// Delay before retry `attempt` (zero-based).
    ///
    /// A server-provided `Retry-After` wins over the computed backoff; both
    /// are capped at `max_delay`. Otherwise the delay is
    /// `min(max_delay, initial · factor^attempt)` plus a uniform jitter of up
    /// to 25% of that base, capped again at `max_delay`.
    fn delay_for(&self, attempt: u32, err: &ExtractError) -> Duration {
        if let Some(server_delay) = err.retry_delay() {
            return server_delay.min(self.config.max_delay);
        }

        let max = self.config.max_delay.as_secs_f64();
        let base = (self.config.initial_delay.as_secs_f64()
            * self.config.backoff_factor.powi(attempt as i32))
        .min(max);
        let jitter = rand::thread_rng().gen_range(0.0..base * 0.25);
        Duration::from_secs_f64((base + jitter).min(max))
    }
}
