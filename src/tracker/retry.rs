//! Exponential backoff for save conflicts.
//!
//! A conflict means another writer saved between this writer's load and save.
//! Reloading and re-applying fixes it, but many writers hammering the same
//! store would keep colliding, so retries back off: by default 3 retries at
//! 25ms, 50ms and 100ms.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Backoff schedule for conflict retries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries, not counting the first attempt.
    pub max_retries: u32,

    pub initial_delay: Duration,

    /// Cap on any single delay.
    pub max_delay: Duration,

    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_millis(25),
        max_delay: Duration::from_millis(500),
        backoff_multiplier: 2.0,
    };

    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Retries immediately, with no sleeping in between.
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO, Duration::ZERO, 1.0)
    }

    /// Delay before retry `attempt` (0-indexed): `initial * multiplier^attempt`,
    /// capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }

    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }

    pub fn total_max_wait(&self) -> Duration {
        self.delays().sum()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// How a retried operation ended.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Success(T),

    /// Every attempt failed with a retriable error.
    ExhaustedRetries {
        last_error: E,
        /// Including the first attempt.
        attempts: u32,
    },

    /// A non-retriable error; returned on the attempt that produced it.
    Failed(E),
}

/// Runs `operation` until it succeeds, fails with an error `is_retriable`
/// rejects, or runs out of retries.
pub async fn retry_with_backoff<T, E, F, Fut>(
    config: RetryConfig,
    is_retriable: impl Fn(&E) -> bool,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_retries + 1;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return RetryOutcome::Success(value),
            Err(e) if !is_retriable(&e) => return RetryOutcome::Failed(e),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return RetryOutcome::ExhaustedRetries {
                        last_error: e,
                        attempts: attempt,
                    };
                }

                let delay = config.delay_for_attempt(attempt - 1);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after conflict"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
