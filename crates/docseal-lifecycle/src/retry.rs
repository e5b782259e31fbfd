use std::fmt::Display;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Bounded exponential backoff with jitter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first. At least 1.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff_ms: 50,
            max_backoff_ms: 2_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy that tries once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Un-jittered backoff before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = self.multiplier.max(1.0).powi(retry.saturating_sub(1) as i32);
        let ms = (self.initial_backoff_ms as f64 * exp).min(self.max_backoff_ms as f64);
        Duration::from_millis(ms as u64)
    }

    /// Backoff with equal jitter: uniform in `[backoff / 2, backoff]`.
    pub fn jittered(&self, retry: u32) -> Duration {
        let base = self.backoff(retry);
        let half = base / 2;
        if half.is_zero() {
            return base;
        }
        half + rand::thread_rng().gen_range(Duration::ZERO..=half)
    }

    /// Run `attempt` until it succeeds, returns a non-retryable error, or the
    /// attempt budget is spent. Sleeps between attempts without blocking the
    /// runtime.
    pub async fn run<T, E: Display>(
        &self,
        operation: &'static str,
        mut attempt: impl FnMut() -> Result<T, E>,
        retryable: impl Fn(&E) -> bool,
    ) -> Result<T, Exhausted<E>> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempts = 0;
        loop {
            attempts += 1;
            match attempt() {
                Ok(value) => return Ok(value),
                Err(error) if attempts < max_attempts && retryable(&error) => {
                    let delay = self.jittered(attempts);
                    warn!(operation, attempt = attempts, %error, delay_ms = delay.as_millis() as u64, "retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(Exhausted { error, attempts }),
            }
        }
    }
}

/// The last error from [`RetryPolicy::run`] and how many attempts were made.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub error: E,
    pub attempts: u32,
}
