//! Retry policy: backoff delays with jitter.

use std::time::Duration;

use rand::Rng;

/// Backoff policy for failed requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry, pre-jitter.
    pub base_delay: Duration,

    /// Backoff multiplier per attempt.
    pub multiplier: f64,

    /// Hard ceiling on any computed delay.
    pub max_delay: Duration,

    /// Retries after the initial attempt; a request is tried at most
    /// `max_retries + 1` times.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(800),
            multiplier: 2.0,
            max_delay: Duration::from_secs(20),
            max_retries: 3,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (1-indexed):
    /// `base * multiplier^(attempt - 1)` plus a uniform jitter drawn from
    /// `[0, base / 2)`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_secs_f64();
        let backoff = base * self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let jitter = rand::thread_rng().gen_range(0.0..base / 2.0);
        Duration::from_secs_f64((backoff + jitter).min(self.max_delay.as_secs_f64()))
    }

    /// Whether a request whose `retry_count` attempts already failed gets
    /// another try.
    pub fn should_retry(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }
}
