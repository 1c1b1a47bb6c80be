//! Retry with exponential back-off and jitter for remote call sites.
//!
//! [`RetryPolicy`] wraps any fallible async operation and retries while the
//! caller-supplied predicate classifies the error as transient. Permanent
//! errors (auth failures, malformed responses) are returned immediately.

use std::future::Future;
use std::time::Duration;

/// Back-off parameters shared by every remote call site.
///
/// Schedule with `base_delay_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt    |
/// |---------|------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter |
/// | 3       | 1 000 ms × 2² ± 25 % jitter |
///
/// Delay is capped at `max_delay_ms`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            ..Self::default()
        }
    }

    /// Runs `operation` with up to `max_retries` additional attempts on errors
    /// for which `is_transient` returns `true`.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted, or the first error
    /// `is_transient` rejects.
    pub async fn run<T, E, F, Fut, P>(&self, is_transient: P, mut operation: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !is_transient(&err) || attempt >= self.max_retries {
                        return Err(err);
                    }
                    attempt += 1;
                    let computed = self
                        .base_delay_ms
                        .saturating_mul(1u64 << (attempt - 1).min(10));
                    let capped = computed.min(self.max_delay_ms);
                    #[allow(
                        clippy::cast_possible_truncation,
                        clippy::cast_sign_loss,
                        clippy::cast_precision_loss
                    )]
                    let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms,
                        error = %err,
                        "transient remote error — retrying after back-off"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}
