//! Retry policy: exponential backoff with bounded jitter.
//!
//! Pure decisions over (retry count, task config). The ±20 % jitter
//! spreads reconnection storms after an outage so clients do not retry
//! in lockstep.

use rand::Rng;
use std::time::Duration;

/// Exponent cap; beyond this the delay would overflow any sane base.
const MAX_EXPONENT: u32 = 20;

/// Stateless retry policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy;

impl RetryPolicy {
    /// Whether a task with `retry_count` failed attempts gets another
    /// try under a budget of `max_retries`.
    #[must_use]
    pub fn should_retry(retry_count: u32, max_retries: u32) -> bool {
        retry_count < max_retries
    }

    /// Next backoff delay: `base * 2^retry_count` with ±20 % jitter.
    #[must_use]
    pub fn next_delay(retry_count: u32, base_delay_ms: u64) -> Duration {
        Self::next_delay_with(retry_count, base_delay_ms, &mut rand::thread_rng())
    }

    /// Deterministic-rng variant of [`RetryPolicy::next_delay`].
    #[must_use]
    pub fn next_delay_with<R: Rng>(retry_count: u32, base_delay_ms: u64, rng: &mut R) -> Duration {
        let exp = retry_count.min(MAX_EXPONENT);
        let delay = base_delay_ms.saturating_mul(1u64 << exp);
        let span = delay / 5;
        let jittered = if span == 0 {
            delay
        } else {
            // Uniform in [delay - span, delay + span], i.e. ±20 %.
            (delay - span).saturating_add(rng.gen_range(0..=span.saturating_mul(2)))
        };
        Duration::from_millis(jittered)
    }
}
