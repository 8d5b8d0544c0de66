//! Bounded exponential back-off for upstream calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation. The caller
//! decides which failures are worth another attempt; soft "not found"
//! answers are retried unless the caller's predicate says otherwise. After
//! the last attempt the final error is returned verbatim.

use std::future::Future;
use std::time::Duration;

use wxstrip_core::{ClientConfig, NotFoundPolicy};

use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure. `0` disables retries.
    pub max_retries: u32,
    /// Sleep before the first retry.
    pub initial_delay: Duration,
    /// Growth factor applied to the delay after each retry.
    pub multiplier: f64,
    /// Fraction of each delay to randomize, in `[0, 1)`. `0.0` is deterministic.
    pub jitter: f64,
}

impl RetryPolicy {
    pub const BACKOFF_MULTIPLIER: f64 = 1.5;
    /// Upper bound on any single sleep, whatever the configured schedule.
    pub const MAX_DELAY: Duration = Duration::from_secs(60);

    #[must_use]
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            multiplier: Self::BACKOFF_MULTIPLIER,
            jitter: 0.0,
        }
    }

    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            jitter: config.retry_jitter,
            ..Self::new(
                config.max_retries,
                Duration::from_millis(config.retry_initial_delay_ms),
            )
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// The un-jittered sleep before each retry, in order, each capped at
    /// [`Self::MAX_DELAY`].
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial_delay.min(Self::MAX_DELAY)), |d| {
            let grown = Duration::try_from_secs_f64(d.as_secs_f64() * self.multiplier)
                .unwrap_or(Self::MAX_DELAY);
            Some(grown.min(Self::MAX_DELAY))
        })
        .take(self.max_retries as usize)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return delay;
        }
        let spread = self.jitter.min(0.99);
        delay.mul_f64(1.0 - spread + rand::random::<f64>() * spread * 2.0)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(1_000))
    }
}

/// Runs `operation`, retrying failures accepted by `is_retriable` according
/// to `policy`.
///
/// Back-off schedule with `initial_delay = 1s`:
///
/// | Retry | Sleep before it |
/// |-------|-----------------|
/// | 1     | 1.0 s           |
/// | 2     | 1.5 s           |
/// | 3     | 2.25 s          |
///
/// With `max_retries = 2` the operation runs at most 3 times.
///
/// # Errors
///
/// Returns the last error produced by `operation` once retries are exhausted
/// or the predicate rejects it.
pub async fn retry_with_backoff<T, F, Fut, R>(
    policy: &RetryPolicy,
    is_retriable: R,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
    R: Fn(&FetchError) -> bool,
{
    let mut delays = policy.delays();
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) {
                    return Err(err);
                }
                let Some(delay) = delays.next() else {
                    return Err(err);
                };
                attempt += 1;
                let delay = policy.jittered(delay);
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "upstream call failed, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Predicate that retries every failure.
#[must_use]
pub fn any_failure(_: &FetchError) -> bool {
    true
}

/// Retry predicate for a product kind's 404 policy.
#[must_use]
pub fn retriable_under(policy: NotFoundPolicy) -> fn(&FetchError) -> bool {
    match policy {
        NotFoundPolicy::Retry => any_failure,
        NotFoundPolicy::Terminal => |err| !err.is_not_found(),
    }
}
