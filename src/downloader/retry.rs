//! Retry ladders with exponential backoff
//!
//! A ladder is one retry loop: it re-runs an operation while a classifier
//! says the error is worth retrying, sleeping an exponentially growing,
//! jittered delay between attempts. Ladders compose by nesting, and each
//! keeps its own attempt counter:
//!
//! ```no_run
//! use fake_faces::config::RetryConfig;
//! use fake_faces::downloader::retry::{retry, Backoff};
//!
//! #[derive(Debug)]
//! enum Failure {
//!     Network,
//!     Duplicate,
//! }
//!
//! impl std::fmt::Display for Failure {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{:?}", self)
//!     }
//! }
//!
//! # async fn example() -> Result<(), Failure> {
//! let config = RetryConfig::default();
//! let network = Backoff::network(&config);
//! let duplicate = Backoff::duplicate(&config);
//! let duplicate = &duplicate;
//!
//! retry(&network, |e: &Failure| matches!(e, Failure::Network), move || {
//!     retry(duplicate, |e: &Failure| matches!(e, Failure::Duplicate), || async {
//!         Ok::<_, Failure>(())
//!     })
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Shape of one retry ladder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    /// Name used in log lines
    pub label: &'static str,

    /// Delay before the second attempt; doubles afterwards
    pub base_delay: Duration,

    /// Upper bound on a single delay
    pub max_delay: Duration,

    /// Total attempts allowed, or `None` for no limit
    pub max_attempts: Option<u32>,
}

impl Backoff {
    /// Bounded ladder for network failures
    pub fn network(config: &RetryConfig) -> Self {
        Self {
            label: "network",
            base_delay: Duration::from_millis(config.network_base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_attempts: Some(config.network_max_attempts),
        }
    }

    /// Unbounded ladder for duplicate content
    pub fn duplicate(config: &RetryConfig) -> Self {
        Self {
            label: "duplicate",
            base_delay: Duration::from_millis(config.duplicate_base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_attempts: None,
        }
    }

    /// Un-jittered delay after the given failed attempt (1-based)
    ///
    /// `base * 2^(attempt - 1)`, capped at `max_delay`. Monotonically
    /// non-decreasing in `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(63);
        let factor = 1u64 << shift;
        let base_ms = self.base_delay.as_millis().min(u64::MAX as u128) as u64;
        let delay = Duration::from_millis(base_ms.saturating_mul(factor));
        delay.min(self.max_delay)
    }

    /// Jittered delay after the given failed attempt
    ///
    /// Uniform in `[d/2, d]` where `d` is [`Backoff::delay_for`], so the
    /// delay never collapses to zero once the ladder has started growing.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.delay_for(attempt);
        let half = delay / 2;
        let spread = (delay - half).as_micros().min(u64::MAX as u128) as u64;
        let extra = rand::thread_rng().gen_range(0..=spread);
        half + Duration::from_micros(extra)
    }

    fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Per-ladder bookkeeping, discarded when the ladder finishes
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Attempts made so far, including the one in progress
    pub attempts: u32,

    /// Display form of the most recent retried error
    pub last_error: Option<String>,

    /// Total time spent sleeping between attempts
    pub elapsed_backoff: Duration,
}

/// Runs `operation` until it succeeds or fails in a way the ladder won't retry
///
/// Errors for which `should_retry` returns false are returned immediately.
/// Retryable errors are retried after a backoff delay until
/// `backoff.max_attempts` attempts have been made; the last error is then
/// returned. With `max_attempts: None` the loop only ends on success or a
/// non-retryable error.
///
/// # Arguments
///
/// * `backoff` - Delay shape and attempt limit
/// * `should_retry` - Classifier selecting which errors this ladder handles
/// * `operation` - Closure producing a fresh attempt each call
pub async fn retry<F, Fut, T, E, C>(
    backoff: &Backoff,
    should_retry: C,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
    E: Display,
{
    let mut state = RetryState::default();

    loop {
        state.attempts += 1;

        let delay = match operation().await {
            Ok(value) => {
                if state.attempts > 1 {
                    tracing::debug!(
                        ladder = backoff.label,
                        attempts = state.attempts,
                        backoff_ms = state.elapsed_backoff.as_millis() as u64,
                        "Succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(e) if !should_retry(&e) => return Err(e),
            Err(e) => {
                if backoff.is_exhausted(state.attempts) {
                    tracing::error!(
                        ladder = backoff.label,
                        attempts = state.attempts,
                        error = %e,
                        "Retry attempts exhausted"
                    );
                    return Err(e);
                }

                let delay = backoff.jittered_delay(state.attempts);
                if backoff.max_attempts.is_some() {
                    tracing::warn!(
                        ladder = backoff.label,
                        attempt = state.attempts,
                        max_attempts = backoff.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                } else {
                    tracing::debug!(
                        ladder = backoff.label,
                        attempt = state.attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                }

                state.last_error = Some(e.to_string());
                delay
            }
        };

        state.elapsed_backoff += delay;
        tokio::time::sleep(delay).await;
    }
}
