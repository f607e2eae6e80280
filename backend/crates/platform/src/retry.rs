//! Bounded exponential-backoff retry for data-access operations
//!
//! Only errors the caller classifies as transient are retried. Attempt `n`
//! (0-based) that fails transiently is followed by a sleep of
//! `base_delay * 2^n`, until `max_attempts` attempts have been made.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff after the failed attempt with the given 0-based index
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt_index))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Every attempt failed transiently
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
    /// First non-transient failure, returned without retrying
    #[error("{0}")]
    Permanent(E),
    /// The cancellation token fired while waiting to retry
    #[error("retry cancelled")]
    Cancelled,
}

/// Run `op` under `policy`, retrying while `is_transient` says so
pub async fn with_retry<F, Fut, T, E, P>(
    policy: RetryPolicy,
    is_transient: P,
    op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    run(policy, is_transient, op, None).await
}

/// Same as [`with_retry`], but the backoff sleep aborts when `cancel` fires
pub async fn with_retry_cancellable<F, Fut, T, E, P>(
    policy: RetryPolicy,
    is_transient: P,
    op: F,
    cancel: &CancellationToken,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    run(policy, is_transient, op, Some(cancel)).await
}

async fn run<F, Fut, T, E, P>(
    policy: RetryPolicy,
    is_transient: P,
    mut op: F,
    cancel: Option<&CancellationToken>,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_transient(&err) {
            return Err(RetryError::Permanent(err));
        }

        attempt += 1;
        if attempt >= max_attempts {
            error!(attempts = attempt, error = %err, "Transient failure persisted, giving up");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        let delay = policy.delay_for(attempt - 1);
        warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Transient failure, retrying"
        );

        match cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => return Err(RetryError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            None => tokio::time::sleep(delay).await,
        }
    }
}
