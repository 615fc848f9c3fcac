//! Timeout and retry wrappers around external calls.
//!
//! Every identity-provider and profile-store call made by a service goes
//! through [`provider_call`] or [`store_call`], so an unresponsive
//! collaborator surfaces as a typed error instead of a hung request.

use std::future::Future;
use std::time::Duration;

use elevate_db::error::{DbError, DbResult};

use crate::identity::{GatewayError, GatewayResult};

/// ## Summary
/// Runs an identity-provider call under `limit`.
///
/// ## Errors
/// Returns the call's own error, or `GatewayError::Timeout` if it did not
/// finish in time.
pub async fn provider_call<T, F>(limit: Duration, call: F) -> GatewayResult<T>
where
    F: Future<Output = GatewayResult<T>>,
{
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_elapsed| {
        tracing::warn!(timeout_ms = limit.as_millis(), "Identity provider call timed out");
        Err(GatewayError::Timeout)
    })
}

/// ## Summary
/// Runs a profile-store call under `limit`.
///
/// ## Errors
/// Returns the call's own error, or `DbError::Unavailable` if it did not
/// finish in time.
pub async fn store_call<T, F>(limit: Duration, call: F) -> DbResult<T>
where
    F: Future<Output = DbResult<T>>,
{
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_elapsed| {
        tracing::warn!(timeout_ms = limit.as_millis(), "Profile store call timed out");
        Err(DbError::Unavailable(format!(
            "no response within {}ms",
            limit.as_millis()
        )))
    })
}

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt - 1)`.
#[must_use]
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
}

/// ## Summary
/// Calls `op` up to `attempts` times, sleeping with exponential backoff
/// between attempts while `is_retryable` accepts the error.
///
/// ## Errors
/// Returns the first non-retryable error, or the last error once the
/// attempts are exhausted.
pub async fn retry_with_backoff<T, E, F, Fut>(
    attempts: u32,
    base_delay: Duration,
    operation: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && is_retryable(&e) => {
                let delay = backoff_delay(base_delay, attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    attempts,
                    delay_ms = delay.as_millis(),
                    error = %e,
                    "Retrying after failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
