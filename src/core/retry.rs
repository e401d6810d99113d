//! Bounded retry with exponential backoff for transient provider failures

use std::future::Future;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::LlmError;

/// How often and how long to wait before re-sending a failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after every retry
    pub backoff_factor: f64,
    /// Upper bound for any single delay, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 1_000,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// A policy that waits the same delay between every attempt
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        let delay_ms = delay.as_millis() as u64;
        Self {
            max_retries,
            initial_delay_ms: delay_ms,
            backoff_factor: 1.0,
            max_delay_ms: delay_ms,
        }
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `retry` (0-based)
    ///
    /// A server-provided `retry_after` replaces the computed backoff but is
    /// still capped by `max_delay_ms`.
    pub fn delay_for(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let cap = Duration::from_millis(self.max_delay_ms);
        if let Some(hint) = retry_after {
            return hint.min(cap);
        }
        let factor = self.backoff_factor.max(1.0).powi(retry.min(i32::MAX as u32) as i32);
        let delay_ms = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
        Duration::from_millis(delay_ms as u64)
    }
}

/// Read a `retry-after` header
///
/// Accepts delay-seconds (fractional values allowed) and the HTTP-date form.
/// Values too large to represent and dates already past are treated as
/// "no usable hint" and "retry now" respectively.
pub(crate) fn retry_after_from_headers(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let value = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<f64>() {
        return Duration::try_from_secs_f64(seconds).ok();
    }

    let at = httpdate::parse_http_date(value).ok()?;
    Some(at.duration_since(SystemTime::now()).unwrap_or(Duration::ZERO))
}

/// Run `operation` until it succeeds, fails permanently, or the policy runs out
///
/// Only [`LlmError::is_transient`] failures are retried. When the budget is
/// spent the last error is wrapped in [`LlmError::RetryExhausted`].
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut retries = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                if retries >= policy.max_retries {
                    return Err(LlmError::RetryExhausted {
                        attempts: retries + 1,
                        last_error: Box::new(err),
                    });
                }
                let delay = policy.delay_for(retries, err.retry_after());
                warn!(
                    attempt = retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient provider error, retrying"
                );
                tokio::time::sleep(delay).await;
                retries += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
