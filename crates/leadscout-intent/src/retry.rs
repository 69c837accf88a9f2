//! Retry with exponential back-off and jitter for LLM calls.

use std::future::Future;
use std::time::Duration;

use crate::error::IntentError;

/// Transient failures worth another attempt: network-level errors and HTTP
/// 5xx. Malformed completions are not retried — the model already answered
/// and the caller's fallback handles it.
pub(crate) fn is_retriable(err: &IntentError) -> bool {
    match err {
        IntentError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        IntentError::Status(status) => status.is_server_error(),
        IntentError::Malformed(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors, doubling the delay per attempt with ±25% jitter.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, IntentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, IntentError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "intent backend transient error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
