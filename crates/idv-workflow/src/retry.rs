//! Retry with exponential backoff for evidence service calls.
//!
//! Retries only transient failures (transport errors, timeouts). Semantic
//! failures — no face in the image, malformed input — are returned
//! immediately; retrying them cannot change the answer.

use std::future::Future;

use idv_core::RetryPolicy;
use idv_evidence::AdapterError;

/// Call an evidence service with a per-call timeout and exponential
/// backoff on transient failures.
///
/// The closure is called up to `policy.max_retries + 1` times. Each call
/// is bounded by `policy.call_timeout`; an elapsed timeout counts as a
/// transient failure. Delays double from `policy.base_delay`.
pub(crate) async fn call_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    service: &'static str,
    f: F,
) -> Result<T, AdapterError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    for attempt in 0..policy.max_retries {
        let error = match tokio::time::timeout(policy.call_timeout, f()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) if !e.is_transient() => return Err(e),
            Ok(Err(e)) => e,
            Err(_) => AdapterError::Timeout { service },
        };
        let delay = policy.base_delay * 2u32.pow(attempt);
        tracing::warn!(
            service,
            attempt = attempt + 1,
            max_retries = policy.max_retries,
            "evidence call failed, retrying in {delay:?}: {error}"
        );
        tokio::time::sleep(delay).await;
    }
    // Final attempt, no more retries.
    match tokio::time::timeout(policy.call_timeout, f()).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout { service }),
    }
}
