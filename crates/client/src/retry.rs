//! Retry wrapper for idempotent RPC reads.

use std::future::Future;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::warn;

/// Run a read with exponential backoff: 100ms, 200ms, 400ms, 800ms, 1.6s (max 5 retries).
///
/// Only use this for calls that are safe to repeat. Broadcasts never go through here.
pub async fn with_retry<T, F, Fut>(call: &'static str, mut read: F) -> eyre::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = eyre::Result<T>>,
{
    let retry_strategy = ExponentialBackoff::from_millis(2).factor(50).take(5);

    Retry::spawn(retry_strategy, || {
        let attempt = read();
        async move {
            attempt.await.map_err(|e| {
                warn!(call, error = %e, "RPC read failed, will retry");
                e
            })
        }
    })
    .await
}
