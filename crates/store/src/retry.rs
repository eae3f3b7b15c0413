//! Connection retry for store initialization.

use crate::backends::DocumentCollection;
use crate::error::{StoreError, StoreResult};
use defstore_core::config::RetryConfig;

/// Ping `collection` until it answers, backing off between attempts.
///
/// Retries indefinitely unless `policy.max_attempts` is set.
pub async fn connect_with_retry(
    collection: &dyn DocumentCollection,
    policy: &RetryConfig,
) -> StoreResult<()> {
    let mut attempts: u32 = 0;
    loop {
        attempts = attempts.saturating_add(1);
        match collection.ping().await {
            Ok(()) => {
                if attempts > 1 {
                    tracing::info!(
                        backend = collection.backend_name(),
                        collection = collection.collection_name(),
                        attempts,
                        "Backend reachable after retries"
                    );
                }
                return Ok(());
            }
            Err(e) => {
                if policy.max_attempts.is_some_and(|max| attempts >= max) {
                    return Err(StoreError::RetryExhausted {
                        backend: collection.backend_name().to_string(),
                        attempts,
                        last_error: e.to_string(),
                    });
                }
                let backoff = policy.backoff(attempts);
                tracing::warn!(
                    backend = collection.backend_name(),
                    collection = collection.collection_name(),
                    attempt = attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Backend unreachable, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
