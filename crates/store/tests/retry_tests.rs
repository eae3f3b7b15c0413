// Connection retry tests for store initialization.

mod common;

use common::FlakyCollection;
use defstore_core::config::RetryConfig;
use defstore_store::retry::connect_with_retry;
use defstore_store::{DefinitionStore, PagedDefinitionStore, StoreError};
use std::sync::atomic::Ordering;

fn fast_retry(max_attempts: Option<u32>) -> RetryConfig {
    RetryConfig {
        initial_backoff_ms: 1,
        max_backoff_ms: 4,
        max_attempts,
    }
}

#[tokio::test]
async fn test_retries_until_reachable() {
    let collection = FlakyCollection::new(3);
    connect_with_retry(collection.as_ref(), &fast_retry(None))
        .await
        .unwrap();
    assert_eq!(collection.pings.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let collection = FlakyCollection::new(10);
    match connect_with_retry(collection.as_ref(), &fast_retry(Some(3))).await {
        Err(StoreError::RetryExhausted {
            backend, attempts, ..
        }) => {
            assert_eq!(backend, "flaky");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected retry exhaustion, got {other:?}"),
    }
    assert_eq!(collection.pings.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_initialize_waits_for_backend() {
    let collection = FlakyCollection::new(2);
    let store = PagedDefinitionStore::new(collection.clone(), 1000, fast_retry(Some(5)));
    store.initialize().await.unwrap();
    assert_eq!(collection.pings.load(Ordering::SeqCst), 3);
}
