// Dispatch store tests: read fallback and write fan-out across stores.

mod common;

use common::{InstrumentedStore, RendezvousStore, coordinates, definition_with_files};
use defstore_core::PartialCoordinates;
use defstore_core::config::RetryConfig;
use defstore_store::query::DefinitionQuery;
use defstore_store::{
    DefinitionStore, DispatchDefinitionStore, MemoryCollection, PagedDefinitionStore,
    TrimmedDefinitionStore,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::Barrier;
use tokio::time::timeout;

fn paged() -> Arc<dyn DefinitionStore> {
    Arc::new(PagedDefinitionStore::new(
        Arc::new(MemoryCollection::new("definitions-paged")),
        2,
        RetryConfig::default(),
    ))
}

fn trimmed() -> Arc<dyn DefinitionStore> {
    Arc::new(TrimmedDefinitionStore::new(
        Arc::new(MemoryCollection::new("definitions-trimmed")),
        RetryConfig::default(),
    ))
}

#[tokio::test]
async fn test_get_short_circuits_on_first_hit() {
    let first = InstrumentedStore::wrapping(paged());
    let second = InstrumentedStore::wrapping(paged());
    let dispatch = DispatchDefinitionStore::new(vec![first.clone(), second.clone()]);

    let definition = definition_with_files(coordinates("foo", "1.0"), 3);
    dispatch.store(&definition).await.unwrap();

    let fetched = dispatch.get(&definition.coordinates).await.unwrap();
    assert_eq!(fetched, Some(definition));
    assert_eq!(first.get_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.get_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reads_fall_through_misses_and_failures() {
    let failing = InstrumentedStore::failing();
    let trimmed = InstrumentedStore::wrapping(trimmed());
    let paged = InstrumentedStore::wrapping(paged());
    let dispatch =
        DispatchDefinitionStore::new(vec![failing.clone(), trimmed.clone(), paged.clone()]);

    let definition = definition_with_files(coordinates("foo", "1.0"), 3);
    let ack = dispatch.store(&definition).await.unwrap().unwrap();
    assert_eq!(ack.key, "npm/npmjs/-/foo/1.0");

    // The trimmed store answers get with None and list with nothing.
    let fetched = dispatch.get(&definition.coordinates).await.unwrap();
    assert_eq!(fetched, Some(definition.clone()));
    let listed = dispatch
        .list(&PartialCoordinates::from(&definition.coordinates))
        .await
        .unwrap();
    assert_eq!(listed, vec!["npm/npmjs/-/foo/1.0"]);

    for store in [&failing, &trimmed, &paged] {
        assert_eq!(store.get_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_find_takes_first_successful_response() {
    let failing = InstrumentedStore::failing();
    let trimmed = InstrumentedStore::wrapping(trimmed());
    let paged = InstrumentedStore::wrapping(paged());
    let dispatch =
        DispatchDefinitionStore::new(vec![failing.clone(), trimmed.clone(), paged.clone()]);

    // An empty successful answer still wins.
    let result = dispatch
        .find(&DefinitionQuery::default(), "", 10)
        .await
        .unwrap();
    assert!(result.data.is_empty());
    assert_eq!(failing.find_calls.load(Ordering::SeqCst), 1);
    assert_eq!(trimmed.find_calls.load(Ordering::SeqCst), 1);
    assert_eq!(paged.find_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_writes_reach_every_store() {
    let failing = InstrumentedStore::failing();
    let paged = InstrumentedStore::wrapping(paged());
    let trimmed = InstrumentedStore::wrapping(trimmed());
    let dispatch =
        DispatchDefinitionStore::new(vec![failing.clone(), paged.clone(), trimmed.clone()]);

    dispatch.initialize().await.unwrap();
    let definition = definition_with_files(coordinates("foo", "1.0"), 5);
    let ack = dispatch.store(&definition).await.unwrap().unwrap();
    // First fulfilled result in store order comes from the paged store.
    assert_eq!(ack.records_written, 3);

    dispatch.delete(&definition.coordinates).await.unwrap();

    for store in [&failing, &paged, &trimmed] {
        assert_eq!(store.initialize_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.store_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.delete_calls.load(Ordering::SeqCst), 1);
    }
    assert!(paged.get(&definition.coordinates).await.unwrap().is_none());
}

#[tokio::test]
async fn test_writes_run_concurrently() {
    // Each store's write blocks until the other store is writing too, so
    // awaiting the stores one after another never finishes.
    let barrier = Arc::new(Barrier::new(2));
    let paged_store = paged();
    let trimmed_store = trimmed();
    let dispatch = DispatchDefinitionStore::new(vec![
        RendezvousStore::new(paged_store.clone(), barrier.clone()),
        RendezvousStore::new(trimmed_store.clone(), barrier),
    ]);
    let definition = definition_with_files(coordinates("foo", "1.0"), 3);
    let limit = Duration::from_secs(5);

    timeout(limit, dispatch.initialize())
        .await
        .expect("initialize awaited stores sequentially")
        .unwrap();

    let ack = timeout(limit, dispatch.store(&definition))
        .await
        .expect("store awaited stores sequentially")
        .unwrap()
        .unwrap();
    assert_eq!(ack.records_written, 2);
    let found = trimmed_store
        .find(&DefinitionQuery::default(), "", 10)
        .await
        .unwrap();
    assert_eq!(found.data.len(), 1);

    timeout(limit, dispatch.delete(&definition.coordinates))
        .await
        .expect("delete awaited stores sequentially")
        .unwrap();
    assert!(paged_store.get(&definition.coordinates).await.unwrap().is_none());
}

#[tokio::test]
async fn test_all_failing_degrades_to_empty() {
    let dispatch = DispatchDefinitionStore::new(vec![
        InstrumentedStore::failing(),
        InstrumentedStore::failing(),
    ]);
    let coordinates = coordinates("foo", "1.0");

    dispatch.initialize().await.unwrap();
    assert!(dispatch.get(&coordinates).await.unwrap().is_none());
    assert!(
        dispatch
            .list(&PartialCoordinates::default())
            .await
            .unwrap()
            .is_empty()
    );
    let found = dispatch
        .find(&DefinitionQuery::default(), "", 10)
        .await
        .unwrap();
    assert!(found.data.is_empty());
    assert!(found.continuation_token.is_empty());
    assert!(
        dispatch
            .store(&definition_with_files(coordinates.clone(), 1))
            .await
            .unwrap()
            .is_none()
    );
    dispatch.delete(&coordinates).await.unwrap();
}
