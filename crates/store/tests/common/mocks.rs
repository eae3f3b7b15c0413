use async_trait::async_trait;
use defstore_core::{Coordinates, Definition, PartialCoordinates};
use defstore_store::backends::{DocumentCollection, FindOptions, IndexSpec};
use defstore_store::error::{StoreError, StoreResult};
use defstore_store::query::{DefinitionQuery, Filter};
use defstore_store::{DefinitionStore, FindResult, MemoryCollection, StoreAck};
use mongodb::bson::Document;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Barrier;

/// Counts calls per operation and either delegates to an inner store or fails
/// every call.
#[allow(dead_code)]
pub struct InstrumentedStore {
    inner: Option<Arc<dyn DefinitionStore>>,
    pub initialize_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub find_calls: AtomicUsize,
    pub store_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

#[allow(dead_code)]
impl InstrumentedStore {
    pub fn wrapping(inner: Arc<dyn DefinitionStore>) -> Arc<Self> {
        Arc::new(Self::with_inner(Some(inner)))
    }

    /// A store whose every operation returns a backend error.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self::with_inner(None))
    }

    fn with_inner(inner: Option<Arc<dyn DefinitionStore>>) -> Self {
        Self {
            inner,
            initialize_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            find_calls: AtomicUsize::new(0),
            store_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    fn inner(&self, counter: &AtomicUsize) -> StoreResult<&Arc<dyn DefinitionStore>> {
        counter.fetch_add(1, Ordering::SeqCst);
        self.inner
            .as_ref()
            .ok_or_else(|| StoreError::Backend("store unavailable".to_string()))
    }
}

#[async_trait]
impl DefinitionStore for InstrumentedStore {
    async fn initialize(&self) -> StoreResult<()> {
        self.inner(&self.initialize_calls)?.initialize().await
    }

    async fn get(&self, coordinates: &Coordinates) -> StoreResult<Option<Definition>> {
        self.inner(&self.get_calls)?.get(coordinates).await
    }

    async fn list(&self, coordinates: &PartialCoordinates) -> StoreResult<Vec<String>> {
        self.inner(&self.list_calls)?.list(coordinates).await
    }

    async fn find(
        &self,
        query: &DefinitionQuery,
        continuation_token: &str,
        page_size: usize,
    ) -> StoreResult<FindResult> {
        self.inner(&self.find_calls)?
            .find(query, continuation_token, page_size)
            .await
    }

    async fn store(&self, definition: &Definition) -> StoreResult<Option<StoreAck>> {
        self.inner(&self.store_calls)?.store(definition).await
    }

    async fn delete(&self, coordinates: &Coordinates) -> StoreResult<()> {
        self.inner(&self.delete_calls)?.delete(coordinates).await
    }

    fn store_name(&self) -> &'static str {
        match &self.inner {
            Some(inner) => inner.store_name(),
            None => "failing",
        }
    }
}

/// Delegates to an inner store, but each write first waits at a barrier
/// shared with other stores. Writes only complete when every store sharing
/// the barrier is writing at the same time.
#[allow(dead_code)]
pub struct RendezvousStore {
    inner: Arc<dyn DefinitionStore>,
    barrier: Arc<Barrier>,
}

#[allow(dead_code)]
impl RendezvousStore {
    pub fn new(inner: Arc<dyn DefinitionStore>, barrier: Arc<Barrier>) -> Arc<Self> {
        Arc::new(Self { inner, barrier })
    }
}

#[async_trait]
impl DefinitionStore for RendezvousStore {
    async fn initialize(&self) -> StoreResult<()> {
        self.barrier.wait().await;
        self.inner.initialize().await
    }

    async fn get(&self, coordinates: &Coordinates) -> StoreResult<Option<Definition>> {
        self.inner.get(coordinates).await
    }

    async fn list(&self, coordinates: &PartialCoordinates) -> StoreResult<Vec<String>> {
        self.inner.list(coordinates).await
    }

    async fn find(
        &self,
        query: &DefinitionQuery,
        continuation_token: &str,
        page_size: usize,
    ) -> StoreResult<FindResult> {
        self.inner.find(query, continuation_token, page_size).await
    }

    async fn store(&self, definition: &Definition) -> StoreResult<Option<StoreAck>> {
        self.barrier.wait().await;
        self.inner.store(definition).await
    }

    async fn delete(&self, coordinates: &Coordinates) -> StoreResult<()> {
        self.barrier.wait().await;
        self.inner.delete(coordinates).await
    }

    fn store_name(&self) -> &'static str {
        self.inner.store_name()
    }
}

/// Memory collection whose first `failures` pings fail.
#[allow(dead_code)]
pub struct FlakyCollection {
    inner: MemoryCollection,
    failures_remaining: AtomicUsize,
    pub pings: AtomicUsize,
}

#[allow(dead_code)]
impl FlakyCollection {
    pub fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryCollection::new("flaky"),
            failures_remaining: AtomicUsize::new(failures),
            pings: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl DocumentCollection for FlakyCollection {
    async fn ping(&self) -> StoreResult<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Backend("connection refused".to_string()));
        }
        Ok(())
    }

    async fn create_indexes(&self, indexes: &[IndexSpec]) -> StoreResult<()> {
        self.inner.create_indexes(indexes).await
    }

    async fn find(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        self.inner.find(filter, options).await
    }

    async fn replace_one(&self, id: &str, document: Document) -> StoreResult<()> {
        self.inner.replace_one(id, document).await
    }

    async fn delete_many(&self, filter: &Filter) -> StoreResult<u64> {
        self.inner.delete_many(filter).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    fn collection_name(&self) -> &str {
        self.inner.collection_name()
    }
}
