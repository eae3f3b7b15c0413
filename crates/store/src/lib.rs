//! Definition storage for defstore.
//!
//! This crate provides:
//! - A paged store that splits large file lists across page records
//! - A trimmed, query-only store that keeps definitions without files
//! - A dispatch store fanning one logical operation across several stores
//! - Sortable, filterable queries with opaque continuation tokens
//! - Backends: MongoDB and in-memory

pub mod backends;
pub mod dispatch;
pub mod error;
pub mod paged;
pub mod query;
pub mod retry;
mod search;
pub mod token;
pub mod traits;
pub mod trimmed;

pub use backends::{
    DocumentCollection, FindOptions, IndexSpec, Projection, memory::MemoryCollection,
    mongo::MongoCollection,
};
pub use dispatch::DispatchDefinitionStore;
pub use error::{StoreError, StoreResult};
pub use paged::PagedDefinitionStore;
pub use query::DefinitionQuery;
pub use traits::{
    DEFAULT_FIND_PAGE_SIZE, DefinitionStore, FindResult, MAX_FIND_PAGE_SIZE, StoreAck,
};
pub use trimmed::TrimmedDefinitionStore;

use defstore_core::config::{AppConfig, BackendConfig, RetryConfig, StoreConfig, StoreKind};
use std::sync::Arc;

/// Create a definition store from configuration.
///
/// The store is not initialized; call [`DefinitionStore::initialize`] before use.
pub async fn from_config(
    config: &StoreConfig,
    retry: &RetryConfig,
) -> StoreResult<Arc<dyn DefinitionStore>> {
    config.validate().map_err(StoreError::Config)?;

    let collection_name = config.collection_name();
    tracing::debug!(
        kind = config.kind.as_str(),
        backend = config.backend.backend_name(),
        collection = %collection_name,
        "Creating definition store"
    );
    let collection: Arc<dyn DocumentCollection> = match &config.backend {
        BackendConfig::Mongo {
            connection_string,
            database,
            app_name,
            ..
        } => Arc::new(
            MongoCollection::new(
                connection_string,
                database,
                &collection_name,
                app_name.as_deref(),
            )
            .await?,
        ),
        BackendConfig::Memory => Arc::new(MemoryCollection::new(collection_name)),
    };

    let store: Arc<dyn DefinitionStore> = match config.kind {
        StoreKind::Paged => Arc::new(PagedDefinitionStore::new(
            collection,
            config.files_per_page,
            retry.clone(),
        )),
        StoreKind::Trimmed => Arc::new(TrimmedDefinitionStore::new(collection, retry.clone())),
    };
    Ok(store)
}

/// Create the store described by an application config.
///
/// Several configured stores are wrapped in a [`DispatchDefinitionStore`] in
/// configured order; a single store is returned as is.
pub async fn from_configs(config: &AppConfig) -> StoreResult<Arc<dyn DefinitionStore>> {
    config.validate().map_err(StoreError::Config)?;

    let mut stores = Vec::with_capacity(config.stores.len());
    for store in &config.stores {
        stores.push(from_config(store, &config.retry).await?);
    }
    if stores.len() == 1
        && let Some(store) = stores.pop()
    {
        return Ok(store);
    }
    Ok(Arc::new(DispatchDefinitionStore::new(stores)))
}
