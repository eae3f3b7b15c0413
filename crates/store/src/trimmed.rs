//! Trimmed definition store.
//!
//! Keeps one record per definition with the file list dropped. It exists to
//! serve `find` cheaply; `get` and `list` are served by a paged store.

use crate::backends::{DocumentCollection, IndexSpec, Projection};
use crate::error::StoreResult;
use crate::query::{DefinitionQuery, Filter};
use crate::retry::connect_with_retry;
use crate::search::find_definitions;
use crate::traits::{DefinitionStore, FindResult, StoreAck};
use async_trait::async_trait;
use defstore_core::config::RetryConfig;
use defstore_core::{Coordinates, Definition, PartialCoordinates};
use mongodb::bson;
use std::sync::Arc;

const FILES_FIELD: &str = "files";

/// Indexes for trimmed collections.
pub fn trimmed_indexes() -> Vec<IndexSpec> {
    [
        "coordinates.name",
        "coordinates.revision",
        "coordinates.type",
        "coordinates.provider",
        "coordinates.namespace",
        "described.releaseDate",
        "described.score.total",
        "licensed.declared",
        "licensed.score.total",
        "scores.effective",
        "scores.tool",
    ]
    .into_iter()
    .map(|key| IndexSpec::new(&[key]))
    .collect()
}

pub struct TrimmedDefinitionStore {
    collection: Arc<dyn DocumentCollection>,
    retry: RetryConfig,
}

impl TrimmedDefinitionStore {
    pub fn new(collection: Arc<dyn DocumentCollection>, retry: RetryConfig) -> Self {
        Self { collection, retry }
    }
}

#[async_trait]
impl DefinitionStore for TrimmedDefinitionStore {
    async fn initialize(&self) -> StoreResult<()> {
        connect_with_retry(self.collection.as_ref(), &self.retry).await?;
        self.collection.create_indexes(&trimmed_indexes()).await?;
        tracing::info!(
            backend = self.collection.backend_name(),
            collection = self.collection.collection_name(),
            "Trimmed definition store initialized"
        );
        Ok(())
    }

    async fn get(&self, coordinates: &Coordinates) -> StoreResult<Option<Definition>> {
        tracing::debug!(key = %coordinates, "get not served by trimmed store");
        Ok(None)
    }

    async fn list(&self, coordinates: &PartialCoordinates) -> StoreResult<Vec<String>> {
        tracing::debug!(prefix = %coordinates.prefix_key(), "list not served by trimmed store");
        Ok(Vec::new())
    }

    async fn find(
        &self,
        query: &DefinitionQuery,
        continuation_token: &str,
        page_size: usize,
    ) -> StoreResult<FindResult> {
        find_definitions(
            self.collection.as_ref(),
            Filter::All,
            Projection::All,
            query,
            continuation_token,
            page_size,
        )
        .await
    }

    async fn store(&self, definition: &Definition) -> StoreResult<Option<StoreAck>> {
        let key = definition.key();
        let mut record = bson::to_document(definition)?;
        record.remove(FILES_FIELD);
        self.collection.replace_one(&key, record).await?;
        tracing::debug!(key = %key, "Stored trimmed definition");
        Ok(Some(StoreAck {
            key,
            records_written: 1,
        }))
    }

    async fn delete(&self, coordinates: &Coordinates) -> StoreResult<()> {
        let key = coordinates.canonical_key();
        self.collection
            .delete_many(&Filter::eq("_id", key.as_str()))
            .await?;
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "trimmed"
    }
}
