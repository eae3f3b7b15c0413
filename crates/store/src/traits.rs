//! Definition store trait definitions.

use crate::error::StoreResult;
use crate::query::DefinitionQuery;
use async_trait::async_trait;
use defstore_core::{Coordinates, Definition, PartialCoordinates};
use serde::{Deserialize, Serialize};

/// Default number of definitions returned by `find`.
pub const DEFAULT_FIND_PAGE_SIZE: usize = 100;

/// Largest page `find` will return.
pub const MAX_FIND_PAGE_SIZE: usize = 1000;

/// Clamp a requested `find` page size to `[1, MAX_FIND_PAGE_SIZE]`.
pub fn normalized_page_size(page_size: usize) -> usize {
    page_size.clamp(1, MAX_FIND_PAGE_SIZE)
}

/// One page of `find` results.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindResult {
    pub data: Vec<Definition>,
    /// Opaque cursor for the next page; empty when there is nothing more.
    pub continuation_token: String,
}

/// Acknowledgement of a successful `store`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreAck {
    /// Canonical key the definition was stored under.
    pub key: String,
    /// Backend records written (page count for paged stores).
    pub records_written: usize,
}

/// Storage for definitions keyed by canonical coordinates.
#[async_trait]
pub trait DefinitionStore: Send + Sync + 'static {
    /// Connect to the backend and create indexes.
    async fn initialize(&self) -> StoreResult<()>;

    /// Fetch a full definition. `None` when absent or unsupported by the store.
    async fn get(&self, coordinates: &Coordinates) -> StoreResult<Option<Definition>>;

    /// Canonical keys under a coordinate prefix, ascending.
    ///
    /// Meant for discovery and browsing; results are not paged.
    async fn list(&self, coordinates: &PartialCoordinates) -> StoreResult<Vec<String>>;

    /// Query definitions (without files), resuming after `continuation_token`.
    async fn find(
        &self,
        query: &DefinitionQuery,
        continuation_token: &str,
        page_size: usize,
    ) -> StoreResult<FindResult>;

    /// Store a definition, replacing any previous one with the same key.
    ///
    /// Returns `None` only when no backend acknowledged the write.
    async fn store(&self, definition: &Definition) -> StoreResult<Option<StoreAck>>;

    /// Remove a definition.
    async fn delete(&self, coordinates: &Coordinates) -> StoreResult<()>;

    /// Name of this store for logging (e.g. "paged", "trimmed", "dispatch").
    fn store_name(&self) -> &'static str;
}
