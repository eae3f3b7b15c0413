//! Dispatch store: one logical store over several configured stores.
//!
//! Reads walk the stores in order and take the first useful answer. Writes
//! go to every store concurrently and report the first that succeeded.

use crate::error::StoreResult;
use crate::query::DefinitionQuery;
use crate::traits::{DefinitionStore, FindResult, StoreAck};
use async_trait::async_trait;
use defstore_core::{Coordinates, Definition, PartialCoordinates};
use futures::future::join_all;
use std::sync::Arc;

pub struct DispatchDefinitionStore {
    stores: Vec<Arc<dyn DefinitionStore>>,
}

impl DispatchDefinitionStore {
    pub fn new(stores: Vec<Arc<dyn DefinitionStore>>) -> Self {
        Self { stores }
    }

    /// Log failed outcomes and return the first fulfilled one in store order.
    fn first_fulfilled<T>(&self, operation: &str, results: Vec<StoreResult<T>>) -> Option<T> {
        let mut first = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(value) => {
                    if first.is_none() {
                        first = Some(value);
                    }
                }
                Err(e) => self.log_failure(operation, index, &e),
            }
        }
        first
    }

    fn log_failure(&self, operation: &str, index: usize, error: &dyn std::fmt::Display) {
        let store = self.stores.get(index).map_or("unknown", |s| s.store_name());
        tracing::error!(operation, index, store, error = %error, "Dispatch store operation failed");
    }
}

#[async_trait]
impl DefinitionStore for DispatchDefinitionStore {
    async fn initialize(&self) -> StoreResult<()> {
        let results = join_all(self.stores.iter().map(|store| store.initialize())).await;
        if self.first_fulfilled("initialize", results).is_none() {
            tracing::warn!(stores = self.stores.len(), "No store initialized");
        }
        Ok(())
    }

    async fn get(&self, coordinates: &Coordinates) -> StoreResult<Option<Definition>> {
        for (index, store) in self.stores.iter().enumerate() {
            match store.get(coordinates).await {
                Ok(Some(definition)) => return Ok(Some(definition)),
                Ok(None) => {}
                Err(e) => self.log_failure("get", index, &e),
            }
        }
        Ok(None)
    }

    async fn list(&self, coordinates: &PartialCoordinates) -> StoreResult<Vec<String>> {
        for (index, store) in self.stores.iter().enumerate() {
            match store.list(coordinates).await {
                Ok(keys) if !keys.is_empty() => return Ok(keys),
                Ok(_) => {}
                Err(e) => self.log_failure("list", index, &e),
            }
        }
        Ok(Vec::new())
    }

    async fn find(
        &self,
        query: &DefinitionQuery,
        continuation_token: &str,
        page_size: usize,
    ) -> StoreResult<FindResult> {
        for (index, store) in self.stores.iter().enumerate() {
            match store.find(query, continuation_token, page_size).await {
                Ok(result) => return Ok(result),
                Err(e) => self.log_failure("find", index, &e),
            }
        }
        Ok(FindResult::default())
    }

    async fn store(&self, definition: &Definition) -> StoreResult<Option<StoreAck>> {
        let results = join_all(self.stores.iter().map(|store| store.store(definition))).await;
        Ok(self.first_fulfilled("store", results).flatten())
    }

    async fn delete(&self, coordinates: &Coordinates) -> StoreResult<()> {
        let results = join_all(self.stores.iter().map(|store| store.delete(coordinates))).await;
        self.first_fulfilled("delete", results);
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "dispatch"
    }
}
