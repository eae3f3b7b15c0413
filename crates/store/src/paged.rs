//! Paged definition store.
//!
//! A definition's `files` list is split across page records so no single
//! record approaches the backend's document size limit:
//!
//! ```text
//! _id = <key>     { coordinates, described, licensed, scores, files[0..n],
//!                   _mongo: { partitionKey: <key>, page: 1, totalPages: 3 } }
//! _id = <key>␟2   { files[n..2n],  _mongo: { partitionKey: <key>, page: 2, totalPages: 3 } }
//! _id = <key>␟3   { files[2n..],   _mongo: { partitionKey: <key>, page: 3, totalPages: 3 } }
//! ```
//!
//! `␟` is [`PAGE_ID_SEPARATOR`]. Keys containing it are rejected, so a page
//! id never equals another definition's key. Only page 1 carries queryable
//! fields, so every query is scoped to it.

use crate::backends::{DocumentCollection, FindOptions, IndexSpec, Projection};
use crate::error::StoreResult;
use crate::query::{Condition, DefinitionQuery, Filter, SortDirection};
use crate::retry::connect_with_retry;
use crate::search::{find_definitions, to_definition};
use crate::traits::{DefinitionStore, FindResult, StoreAck};
use async_trait::async_trait;
use defstore_core::config::RetryConfig;
use defstore_core::{Coordinates, Definition, PartialCoordinates};
use mongodb::bson::{self, Bson, Document, doc};
use std::sync::Arc;

/// Paging metadata field on every page record.
pub const PAGING_FIELD: &str = "_mongo";
pub const PARTITION_KEY_PATH: &str = "_mongo.partitionKey";
pub const PAGE_PATH: &str = "_mongo.page";
pub const TOTAL_PAGES_PATH: &str = "_mongo.totalPages";

/// Joins the key and page number in ids of pages after the first (ASCII unit
/// separator).
pub const PAGE_ID_SEPARATOR: char = '\u{1f}';

const FILES_FIELD: &str = "files";

/// Record id of a page. Page 1 uses the canonical key itself.
pub fn page_id(key: &str, page: usize) -> String {
    if page == 1 {
        key.to_string()
    } else {
        format!("{key}{PAGE_ID_SEPARATOR}{page}")
    }
}

/// Indexes for paged collections.
pub fn paged_indexes() -> Vec<IndexSpec> {
    [
        &[PARTITION_KEY_PATH][..],
        &["coordinates.type", PARTITION_KEY_PATH],
        &["coordinates.provider", PARTITION_KEY_PATH],
        &["coordinates.name", "coordinates.revision", PARTITION_KEY_PATH],
        &[
            "coordinates.namespace",
            "coordinates.name",
            "coordinates.revision",
            PARTITION_KEY_PATH,
        ],
        &["coordinates.name"],
        &["coordinates.revision"],
        &["coordinates.type"],
        &["described.releaseDate"],
        &["licensed.declared"],
        &["scores.effective"],
    ]
    .into_iter()
    .map(IndexSpec::new)
    .collect()
}

/// Definition store that splits file lists across page records.
pub struct PagedDefinitionStore {
    collection: Arc<dyn DocumentCollection>,
    files_per_page: usize,
    retry: RetryConfig,
}

impl PagedDefinitionStore {
    pub fn new(
        collection: Arc<dyn DocumentCollection>,
        files_per_page: usize,
        retry: RetryConfig,
    ) -> Self {
        Self {
            collection,
            files_per_page: files_per_page.max(1),
            retry,
        }
    }

    /// Split a definition into `(record id, record)` pairs in page order.
    ///
    /// A definition without files still produces exactly one page.
    pub fn page_records(&self, definition: &Definition) -> StoreResult<Vec<(String, Document)>> {
        let key = definition.key();
        if key.contains(PAGE_ID_SEPARATOR) {
            return Err(defstore_core::Error::InvalidCoordinates(format!(
                "'{}' contains the page id separator",
                key.escape_debug()
            ))
            .into());
        }
        let mut base = bson::to_document(definition)?;
        let files = match base.remove(FILES_FIELD) {
            Some(Bson::Array(files)) => files,
            _ => Vec::new(),
        };

        let total_pages = files.len().div_ceil(self.files_per_page).max(1);
        let mut chunks = files.chunks(self.files_per_page);
        let mut pages = Vec::with_capacity(total_pages);
        for page in 1..=total_pages {
            let mut record = if page == 1 {
                std::mem::take(&mut base)
            } else {
                Document::new()
            };
            let chunk = chunks.next().map(<[Bson]>::to_vec).unwrap_or_default();
            record.insert(FILES_FIELD, chunk);
            record.insert(
                PAGING_FIELD,
                doc! {
                    "partitionKey": key.as_str(),
                    "page": page as i64,
                    "totalPages": total_pages as i64,
                },
            );
            pages.push((page_id(&key, page), record));
        }
        Ok(pages)
    }

    fn partition(key: &str) -> Filter {
        Filter::eq(PARTITION_KEY_PATH, key)
    }
}

fn page_number(record: &Document, path: &str) -> Option<i64> {
    match crate::query::filter::lookup(record, path)? {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(n) => Some(*n as i64),
        _ => None,
    }
}

fn take_files(record: &mut Document) -> Vec<Bson> {
    match record.remove(FILES_FIELD) {
        Some(Bson::Array(files)) => files,
        _ => Vec::new(),
    }
}

#[async_trait]
impl DefinitionStore for PagedDefinitionStore {
    async fn initialize(&self) -> StoreResult<()> {
        connect_with_retry(self.collection.as_ref(), &self.retry).await?;
        self.collection.create_indexes(&paged_indexes()).await?;
        tracing::info!(
            backend = self.collection.backend_name(),
            collection = self.collection.collection_name(),
            files_per_page = self.files_per_page,
            "Paged definition store initialized"
        );
        Ok(())
    }

    async fn get(&self, coordinates: &Coordinates) -> StoreResult<Option<Definition>> {
        let key = coordinates.canonical_key();
        let options = FindOptions {
            sort: vec![(PAGE_PATH.to_string(), SortDirection::Ascending)],
            ..Default::default()
        };
        let mut records = self
            .collection
            .find(&Self::partition(&key), &options)
            .await?
            .into_iter();

        let Some(mut base) = records.next() else {
            return Ok(None);
        };
        if page_number(&base, PAGE_PATH) != Some(1) {
            tracing::warn!(key = %key, "Page records found without a first page");
            return Ok(None);
        }
        let total_pages = page_number(&base, TOTAL_PAGES_PATH).unwrap_or(1);

        let mut files = take_files(&mut base);
        let mut pages_read = 1;
        for mut record in records {
            match page_number(&record, PAGE_PATH) {
                Some(page) if page <= total_pages => {
                    files.extend(take_files(&mut record));
                    pages_read += 1;
                }
                // Left over from a larger version that is still being trimmed.
                _ => {}
            }
        }
        if pages_read != total_pages {
            tracing::warn!(
                key = %key,
                pages_read,
                total_pages,
                "Definition is missing pages"
            );
        }

        base.insert(FILES_FIELD, files);
        to_definition(base).map(Some)
    }

    async fn list(&self, coordinates: &PartialCoordinates) -> StoreResult<Vec<String>> {
        let filter = Filter::and([
            Filter::eq(PAGE_PATH, 1_i64),
            Filter::prefix(PARTITION_KEY_PATH, coordinates.prefix_key()),
        ]);
        let options = FindOptions {
            sort: vec![("_id".to_string(), SortDirection::Ascending)],
            limit: None,
            projection: Projection::Include(vec!["_id".to_string()]),
        };
        let records = self.collection.find(&filter, &options).await?;
        Ok(records
            .iter()
            .filter_map(|record| record.get_str("_id").ok().map(str::to_string))
            .collect())
    }

    async fn find(
        &self,
        query: &DefinitionQuery,
        continuation_token: &str,
        page_size: usize,
    ) -> StoreResult<FindResult> {
        find_definitions(
            self.collection.as_ref(),
            Filter::eq(PAGE_PATH, 1_i64),
            Projection::Exclude(vec![FILES_FIELD.to_string(), PAGING_FIELD.to_string()]),
            query,
            continuation_token,
            page_size,
        )
        .await
    }

    async fn store(&self, definition: &Definition) -> StoreResult<Option<StoreAck>> {
        let key = definition.key();
        let mut pages = self.page_records(definition)?;
        let total_pages = pages.len();

        // Trailing pages first, then page 1, then stale pages. Readers follow
        // page 1's totalPages, so they never see an absent definition and never
        // append pages from a different page count.
        let (first_id, first) = pages.remove(0);
        for (id, record) in pages {
            self.collection.replace_one(&id, record).await?;
        }
        self.collection.replace_one(&first_id, first).await?;

        let stale = Filter::and([
            Self::partition(&key),
            Filter::field(PAGE_PATH, Condition::Gt(Bson::Int64(total_pages as i64))),
        ]);
        let removed = self.collection.delete_many(&stale).await?;

        tracing::debug!(
            key = %key,
            pages = total_pages,
            stale_removed = removed,
            "Stored paged definition"
        );
        Ok(Some(StoreAck {
            key,
            records_written: total_pages,
        }))
    }

    async fn delete(&self, coordinates: &Coordinates) -> StoreResult<()> {
        let key = coordinates.canonical_key();
        let removed = self.collection.delete_many(&Self::partition(&key)).await?;
        tracing::debug!(key = %key, removed, "Deleted paged definition");
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "paged"
    }
}
