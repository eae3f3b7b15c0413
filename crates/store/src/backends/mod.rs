//! Document collection backends.
//!
//! Definition stores talk to their persistence through [`DocumentCollection`],
//! a narrow view of a MongoDB collection. [`mongo::MongoCollection`] is the
//! production backend; [`memory::MemoryCollection`] evaluates the same
//! filters in process.

pub mod memory;
pub mod mongo;

use crate::error::StoreResult;
use crate::query::filter::Filter;
use crate::query::sort::SortDirection;
use async_trait::async_trait;
use mongodb::bson::Document;

/// Which fields a find returns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    All,
    /// Only these top-level fields (plus `_id`).
    Include(Vec<String>),
    /// Everything except these top-level fields.
    Exclude(Vec<String>),
}

/// Options for [`DocumentCollection::find`].
#[derive(Clone, Debug, Default)]
pub struct FindOptions {
    /// `(path, direction)` pairs, most significant first.
    pub sort: Vec<(String, SortDirection)>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
    pub projection: Projection,
}

/// An ascending index over one or more field paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Vec<&'static str>,
}

impl IndexSpec {
    /// Index named after its keys.
    pub fn new(keys: &[&'static str]) -> Self {
        Self {
            name: keys.join("_").replace('.', "_"),
            keys: keys.to_vec(),
        }
    }
}

/// A collection of BSON documents keyed by `_id`.
#[async_trait]
pub trait DocumentCollection: Send + Sync + 'static {
    /// Verify the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Create indexes that do not exist yet.
    async fn create_indexes(&self, indexes: &[IndexSpec]) -> StoreResult<()>;

    /// Find documents matching `filter`.
    async fn find(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>>;

    /// Replace the document with `_id == id`, inserting it if absent.
    async fn replace_one(&self, id: &str, document: Document) -> StoreResult<()>;

    /// Delete every document matching `filter`, returning the count removed.
    async fn delete_many(&self, filter: &Filter) -> StoreResult<u64>;

    /// Backend identifier for logging (e.g. "mongo", "memory").
    fn backend_name(&self) -> &'static str;

    /// Collection name for logging.
    fn collection_name(&self) -> &str;
}
