//! MongoDB document collection.

use super::{DocumentCollection, FindOptions, IndexSpec, Projection};
use crate::error::StoreResult;
use crate::query::filter::Filter;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use tracing::instrument;

/// A MongoDB collection of definition records.
///
/// Construction only parses options; the first round trip happens in
/// [`DocumentCollection::ping`], which stores call with retry during
/// initialization.
pub struct MongoCollection {
    client: Client,
    database: String,
    collection: Collection<Document>,
    name: String,
}

impl MongoCollection {
    /// Create a collection handle from a connection string.
    pub async fn new(
        connection_string: &str,
        database: &str,
        collection: &str,
        app_name: Option<&str>,
    ) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(connection_string).await?;
        if let Some(app_name) = app_name {
            options.app_name = Some(app_name.to_string());
        }
        let client = Client::with_options(options)?;
        Ok(Self::from_client(client, database, collection))
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client, database: &str, collection: &str) -> Self {
        let handle = client.database(database).collection::<Document>(collection);
        Self {
            client,
            database: database.to_string(),
            collection: handle,
            name: collection.to_string(),
        }
    }
}

fn sort_document(options: &FindOptions) -> Document {
    let mut sort = Document::new();
    for (path, direction) in &options.sort {
        sort.insert(path.as_str(), direction.as_i32());
    }
    sort
}

fn projection_document(projection: &Projection) -> Option<Document> {
    let (fields, flag) = match projection {
        Projection::All => return None,
        Projection::Include(fields) => (fields, 1),
        Projection::Exclude(fields) => (fields, 0),
    };
    let mut out = Document::new();
    for field in fields {
        out.insert(field.as_str(), flag);
    }
    Some(out)
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    #[instrument(skip(self), fields(backend = "mongo", collection = %self.name))]
    async fn ping(&self) -> StoreResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    #[instrument(skip(self, indexes), fields(backend = "mongo", collection = %self.name))]
    async fn create_indexes(&self, indexes: &[IndexSpec]) -> StoreResult<()> {
        let models = indexes.iter().map(|index| {
            let mut keys = Document::new();
            for key in &index.keys {
                keys.insert(*key, 1);
            }
            IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().name(index.name.clone()).build())
                .build()
        });
        self.collection.create_indexes(models).await?;
        tracing::debug!(count = indexes.len(), "Indexes ensured");
        Ok(())
    }

    #[instrument(skip(self, options), fields(backend = "mongo", collection = %self.name))]
    async fn find(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        let mut find = self.collection.find(filter.to_document());
        if !options.sort.is_empty() {
            find = find.sort(sort_document(options));
        }
        if let Some(limit) = options.limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(projection) = projection_document(&options.projection) {
            find = find.projection(projection);
        }
        let cursor = find.await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self, document), fields(backend = "mongo", collection = %self.name))]
    async fn replace_one(&self, id: &str, mut document: Document) -> StoreResult<()> {
        document.insert("_id", id);
        self.collection
            .replace_one(doc! { "_id": id }, document)
            .upsert(true)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "mongo", collection = %self.name))]
    async fn delete_many(&self, filter: &Filter) -> StoreResult<u64> {
        let result = self.collection.delete_many(filter.to_document()).await?;
        Ok(result.deleted_count)
    }

    fn backend_name(&self) -> &'static str {
        "mongo"
    }

    fn collection_name(&self) -> &str {
        &self.name
    }
}
