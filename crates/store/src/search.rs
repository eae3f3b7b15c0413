//! Shared `find` path for stores backed by a document collection.

use crate::backends::{DocumentCollection, FindOptions, Projection};
use crate::error::StoreResult;
use crate::paged::PAGING_FIELD;
use crate::query::{DefinitionQuery, Filter, build_filter, build_sort, resume_filter};
use crate::token;
use crate::traits::{FindResult, normalized_page_size};
use defstore_core::Definition;
use mongodb::bson::{self, Document};

/// Run a definition query against `collection`.
///
/// `scope` restricts the records considered (e.g. page 1 only). A continuation
/// token is returned only when the page came back full.
pub(crate) async fn find_definitions(
    collection: &dyn DocumentCollection,
    scope: Filter,
    projection: Projection,
    query: &DefinitionQuery,
    continuation_token: &str,
    page_size: usize,
) -> StoreResult<FindResult> {
    let page_size = normalized_page_size(page_size);
    let sort = build_sort(query);
    let filter = Filter::and([
        scope,
        build_filter(query),
        resume_filter(continuation_token, &sort)?,
    ]);
    let options = FindOptions {
        sort: sort.to_pairs(),
        limit: Some(page_size),
        projection,
    };

    let documents = collection.find(&filter, &options).await?;
    let continuation_token = match documents.last() {
        Some(last) if documents.len() == page_size => token::encode(last, &sort)?,
        _ => String::new(),
    };
    let data = documents
        .into_iter()
        .map(to_definition)
        .collect::<StoreResult<Vec<_>>>()?;

    tracing::debug!(
        collection = collection.collection_name(),
        returned = data.len(),
        more = !continuation_token.is_empty(),
        "Definition query completed"
    );

    Ok(FindResult {
        data,
        continuation_token,
    })
}

/// Strip storage fields from a record and decode it.
pub(crate) fn to_definition(mut document: Document) -> StoreResult<Definition> {
    document.remove("_id");
    document.remove(PAGING_FIELD);
    Ok(bson::from_document(document)?)
}
