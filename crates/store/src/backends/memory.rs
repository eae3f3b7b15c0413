//! In-process document collection.
//!
//! Follows MongoDB's query semantics closely enough for the definition stores:
//! missing fields behave as null, comparisons only match values of the same
//! type bracket, and sorting uses the BSON cross-type order (null first).

use super::{DocumentCollection, FindOptions, IndexSpec, Projection};
use crate::error::StoreResult;
use crate::query::filter::{Condition, Filter, lookup};
use crate::query::sort::SortDirection;
use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Document collection held in memory.
pub struct MemoryCollection {
    name: String,
    documents: RwLock<BTreeMap<String, Document>>,
    indexes: RwLock<Vec<IndexSpec>>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(BTreeMap::new()),
            indexes: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Stored document ids in ascending order.
    pub async fn ids(&self) -> Vec<String> {
        self.documents.read().await.keys().cloned().collect()
    }

    /// Raw stored document by id.
    pub async fn document(&self, id: &str) -> Option<Document> {
        self.documents.read().await.get(id).cloned()
    }

    /// Names of the indexes created so far.
    pub async fn index_names(&self) -> Vec<String> {
        self.indexes
            .read()
            .await
            .iter()
            .map(|index| index.name.clone())
            .collect()
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_indexes(&self, indexes: &[IndexSpec]) -> StoreResult<()> {
        let mut existing = self.indexes.write().await;
        for index in indexes {
            if !existing.iter().any(|e| e.name == index.name) {
                existing.push(index.clone());
            }
        }
        Ok(())
    }

    async fn find(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        let documents = self.documents.read().await;
        let mut matched: Vec<&Document> = documents
            .values()
            .filter(|document| matches(filter, document))
            .collect();
        sort_documents(&mut matched, &options.sort);

        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .take(limit)
            .map(|document| project(document, &options.projection))
            .collect())
    }

    async fn replace_one(&self, id: &str, mut document: Document) -> StoreResult<()> {
        document.insert("_id", id);
        self.documents.write().await.insert(id.to_string(), document);
        Ok(())
    }

    async fn delete_many(&self, filter: &Filter) -> StoreResult<u64> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|_, document| !matches(filter, document));
        Ok((before - documents.len()) as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn collection_name(&self) -> &str {
        &self.name
    }
}

fn sort_documents(documents: &mut [&Document], sort: &[(String, SortDirection)]) {
    if sort.is_empty() {
        return;
    }
    documents.sort_by(|a, b| {
        for (path, direction) in sort {
            let ordering = compare(lookup(a, path), lookup(b, path));
            let ordering = match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn project(document: &Document, projection: &Projection) -> Document {
    match projection {
        Projection::All => document.clone(),
        Projection::Include(fields) => document
            .iter()
            .filter(|(key, _)| *key == "_id" || fields.iter().any(|f| f == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        Projection::Exclude(fields) => document
            .iter()
            .filter(|(key, _)| !fields.iter().any(|f| f == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}

/// Evaluate a filter against a document.
pub(crate) fn matches(filter: &Filter, document: &Document) -> bool {
    match filter {
        Filter::All => true,
        Filter::Nothing => false,
        Filter::And(parts) => parts.iter().all(|part| matches(part, document)),
        Filter::Or(parts) => parts.iter().any(|part| matches(part, document)),
        Filter::Field { path, condition } => condition_matches(lookup(document, path), condition),
    }
}

fn condition_matches(value: Option<&Bson>, condition: &Condition) -> bool {
    match condition {
        Condition::Eq(expected) => equals(value, expected),
        Condition::Ne(expected) => !equals(value, expected),
        Condition::Gt(bound) => bracketed(value, bound).is_some_and(Ordering::is_gt),
        Condition::Gte(bound) => bracketed(value, bound).is_some_and(Ordering::is_ge),
        Condition::Lt(bound) => bracketed(value, bound).is_some_and(Ordering::is_lt),
        Condition::Lte(bound) => bracketed(value, bound).is_some_and(Ordering::is_le),
        Condition::Prefix(prefix) => match value {
            Some(Bson::String(s)) => {
                s == prefix
                    || s.strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            _ => false,
        },
    }
}

fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    bracketed(value, expected).is_some_and(Ordering::is_eq)
}

/// Compare only when both sides share a type bracket, as MongoDB does for
/// query operators.
fn bracketed(value: Option<&Bson>, bound: &Bson) -> Option<Ordering> {
    if type_rank(value) != type_rank(Some(bound)) {
        return None;
    }
    Some(compare(value, Some(bound)))
}

/// Position of a value's type in the BSON comparison order.
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        Some(Bson::MinKey) => 0,
        None | Some(Bson::Null) | Some(Bson::Undefined) => 1,
        Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_)) => 2,
        Some(Bson::String(_) | Bson::Symbol(_)) => 3,
        Some(Bson::Document(_)) => 4,
        Some(Bson::Array(_)) => 5,
        Some(Bson::Binary(_)) => 6,
        Some(Bson::ObjectId(_)) => 7,
        Some(Bson::Boolean(_)) => 8,
        Some(Bson::DateTime(_)) => 9,
        Some(Bson::Timestamp(_)) => 10,
        Some(Bson::RegularExpression(_)) => 11,
        Some(Bson::MaxKey) => 13,
        Some(_) => 12,
    }
}

/// Total order over optional BSON values; missing sorts with null.
fn compare(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let (rank_a, rank_b) = (type_rank(a), type_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }
    match (a, b) {
        (Some(Bson::Int32(x)), Some(Bson::Int32(y))) => x.cmp(y),
        (Some(Bson::Int64(x)), Some(Bson::Int64(y))) => x.cmp(y),
        (Some(Bson::Int32(x)), Some(Bson::Int64(y))) => i64::from(*x).cmp(y),
        (Some(Bson::Int64(x)), Some(Bson::Int32(y))) => x.cmp(&i64::from(*y)),
        (Some(x), Some(y)) if rank_a == 2 => as_f64(x).total_cmp(&as_f64(y)),
        (Some(Bson::String(x)), Some(Bson::String(y))) => x.as_bytes().cmp(y.as_bytes()),
        (Some(Bson::Boolean(x)), Some(Bson::Boolean(y))) => x.cmp(y),
        (Some(Bson::DateTime(x)), Some(Bson::DateTime(y))) => x.cmp(y),
        (Some(Bson::Document(x)), Some(Bson::Document(y))) => x.to_string().cmp(&y.to_string()),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        _ => Ordering::Equal,
    }
}

fn as_f64(value: &Bson) -> f64 {
    match value {
        Bson::Int32(n) => f64::from(*n),
        Bson::Int64(n) => *n as f64,
        Bson::Double(n) => *n,
        _ => f64::NAN,
    }
}
