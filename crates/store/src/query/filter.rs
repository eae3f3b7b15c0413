//! Backend-neutral filter expressions.
//!
//! Stores build a [`Filter`] once and hand it to a
//! [`DocumentCollection`](crate::backends::DocumentCollection). The MongoDB
//! backend renders it with [`Filter::to_document`]; the in-memory backend
//! evaluates it directly.

use mongodb::bson::{Bson, Document, doc};

/// A comparison applied to the value at a field path.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Equal. `Eq(Null)` also matches a missing field.
    Eq(Bson),
    /// Not equal. `Ne(Null)` matches any present, non-null value.
    Ne(Bson),
    Gt(Bson),
    Gte(Bson),
    Lt(Bson),
    Lte(Bson),
    /// Equals the prefix or starts with `prefix/` (path-segment prefix).
    Prefix(String),
}

/// A filter tree over document field paths.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Matches no document.
    Nothing,
    Field { path: String, condition: Condition },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn field(path: impl Into<String>, condition: Condition) -> Self {
        Filter::Field {
            path: path.into(),
            condition,
        }
    }

    pub fn eq(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::field(path, Condition::Eq(value.into()))
    }

    /// Field equals `null` or is missing.
    pub fn is_null(path: impl Into<String>) -> Self {
        Self::field(path, Condition::Eq(Bson::Null))
    }

    /// Segment-wise prefix match. An empty prefix matches everything.
    pub fn prefix(path: impl Into<String>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Filter::All;
        }
        Self::field(path, Condition::Prefix(prefix))
    }

    /// Conjunction, flattening nested `And`s and dropping `All`.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut parts = Vec::new();
        for filter in filters {
            match filter {
                Filter::All => {}
                Filter::Nothing => return Filter::Nothing,
                Filter::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Filter::All,
            1 => parts.remove(0),
            _ => Filter::And(parts),
        }
    }

    /// Disjunction, flattening nested `Or`s and dropping `Nothing`.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut parts = Vec::new();
        for filter in filters {
            match filter {
                Filter::Nothing => {}
                Filter::All => return Filter::All,
                Filter::Or(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Filter::Nothing,
            1 => parts.remove(0),
            _ => Filter::Or(parts),
        }
    }

    /// Render as a MongoDB query document.
    pub fn to_document(&self) -> Document {
        match self {
            Filter::All => Document::new(),
            Filter::Nothing => doc! { "_id": { "$in": [] } },
            Filter::Field { path, condition } => render_condition(path, condition),
            Filter::And(parts) => {
                let parts: Vec<Document> = parts.iter().map(Filter::to_document).collect();
                doc! { "$and": parts }
            }
            Filter::Or(parts) => {
                let parts: Vec<Document> = parts.iter().map(Filter::to_document).collect();
                doc! { "$or": parts }
            }
        }
    }
}

fn render_condition(path: &str, condition: &Condition) -> Document {
    let mut out = Document::new();
    match condition {
        Condition::Eq(value) => {
            out.insert(path, value.clone());
        }
        Condition::Ne(value) => {
            out.insert(path, doc! { "$ne": value.clone() });
        }
        Condition::Gt(value) => {
            out.insert(path, doc! { "$gt": value.clone() });
        }
        Condition::Gte(value) => {
            out.insert(path, doc! { "$gte": value.clone() });
        }
        Condition::Lt(value) => {
            out.insert(path, doc! { "$lt": value.clone() });
        }
        Condition::Lte(value) => {
            out.insert(path, doc! { "$lte": value.clone() });
        }
        Condition::Prefix(prefix) => {
            // '0' is the character after '/', so this range is exactly `prefix/...`
            // and stays usable by an index on the field.
            let mut exact = Document::new();
            exact.insert(path, prefix.as_str());
            let mut nested = Document::new();
            nested.insert(
                path,
                doc! { "$gte": format!("{prefix}/"), "$lt": format!("{prefix}0") },
            );
            out.insert("$or", vec![exact, nested]);
        }
    }
    out
}

/// Look up a dotted field path in a document.
pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = document.get(first)?;
    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }
    Some(current)
}
