//! Continuation token codec.
//!
//! A token is the base64 encoding of the last returned record's sort values,
//! one segment per sort field in clause order, joined by [`SEPARATOR`].
//! Null or missing values encode as empty segments.

use crate::error::{StoreError, StoreResult};
use crate::query::filter::lookup;
use crate::query::sort::{SortClause, ValueKind};
use base64::{Engine as _, engine::general_purpose};
use mongodb::bson::{Bson, Document};

/// Segment separator (ASCII unit separator).
pub const SEPARATOR: char = '\u{1f}';

/// Maximum accepted token length before decoding.
pub const MAX_TOKEN_LENGTH: usize = 4096;

/// Encode the sort values of `last` as a continuation token.
///
/// Fails if a text value contains the separator, since that token could not be
/// decoded back to the same values.
pub fn encode(last: &Document, sort: &SortClause) -> StoreResult<String> {
    let mut segments = Vec::with_capacity(sort.fields().len());
    for field in sort.fields() {
        let segment = segment(lookup(last, field.path));
        if segment.contains(SEPARATOR) {
            return Err(StoreError::InvalidContinuationToken(format!(
                "value of '{}' contains the token separator",
                field.path
            )));
        }
        segments.push(segment);
    }
    let joined = segments.join(&SEPARATOR.to_string());
    Ok(general_purpose::STANDARD.encode(joined.as_bytes()))
}

/// Decode a token into one value per sort field.
pub fn decode(token: &str, sort: &SortClause) -> StoreResult<Vec<Bson>> {
    if token.len() > MAX_TOKEN_LENGTH {
        return Err(StoreError::InvalidContinuationToken(format!(
            "token too large: {} bytes (max: {MAX_TOKEN_LENGTH})",
            token.len()
        )));
    }

    let bytes = general_purpose::STANDARD.decode(token).map_err(|e| {
        StoreError::InvalidContinuationToken(format!("invalid token base64: {e}"))
    })?;
    let text = String::from_utf8(bytes).map_err(|e| {
        StoreError::InvalidContinuationToken(format!("token is not UTF-8: {e}"))
    })?;

    let segments: Vec<&str> = text.split(SEPARATOR).collect();
    let fields = sort.fields();
    if segments.len() != fields.len() {
        return Err(StoreError::InvalidContinuationToken(format!(
            "token has {} values but the sort has {} fields",
            segments.len(),
            fields.len()
        )));
    }

    let mut values = Vec::with_capacity(fields.len());
    for (field, segment) in fields.iter().zip(segments) {
        values.push(parse_segment(segment, field.kind).ok_or_else(|| {
            StoreError::InvalidContinuationToken(format!(
                "value '{segment}' is not valid for '{}'",
                field.path
            ))
        })?);
    }

    // The key tie-breaker is never null on a stored record.
    if values.last().is_some_and(|key| *key == Bson::Null) {
        return Err(StoreError::InvalidContinuationToken(
            "token is missing the record key".to_string(),
        ));
    }

    Ok(values)
}

fn segment(value: Option<&Bson>) -> String {
    match value {
        None | Some(Bson::Null) | Some(Bson::Undefined) => String::new(),
        Some(Bson::String(s)) => s.clone(),
        Some(Bson::Int32(n)) => n.to_string(),
        Some(Bson::Int64(n)) => n.to_string(),
        Some(Bson::Double(n)) => n.to_string(),
        Some(Bson::Boolean(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

fn parse_segment(segment: &str, kind: ValueKind) -> Option<Bson> {
    if segment.is_empty() {
        return Some(Bson::Null);
    }
    match kind {
        ValueKind::Text => Some(Bson::String(segment.to_string())),
        ValueKind::Number => segment
            .parse::<i64>()
            .map(Bson::Int64)
            .or_else(|_| segment.parse::<f64>().map(Bson::Double))
            .ok(),
    }
}
