//! Resume predicates for multi-field keyset pagination.
//!
//! Given the sort values `v1..vN` of the last record returned, the next page is
//! every record ordered after it:
//!
//! ```text
//! (f1 > v1)
//! OR (f1 = v1 AND f2 > v2)
//! ...
//! OR (f1 = v1 AND ... AND fN-1 = vN-1 AND fN > vN)
//! ```
//!
//! with `<` in place of `>` for descending sorts. Null and missing values sort
//! before every other value, so the comparisons are rewritten around them.

use super::filter::{Condition, Filter};
use super::sort::{SortClause, SortDirection};
use crate::error::{StoreError, StoreResult};
use crate::token;
use mongodb::bson::Bson;
use std::iter;

/// Filter selecting records after the position encoded in `continuation_token`.
///
/// An empty token starts from the beginning.
pub fn resume_filter(continuation_token: &str, sort: &SortClause) -> StoreResult<Filter> {
    if continuation_token.is_empty() {
        return Ok(Filter::All);
    }
    let values = token::decode(continuation_token, sort)?;
    pagination_predicate(&values, sort)
}

/// Build the "after these values" disjunction for a sort clause.
pub fn pagination_predicate(values: &[Bson], sort: &SortClause) -> StoreResult<Filter> {
    let fields = sort.fields();
    if values.len() != fields.len() {
        return Err(StoreError::InvalidContinuationToken(format!(
            "expected {} sort values, got {}",
            fields.len(),
            values.len()
        )));
    }

    let descending = sort.direction() == SortDirection::Descending;
    let disjuncts = (0..fields.len()).map(|k| {
        let equalities = fields[..k]
            .iter()
            .zip(values)
            .map(|(field, value)| Filter::field(field.path, Condition::Eq(value.clone())));
        let boundary = boundary(fields[k].path, &values[k], descending);
        Filter::and(equalities.chain(iter::once(boundary)))
    });

    Ok(Filter::or(disjuncts))
}

/// Records strictly after `value` on a single field.
fn boundary(path: &str, value: &Bson, descending: bool) -> Filter {
    match (descending, value) {
        // Ascending, everything non-null follows null.
        (false, Bson::Null) => Filter::field(path, Condition::Ne(Bson::Null)),
        (false, value) => Filter::field(path, Condition::Gt(value.clone())),
        // Descending, nothing follows null.
        (true, Bson::Null) => Filter::Nothing,
        (true, value) => Filter::or([
            Filter::field(path, Condition::Lt(value.clone())),
            Filter::is_null(path),
        ]),
    }
}
