//! Query building: filters, sort clauses and resume predicates.

pub mod filter;
pub mod pagination;
pub mod params;
pub mod sort;

pub use filter::{Condition, Filter};
pub use pagination::{pagination_predicate, resume_filter};
pub use params::DefinitionQuery;
pub use sort::{SortClause, SortDirection, SortField, ValueKind, build_sort};

use mongodb::bson::Bson;

/// Translate query parameters into a filter over definition fields.
///
/// Missing parameters add no constraint; `min*`/`max*` bounds are inclusive
/// and release date bounds are exclusive.
pub fn build_filter(query: &DefinitionQuery) -> Filter {
    let mut parts = Vec::new();

    let equalities = [
        ("coordinates.type", &query.r#type),
        ("coordinates.provider", &query.provider),
        ("coordinates.namespace", &query.namespace),
        ("coordinates.name", &query.name),
        ("licensed.declared", &query.license),
    ];
    for (path, value) in equalities {
        if let Some(value) = value {
            parts.push(Filter::eq(path, value.as_str()));
        }
    }

    if let Some(after) = &query.released_after {
        parts.push(Filter::field(
            "described.releaseDate",
            Condition::Gt(Bson::String(after.clone())),
        ));
    }
    if let Some(before) = &query.released_before {
        parts.push(Filter::field(
            "described.releaseDate",
            Condition::Lt(Bson::String(before.clone())),
        ));
    }

    let score_bounds = [
        (
            "scores.effective",
            query.min_effective_score,
            query.max_effective_score,
        ),
        ("scores.tool", query.min_tool_score, query.max_tool_score),
        (
            "licensed.score.total",
            query.min_licensed_score,
            query.max_licensed_score,
        ),
        (
            "described.score.total",
            query.min_described_score,
            query.max_described_score,
        ),
    ];
    for (path, min, max) in score_bounds {
        if let Some(min) = min {
            parts.push(Filter::field(path, Condition::Gte(Bson::Int64(min))));
        }
        if let Some(max) = max {
            parts.push(Filter::field(path, Condition::Lte(Bson::Int64(max))));
        }
    }

    Filter::and(parts)
}
