//! Sort clauses for definition queries.

use super::params::DefinitionQuery;

/// Field path of the canonical key on every stored record.
pub const KEY_FIELD: &str = "_id";

/// Sort direction, applied uniformly to every field of a clause.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// MongoDB sort value (`1` or `-1`).
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// How a sort field's values are typed when read back from a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Number,
}

/// One field of a sort clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortField {
    pub path: &'static str,
    pub kind: ValueKind,
}

const fn text(path: &'static str) -> SortField {
    SortField {
        path,
        kind: ValueKind::Text,
    }
}

const fn number(path: &'static str) -> SortField {
    SortField {
        path,
        kind: ValueKind::Number,
    }
}

/// Sort names accepted in the `sort` query parameter and their field paths.
const SORT_FIELDS: &[(&str, &[SortField])] = &[
    ("type", &[text("coordinates.type")]),
    ("provider", &[text("coordinates.provider")]),
    (
        "name",
        &[text("coordinates.name"), text("coordinates.revision")],
    ),
    (
        "namespace",
        &[
            text("coordinates.namespace"),
            text("coordinates.name"),
            text("coordinates.revision"),
        ],
    ),
    ("revision", &[text("coordinates.revision")]),
    ("license", &[text("licensed.declared")]),
    ("releaseDate", &[text("described.releaseDate")]),
    ("licensedScore", &[number("licensed.score.total")]),
    ("describedScore", &[number("described.score.total")]),
    ("effectiveScore", &[number("scores.effective")]),
    ("toolScore", &[number("scores.tool")]),
];

/// Ordered sort fields, always ending with the canonical key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortClause {
    fields: Vec<SortField>,
    direction: SortDirection,
}

impl SortClause {
    /// Build a clause from requested fields; the key tie-breaker is appended.
    pub fn new(requested: &[SortField], direction: SortDirection) -> Self {
        let mut fields = requested.to_vec();
        fields.push(text(KEY_FIELD));
        Self { fields, direction }
    }

    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// `(path, direction)` pairs in clause order.
    pub fn to_pairs(&self) -> Vec<(String, SortDirection)> {
        self.fields
            .iter()
            .map(|field| (field.path.to_string(), self.direction))
            .collect()
    }
}

/// Look up the field paths for a sort name. Unknown names sort by key only.
pub fn sort_fields(name: &str) -> &'static [SortField] {
    SORT_FIELDS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, fields)| *fields)
        .unwrap_or(&[])
}

/// Sort clause for a query.
pub fn build_sort(query: &DefinitionQuery) -> SortClause {
    let requested = query.sort.as_deref().map(sort_fields).unwrap_or(&[]);
    let direction = if query.sort_desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    SortClause::new(requested, direction)
}
