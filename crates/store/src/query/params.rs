//! Definition query parameters.

use serde::{Deserialize, Serialize};

/// Filter and sort request for `find`.
///
/// Built from loosely-typed request parameters with [`DefinitionQuery::from_params`];
/// numeric bounds that fail to parse are dropped rather than rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionQuery {
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub provider: Option<String>,
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub license: Option<String>,
    pub released_after: Option<String>,
    pub released_before: Option<String>,
    pub min_effective_score: Option<i64>,
    pub max_effective_score: Option<i64>,
    pub min_tool_score: Option<i64>,
    pub max_tool_score: Option<i64>,
    pub min_licensed_score: Option<i64>,
    pub max_licensed_score: Option<i64>,
    pub min_described_score: Option<i64>,
    pub max_described_score: Option<i64>,
    pub sort: Option<String>,
    #[serde(default)]
    pub sort_desc: bool,
}

impl DefinitionQuery {
    /// Build a query from `key=value` style parameters.
    ///
    /// Unknown keys are ignored. Empty values count as absent.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();
        for (key, value) in params {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            let text = || Some(value.to_string());
            let number = || value.parse::<i64>().ok();
            match key.as_ref() {
                "type" => query.r#type = text(),
                "provider" => query.provider = text(),
                "namespace" => query.namespace = text(),
                "name" => query.name = text(),
                "license" => query.license = text(),
                "releasedAfter" => query.released_after = text(),
                "releasedBefore" => query.released_before = text(),
                "minEffectiveScore" => query.min_effective_score = number(),
                "maxEffectiveScore" => query.max_effective_score = number(),
                "minToolScore" => query.min_tool_score = number(),
                "maxToolScore" => query.max_tool_score = number(),
                "minLicensedScore" => query.min_licensed_score = number(),
                "maxLicensedScore" => query.max_licensed_score = number(),
                "minDescribedScore" => query.min_described_score = number(),
                "maxDescribedScore" => query.max_described_score = number(),
                "sort" => query.sort = text(),
                "sortDesc" => {
                    query.sort_desc = value.eq_ignore_ascii_case("true") || value == "1"
                }
                _ => {}
            }
        }
        query
    }

    /// Query matching a declared license.
    pub fn by_license(license: impl Into<String>) -> Self {
        Self {
            license: Some(license.into()),
            ..Default::default()
        }
    }
}
