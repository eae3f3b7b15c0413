//! Component coordinates and canonical keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace placeholder used in canonical keys when a component has none.
pub const NAMESPACE_SENTINEL: &str = "-";

/// Coordinates identifying one revision of a component.
///
/// The canonical key (`type/provider/namespace/name/revision`) is the natural
/// key of every definition store. Type and provider are case-normalized;
/// namespace and name casing is provider-specific and taken as given.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "type")]
    pub r#type: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl Coordinates {
    /// Create coordinates from components. A `-` namespace is treated as absent.
    pub fn new(
        r#type: impl Into<String>,
        provider: impl Into<String>,
        namespace: Option<&str>,
        name: impl Into<String>,
        revision: Option<&str>,
    ) -> Self {
        Self {
            r#type: r#type.into(),
            provider: provider.into(),
            namespace: namespace
                .filter(|ns| !ns.is_empty() && *ns != NAMESPACE_SENTINEL)
                .map(str::to_string),
            name: name.into(),
            revision: revision.filter(|r| !r.is_empty()).map(str::to_string),
        }
    }

    /// Canonical key: lower-cased type/provider, `-` for a missing namespace,
    /// empty fields omitted.
    pub fn canonical_key(&self) -> String {
        let r#type = self.r#type.to_lowercase();
        let provider = self.provider.to_lowercase();
        let namespace = self
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(NAMESPACE_SENTINEL);

        [
            r#type.as_str(),
            provider.as_str(),
            namespace,
            self.name.as_str(),
            self.revision.as_deref().unwrap_or_default(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_key())
    }
}

impl FromStr for Coordinates {
    type Err = crate::Error;

    /// Parse `type/provider/namespace/name[/revision]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim_matches('/').split('/').collect();
        if parts.len() < 4 || parts.len() > 5 {
            return Err(crate::Error::InvalidCoordinates(format!(
                "expected type/provider/namespace/name[/revision], got '{s}'"
            )));
        }
        if let Some(empty) = parts[..4].iter().position(|part| part.is_empty()) {
            return Err(crate::Error::InvalidCoordinates(format!(
                "segment {} of '{s}' is empty",
                empty + 1
            )));
        }

        Ok(Self::new(
            parts[0],
            parts[1],
            Some(parts[2]),
            parts[3],
            parts.get(4).copied(),
        ))
    }
}

/// Coordinates with any trailing fields left out, used for prefix listings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialCoordinates {
    #[serde(rename = "type", default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub revision: Option<String>,
}

impl PartialCoordinates {
    /// Key prefix covering every definition under these coordinates.
    ///
    /// Stops at the first absent field. An absent namespace renders as `-`
    /// when a name follows it.
    pub fn prefix_key(&self) -> String {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.is_empty())
        }

        let mut parts: Vec<String> = Vec::with_capacity(5);
        let Some(r#type) = present(&self.r#type) else {
            return String::new();
        };
        parts.push(r#type.to_lowercase());

        if let Some(provider) = present(&self.provider) {
            parts.push(provider.to_lowercase());
            match (present(&self.namespace), present(&self.name)) {
                (Some(namespace), _) => parts.push(namespace.to_string()),
                (None, Some(_)) => parts.push(NAMESPACE_SENTINEL.to_string()),
                (None, None) => {}
            }
            if parts.len() == 3
                && let Some(name) = present(&self.name)
            {
                parts.push(name.to_string());
                if let Some(revision) = present(&self.revision) {
                    parts.push(revision.to_string());
                }
            }
        }

        parts.join("/")
    }
}

impl From<&Coordinates> for PartialCoordinates {
    fn from(coordinates: &Coordinates) -> Self {
        Self {
            r#type: Some(coordinates.r#type.clone()),
            provider: Some(coordinates.provider.clone()),
            namespace: coordinates.namespace.clone(),
            name: Some(coordinates.name.clone()),
            revision: coordinates.revision.clone(),
        }
    }
}

impl FromStr for PartialCoordinates {
    type Err = crate::Error;

    /// Parse any leading portion of `type/provider/namespace/name/revision`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let parts: Vec<&str> = trimmed.split('/').collect();
        if parts.len() > 5 {
            return Err(crate::Error::InvalidCoordinates(format!(
                "too many segments in '{s}'"
            )));
        }

        let segment = |i: usize| {
            parts
                .get(i)
                .filter(|part| !part.is_empty())
                .map(|part| part.to_string())
        };
        Ok(Self {
            r#type: segment(0),
            provider: segment(1),
            namespace: segment(2).filter(|ns| ns != NAMESPACE_SENTINEL),
            name: segment(3),
            revision: segment(4),
        })
    }
}
