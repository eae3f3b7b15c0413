//! Definition documents: the aggregated record for one component revision.

use crate::coordinates::Coordinates;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Aggregated metadata for one component revision.
///
/// Fields the store does not interpret are kept in `extra` so a definition
/// survives a store/get round trip unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub described: Option<Described>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licensed: Option<Licensed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Scores>,
    /// Ordered file descriptors. The only unbounded field of a definition.
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Definition {
    /// Create an empty definition for the given coordinates.
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            described: None,
            licensed: None,
            scores: None,
            files: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Canonical key of this definition's coordinates.
    pub fn key(&self) -> String {
        self.coordinates.canonical_key()
    }

    /// Copy of this definition with the file list dropped.
    pub fn without_files(&self) -> Self {
        Self {
            files: Vec::new(),
            ..self.clone()
        }
    }

    /// Declared license, if any.
    pub fn declared_license(&self) -> Option<&str> {
        self.licensed.as_ref()?.declared.as_deref()
    }
}

/// Descriptive metadata (release date, source location, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Described {
    #[serde(
        rename = "releaseDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// License metadata for the component as a whole.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Licensed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A scored facet with its total.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Score {
    pub fn with_total(total: i64) -> Self {
        Self {
            total: Some(total),
            extra: Map::new(),
        }
    }
}

/// Aggregate ratings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<i64>,
}

/// One file of a component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}
