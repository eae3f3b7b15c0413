//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of file entries per page record.
pub const DEFAULT_FILES_PER_PAGE: usize = 1000;

/// Upper bound on file entries per page record.
/// Keeps a single page comfortably below MongoDB's 16 MiB document limit.
pub const MAX_FILES_PER_PAGE: usize = 10_000;

/// Top-level application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Definition stores in dispatch order. Reads prefer the first entry.
    #[serde(default)]
    pub stores: Vec<StoreConfig>,
    /// Connection retry policy applied during store initialization.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl AppConfig {
    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.stores.is_empty() {
            return Err("at least one store must be configured".to_string());
        }
        for (index, store) in self.stores.iter().enumerate() {
            store
                .validate()
                .map_err(|e| format!("stores[{index}]: {e}"))?;
        }
        self.retry.validate()
    }

    /// A single in-memory paged store.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            stores: vec![StoreConfig {
                kind: StoreKind::Paged,
                backend: BackendConfig::Memory,
                files_per_page: DEFAULT_FILES_PER_PAGE,
            }],
            retry: RetryConfig::default(),
        }
    }
}

/// Which definition layout a store persists.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Full definitions, files split across page records.
    #[default]
    Paged,
    /// Definitions without files, query-only.
    Trimmed,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paged => "paged",
            Self::Trimmed => "trimmed",
        }
    }

    fn default_collection(self) -> &'static str {
        match self {
            Self::Paged => "definitions-paged",
            Self::Trimmed => "definitions-trimmed",
        }
    }
}

/// One definition store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Record layout (default: paged).
    #[serde(default)]
    pub kind: StoreKind,
    /// Document backend.
    #[serde(default)]
    pub backend: BackendConfig,
    /// File entries per page record (paged stores only, default: 1000).
    #[serde(default = "default_files_per_page")]
    pub files_per_page: usize,
}

fn default_files_per_page() -> usize {
    DEFAULT_FILES_PER_PAGE
}

impl StoreConfig {
    /// Validate store configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.files_per_page == 0 || self.files_per_page > MAX_FILES_PER_PAGE {
            return Err(format!(
                "files_per_page must be between 1 and {MAX_FILES_PER_PAGE}, got {}",
                self.files_per_page
            ));
        }
        self.backend.validate()
    }

    /// Collection name, falling back to the per-kind default.
    pub fn collection_name(&self) -> String {
        match &self.backend {
            BackendConfig::Mongo {
                collection: Some(collection),
                ..
            } => collection.clone(),
            _ => self.kind.default_collection().to_string(),
        }
    }
}

/// Document backend configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// MongoDB (or a wire-compatible service such as Cosmos DB).
    Mongo {
        /// Connection string, e.g. `mongodb://localhost:27017`.
        /// WARNING: Prefer DEFSTORE_STORES env vars over storing credentials in config.
        connection_string: String,
        /// Database name (default: "clearlydefined").
        #[serde(default = "default_database")]
        database: String,
        /// Collection name (default depends on the store kind).
        #[serde(default)]
        collection: Option<String>,
        /// Application name reported to the server.
        #[serde(default)]
        app_name: Option<String>,
    },
    /// In-process store (recommended for testing and local development only).
    #[default]
    Memory,
}

fn default_database() -> String {
    "clearlydefined".to_string()
}

impl BackendConfig {
    /// Validate backend configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            BackendConfig::Mongo {
                connection_string,
                database,
                ..
            } => {
                if connection_string.trim().is_empty() {
                    return Err("mongo backend requires a connection_string".to_string());
                }
                if database.trim().is_empty() {
                    return Err("mongo backend requires a database name".to_string());
                }
                Ok(())
            }
            BackendConfig::Memory => Ok(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            BackendConfig::Mongo { .. } => "mongo",
            BackendConfig::Memory => "memory",
        }
    }
}

/// Connection retry policy for store initialization.
///
/// Connectivity is a precondition for serving, so the default retries forever.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    /// First delay between attempts in milliseconds (default: 100).
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Cap on the delay between attempts in milliseconds (default: 16000).
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Give up after this many attempts (default: None = retry indefinitely).
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    16_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_attempts: None,
        }
    }
}

impl RetryConfig {
    /// Validate retry configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_backoff_ms == 0 {
            return Err("retry.initial_backoff_ms must be greater than 0".to_string());
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(format!(
                "retry.max_backoff_ms ({}) must be >= retry.initial_backoff_ms ({})",
                self.max_backoff_ms, self.initial_backoff_ms
            ));
        }
        if self.max_attempts == Some(0) {
            return Err("retry.max_attempts must be at least 1 when set".to_string());
        }
        Ok(())
    }

    /// Delay before the given retry (1-based), doubling up to the cap.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(32);
        let millis = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}
