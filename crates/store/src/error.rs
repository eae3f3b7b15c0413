//! Definition store error types.

use thiserror::Error;

/// Definition store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("mongo error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid continuation token: {0}")]
    InvalidContinuationToken(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("{backend} still unreachable after {attempts} attempts: {last_error}")]
    RetryExhausted {
        backend: String,
        attempts: u32,
        last_error: String,
    },

    #[error(transparent)]
    Core(#[from] defstore_core::Error),
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for StoreError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for definition store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
