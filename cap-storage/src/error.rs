//! Storage manager error type.

use thiserror::Error;

/// Errors raised by the local JSON collection store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("record already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("invalid id: {id}")]
    InvalidId { id: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("lock poisoned for path: {path}")]
    LockPoisoned { path: String },
}

pub type StorageResult<T> = Result<T, StorageError>;
