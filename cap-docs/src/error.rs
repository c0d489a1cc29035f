//! External-docs cache error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocsCacheError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type DocsCacheResult<T> = Result<T, DocsCacheError>;
