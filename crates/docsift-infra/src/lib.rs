//! Storage backends for docsift.
//!
//! - [`LocalBlobStore`] keeps uploaded bytes under a directory
//! - [`MemoryRepository`] holds the corpus for tests and one-shot runs
//! - [`JsonFileRepository`] persists the corpus to a single JSON file

pub mod blob;
pub mod repository;

pub use blob::LocalBlobStore;
pub use repository::{open_repository, JsonFileRepository, MemoryRepository};

use docsift_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, InfraError>;

impl From<InfraError> for AppError {
    fn from(err: InfraError) -> Self {
        match err {
            InfraError::NotFound(msg) => AppError::NotFound(msg),
            InfraError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}
