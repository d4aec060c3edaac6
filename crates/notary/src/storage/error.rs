//! Content store error types

use std::time::Duration;

use notary_core::{ContentError, RootHash};
use thiserror::Error;

/// Errors that can occur during content store operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// No content is stored under this root
    #[error("content not found: {0}")]
    NotFound(RootHash),

    /// Empty input, or retrieved bytes that do not rebuild their root
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Local filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage network could not be reached
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The operation did not complete in time
    #[error("storage timed out after {0:?}")]
    Timeout(Duration),
}

impl StorageError {
    /// Errors where the same request may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StorageError::Unavailable(_) | StorageError::Timeout(_) | StorageError::Io(_)
        )
    }
}

/// Result type for content store operations
pub type StorageResult<T> = Result<T, StorageError>;
