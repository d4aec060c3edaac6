//! Content addressing error types

use thiserror::Error;

use crate::id::RootHash;

/// Errors that can occur while addressing or verifying content
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// The storage network refuses zero-length files
    #[error("content is empty")]
    Empty,

    /// Bytes do not rebuild the expected root
    #[error("content mismatch: expected {expected}, rebuilt {actual}")]
    Mismatch { expected: RootHash, actual: RootHash },
}

/// Result type for content operations
pub type ContentResult<T> = Result<T, ContentError>;
