//! Ledger book error types

use thiserror::Error;

/// Errors that can occur during book operations
#[derive(Debug, Clone, Error)]
pub enum BookError {
    /// A record for this root hash already exists
    #[error("root hash already notarized: {0}")]
    AlreadyExists(String),

    /// Stored data could not be turned back into a record
    #[error("invalid record data: {0}")]
    InvalidData(String),

    /// Storage backend error (database, filesystem, etc.)
    #[error("book backend error: {0}")]
    Backend(String),
}

/// Result type for book operations
pub type BookResult<T> = Result<T, BookError>;
