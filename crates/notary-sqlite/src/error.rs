//! Error types for the SQLite ledger book

use notary_core::{BookError, IdError};
use thiserror::Error;

/// Result type for SQLite book operations
pub type Result<T> = std::result::Result<T, SqliteError>;

/// Errors that can occur during SQLite book operations
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Database connection or query error
    #[error("SQLite error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored root hash or address no longer parses
    #[error("corrupt identifier: {0}")]
    Identifier(#[from] IdError),

    /// Root hash already recorded
    #[error("root hash {0} already recorded")]
    AlreadyExists(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Convert SqliteError to BookError for the book trait
impl From<SqliteError> for BookError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::AlreadyExists(root) => BookError::AlreadyExists(root),
            SqliteError::Identifier(e) => BookError::InvalidData(e.to_string()),
            SqliteError::Database(e) => BookError::Backend(format!("SQLite: {}", e)),
            SqliteError::Migration(msg) => BookError::Backend(format!("Migration: {}", msg)),
        }
    }
}
