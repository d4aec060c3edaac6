//! SQLite ledger book for the notary
//!
//! Persistent implementation of the `notary_core::LedgerBook` trait, so a
//! `LocalLedger` keeps its records across process restarts.
//!
//! - Schema is embedded and migrated on open
//! - Supports in-memory databases for testing
//! - Registration order is kept in an autoincrement `seq` column
//!
//! # Example
//!
//! ```rust,no_run
//! use notary_core::{LedgerBook, RecordBuilder, RootHash, Address};
//! use notary_sqlite::SqliteBook;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut book = SqliteBook::open("ledger.db")?;
//!
//! let root = RootHash::from_digest([7u8; 32]);
//! book.insert(
//!     RecordBuilder::new(root.clone())
//!         .submitter(Address::from_bytes([1u8; 20]))
//!         .timestamp(1_704_067_200)
//!         .filename("a.txt")
//!         .build(),
//! )?;
//!
//! assert!(book.get(&root)?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod migrate;
mod store;

pub use error::{Result, SqliteError};
pub use store::SqliteBook;
