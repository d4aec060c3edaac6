//! Ledger book - storage abstraction for notarization records
//!
//! This module defines the `LedgerBook` trait that abstracts over where the
//! ledger keeps its records. Implementations exist for:
//!
//! - **Memory**: In-memory book for testing (`MemoryBook`)
//! - **SQLite**: Persistent book via rusqlite (separate crate, `notary-sqlite`)
//!
//! A book enforces the ledger's write-once rule: inserting a root hash that
//! is already present fails with `BookError::AlreadyExists`.
//!
//! # Example
//!
//! ```rust
//! use notary_core::book::{LedgerBook, MemoryBook};
//! use notary_core::record::RecordBuilder;
//! use notary_core::{Address, RootHash};
//!
//! let mut book = MemoryBook::new();
//! let root = RootHash::from_digest([7u8; 32]);
//! let record = RecordBuilder::new(root.clone())
//!     .submitter(Address::from_bytes([1u8; 20]))
//!     .timestamp(1_704_067_200)
//!     .build();
//!
//! book.insert(record).unwrap();
//! assert!(book.get(&root).unwrap().is_some());
//! ```

mod error;
mod memory;
mod traits;

pub use error::{BookError, BookResult};
pub use memory::MemoryBook;
pub use traits::LedgerBook;
