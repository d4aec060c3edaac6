//! Notary Core
//!
//! This crate provides the I/O-free kernel of the notary: the identifiers
//! that cross the storage and ledger boundaries, content addressing over
//! fixed-size chunks, the notarization record model (including the
//! all-zero "unregistered" sentinel), and the synchronous `LedgerBook`
//! storage abstraction that persistent backends implement.
//!
//! Nothing here performs network or disk I/O; the async collaborators and
//! the orchestrator live in the `notary` crate.
//!
//! # Example
//!
//! ```rust
//! use notary_core::content;
//! use notary_core::book::{LedgerBook, MemoryBook};
//! use notary_core::record::{Lookup, RecordBuilder};
//! use notary_core::Address;
//!
//! let root = content::root_hash(b"hello1234\n").unwrap();
//! assert_eq!(root, content::root_hash(b"hello1234\n").unwrap());
//!
//! let mut book = MemoryBook::new();
//! let owner: Address = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".parse().unwrap();
//! book.insert(
//!     RecordBuilder::new(root.clone())
//!         .submitter(owner)
//!         .timestamp(1_704_067_200)
//!         .filename("a.txt")
//!         .build(),
//! )
//! .unwrap();
//!
//! let found = Lookup::from_book(&book, &root).unwrap();
//! assert!(found.is_registered());
//! ```

pub mod book;
pub mod call;
pub mod content;
pub mod id;
pub mod record;

// Re-export main types at crate root
pub use book::{BookError, BookResult, LedgerBook, MemoryBook};
pub use call::NotarizeCall;
pub use content::{ContentError, MerkleProof, MerkleTree};
pub use id::{Address, IdError, RootHash, TxRef};
pub use record::{
    format_timestamp, short_hash, Certificate, Lookup, NotarizationRecord, NotarizedEvent,
    RawRecord, RecordBuilder,
};
