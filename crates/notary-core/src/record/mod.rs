//! Notarization records - what the ledger remembers about a root hash
//!
//! A record ties a content address to the account that attested it, the
//! ledger-assigned time, and free-text metadata. Records are written once
//! and never change.
//!
//! The ledger's read entry point never reports absence directly: an
//! unregistered root reads back as the all-zero tuple. [`Lookup`] is the
//! only place that tuple is interpreted.
//!
//! # Example
//!
//! ```rust
//! use notary_core::record::{Lookup, RawRecord};
//! use notary_core::RootHash;
//!
//! let root = RootHash::parse(&format!("0xdead{}", "0".repeat(60))).unwrap();
//! let lookup = Lookup::from_raw(root, RawRecord::zero());
//! assert!(!lookup.is_registered());
//! ```

mod certificate;
mod format;
mod types;

pub use certificate::Certificate;
pub use format::{format_timestamp, short_hash};
pub use types::{Lookup, NotarizationRecord, NotarizedEvent, RawRecord, RecordBuilder};
