//! Attestation ledger boundary
//!
//! The `Ledger` trait is the on-chain side of the notary: an append-only,
//! publicly readable map from root hash to `(submitter, timestamp,
//! filename, label)` plus a per-submitter index, written by signed calls.
//!
//! `LocalLedger` runs that contract in process over any `LedgerBook`,
//! with pending transactions, blocks, receipts and a `Notarized` event
//! stream, so the orchestrator can be driven end to end without a node.
//!
//! Duplicate policy: a root hash that is registered, or pending in an
//! unmined transaction, cannot be submitted again
//! (`LedgerError::AlreadyNotarized`).

mod error;
mod local;
mod traits;
mod types;

pub use error::{LedgerError, LedgerResult};
pub use local::LocalLedger;
pub use traits::{documents, events, lookup, Ledger};
pub use types::{Receipt, ReceiptStatus, SignedCall};
