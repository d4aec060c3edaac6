//! Ledger error types

use std::time::Duration;

use notary_core::{Address, BookError, RootHash, TxRef};
use thiserror::Error;

/// Errors that can occur during ledger operations
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The node could not be reached
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// A call did not complete in time
    #[error("ledger call timed out after {0:?}")]
    Timeout(Duration),

    /// The root hash is registered, or pending, under `submitter`
    #[error("{root_hash} already notarized by {submitter}")]
    AlreadyNotarized {
        root_hash: RootHash,
        submitter: Address,
    },

    /// Signature does not recover to a valid account
    #[error("invalid signature")]
    InvalidSignature,

    /// The call was signed for a stale or future nonce
    #[error("nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch { expected: u64, got: u64 },

    /// The call was signed for another chain
    #[error("wrong chain: ledger is {expected}, call is for {got}")]
    WrongChain { expected: u64, got: u64 },

    /// The call was signed for another contract
    #[error("wrong contract: ledger is {expected}, call is for {got}")]
    WrongContract { expected: Address, got: Address },

    /// The transaction was included but its effects were rolled back
    #[error("transaction {tx} reverted: {reason}")]
    Reverted { tx: TxRef, reason: String },

    /// The record store behind the ledger failed
    #[error(transparent)]
    Book(#[from] BookError),
}

impl LedgerError {
    /// Errors where the same request may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_) | LedgerError::Timeout(_))
    }

    /// The ledger reached a verdict and refused the call.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::AlreadyNotarized { .. }
                | LedgerError::InvalidSignature
                | LedgerError::NonceMismatch { .. }
                | LedgerError::WrongChain { .. }
                | LedgerError::WrongContract { .. }
                | LedgerError::Reverted { .. }
        )
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
