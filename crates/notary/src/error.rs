//! Error types for notary operations.

use std::time::Duration;

use notary_core::{IdError, TxRef};
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::signer::SignError;
use crate::storage::StorageError;

/// Error surfaced by the orchestrator and the adapters around it.
#[derive(Error, Debug)]
pub enum Error {
    /// Upload or download failed, or the content store timed out
    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),

    /// The wallet declined to sign, or the ledger rejected the call
    #[error("attestation rejected: {0}")]
    AttestationRejected(String),

    /// The ledger could not be reached
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// Any other ledger failure
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The transaction was submitted but no receipt arrived in time.
    /// It may still confirm later.
    #[error("transaction {tx} not final after {waited:?}")]
    FinalityTimeout { tx: TxRef, waited: Duration },

    /// Attestation needs a connected wallet
    #[error("no wallet connected")]
    WalletNotConnected,

    /// The wallet is on a different chain than the ledger
    #[error("wallet is on chain {wallet}, ledger is on chain {ledger}")]
    WrongChain { wallet: u64, ledger: u64 },

    /// An operation was requested from a phase that does not allow it
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    /// The caller cancelled the operation
    #[error("cancelled")]
    Cancelled,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed root hash, address or transaction reference
    #[error("invalid identifier: {0}")]
    Id(#[from] IdError),

    /// Signing failed for a reason other than the user declining
    #[error("signing failed: {0}")]
    Sign(#[from] SignError),
}

impl Error {
    /// True when repeating the same request could succeed without any other change.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Storage(e) => e.is_transient(),
            Error::LedgerUnavailable(_) | Error::FinalityTimeout { .. } => true,
            Error::Ledger(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Result type alias using notary Error.
pub type Result<T> = std::result::Result<T, Error>;
