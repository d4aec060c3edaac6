//! Ledger transaction types

use notary_core::{Address, NotarizeCall, RootHash, TxRef};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::signer::{recover_signer, SignError, Signature, Signer};

/// A `notarize` call together with the submitter's signature over its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCall {
    pub call: NotarizeCall,
    pub signature: Signature,
}

impl SignedCall {
    /// Ask `signer` to sign `call`.
    pub async fn sign(call: NotarizeCall, signer: &dyn Signer) -> Result<Self, SignError> {
        let signature = signer.sign_digest(&call.digest()).await?;
        Ok(Self { call, signature })
    }

    /// Transaction reference: Keccak-256 of the digest and signature.
    pub fn tx_ref(&self) -> TxRef {
        let mut h = Keccak256::new();
        h.update(self.call.digest());
        h.update(self.signature.as_bytes());
        TxRef::from_digest(h.finalize().into())
    }

    /// Account that signed the call.
    pub fn recover_submitter(&self) -> Result<Address, SignError> {
        recover_signer(&self.call.digest(), &self.signature)
    }
}

/// Outcome of an included transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    Reverted(String),
}

/// Inclusion receipt for a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx: TxRef,
    pub block: u64,
    /// Block timestamp, which is also the record timestamp on success
    pub timestamp: u64,
    pub status: ReceiptStatus,
    pub submitter: Address,
    pub root_hash: RootHash,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}
