//! Signing capability behind the wallet.
//!
//! A [`Signer`] exposes one account and signs 32-byte digests with
//! recoverable secp256k1 ECDSA. The ledger recovers the submitter from the
//! signature, so the address a record carries is always the one whose key
//! signed the call.

use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use notary_core::Address;
use thiserror::Error;

/// Errors produced while signing or recovering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    /// The wallet owner refused to sign
    #[error("signature request declined")]
    Declined,

    #[error("invalid private key")]
    InvalidKey,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("signing failed: {0}")]
    Failed(String),
}

/// Recoverable signature: `r ‖ s ‖ recovery id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 65]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }
}

/// An account able to sign digests.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Address of the signing account.
    fn address(&self) -> Address;

    /// Sign a prehashed digest.
    async fn sign_digest(&self, digest: &[u8; 32]) -> Result<Signature, SignError>;
}

/// Wallet holding a private key in process.
pub struct LocalWallet {
    key: SigningKey,
    address: Address,
}

impl LocalWallet {
    /// Parse a hex private key, with or without `0x`.
    pub fn from_hex(key: &str) -> Result<Self, SignError> {
        let key = key.trim();
        let body = key.strip_prefix("0x").unwrap_or(key);
        let bytes = hex::decode(body).map_err(|_| SignError::InvalidKey)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignError> {
        let key = SigningKey::from_slice(bytes).map_err(|_| SignError::InvalidKey)?;
        let address = address_of(key.verifying_key())?;
        Ok(Self { key, address })
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Signer for LocalWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_digest(&self, digest: &[u8; 32]) -> Result<Signature, SignError> {
        let (sig, recid) = self
            .key
            .sign_prehash_recoverable(digest)
            .map_err(|e| SignError::Failed(e.to_string()))?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = recid.to_byte();
        Ok(Signature(out))
    }
}

/// Address of the account that produced `signature` over `digest`.
pub fn recover_signer(digest: &[u8; 32], signature: &Signature) -> Result<Address, SignError> {
    let sig = EcdsaSignature::from_slice(&signature.0[..64])
        .map_err(|_| SignError::InvalidSignature)?;
    let recid = RecoveryId::from_byte(signature.0[64]).ok_or(SignError::InvalidSignature)?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recid)
        .map_err(|_| SignError::InvalidSignature)?;
    address_of(&key)
}

fn address_of(key: &VerifyingKey) -> Result<Address, SignError> {
    let point = k256::PublicKey::from(key).to_encoded_point(false);
    let bytes: [u8; 64] = point.as_bytes()[1..]
        .try_into()
        .map_err(|_| SignError::InvalidKey)?;
    Ok(Address::from_public_key(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn address_from_known_key() {
        let wallet = LocalWallet::from_hex(KEY_ONE).unwrap();
        assert_eq!(
            wallet.address().to_string(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn rejects_bad_keys() {
        assert_eq!(LocalWallet::from_hex("zz").unwrap_err(), SignError::InvalidKey);
        assert_eq!(
            LocalWallet::from_hex(&"00".repeat(32)).unwrap_err(),
            SignError::InvalidKey
        );
    }

    #[tokio::test]
    async fn signature_recovers_signer() {
        let wallet = LocalWallet::from_hex(&"11".repeat(32)).unwrap();
        let digest = [0x5a; 32];
        let sig = wallet.sign_digest(&digest).await.unwrap();

        assert_eq!(recover_signer(&digest, &sig).unwrap(), wallet.address());
        assert_ne!(recover_signer(&[0x5b; 32], &sig).ok(), Some(wallet.address()));
    }

    #[tokio::test]
    async fn corrupted_recovery_id_is_invalid() {
        let wallet = LocalWallet::from_hex(KEY_ONE).unwrap();
        let mut sig = wallet.sign_digest(&[1; 32]).await.unwrap();
        sig.0[64] = 9;
        assert_eq!(recover_signer(&[1; 32], &sig), Err(SignError::InvalidSignature));
    }
}
