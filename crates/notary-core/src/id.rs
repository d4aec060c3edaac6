//! Hex identifiers shared by the content store and the ledger.
//!
//! - [`RootHash`]: content address of a stored file. Kept as the exact
//!   string it was created or parsed from, because the ledger keys records
//!   by that string and letter case is part of the key.
//! - [`Address`]: 20-byte account address, displayed in EIP-55 checksum case.
//! - [`TxRef`]: 32-byte transaction reference returned by either collaborator.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("expected 0x prefix: {0:?}")]
    MissingPrefix(String),

    #[error("expected {expected} hex digits, got {actual}: {value:?}")]
    Length {
        expected: usize,
        actual: usize,
        value: String,
    },

    #[error("invalid hex digit in {0:?}")]
    InvalidHex(String),
}

/// Validate `0x` + `digits` hex characters and return the body.
fn hex_body(value: &str, digits: usize) -> Result<&str, IdError> {
    let body = value
        .strip_prefix("0x")
        .ok_or_else(|| IdError::MissingPrefix(value.to_string()))?;
    if body.len() != digits {
        return Err(IdError::Length {
            expected: digits,
            actual: body.len(),
            value: value.to_string(),
        });
    }
    if !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(IdError::InvalidHex(value.to_string()));
    }
    Ok(body)
}

fn decode_fixed<const N: usize>(value: &str, digits: usize) -> Result<[u8; N], IdError> {
    let body = hex_body(value, digits)?;
    let mut out = [0u8; N];
    hex::decode_to_slice(body, &mut out).map_err(|_| IdError::InvalidHex(value.to_string()))?;
    Ok(out)
}

/// Content address of a stored file: `0x` followed by 64 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootHash {
    text: String,
    digest: [u8; 32],
}

impl RootHash {
    pub const HEX_DIGITS: usize = 64;

    /// Parse a root hash, trimming surrounding whitespace.
    ///
    /// Letter case is preserved verbatim.
    pub fn parse(value: &str) -> Result<Self, IdError> {
        let trimmed = value.trim();
        let digest = decode_fixed(trimmed, Self::HEX_DIGITS)?;
        Ok(Self {
            text: trimmed.to_string(),
            digest,
        })
    }

    /// Build the canonical (lowercase) root hash for a digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self {
            text: format!("0x{}", hex::encode(digest)),
            digest,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Digest bytes. Case-insensitive: `0xAB..` and `0xab..` share a digest.
    pub fn digest(&self) -> [u8; 32] {
        self.digest
    }

    /// True when the hash is identical to the canonical lowercase form of its digest.
    pub fn is_canonical(&self) -> bool {
        *self == Self::from_digest(self.digest())
    }
}

impl fmt::Display for RootHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for RootHash {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for RootHash {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// A 20-byte account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive an account address from an uncompressed secp256k1 public key
    /// (64 bytes, without the 0x04 tag): last 20 bytes of its Keccak-256.
    pub fn from_public_key(uncompressed: &[u8; 64]) -> Self {
        let hash = Keccak256::digest(uncompressed);
        let mut out = [0u8; 20];
        out.copy_from_slice(&hash[12..]);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(decode_fixed(s.trim(), 40)?))
    }
}

/// Reference to a submitted transaction (storage network or ledger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxRef([u8; 32]);

impl TxRef {
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for TxRef {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(decode_fixed(s.trim(), 64)?))
    }
}

macro_rules! serde_as_string {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

serde_as_string!(RootHash);
serde_as_string!(Address);
serde_as_string!(TxRef);
