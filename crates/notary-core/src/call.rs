//! The ledger write call and its signing digest.
//!
//! The digest binds the call to one chain, one contract and one account
//! nonce, so a signature cannot be replayed elsewhere or twice.
//! Variable-length fields are length-prefixed to keep field boundaries
//! unambiguous.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::id::{Address, RootHash};

const DOMAIN: &[u8] = b"notary.notarize.v1";

/// Arguments of one `notarize(rootHash, filename, label)` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarizeCall {
    pub chain_id: u64,
    pub contract: Address,
    pub nonce: u64,
    pub root_hash: RootHash,
    pub filename: String,
    pub label: String,
}

impl NotarizeCall {
    /// Keccak-256 digest the submitter signs.
    pub fn digest(&self) -> [u8; 32] {
        let mut h = Keccak256::new();
        h.update(DOMAIN);
        h.update(self.chain_id.to_be_bytes());
        h.update(self.contract.as_bytes());
        h.update(self.nonce.to_be_bytes());
        update_prefixed(&mut h, self.root_hash.as_str().as_bytes());
        update_prefixed(&mut h, self.filename.as_bytes());
        update_prefixed(&mut h, self.label.as_bytes());
        h.finalize().into()
    }
}

fn update_prefixed(h: &mut Keccak256, bytes: &[u8]) {
    h.update((bytes.len() as u64).to_be_bytes());
    h.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call() -> NotarizeCall {
        NotarizeCall {
            chain_id: 16602,
            contract: Address::from_bytes([0x42; 20]),
            nonce: 0,
            root_hash: RootHash::from_digest([0x11; 32]),
            filename: "a.txt".into(),
            label: String::new(),
        }
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(call().digest(), call().digest());
    }

    #[test]
    fn digest_binds_every_field() {
        let base = call().digest();

        let mut c = call();
        c.chain_id = 1;
        assert_ne!(c.digest(), base);

        let mut c = call();
        c.nonce = 1;
        assert_ne!(c.digest(), base);

        let mut c = call();
        c.contract = Address::from_bytes([0x43; 20]);
        assert_ne!(c.digest(), base);

        let mut c = call();
        c.label = "x".into();
        assert_ne!(c.digest(), base);
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        let mut a = call();
        a.filename = "ab".into();
        a.label = "c".into();
        let mut b = call();
        b.filename = "a".into();
        b.label = "bc".into();
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn root_case_is_part_of_the_digest() {
        let mut a = call();
        a.root_hash = RootHash::parse(&format!("0x{}", "ab".repeat(32))).unwrap();
        let mut b = call();
        b.root_hash = RootHash::parse(&format!("0x{}", "AB".repeat(32))).unwrap();
        assert_ne!(a.digest(), b.digest());
    }
}
