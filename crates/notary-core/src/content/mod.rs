//! Content addressing for stored files.
//!
//! A file is cut into 256-byte chunks (the last one zero-padded), each chunk
//! is hashed with Keccak-256, and the chunk hashes are folded pairwise into a
//! Merkle tree. The root of that tree is the file's [`RootHash`]: it depends
//! only on the bytes, never on the filename or the time of upload.
//!
//! Chunks are grouped into segments of 1024 (256 KiB), the unit the storage
//! network moves around. Because segments are aligned powers of two, the root
//! of every full segment is an interior node of the file tree.

mod error;
mod merkle;

pub use error::{ContentError, ContentResult};
pub use merkle::{
    leaf_hash, verify_proof, MerkleProof, MerkleTree, CHUNK_SIZE, SEGMENT_CHUNKS, SEGMENT_SIZE,
};

use crate::id::RootHash;

/// Compute the root hash of `data`.
pub fn root_hash(data: &[u8]) -> ContentResult<RootHash> {
    Ok(MerkleTree::from_bytes(data)?.root_hash())
}

/// Check that `data` rebuilds `expected`.
///
/// Comparison is on digest bytes, so a caller holding an upper-case root
/// still verifies against the canonical lowercase one.
pub fn verify_content(expected: &RootHash, data: &[u8]) -> ContentResult<()> {
    let actual = root_hash(data)?;
    if actual.digest() != expected.digest() {
        return Err(ContentError::Mismatch {
            expected: expected.clone(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_same_bytes() {
        let a = root_hash(b"hello1234\n").unwrap();
        let b = root_hash(&b"hello1234\n".to_vec()).unwrap();
        assert_eq!(a, b);
        assert!(a.is_canonical());
    }

    #[test]
    fn different_bytes_different_root() {
        assert_ne!(
            root_hash(b"hello1234\n").unwrap(),
            root_hash(b"hello1235\n").unwrap()
        );
    }

    #[test]
    fn empty_content_rejected() {
        assert!(matches!(root_hash(b""), Err(ContentError::Empty)));
    }

    #[test]
    fn verify_content_detects_tampering() {
        let root = root_hash(b"original").unwrap();
        verify_content(&root, b"original").unwrap();

        let upper = RootHash::parse(&root.as_str().to_uppercase().replacen("0X", "0x", 1)).unwrap();
        verify_content(&upper, b"original").unwrap();

        assert!(matches!(
            verify_content(&root, b"tampered"),
            Err(ContentError::Mismatch { .. })
        ));
    }
}
