//! Chunk Merkle tree for content addressing.
//!
//! Leaves are Keccak-256 hashes of 256-byte chunks. Each level pairs nodes
//! left to right; a node left without a partner is promoted to the next
//! level unchanged. All levels are kept so inclusion proofs are cheap.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use super::error::{ContentError, ContentResult};
use crate::id::RootHash;

/// Bytes per leaf chunk.
pub const CHUNK_SIZE: usize = 256;

/// Chunks per storage segment.
pub const SEGMENT_CHUNKS: usize = 1024;

/// Bytes per storage segment (256 KiB).
pub const SEGMENT_SIZE: usize = CHUNK_SIZE * SEGMENT_CHUNKS;

/// Hash one chunk, zero-padding it to [`CHUNK_SIZE`].
pub fn leaf_hash(chunk: &[u8]) -> [u8; 32] {
    debug_assert!(chunk.len() <= CHUNK_SIZE);
    let mut padded = [0u8; CHUNK_SIZE];
    padded[..chunk.len()].copy_from_slice(chunk);
    Keccak256::digest(padded).into()
}

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut h = Keccak256::new();
    h.update(left);
    h.update(right);
    h.finalize().into()
}

/// Fold a non-empty run of leaves into its root, promoting unpaired nodes.
fn subtree_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level.first().copied().unwrap_or([0u8; 32])
}

fn next_level(level: &[[u8; 32]]) -> Vec<[u8; 32]> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => hash_pair(left, right),
            [single] => *single,
            _ => unreachable!("chunks(2) yields one or two nodes"),
        })
        .collect()
}

/// Merkle tree over the chunks of one file.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// `levels[0]` holds the leaves, the last level holds the root alone.
    levels: Vec<Vec<[u8; 32]>>,
    content_len: usize,
}

impl MerkleTree {
    /// Build the tree for a file's bytes.
    pub fn from_bytes(data: &[u8]) -> ContentResult<Self> {
        if data.is_empty() {
            return Err(ContentError::Empty);
        }
        let leaves = data.chunks(CHUNK_SIZE).map(leaf_hash).collect();
        let mut tree = Self::from_leaves(leaves)?;
        tree.content_len = data.len();
        Ok(tree)
    }

    /// Build a tree from precomputed leaf hashes.
    pub fn from_leaves(leaves: Vec<[u8; 32]>) -> ContentResult<Self> {
        if leaves.is_empty() {
            return Err(ContentError::Empty);
        }

        let content_len = leaves.len() * CHUNK_SIZE;
        let mut levels = vec![leaves];
        while levels[levels.len() - 1].len() > 1 {
            let next = next_level(&levels[levels.len() - 1]);
            levels.push(next);
        }

        Ok(Self {
            levels,
            content_len,
        })
    }

    /// Root digest.
    pub fn root(&self) -> [u8; 32] {
        self.levels[self.levels.len() - 1][0]
    }

    /// Root as a canonical hex root hash.
    pub fn root_hash(&self) -> RootHash {
        RootHash::from_digest(self.root())
    }

    /// Number of chunks (leaves).
    pub fn chunk_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Length of the content the tree was built from.
    pub fn content_len(&self) -> usize {
        self.content_len
    }

    /// Number of storage segments the content spans.
    pub fn segment_count(&self) -> usize {
        self.chunk_count().div_ceil(SEGMENT_CHUNKS)
    }

    /// Root of each segment's chunk subtree, in order.
    pub fn segment_roots(&self) -> Vec<[u8; 32]> {
        self.levels[0]
            .chunks(SEGMENT_CHUNKS)
            .map(subtree_root)
            .collect()
    }

    /// Inclusion proof for the chunk at `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.chunk_count() {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.levels.len() - 1);
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            siblings.push(level.get(idx ^ 1).copied());
            idx /= 2;
        }

        Some(MerkleProof {
            index,
            leaf: self.levels[0][index],
            siblings,
        })
    }
}

/// Inclusion proof for one chunk.
///
/// `siblings[i]` is the partner at level `i`, or `None` where the node was
/// promoted without a partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub index: usize,
    pub leaf: [u8; 32],
    pub siblings: Vec<Option<[u8; 32]>>,
}

/// Check a proof against a root digest.
pub fn verify_proof(root: &[u8; 32], proof: &MerkleProof) -> bool {
    let mut acc = proof.leaf;
    let mut idx = proof.index;
    for sibling in &proof.siblings {
        if let Some(sibling) = sibling {
            acc = if idx % 2 == 0 {
                hash_pair(&acc, sibling)
            } else {
                hash_pair(sibling, &acc)
            };
        }
        idx /= 2;
    }
    acc == *root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn single_chunk_root_is_leaf() {
        let tree = MerkleTree::from_bytes(b"hello1234\n").unwrap();
        assert_eq!(tree.chunk_count(), 1);
        assert_eq!(tree.root(), leaf_hash(b"hello1234\n"));
        assert_eq!(tree.content_len(), 10);
    }

    #[test]
    fn padding_is_part_of_the_leaf() {
        // A short chunk and its explicit zero padding hash the same leaf
        assert_eq!(leaf_hash(b"abc"), leaf_hash(&[b'a', b'b', b'c', 0, 0]));
    }

    #[test]
    fn two_chunks_hash_pair() {
        let data = bytes(CHUNK_SIZE + 1);
        let tree = MerkleTree::from_bytes(&data).unwrap();
        let expected = hash_pair(
            &leaf_hash(&data[..CHUNK_SIZE]),
            &leaf_hash(&data[CHUNK_SIZE..]),
        );
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn unpaired_node_is_promoted() {
        let leaves = vec![[1u8; 32], [2u8; 32], [3u8; 32]];
        let tree = MerkleTree::from_leaves(leaves).unwrap();
        let expected = hash_pair(&hash_pair(&[1u8; 32], &[2u8; 32]), &[3u8; 32]);
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn proofs_verify_for_every_chunk() {
        let data = bytes(CHUNK_SIZE * 7 + 13);
        let tree = MerkleTree::from_bytes(&data).unwrap();
        let root = tree.root();
        for i in 0..tree.chunk_count() {
            let proof = tree.proof(i).unwrap();
            assert!(verify_proof(&root, &proof), "chunk {i}");
        }
        assert!(tree.proof(tree.chunk_count()).is_none());
    }

    #[test]
    fn tampered_proof_fails() {
        let tree = MerkleTree::from_bytes(&bytes(CHUNK_SIZE * 4)).unwrap();
        let mut proof = tree.proof(2).unwrap();
        proof.leaf[0] ^= 0xff;
        assert!(!verify_proof(&tree.root(), &proof));
    }

    #[test]
    fn full_segment_roots_are_interior_nodes() {
        let data = bytes(SEGMENT_SIZE * 2 + 10);
        let tree = MerkleTree::from_bytes(&data).unwrap();
        assert_eq!(tree.segment_count(), 3);

        let roots = tree.segment_roots();
        assert_eq!(roots.len(), 3);
        // Level 10 of the file tree holds one node per full segment
        assert_eq!(tree.levels[10][0], roots[0]);
        assert_eq!(tree.levels[10][1], roots[1]);
    }
}
