//! In-memory content store
//!
//! Keeps blobs in a map keyed by digest. Availability and latency can be
//! toggled to exercise failure paths in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use notary_core::content::{self, MerkleTree};
use notary_core::RootHash;
use parking_lot::RwLock;
use tracing::debug;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::traits::{storage_tx, ContentStore, StoredContent};
use crate::tracing::prefix;

/// In-memory content store.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    blobs: RwLock<HashMap<[u8; 32], Vec<u8>>>,
    unavailable: AtomicBool,
    latency: Option<Duration>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every operation by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulate the storage network going down or coming back.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Replace the blob under `root_hash` without re-addressing it.
    #[cfg(test)]
    pub(crate) fn corrupt(&self, root_hash: &RootHash, data: Vec<u8>) {
        self.blobs.write().insert(root_hash.digest(), data);
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    async fn enter(&self) -> StorageResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn store(&self, data: Vec<u8>) -> StorageResult<StoredContent> {
        self.enter().await?;

        let tree = MerkleTree::from_bytes(&data)?;
        let root_hash = tree.root_hash();
        let size = data.len() as u64;

        let already_stored = {
            let mut blobs = self.blobs.write();
            if blobs.contains_key(&tree.root()) {
                true
            } else {
                blobs.insert(tree.root(), data);
                false
            }
        };
        debug!(
            "{} stored {} ({} bytes, {} segments{})",
            prefix::STORE,
            root_hash,
            size,
            tree.segment_count(),
            if already_stored { ", already present" } else { "" }
        );

        Ok(StoredContent {
            tx: storage_tx(&root_hash),
            root_hash,
            size,
            already_stored,
        })
    }

    async fn retrieve(&self, root_hash: &RootHash) -> StorageResult<Vec<u8>> {
        self.enter().await?;

        let data = self
            .blobs
            .read()
            .get(&root_hash.digest())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(root_hash.clone()))?;
        content::verify_content(root_hash, &data)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notary_core::ContentError;

    #[tokio::test]
    async fn store_then_retrieve() {
        let store = MemoryContentStore::new();
        let stored = store.store(b"hello1234\n".to_vec()).await.unwrap();
        assert_eq!(stored.root_hash, content::root_hash(b"hello1234\n").unwrap());
        assert_eq!(stored.size, 10);
        assert!(!stored.already_stored);

        assert_eq!(store.retrieve(&stored.root_hash).await.unwrap(), b"hello1234\n");
        assert!(store.contains(&stored.root_hash).await.unwrap());
    }

    #[tokio::test]
    async fn restore_is_idempotent() {
        let store = MemoryContentStore::new();
        let first = store.store(b"same".to_vec()).await.unwrap();
        let second = store.store(b"same".to_vec()).await.unwrap();
        assert_eq!(first.root_hash, second.root_hash);
        assert_eq!(first.tx, second.tx);
        assert!(second.already_stored);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn empty_content_rejected() {
        let store = MemoryContentStore::new();
        let err = store.store(Vec::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::Content(ContentError::Empty)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unknown_root_not_found() {
        let store = MemoryContentStore::new();
        let root = RootHash::from_digest([9; 32]);
        assert!(matches!(
            store.retrieve(&root).await,
            Err(StorageError::NotFound(r)) if r == root
        ));
        assert!(!store.contains(&root).await.unwrap());
    }

    #[tokio::test]
    async fn upper_case_root_retrieves_same_blob() {
        let store = MemoryContentStore::new();
        let stored = store.store(b"hello1234\n".to_vec()).await.unwrap();
        let upper = RootHash::parse(&stored.root_hash.as_str().to_uppercase().replacen("0X", "0x", 1))
            .unwrap();
        assert_eq!(store.retrieve(&upper).await.unwrap(), b"hello1234\n");
    }

    #[tokio::test]
    async fn corrupted_blob_fails_verification() {
        let store = MemoryContentStore::new();
        let stored = store.store(b"original".to_vec()).await.unwrap();
        store.corrupt(&stored.root_hash, b"tampered".to_vec());
        assert!(matches!(
            store.retrieve(&stored.root_hash).await,
            Err(StorageError::Content(ContentError::Mismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn offline_store_is_unavailable() {
        let store = MemoryContentStore::new();
        store.set_available(false);
        let err = store.store(b"x".to_vec()).await.unwrap_err();
        assert!(err.is_transient());

        store.set_available(true);
        assert!(store.store(b"x".to_vec()).await.is_ok());
    }
}
