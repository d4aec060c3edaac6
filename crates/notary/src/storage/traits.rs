//! Content store trait definitions

use std::path::Path;

use async_trait::async_trait;
use notary_core::{RootHash, TxRef};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::storage::error::StorageResult;

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContent {
    /// Content address of the uploaded bytes
    pub root_hash: RootHash,
    /// Storage network transaction that accepted the upload
    pub tx: TxRef,
    /// Size in bytes
    pub size: u64,
    /// The bytes were already present; nothing new was written
    pub already_stored: bool,
}

/// Off-chain content storage.
///
/// Stores are shared between tasks, so every method takes `&self`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upload `data` and return its root hash.
    ///
    /// Uploading bytes that are already stored succeeds and reports
    /// `already_stored`. Empty input fails with `ContentError::Empty`.
    async fn store(&self, data: Vec<u8>) -> StorageResult<StoredContent>;

    /// Download the bytes stored under `root_hash`.
    ///
    /// Returned bytes always rebuild `root_hash`; anything else is reported
    /// as `ContentError::Mismatch`.
    async fn retrieve(&self, root_hash: &RootHash) -> StorageResult<Vec<u8>>;

    /// Check whether content is stored under `root_hash`.
    async fn contains(&self, root_hash: &RootHash) -> StorageResult<bool> {
        match self.retrieve(root_hash).await {
            Ok(_) => Ok(true),
            Err(crate::StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Storage transaction reference for an upload of `root`.
///
/// Deterministic, so re-uploading the same bytes reports the same reference.
pub fn storage_tx(root: &RootHash) -> TxRef {
    let mut h = Keccak256::new();
    h.update(b"storage.submit");
    h.update(root.digest());
    TxRef::from_digest(h.finalize().into())
}

/// Read a file from disk and upload it.
pub async fn store_file<S: ContentStore + ?Sized>(
    store: &S,
    path: impl AsRef<Path>,
) -> StorageResult<StoredContent> {
    let data = tokio::fs::read(path.as_ref()).await?;
    store.store(data).await
}

/// Download `root_hash` into a file, returning the number of bytes written.
pub async fn download_to<S: ContentStore + ?Sized>(
    store: &S,
    root_hash: &RootHash,
    path: impl AsRef<Path>,
) -> StorageResult<u64> {
    let data = store.retrieve(root_hash).await?;
    tokio::fs::write(path.as_ref(), &data).await?;
    Ok(data.len() as u64)
}
