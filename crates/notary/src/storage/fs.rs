//! Filesystem content store
//!
//! Each blob lives at `<root>/<lowercase hex digest>`. Every write goes to
//! its own temporary file in the same directory and is renamed into place,
//! so a blob file is either absent or complete, and concurrent uploads of
//! the same content never share a temporary file.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use notary_core::content::{self, MerkleTree};
use notary_core::RootHash;
use tracing::{debug, info};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::traits::{storage_tx, ContentStore, StoredContent};
use crate::tracing::prefix;

/// Content store backed by a local directory.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open (creating if needed) a store under `root`.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        info!("{} content store at {}", prefix::STORE, root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, digest: &[u8; 32]) -> PathBuf {
        self.root.join(hex::encode(digest))
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn store(&self, data: Vec<u8>) -> StorageResult<StoredContent> {
        let size = data.len() as u64;
        let (tree, data) = tokio::task::spawn_blocking(move || {
            MerkleTree::from_bytes(&data).map(|tree| (tree, data))
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("hashing task failed: {e}")))??;

        let root_hash = tree.root_hash();
        let path = self.blob_path(&tree.root());

        let mut already_stored = tokio::fs::try_exists(&path).await?;
        if !already_stored {
            let dir = self.root.clone();
            let target = path.clone();
            already_stored = tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &data))
                .await
                .map_err(|e| StorageError::Unavailable(format!("write task failed: {e}")))??;
        }
        debug!(
            "{} stored {} at {} ({} bytes{})",
            prefix::STORE,
            root_hash,
            path.display(),
            size,
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
        let path = self.blob_path(&root_hash.digest());
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(root_hash.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        let expected = root_hash.clone();
        tokio::task::spawn_blocking(move || {
            content::verify_content(&expected, &data).map(|_| data)
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("hashing task failed: {e}")))?
        .map_err(StorageError::from)
    }
}

/// Write `data` to `target` through a private temporary file.
///
/// Returns `true` when another writer put the blob in place first.
fn write_atomic(dir: &Path, target: &Path, data: &[u8]) -> std::io::Result<bool> {
    let mut part = tempfile::NamedTempFile::new_in(dir)?;
    part.write_all(data)?;
    part.as_file().sync_all()?;

    match part.persist(target) {
        Ok(_) => Ok(false),
        Err(_) if target.exists() => Ok(true),
        Err(e) => Err(e.error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::{download_to, store_file};
    use notary_core::ContentError;

    #[tokio::test]
    async fn blobs_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let root_hash = {
            let store = FsContentStore::open(dir.path()).await.unwrap();
            store.store(b"hello1234\n".to_vec()).await.unwrap().root_hash
        };

        let store = FsContentStore::open(dir.path()).await.unwrap();
        assert_eq!(store.retrieve(&root_hash).await.unwrap(), b"hello1234\n");
        assert!(store.store(b"hello1234\n".to_vec()).await.unwrap().already_stored);
    }

    #[tokio::test]
    async fn missing_blob_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::open(dir.path()).await.unwrap();
        let root = RootHash::from_digest([3; 32]);
        assert!(matches!(store.retrieve(&root).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn tampered_blob_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::open(dir.path()).await.unwrap();
        let stored = store.store(b"original".to_vec()).await.unwrap();

        std::fs::write(store.blob_path(&stored.root_hash.digest()), b"tampered").unwrap();
        assert!(matches!(
            store.retrieve(&stored.root_hash).await,
            Err(StorageError::Content(ContentError::Mismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn file_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::open(dir.path().join("blobs")).await.unwrap();

        let input = dir.path().join("a.txt");
        std::fs::write(&input, b"hello1234\n").unwrap();
        let stored = store_file(&store, &input).await.unwrap();

        let output = dir.path().join("out.txt");
        let written = download_to(&store, &stored.root_hash, &output).await.unwrap();
        assert_eq!(written, 10);
        assert_eq!(std::fs::read(&output).unwrap(), b"hello1234\n");
    }

    #[tokio::test]
    async fn empty_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::open(dir.path()).await.unwrap();
        assert!(matches!(
            store.store(Vec::new()).await,
            Err(StorageError::Content(ContentError::Empty))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_identical_uploads_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::open(dir.path()).await.unwrap();
        let data: Vec<u8> = (0..2 * 1024 * 1024).map(|i| (i % 251) as u8).collect();

        for _ in 0..10 {
            let mut tasks = Vec::new();
            for _ in 0..8 {
                let store = store.clone();
                let data = data.clone();
                tasks.push(tokio::spawn(async move { store.store(data).await }));
            }

            let mut roots = Vec::new();
            for task in tasks {
                roots.push(task.await.unwrap().unwrap().root_hash);
            }
            roots.dedup();
            assert_eq!(roots.len(), 1);
            assert_eq!(store.retrieve(&roots[0]).await.unwrap(), data);
        }

        // Only the blob itself remains, no stray temporary files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
