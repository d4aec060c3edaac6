//! Content store boundary
//!
//! This module defines the `ContentStore` trait: the off-chain side of the
//! notary. Storing bytes returns their root hash; retrieving a root hash
//! returns bytes that are verified to rebuild it. Implementations exist for:
//!
//! - **Memory**: In-memory store for tests and demos (`MemoryContentStore`)
//! - **Filesystem**: One blob per root under a directory (`FsContentStore`)
//!
//! # Example
//!
//! ```rust
//! use notary::storage::{ContentStore, MemoryContentStore};
//!
//! # async fn run() -> Result<(), notary::StorageError> {
//! let store = MemoryContentStore::new();
//! let stored = store.store(b"hello1234\n".to_vec()).await?;
//! assert_eq!(store.retrieve(&stored.root_hash).await?, b"hello1234\n");
//! # Ok(())
//! # }
//! ```

mod error;
mod fs;
mod memory;
mod traits;

pub use error::{StorageError, StorageResult};
pub use fs::FsContentStore;
pub use memory::MemoryContentStore;
pub use traits::{download_to, storage_tx, store_file, ContentStore, StoredContent};
