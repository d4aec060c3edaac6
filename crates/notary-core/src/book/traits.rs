//! Ledger book trait definition

use crate::book::error::BookResult;
use crate::id::{Address, RootHash};
use crate::record::NotarizationRecord;

/// Core storage operations for notarization records.
///
/// This trait defines the minimal interface every book must implement.
/// Records are write-once: there is no update or delete.
pub trait LedgerBook {
    /// Store a record.
    ///
    /// If a record with the same root hash already exists, returns
    /// `BookError::AlreadyExists`. Root hashes compare as exact strings.
    fn insert(&mut self, record: NotarizationRecord) -> BookResult<()>;

    /// Retrieve the record for a root hash.
    ///
    /// Returns `None` if the root hash was never inserted.
    fn get(&self, root_hash: &RootHash) -> BookResult<Option<NotarizationRecord>>;

    /// Check if a root hash is recorded.
    fn contains(&self, root_hash: &RootHash) -> BookResult<bool> {
        Ok(self.get(root_hash)?.is_some())
    }

    /// Root hashes recorded by `owner`, in insertion order.
    fn by_owner(&self, owner: &Address) -> BookResult<Vec<RootHash>>;

    /// Total number of records.
    fn count(&self) -> BookResult<u64>;

    /// Largest timestamp recorded so far, 0 for an empty book.
    fn latest_timestamp(&self) -> BookResult<u64>;
}
