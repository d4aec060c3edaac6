//! In-memory ledger book
//!
//! A simple HashMap-based implementation for testing and development.
//! Not suitable for production use due to lack of persistence.

use std::collections::HashMap;

use crate::book::error::{BookError, BookResult};
use crate::book::traits::LedgerBook;
use crate::id::{Address, RootHash};
use crate::record::NotarizationRecord;

/// In-memory ledger book.
#[derive(Debug, Default)]
pub struct MemoryBook {
    records: HashMap<RootHash, NotarizationRecord>,
    owners: HashMap<Address, Vec<RootHash>>,
    latest: u64,
}

impl MemoryBook {
    /// Create a new empty book.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerBook for MemoryBook {
    fn insert(&mut self, record: NotarizationRecord) -> BookResult<()> {
        if self.records.contains_key(&record.root_hash) {
            return Err(BookError::AlreadyExists(record.root_hash.to_string()));
        }
        self.owners
            .entry(record.submitter)
            .or_default()
            .push(record.root_hash.clone());
        self.latest = self.latest.max(record.timestamp);
        self.records.insert(record.root_hash.clone(), record);
        Ok(())
    }

    fn get(&self, root_hash: &RootHash) -> BookResult<Option<NotarizationRecord>> {
        Ok(self.records.get(root_hash).cloned())
    }

    fn by_owner(&self, owner: &Address) -> BookResult<Vec<RootHash>> {
        Ok(self.owners.get(owner).cloned().unwrap_or_default())
    }

    fn count(&self) -> BookResult<u64> {
        Ok(self.records.len() as u64)
    }

    fn latest_timestamp(&self) -> BookResult<u64> {
        Ok(self.latest)
    }
}
