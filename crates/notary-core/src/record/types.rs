//! Record type definitions

use serde::{Deserialize, Serialize};

use crate::book::{BookResult, LedgerBook};
use crate::id::{Address, RootHash, TxRef};

/// A notarization: one root hash attested by one account at one time.
///
/// Every field is immutable once the ledger has written it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarizationRecord {
    /// Content address, the ledger key
    pub root_hash: RootHash,

    /// Account whose signature authorized the write
    pub submitter: Address,

    /// Ledger-assigned write time (seconds since epoch)
    pub timestamp: u64,

    /// Original filename supplied by the submitter
    pub filename: String,

    /// Free-text description supplied by the submitter
    pub label: String,
}

/// The ledger's `getRecord` tuple: `(submitter, timestamp, filename, label)`.
///
/// Unregistered roots read back as [`RawRecord::zero`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub submitter: Address,
    pub timestamp: u64,
    pub filename: String,
    pub label: String,
}

impl RawRecord {
    /// The all-zero tuple returned for unregistered roots.
    pub fn zero() -> Self {
        Self::default()
    }

    /// True when this tuple must be read as "unregistered".
    ///
    /// Either a zero submitter or a zero timestamp qualifies. A real record
    /// whose submitter is the zero address is indistinguishable from absence.
    pub fn is_unregistered(&self) -> bool {
        self.submitter.is_zero() || self.timestamp == 0
    }
}

impl From<NotarizationRecord> for RawRecord {
    fn from(record: NotarizationRecord) -> Self {
        Self {
            submitter: record.submitter,
            timestamp: record.timestamp,
            filename: record.filename,
            label: record.label,
        }
    }
}

/// Result of looking a root hash up on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lookup {
    Registered(NotarizationRecord),
    Unregistered { root_hash: RootHash },
}

impl Lookup {
    /// Interpret a raw ledger tuple for `root_hash`.
    pub fn from_raw(root_hash: RootHash, raw: RawRecord) -> Self {
        if raw.is_unregistered() {
            return Lookup::Unregistered { root_hash };
        }
        Lookup::Registered(NotarizationRecord {
            root_hash,
            submitter: raw.submitter,
            timestamp: raw.timestamp,
            filename: raw.filename,
            label: raw.label,
        })
    }

    /// Look `root_hash` up in a ledger book.
    pub fn from_book<B: LedgerBook + ?Sized>(book: &B, root_hash: &RootHash) -> BookResult<Self> {
        let raw = book
            .get(root_hash)?
            .map(RawRecord::from)
            .unwrap_or_else(RawRecord::zero);
        Ok(Self::from_raw(root_hash.clone(), raw))
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Lookup::Registered(_))
    }

    pub fn root_hash(&self) -> &RootHash {
        match self {
            Lookup::Registered(record) => &record.root_hash,
            Lookup::Unregistered { root_hash } => root_hash,
        }
    }

    pub fn record(&self) -> Option<&NotarizationRecord> {
        match self {
            Lookup::Registered(record) => Some(record),
            Lookup::Unregistered { .. } => None,
        }
    }

    pub fn into_record(self) -> Option<NotarizationRecord> {
        match self {
            Lookup::Registered(record) => Some(record),
            Lookup::Unregistered { .. } => None,
        }
    }
}

/// The ledger's `Notarized` event, as seen by passive observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarizedEvent {
    pub submitter: Address,
    pub root_hash: RootHash,
    pub filename: String,
    pub label: String,
    pub timestamp: u64,

    /// Transaction that emitted the event
    pub tx: TxRef,

    /// Block that included the transaction
    pub block: u64,
}

impl NotarizedEvent {
    pub fn record(&self) -> NotarizationRecord {
        NotarizationRecord {
            root_hash: self.root_hash.clone(),
            submitter: self.submitter,
            timestamp: self.timestamp,
            filename: self.filename.clone(),
            label: self.label.clone(),
        }
    }
}

/// Builder for creating records
#[derive(Debug)]
pub struct RecordBuilder {
    record: NotarizationRecord,
}

impl RecordBuilder {
    pub fn new(root_hash: RootHash) -> Self {
        Self {
            record: NotarizationRecord {
                root_hash,
                submitter: Address::ZERO,
                timestamp: 0,
                filename: String::new(),
                label: String::new(),
            },
        }
    }

    pub fn submitter(mut self, submitter: Address) -> Self {
        self.record.submitter = submitter;
        self
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.record.timestamp = timestamp;
        self
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.record.filename = filename.into();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.record.label = label.into();
        self
    }

    pub fn build(self) -> NotarizationRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn root() -> RootHash {
        RootHash::parse(&format!("0x{}", "12".repeat(32))).unwrap()
    }

    fn owner() -> Address {
        "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".parse().unwrap()
    }

    #[test]
    fn zero_tuple_is_unregistered() {
        let lookup = Lookup::from_raw(root(), RawRecord::zero());
        assert_eq!(lookup, Lookup::Unregistered { root_hash: root() });
        assert!(lookup.record().is_none());
    }

    #[test]
    fn zero_timestamp_alone_is_unregistered() {
        let raw = RawRecord {
            submitter: owner(),
            timestamp: 0,
            filename: "a.txt".into(),
            label: String::new(),
        };
        assert!(!Lookup::from_raw(root(), raw).is_registered());
    }

    #[test]
    fn zero_submitter_alone_is_unregistered() {
        let raw = RawRecord {
            submitter: Address::ZERO,
            timestamp: 1_704_067_200,
            filename: "a.txt".into(),
            label: String::new(),
        };
        assert!(!Lookup::from_raw(root(), raw).is_registered());
    }

    #[test]
    fn populated_tuple_is_registered() {
        let raw = RawRecord {
            submitter: owner(),
            timestamp: 1_704_067_200,
            filename: "a.txt".into(),
            label: "contract v2".into(),
        };
        let expected = RecordBuilder::new(root())
            .submitter(owner())
            .timestamp(1_704_067_200)
            .filename("a.txt")
            .label("contract v2")
            .build();
        assert_eq!(Lookup::from_raw(root(), raw).into_record(), Some(expected));
    }

    #[test]
    fn lookup_serializes_with_status_tag() {
        let json = serde_json::to_value(Lookup::Unregistered { root_hash: root() }).unwrap();
        assert_eq!(json["status"], "unregistered");
        assert_eq!(json["root_hash"], root().as_str());
    }
}
