//! SQLite ledger book implementing the LedgerBook trait

use notary_core::{Address, BookError, BookResult, LedgerBook, NotarizationRecord, RootHash};
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, SqliteError};

/// SQLite-backed ledger book
pub struct SqliteBook {
    conn: Connection,
}

impl SqliteBook {
    /// Wrap a connection that already has migrations applied.
    ///
    /// Use [`crate::migrate::migrate`] to initialize a fresh database.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Create a new in-memory book (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        crate::migrate::migrate(&conn)?;
        Ok(Self::new(conn))
    }

    /// Open or create a file-backed book
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        crate::migrate::migrate(&conn)?;
        Ok(Self::new(conn))
    }

    /// Row number of the most recent record, 0 for an empty book.
    pub fn latest_seq(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COALESCE(MAX(seq), 0) FROM records", [], |row| row.get(0))?)
    }

    /// Records registered after row `seq`, oldest first, with their row numbers.
    ///
    /// Lets another process tail the book while a ledger writes to it.
    pub fn records_after(&self, seq: i64) -> Result<Vec<(i64, NotarizationRecord)>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, root_hash, submitter, timestamp, filename, label
             FROM records WHERE seq > ? ORDER BY seq",
        )?;
        let rows = stmt
            .query_map([seq], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(seq, root, submitter, timestamp, filename, label)| -> Result<_> {
                Ok((
                    seq,
                    NotarizationRecord {
                        root_hash: RootHash::parse(&root)?,
                        submitter: submitter.parse()?,
                        timestamp: timestamp as u64,
                        filename,
                        label,
                    },
                ))
            })
            .collect()
    }

    fn insert_row(&mut self, record: &NotarizationRecord) -> Result<()> {
        let tx = self.conn.transaction()?;
        let exists = tx
            .prepare("SELECT 1 FROM records WHERE root_hash = ?")?
            .exists([record.root_hash.as_str()])?;
        if exists {
            return Err(SqliteError::AlreadyExists(record.root_hash.to_string()));
        }

        tx.execute(
            "INSERT INTO records (root_hash, submitter, timestamp, filename, label)
             VALUES (?, ?, ?, ?, ?)",
            rusqlite::params![
                record.root_hash.as_str(),
                record.submitter.to_string(),
                record.timestamp as i64,
                record.filename,
                record.label,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn select_one(&self, root_hash: &RootHash) -> Result<Option<NotarizationRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT submitter, timestamp, filename, label FROM records WHERE root_hash = ?",
                [root_hash.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((submitter, timestamp, filename, label)) = row else {
            return Ok(None);
        };
        Ok(Some(NotarizationRecord {
            root_hash: root_hash.clone(),
            submitter: submitter.parse()?,
            timestamp: timestamp as u64,
            filename,
            label,
        }))
    }

    fn select_owner(&self, owner: &Address) -> Result<Vec<RootHash>> {
        let mut stmt = self
            .conn
            .prepare("SELECT root_hash FROM records WHERE submitter = ? ORDER BY seq")?;
        let roots = stmt
            .query_map([owner.to_string()], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        roots
            .iter()
            .map(|r| RootHash::parse(r).map_err(SqliteError::from))
            .collect()
    }
}

impl LedgerBook for SqliteBook {
    fn insert(&mut self, record: NotarizationRecord) -> BookResult<()> {
        Ok(self.insert_row(&record)?)
    }

    fn get(&self, root_hash: &RootHash) -> BookResult<Option<NotarizationRecord>> {
        Ok(self.select_one(root_hash)?)
    }

    fn contains(&self, root_hash: &RootHash) -> BookResult<bool> {
        self.conn
            .prepare("SELECT 1 FROM records WHERE root_hash = ?")
            .and_then(|mut stmt| stmt.exists([root_hash.as_str()]))
            .map_err(|e| BookError::from(SqliteError::from(e)))
    }

    fn by_owner(&self, owner: &Address) -> BookResult<Vec<RootHash>> {
        Ok(self.select_owner(owner)?)
    }

    fn count(&self) -> BookResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .map_err(SqliteError::from)?;
        Ok(count as u64)
    }

    fn latest_timestamp(&self) -> BookResult<u64> {
        let latest: i64 = self
            .conn
            .query_row("SELECT COALESCE(MAX(timestamp), 0) FROM records", [], |row| {
                row.get(0)
            })
            .map_err(SqliteError::from)?;
        Ok(latest as u64)
    }
}
