//! Human-readable notarization certificates.

use std::fmt;

use serde::Serialize;

use super::format::{format_timestamp, short_hash};
use super::types::NotarizationRecord;
use crate::id::TxRef;

/// A confirmed record plus the context needed to present and share it.
#[derive(Debug, Clone, Serialize)]
pub struct Certificate {
    pub record: NotarizationRecord,
    /// Ledger transaction that wrote the record, when known
    pub tx: Option<TxRef>,
    pub chain_name: String,
    /// Block explorer base URL, without trailing slash
    pub explorer_url: String,
}

impl Certificate {
    pub fn new(
        record: NotarizationRecord,
        tx: Option<TxRef>,
        chain_name: impl Into<String>,
        explorer_url: impl Into<String>,
    ) -> Self {
        Self {
            record,
            tx,
            chain_name: chain_name.into(),
            explorer_url: explorer_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Explorer link for the ledger transaction.
    pub fn tx_url(&self) -> Option<String> {
        self.tx.map(|tx| format!("{}/tx/{}", self.explorer_url, tx))
    }

    /// Explorer link for the submitter's account.
    pub fn submitter_url(&self) -> String {
        format!("{}/address/{}", self.explorer_url, self.record.submitter)
    }

    /// Share link that opens verification of this root at `base`.
    pub fn verify_link(&self, base: &str) -> String {
        format!(
            "{}?verify={}",
            base.trim_end_matches('/'),
            self.record.root_hash
        )
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let submitter = self.record.submitter.to_string();
        writeln!(f, "✓ Notarized · {}", self.chain_name)?;
        if !self.record.label.is_empty() {
            writeln!(f, "  \"{}\"", self.record.label)?;
        }
        if !self.record.filename.is_empty() {
            writeln!(f, "  Document      {}", self.record.filename)?;
        }
        writeln!(
            f,
            "  Notarized by  {}…{}",
            &submitter[..8],
            &submitter[submitter.len() - 6..]
        )?;
        writeln!(f, "  Timestamp     {}", format_timestamp(self.record.timestamp))?;
        write!(
            f,
            "  Root Hash     {}",
            short_hash(self.record.root_hash.as_str(), 14)
        )?;
        if let Some(url) = self.tx_url() {
            write!(f, "\n  Explorer      {url}")?;
        }
        Ok(())
    }
}
