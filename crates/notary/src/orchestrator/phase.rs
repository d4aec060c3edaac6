//! Orchestrator phases and the actions each one allows.

use notary_core::{NotarizationRecord, RootHash, TxRef};
use serde::Serialize;

use crate::storage::StoredContent;

/// Why an attempt ended in [`Phase::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Failure {
    /// The content store could not take the file
    Storage(String),
    /// The ledger could not be reached, or failed after submission
    Ledger(String),
    /// Submitted, but no receipt within the finality bound
    FinalityTimeout,
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Storage(msg) => write!(f, "storage failed: {msg}"),
            Failure::Ledger(msg) => write!(f, "ledger failed: {msg}"),
            Failure::FinalityTimeout => f.write_str("transaction not final in time"),
        }
    }
}

/// Where a notarization attempt stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Storing {
        filename: String,
    },
    /// Stored and ready to attest. `last_error` explains a bounce back from `Attesting`.
    Ready {
        filename: String,
        stored: StoredContent,
        last_error: Option<String>,
    },
    Attesting {
        filename: String,
        stored: StoredContent,
    },
    Confirming {
        filename: String,
        stored: StoredContent,
        tx: TxRef,
    },
    /// `tx` is `None` when the root was already registered by the same account.
    Confirmed {
        stored: StoredContent,
        tx: Option<TxRef>,
        record: NotarizationRecord,
    },
    /// Progress made before the failure is kept: the stored content and,
    /// when one was submitted, the ledger transaction.
    Failed {
        filename: String,
        stored: Option<StoredContent>,
        tx: Option<TxRef>,
        failure: Failure,
    },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Storing { .. } => "storing",
            Phase::Ready { .. } => "ready",
            Phase::Attesting { .. } => "attesting",
            Phase::Confirming { .. } => "confirming",
            Phase::Confirmed { .. } => "confirmed",
            Phase::Failed { .. } => "failed",
        }
    }

    /// Root hash of the stored content, once there is one.
    pub fn root_hash(&self) -> Option<&RootHash> {
        match self {
            Phase::Ready { stored, .. }
            | Phase::Attesting { stored, .. }
            | Phase::Confirming { stored, .. }
            | Phase::Confirmed { stored, .. } => Some(&stored.root_hash),
            Phase::Failed { stored, .. } => stored.as_ref().map(|s| &s.root_hash),
            Phase::Idle | Phase::Storing { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Confirmed { .. } | Phase::Failed { .. })
    }

    pub fn actions(&self) -> Actions {
        Actions {
            store: matches!(self, Phase::Idle),
            attest: matches!(self, Phase::Ready { .. }),
            await_finality: matches!(self, Phase::Confirming { .. }),
            recheck: matches!(
                self,
                Phase::Confirming { .. }
                    | Phase::Failed {
                        stored: Some(_),
                        tx: Some(_),
                        ..
                    }
            ),
            resume: matches!(self, Phase::Failed { stored: Some(_), .. }),
            reset: true,
        }
    }
}

/// User actions available in a phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Actions {
    pub store: bool,
    pub attest: bool,
    pub await_finality: bool,
    pub recheck: bool,
    pub resume: bool,
    pub reset: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::storage_tx;

    fn stored() -> StoredContent {
        let root_hash = RootHash::from_digest([1; 32]);
        StoredContent {
            tx: storage_tx(&root_hash),
            root_hash,
            size: 10,
            already_stored: false,
        }
    }

    #[test]
    fn attest_only_from_ready() {
        let phases = [
            Phase::Idle,
            Phase::Storing {
                filename: "a.txt".into(),
            },
            Phase::Attesting {
                filename: "a.txt".into(),
                stored: stored(),
            },
            Phase::Confirming {
                filename: "a.txt".into(),
                stored: stored(),
                tx: TxRef::from_digest([2; 32]),
            },
            Phase::Failed {
                filename: "a.txt".into(),
                stored: Some(stored()),
                tx: None,
                failure: Failure::Ledger("down".into()),
            },
        ];
        for phase in phases {
            assert!(!phase.actions().attest, "{}", phase.name());
        }

        let ready = Phase::Ready {
            filename: "a.txt".into(),
            stored: stored(),
            last_error: None,
        };
        assert!(ready.actions().attest);
    }

    #[test]
    fn storing_offers_only_reset() {
        let actions = Phase::Storing {
            filename: "a.txt".into(),
        }
        .actions();
        assert_eq!(
            actions,
            Actions {
                reset: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn failure_keeps_progress() {
        let timed_out = Phase::Failed {
            filename: "a.txt".into(),
            stored: Some(stored()),
            tx: Some(TxRef::from_digest([2; 32])),
            failure: Failure::FinalityTimeout,
        };
        assert_eq!(timed_out.root_hash(), Some(&stored().root_hash));
        assert!(timed_out.actions().recheck);
        assert!(timed_out.actions().resume);

        let storage_failed = Phase::Failed {
            filename: "a.txt".into(),
            stored: None,
            tx: None,
            failure: Failure::Storage("offline".into()),
        };
        assert!(!storage_failed.actions().resume);
        assert!(storage_failed.is_terminal());
    }

    #[test]
    fn phase_serializes_with_tag() {
        let json = serde_json::to_value(Phase::Idle).unwrap();
        assert_eq!(json["phase"], "idle");
    }
}
