//! The `Notarizer` state machine.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notary_core::{Lookup, NotarizationRecord, NotarizeCall, RootHash, TxRef};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Timeouts;
use crate::error::{Error, Result};
use crate::ledger::{self, Ledger, LedgerError, LedgerResult, Receipt, ReceiptStatus, SignedCall};
use crate::orchestrator::phase::{Failure, Phase};
use crate::signer::SignError;
use crate::storage::{ContentStore, StorageError, StoredContent};
use crate::tracing::prefix;
use crate::wallet::WalletContext;

/// Outcome of [`Notarizer::attest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A new ledger transaction is waiting for finality
    Submitted(TxRef),
    /// The connected account had already registered this root; nothing was sent
    AlreadyConfirmed(NotarizationRecord),
}

/// Drives one notarization attempt: store first, attest second.
///
/// Mutating operations take `&mut self`, so one attempt is never driven
/// from two places at once. Observers follow along through
/// [`subscribe`](Self::subscribe).
pub struct Notarizer<S, L> {
    store: Arc<S>,
    ledger: Arc<L>,
    timeouts: Timeouts,
    phase: watch::Sender<Phase>,
}

impl<S: ContentStore, L: Ledger> Notarizer<S, L> {
    pub fn new(store: Arc<S>, ledger: Arc<L>, timeouts: Timeouts) -> Self {
        let (phase, _) = watch::channel(Phase::Idle);
        Self {
            store,
            ledger,
            timeouts,
            phase,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase.borrow().clone()
    }

    /// Watch phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Upload `data` under `filename`. Allowed from `Idle` only.
    pub async fn store(&mut self, filename: &str, data: Vec<u8>) -> Result<StoredContent> {
        self.require("store", |p| matches!(p, Phase::Idle))?;
        self.set_phase(Phase::Storing {
            filename: filename.to_string(),
        });
        self.upload(filename.to_string(), data).await
    }

    /// Read a file from disk and upload it. Allowed from `Idle` only.
    pub async fn store_file(&mut self, path: impl AsRef<Path>) -> Result<StoredContent> {
        self.require("store", |p| matches!(p, Phase::Idle))?;
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.set_phase(Phase::Storing {
            filename: filename.clone(),
        });

        match tokio::fs::read(path).await {
            Ok(data) => self.upload(filename, data).await,
            Err(e) => {
                let err = StorageError::Io(e);
                self.fail(filename, None, None, Failure::Storage(err.to_string()));
                Err(err.into())
            }
        }
    }

    async fn upload(&mut self, filename: String, data: Vec<u8>) -> Result<StoredContent> {
        let limit = self.timeouts.storage;
        let result = bounded(limit, self.store.store(data), StorageError::Timeout).await;
        match result {
            Ok(stored) => {
                info!(
                    "{} {} stored as {} ({} bytes)",
                    prefix::STORE,
                    filename,
                    stored.root_hash,
                    stored.size
                );
                self.set_phase(Phase::Ready {
                    filename,
                    stored: stored.clone(),
                    last_error: None,
                });
                Ok(stored)
            }
            Err(e) => {
                self.fail(filename, None, None, Failure::Storage(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Sign and submit the `notarize` call for the stored root.
    ///
    /// Allowed from `Ready` only. A declined signature or a rejected call
    /// returns to `Ready` with the content still stored; an unreachable
    /// ledger fails the attempt.
    pub async fn attest(&mut self, label: &str, wallet: &WalletContext) -> Result<Submission> {
        let (filename, stored) = match self.phase() {
            Phase::Ready {
                filename, stored, ..
            } => (filename, stored),
            other => {
                return Err(Error::InvalidTransition {
                    action: "attest",
                    phase: other.name(),
                })
            }
        };
        let signer = wallet.signer().cloned().ok_or(Error::WalletNotConnected)?;
        if wallet.chain().chain_id != self.ledger.chain_id() {
            return Err(Error::WrongChain {
                wallet: wallet.chain().chain_id,
                ledger: self.ledger.chain_id(),
            });
        }

        self.set_phase(Phase::Attesting {
            filename: filename.clone(),
            stored: stored.clone(),
        });
        let root = stored.root_hash.clone();
        let account = signer.address();

        let existing = match self.ledger_call(ledger::lookup(&*self.ledger, &root)).await {
            Ok(lookup) => lookup,
            Err(e) => return Err(self.attest_failed(filename, stored, e)),
        };
        if let Lookup::Registered(record) = existing {
            if record.submitter == account {
                info!(
                    "{} {} already notarized by {}",
                    prefix::LEDGER,
                    root,
                    account
                );
                self.set_phase(Phase::Confirmed {
                    stored,
                    tx: None,
                    record: record.clone(),
                });
                return Ok(Submission::AlreadyConfirmed(record));
            }
            let err = LedgerError::AlreadyNotarized {
                root_hash: root,
                submitter: record.submitter,
            };
            return Err(self.attest_failed(filename, stored, err));
        }

        let nonce = match self.ledger_call(self.ledger.nonce(&account)).await {
            Ok(nonce) => nonce,
            Err(e) => return Err(self.attest_failed(filename, stored, e)),
        };
        let call = NotarizeCall {
            chain_id: self.ledger.chain_id(),
            contract: self.ledger.contract(),
            nonce,
            root_hash: root,
            filename: filename.clone(),
            label: label.to_string(),
        };

        let signed = match tokio::time::timeout(
            self.timeouts.signature,
            SignedCall::sign(call, &*signer),
        )
        .await
        {
            Ok(Ok(signed)) => signed,
            Ok(Err(SignError::Declined)) => {
                return Err(self.bounce(filename, stored, "signature request declined".into()))
            }
            Err(_) => {
                return Err(self.bounce(filename, stored, "signature request timed out".into()))
            }
            Ok(Err(e)) => {
                self.set_ready(filename, stored, Some(e.to_string()));
                return Err(e.into());
            }
        };

        let tx = match self.ledger_call(self.ledger.submit(signed)).await {
            Ok(tx) => tx,
            Err(e) => return Err(self.attest_failed(filename, stored, e)),
        };
        info!("{} submitted {} for {}", prefix::LEDGER, tx, stored.root_hash);
        self.set_phase(Phase::Confirming {
            filename,
            stored,
            tx,
        });
        Ok(Submission::Submitted(tx))
    }

    /// Wait until the submitted transaction is included.
    ///
    /// Polls for a receipt every `poll_interval` for at most `finality`.
    /// Cancelling stops the wait and leaves the phase at `Confirming`; the
    /// transaction itself is unaffected and can be rechecked later.
    pub async fn await_finality(&mut self, cancel: &CancellationToken) -> Result<NotarizationRecord> {
        let (filename, stored, tx) = match self.phase() {
            Phase::Confirming {
                filename,
                stored,
                tx,
            } => (filename, stored, tx),
            other => {
                return Err(Error::InvalidTransition {
                    action: "await finality",
                    phase: other.name(),
                })
            }
        };

        let started = Instant::now();
        let poll = async {
            loop {
                if let Some(receipt) = self.ledger_call(self.ledger.receipt(&tx)).await? {
                    return Ok::<_, LedgerError>(receipt);
                }
                debug!("{} {} pending", prefix::LEDGER, tx);
                tokio::time::sleep(self.timeouts.poll_interval).await;
            }
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                info!("{} stopped waiting for {}, transaction remains submitted", prefix::PHASE, tx);
                return Err(Error::Cancelled);
            }
            outcome = tokio::time::timeout(self.timeouts.finality, poll) => outcome,
        };

        match outcome {
            Ok(Ok(receipt)) => self.finish(filename, stored, receipt).await,
            Ok(Err(e)) => {
                self.fail(filename, Some(stored), Some(tx), Failure::Ledger(e.to_string()));
                Err(ledger_error(e))
            }
            Err(_) => {
                let waited = started.elapsed();
                self.fail(filename, Some(stored), Some(tx), Failure::FinalityTimeout);
                Err(Error::FinalityTimeout { tx, waited })
            }
        }
    }

    /// Ask the ledger once more about a submitted transaction.
    ///
    /// Allowed while `Confirming` (a stale view after cancellation) or
    /// `Failed` with a submitted transaction. Returns `None` while it is
    /// still pending, leaving the phase unchanged.
    pub async fn recheck(&mut self) -> Result<Option<NotarizationRecord>> {
        let (filename, stored, tx) = match self.phase() {
            Phase::Confirming {
                filename,
                stored,
                tx,
            } => (filename, stored, tx),
            Phase::Failed {
                filename,
                stored: Some(stored),
                tx: Some(tx),
                ..
            } => (filename, stored, tx),
            other => {
                return Err(Error::InvalidTransition {
                    action: "recheck",
                    phase: other.name(),
                })
            }
        };

        match self
            .ledger_call(self.ledger.receipt(&tx))
            .await
            .map_err(ledger_error)?
        {
            Some(receipt) => self.finish(filename, stored, receipt).await.map(Some),
            None => {
                debug!("{} {} still pending", prefix::LEDGER, tx);
                Ok(None)
            }
        }
    }

    /// Pick a failed attempt back up without losing progress.
    ///
    /// With a submitted transaction this returns to `Confirming`; with only
    /// stored content it returns to `Ready`. A failed upload cannot resume:
    /// reset and store again.
    pub fn resume(&mut self) -> Result<()> {
        match self.phase() {
            Phase::Failed {
                filename,
                stored: Some(stored),
                tx: Some(tx),
                ..
            } => {
                self.set_phase(Phase::Confirming {
                    filename,
                    stored,
                    tx,
                });
                Ok(())
            }
            Phase::Failed {
                filename,
                stored: Some(stored),
                tx: None,
                failure,
            } => {
                self.set_ready(filename, stored, Some(failure.to_string()));
                Ok(())
            }
            other => Err(Error::InvalidTransition {
                action: "resume",
                phase: other.name(),
            }),
        }
    }

    /// Drop the current attempt and return to `Idle`.
    ///
    /// Anything already stored or submitted stays where it is.
    pub fn reset(&mut self) {
        self.set_phase(Phase::Idle);
    }

    /// Read the ledger entry for `root_hash`. Never changes the phase.
    pub async fn lookup(&self, root_hash: &RootHash) -> Result<Lookup> {
        self.ledger_call(ledger::lookup(&*self.ledger, root_hash))
            .await
            .map_err(ledger_error)
    }

    /// Download the content stored under `root_hash`. Never changes the phase.
    pub async fn retrieve(&self, root_hash: &RootHash) -> Result<Vec<u8>> {
        let limit = self.timeouts.storage;
        Ok(bounded(limit, self.store.retrieve(root_hash), StorageError::Timeout).await?)
    }

    /// Store, attest and wait for finality in one go.
    pub async fn notarize(
        &mut self,
        filename: &str,
        data: Vec<u8>,
        label: &str,
        wallet: &WalletContext,
        cancel: &CancellationToken,
    ) -> Result<NotarizationRecord> {
        self.store(filename, data).await?;
        match self.attest(label, wallet).await? {
            Submission::AlreadyConfirmed(record) => Ok(record),
            Submission::Submitted(_) => self.await_finality(cancel).await,
        }
    }

    async fn finish(
        &mut self,
        filename: String,
        stored: StoredContent,
        receipt: Receipt,
    ) -> Result<NotarizationRecord> {
        let tx = receipt.tx;
        if let ReceiptStatus::Reverted(reason) = receipt.status {
            warn!("{} {} reverted: {}", prefix::FAIL, tx, reason);
            let err = LedgerError::Reverted { tx, reason };
            self.fail(filename, Some(stored), None, Failure::Ledger(err.to_string()));
            return Err(err.into());
        }

        let lookup = self
            .ledger_call(ledger::lookup(&*self.ledger, &stored.root_hash))
            .await;
        match lookup {
            Ok(Lookup::Registered(record)) => {
                info!(
                    "{} {} notarized by {} at {}",
                    prefix::PHASE,
                    record.root_hash,
                    record.submitter,
                    record.timestamp
                );
                self.set_phase(Phase::Confirmed {
                    stored,
                    tx: Some(tx),
                    record: record.clone(),
                });
                Ok(record)
            }
            Ok(Lookup::Unregistered { root_hash }) => {
                let msg = format!("receipt for {tx} but {root_hash} is unregistered");
                self.fail(filename, Some(stored), Some(tx), Failure::Ledger(msg.clone()));
                Err(Error::LedgerUnavailable(msg))
            }
            Err(e) => {
                self.fail(filename, Some(stored), Some(tx), Failure::Ledger(e.to_string()));
                Err(ledger_error(e))
            }
        }
    }

    /// Classify a ledger error raised while attesting.
    fn attest_failed(&self, filename: String, stored: StoredContent, err: LedgerError) -> Error {
        if err.is_rejection() {
            self.set_ready(filename, stored, Some(err.to_string()));
            return match err {
                LedgerError::AlreadyNotarized { .. } => Error::Ledger(err),
                other => Error::AttestationRejected(other.to_string()),
            };
        }
        self.fail(filename, Some(stored), None, Failure::Ledger(err.to_string()));
        ledger_error(err)
    }

    fn bounce(&self, filename: String, stored: StoredContent, reason: String) -> Error {
        self.set_ready(filename, stored, Some(reason.clone()));
        Error::AttestationRejected(reason)
    }

    fn set_ready(&self, filename: String, stored: StoredContent, last_error: Option<String>) {
        self.set_phase(Phase::Ready {
            filename,
            stored,
            last_error,
        });
    }

    fn fail(
        &self,
        filename: String,
        stored: Option<StoredContent>,
        tx: Option<TxRef>,
        failure: Failure,
    ) {
        warn!("{} {}: {}", prefix::FAIL, filename, failure);
        self.set_phase(Phase::Failed {
            filename,
            stored,
            tx,
            failure,
        });
    }

    fn set_phase(&self, next: Phase) {
        let previous = self.phase.send_replace(next);
        debug!(
            "{} {} -> {}",
            prefix::PHASE,
            previous.name(),
            self.phase.borrow().name()
        );
    }

    fn require(&self, action: &'static str, allowed: impl Fn(&Phase) -> bool) -> Result<()> {
        let phase = self.phase.borrow();
        if allowed(&*phase) {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                action,
                phase: phase.name(),
            })
        }
    }

    async fn ledger_call<T>(&self, call: impl Future<Output = LedgerResult<T>>) -> LedgerResult<T> {
        bounded(self.timeouts.ledger, call, LedgerError::Timeout).await
    }
}

/// Run `call` for at most `limit`, mapping expiry through `elapsed`.
async fn bounded<T, E>(
    limit: Duration,
    call: impl Future<Output = std::result::Result<T, E>>,
    elapsed: impl FnOnce(Duration) -> E,
) -> std::result::Result<T, E> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(elapsed(limit)),
    }
}

fn ledger_error(err: LedgerError) -> Error {
    if err.is_transient() {
        Error::LedgerUnavailable(err.to_string())
    } else {
        Error::Ledger(err)
    }
}
