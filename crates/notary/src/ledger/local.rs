//! In-process ledger
//!
//! Simulates the notary contract on a single-node chain. Accepted calls
//! wait in a pending pool until a block includes them; inclusion writes the
//! record into the `LedgerBook`, stores a receipt and broadcasts the
//! `Notarized` event. With auto-mining on, every accepted call is included
//! in its own block straight away.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use notary_core::{
    Address, LedgerBook, NotarizationRecord, NotarizeCall, NotarizedEvent, RawRecord, RootHash,
    TxRef,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::ledger::error::{LedgerError, LedgerResult};
use crate::ledger::traits::Ledger;
use crate::ledger::types::{Receipt, ReceiptStatus, SignedCall};
use crate::tracing::prefix;

const EVENT_CAPACITY: usize = 256;

type Clock = Box<dyn Fn() -> u64 + Send + Sync>;

struct Pending {
    tx: TxRef,
    submitter: Address,
    call: NotarizeCall,
}

struct Inner<B> {
    book: B,
    pending: Vec<Pending>,
    receipts: HashMap<TxRef, Receipt>,
    nonces: HashMap<Address, u64>,
    block: u64,
    last_timestamp: u64,
}

/// Single-node ledger over a [`LedgerBook`].
pub struct LocalLedger<B> {
    chain_id: u64,
    contract: Address,
    inner: Mutex<Inner<B>>,
    events: broadcast::Sender<NotarizedEvent>,
    available: AtomicBool,
    auto_mine: AtomicBool,
    clock: Clock,
}

impl<B: LedgerBook + Send> LocalLedger<B> {
    /// Ledger for `contract` on `chain_id`, auto-mining.
    pub fn new(book: B, chain_id: u64, contract: Address) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            chain_id,
            contract,
            inner: Mutex::new(Inner {
                book,
                pending: Vec::new(),
                receipts: HashMap::new(),
                nonces: HashMap::new(),
                block: 0,
                last_timestamp: 0,
            }),
            events,
            available: AtomicBool::new(true),
            auto_mine: AtomicBool::new(true),
            clock: Box::new(|| chrono::Utc::now().timestamp().max(0) as u64),
        }
    }

    /// Replace the wall clock used for block timestamps.
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Include each accepted call immediately (`true`) or wait for [`mine`](Self::mine).
    pub fn set_auto_mine(&self, enabled: bool) {
        self.auto_mine.store(enabled, Ordering::SeqCst);
    }

    /// Simulate the node going down or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn block_number(&self) -> u64 {
        self.inner.lock().block
    }

    /// Include every pending call, in submission order, in one new block.
    ///
    /// A call whose record cannot be written gets a reverted receipt and
    /// leaves the book untouched.
    pub fn mine(&self) -> LedgerResult<Vec<Receipt>> {
        let mut receipts = Vec::new();
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock();
            if inner.pending.is_empty() {
                return Ok(receipts);
            }

            let floor = inner.last_timestamp.max(inner.book.latest_timestamp()?);
            let timestamp = (self.clock)().max(floor).max(1);
            inner.block += 1;
            inner.last_timestamp = timestamp;
            let block = inner.block;

            for Pending { tx, submitter, call } in std::mem::take(&mut inner.pending) {
                let record = NotarizationRecord {
                    root_hash: call.root_hash,
                    submitter,
                    timestamp,
                    filename: call.filename,
                    label: call.label,
                };
                let status = match inner.book.insert(record.clone()) {
                    Ok(()) => {
                        events.push(NotarizedEvent {
                            submitter,
                            root_hash: record.root_hash.clone(),
                            filename: record.filename.clone(),
                            label: record.label.clone(),
                            timestamp,
                            tx,
                            block,
                        });
                        ReceiptStatus::Success
                    }
                    Err(e) => {
                        warn!("{} tx {} reverted: {}", prefix::LEDGER, tx, e);
                        ReceiptStatus::Reverted(e.to_string())
                    }
                };

                let receipt = Receipt {
                    tx,
                    block,
                    timestamp,
                    status,
                    submitter,
                    root_hash: record.root_hash,
                };
                inner.receipts.insert(tx, receipt.clone());
                receipts.push(receipt);
            }
            debug!(
                "{} block {} at {} with {} tx",
                prefix::LEDGER,
                block,
                timestamp,
                receipts.len()
            );
        }

        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
        Ok(receipts)
    }

    fn check_available(&self) -> LedgerResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LedgerError::Unavailable("local node offline".into()))
        }
    }
}

#[async_trait]
impl<B: LedgerBook + Send> Ledger for LocalLedger<B> {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn contract(&self) -> Address {
        self.contract
    }

    async fn nonce(&self, account: &Address) -> LedgerResult<u64> {
        self.check_available()?;
        Ok(self.inner.lock().nonces.get(account).copied().unwrap_or(0))
    }

    async fn submit(&self, signed: SignedCall) -> LedgerResult<TxRef> {
        self.check_available()?;

        let call = &signed.call;
        if call.chain_id != self.chain_id {
            return Err(LedgerError::WrongChain {
                expected: self.chain_id,
                got: call.chain_id,
            });
        }
        if call.contract != self.contract {
            return Err(LedgerError::WrongContract {
                expected: self.contract,
                got: call.contract,
            });
        }
        let submitter = signed
            .recover_submitter()
            .map_err(|_| LedgerError::InvalidSignature)?;
        let tx = signed.tx_ref();

        {
            let mut inner = self.inner.lock();
            let expected = inner.nonces.get(&submitter).copied().unwrap_or(0);
            if call.nonce != expected {
                return Err(LedgerError::NonceMismatch {
                    expected,
                    got: call.nonce,
                });
            }
            if let Some(existing) = inner.book.get(&call.root_hash)? {
                return Err(LedgerError::AlreadyNotarized {
                    root_hash: existing.root_hash,
                    submitter: existing.submitter,
                });
            }
            if let Some(pending) = inner
                .pending
                .iter()
                .find(|p| p.call.root_hash == call.root_hash)
            {
                return Err(LedgerError::AlreadyNotarized {
                    root_hash: call.root_hash.clone(),
                    submitter: pending.submitter,
                });
            }

            inner.nonces.insert(submitter, expected + 1);
            inner.pending.push(Pending {
                tx,
                submitter,
                call: signed.call,
            });
        }
        info!("{} accepted tx {} from {}", prefix::LEDGER, tx, submitter);

        // Accepted means submitted: a block that fails to form leaves the
        // call pending for the next mine
        if self.auto_mine.load(Ordering::SeqCst) {
            if let Err(e) = self.mine() {
                warn!("{} tx {} left pending: {}", prefix::LEDGER, tx, e);
            }
        }
        Ok(tx)
    }

    async fn receipt(&self, tx: &TxRef) -> LedgerResult<Option<Receipt>> {
        self.check_available()?;
        Ok(self.inner.lock().receipts.get(tx).cloned())
    }

    async fn get_record(&self, root_hash: &RootHash) -> LedgerResult<RawRecord> {
        self.check_available()?;
        Ok(self
            .inner
            .lock()
            .book
            .get(root_hash)?
            .map(RawRecord::from)
            .unwrap_or_else(RawRecord::zero))
    }

    async fn get_by_owner(&self, owner: &Address) -> LedgerResult<Vec<RootHash>> {
        self.check_available()?;
        Ok(self.inner.lock().book.by_owner(owner)?)
    }

    async fn total_count(&self) -> LedgerResult<u64> {
        self.check_available()?;
        Ok(self.inner.lock().book.count()?)
    }

    fn subscribe(&self) -> broadcast::Receiver<NotarizedEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::traits::{documents, lookup};
    use crate::signer::{LocalWallet, Signer};
    use notary_core::{BookError, BookResult, MemoryBook};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;

    const CHAIN: u64 = 16602;

    fn contract() -> Address {
        Address::from_bytes([0xc0; 20])
    }

    fn ledger() -> LocalLedger<MemoryBook> {
        LocalLedger::new(MemoryBook::new(), CHAIN, contract()).with_clock(|| 1_704_067_200)
    }

    fn wallet(n: u8) -> LocalWallet {
        LocalWallet::from_hex(&format!("{:02x}", n).repeat(32)).unwrap()
    }

    fn root(n: u8) -> RootHash {
        RootHash::from_digest([n; 32])
    }

    async fn signed<B: LedgerBook + Send>(
        ledger: &LocalLedger<B>,
        wallet: &LocalWallet,
        root: RootHash,
        filename: &str,
    ) -> SignedCall {
        let call = NotarizeCall {
            chain_id: CHAIN,
            contract: contract(),
            nonce: ledger.nonce(&wallet.address()).await.unwrap(),
            root_hash: root,
            filename: filename.into(),
            label: String::new(),
        };
        SignedCall::sign(call, wallet).await.unwrap()
    }

    #[tokio::test]
    async fn submit_writes_record_with_recovered_submitter() {
        let ledger = ledger();
        let alice = wallet(1);
        let tx = ledger
            .submit(signed(&ledger, &alice, root(1), "a.txt").await)
            .await
            .unwrap();

        let receipt = ledger.receipt(&tx).await.unwrap().unwrap();
        assert!(receipt.is_success());
        assert_eq!(receipt.submitter, alice.address());

        let record = lookup(&ledger, &root(1)).await.unwrap().into_record().unwrap();
        assert_eq!(record.submitter, alice.address());
        assert_eq!(record.filename, "a.txt");
        assert_eq!(record.timestamp, 1_704_067_200);
        assert_eq!(ledger.total_count().await.unwrap(), 1);
        assert_eq!(ledger.nonce(&alice.address()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn pending_until_mined() {
        let ledger = ledger();
        ledger.set_auto_mine(false);
        let alice = wallet(1);

        let tx = ledger
            .submit(signed(&ledger, &alice, root(1), "a.txt").await)
            .await
            .unwrap();
        assert!(ledger.receipt(&tx).await.unwrap().is_none());
        assert!(ledger.get_record(&root(1)).await.unwrap().is_unregistered());
        assert_eq!(ledger.pending_count(), 1);

        let receipts = ledger.mine().unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(ledger.receipt(&tx).await.unwrap(), Some(receipts[0].clone()));
        assert_eq!(ledger.block_number(), 1);
    }

    #[tokio::test]
    async fn duplicates_rejected_registered_or_pending() {
        let ledger = ledger();
        let alice = wallet(1);
        let bob = wallet(2);

        ledger.set_auto_mine(false);
        ledger
            .submit(signed(&ledger, &alice, root(1), "a.txt").await)
            .await
            .unwrap();
        let pending_dup = ledger
            .submit(signed(&ledger, &bob, root(1), "b.txt").await)
            .await;
        assert!(matches!(
            pending_dup,
            Err(LedgerError::AlreadyNotarized { submitter, .. }) if submitter == alice.address()
        ));

        ledger.mine().unwrap();
        let registered_dup = ledger
            .submit(signed(&ledger, &bob, root(1), "b.txt").await)
            .await;
        assert!(matches!(registered_dup, Err(LedgerError::AlreadyNotarized { .. })));
        assert!(ledger.get_by_owner(&bob.address()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replayed_and_foreign_calls_rejected() {
        let ledger = ledger();
        let alice = wallet(1);

        let call = signed(&ledger, &alice, root(1), "a.txt").await;
        ledger.submit(call.clone()).await.unwrap();
        assert!(matches!(
            ledger.submit(call).await,
            Err(LedgerError::NonceMismatch { expected: 1, got: 0 })
        ));

        let mut foreign = signed(&ledger, &alice, root(2), "b.txt").await;
        foreign.call.chain_id = 1;
        assert!(matches!(
            ledger.submit(foreign).await,
            Err(LedgerError::WrongChain { .. })
        ));

        let mut other = NotarizeCall {
            chain_id: CHAIN,
            contract: Address::from_bytes([0xc1; 20]),
            nonce: 1,
            root_hash: root(2),
            filename: String::new(),
            label: String::new(),
        };
        let wrong_contract = SignedCall::sign(other.clone(), &alice).await.unwrap();
        assert!(matches!(
            ledger.submit(wrong_contract).await,
            Err(LedgerError::WrongContract { .. })
        ));

        // Tampering with the call after signing changes who it recovers to
        other.contract = contract();
        let mut tampered = SignedCall::sign(other, &alice).await.unwrap();
        tampered.call.label = "changed".into();
        assert!(ledger.submit(tampered).await.is_err());
        assert!(ledger.get_record(&root(2)).await.unwrap().is_unregistered());
    }

    #[tokio::test]
    async fn unavailable_ledger_writes_nothing() {
        let ledger = ledger();
        let alice = wallet(1);
        let call = signed(&ledger, &alice, root(1), "a.txt").await;

        ledger.set_available(false);
        let err = ledger.submit(call).await.unwrap_err();
        assert!(err.is_transient());

        ledger.set_available(true);
        assert!(ledger.get_record(&root(1)).await.unwrap().is_unregistered());
        assert_eq!(ledger.nonce(&alice.address()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn timestamps_never_go_backwards() {
        let now = Arc::new(AtomicU64::new(2_000));
        let clock = now.clone();
        let ledger = LocalLedger::new(MemoryBook::new(), CHAIN, contract())
            .with_clock(move || clock.load(Ordering::SeqCst));
        let alice = wallet(1);

        let mut last = 0;
        for (n, t) in [(1u8, 2_000u64), (2, 1_500), (3, 2_500)] {
            now.store(t, Ordering::SeqCst);
            ledger
                .submit(signed(&ledger, &alice, root(n), "f").await)
                .await
                .unwrap();
            let ts = ledger.get_record(&root(n)).await.unwrap().timestamp;
            assert!(ts >= last);
            last = ts;
        }
        assert_eq!(last, 2_500);
    }

    #[tokio::test]
    async fn events_and_owner_documents() {
        let ledger = ledger();
        let mut events = ledger.subscribe();
        let alice = wallet(1);

        for n in 1..=3u8 {
            ledger
                .submit(signed(&ledger, &alice, root(n), &format!("{n}.txt")).await)
                .await
                .unwrap();
        }

        for n in 1..=3u8 {
            let event = events.recv().await.unwrap();
            assert_eq!(event.root_hash, root(n));
            assert_eq!(event.submitter, alice.address());
            assert_eq!(event.block, n as u64);
        }

        assert_eq!(
            ledger.get_by_owner(&alice.address()).await.unwrap(),
            vec![root(1), root(2), root(3)]
        );
        let docs = documents(&ledger, &alice.address()).await.unwrap();
        let names: Vec<_> = docs.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["3.txt", "2.txt", "1.txt"]);
    }

    /// Book whose block-time query fails until `healthy` is set.
    #[derive(Default)]
    struct FlakyBook {
        inner: MemoryBook,
        healthy: Arc<AtomicBool>,
    }

    impl LedgerBook for FlakyBook {
        fn insert(&mut self, record: NotarizationRecord) -> BookResult<()> {
            self.inner.insert(record)
        }

        fn get(&self, root_hash: &RootHash) -> BookResult<Option<NotarizationRecord>> {
            self.inner.get(root_hash)
        }

        fn by_owner(&self, owner: &Address) -> BookResult<Vec<RootHash>> {
            self.inner.by_owner(owner)
        }

        fn count(&self) -> BookResult<u64> {
            self.inner.count()
        }

        fn latest_timestamp(&self) -> BookResult<u64> {
            if self.healthy.load(Ordering::SeqCst) {
                self.inner.latest_timestamp()
            } else {
                Err(BookError::Backend("database is locked".into()))
            }
        }
    }

    #[tokio::test]
    async fn accepted_call_survives_failed_block() {
        let book = FlakyBook::default();
        let healthy = book.healthy.clone();
        let ledger = LocalLedger::new(book, CHAIN, contract()).with_clock(|| 1_704_067_200);
        let alice = wallet(1);

        let tx = ledger
            .submit(signed(&ledger, &alice, root(1), "a.txt").await)
            .await
            .unwrap();
        assert_eq!(ledger.pending_count(), 1);
        assert_eq!(ledger.nonce(&alice.address()).await.unwrap(), 1);
        assert!(ledger.receipt(&tx).await.unwrap().is_none());

        healthy.store(true, Ordering::SeqCst);
        let receipts = ledger.mine().unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].tx, tx);
        assert!(ledger.receipt(&tx).await.unwrap().unwrap().is_success());
        assert_eq!(ledger.pending_count(), 0);
    }
}
