//! Ledger trait definitions

use async_trait::async_trait;
use notary_core::{Address, Lookup, NotarizationRecord, NotarizedEvent, RawRecord, RootHash, TxRef};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::ledger::error::LedgerResult;
use crate::ledger::types::{Receipt, SignedCall};

/// The notary contract as seen from a client.
///
/// Reads are safe to issue concurrently from many sessions.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Chain the contract is deployed on.
    fn chain_id(&self) -> u64;

    /// Contract address calls must be signed for.
    fn contract(&self) -> Address;

    /// Next nonce expected from `account`.
    async fn nonce(&self, account: &Address) -> LedgerResult<u64>;

    /// Submit a signed `notarize` call.
    ///
    /// Returns once the transaction is accepted into the pending pool; the
    /// record only exists after inclusion (see [`Ledger::receipt`]).
    async fn submit(&self, call: SignedCall) -> LedgerResult<TxRef>;

    /// Receipt for `tx`, or `None` while it is still pending.
    async fn receipt(&self, tx: &TxRef) -> LedgerResult<Option<Receipt>>;

    /// The `getRecord` tuple. Unregistered roots return [`RawRecord::zero`].
    async fn get_record(&self, root_hash: &RootHash) -> LedgerResult<RawRecord>;

    /// Roots registered by `owner`, in registration order.
    async fn get_by_owner(&self, owner: &Address) -> LedgerResult<Vec<RootHash>>;

    /// Number of registered roots.
    async fn total_count(&self) -> LedgerResult<u64>;

    /// Stream of `Notarized` events for records included from now on.
    fn subscribe(&self) -> broadcast::Receiver<NotarizedEvent>;
}

/// Read `root_hash` and interpret the all-zero sentinel.
pub async fn lookup<L: Ledger + ?Sized>(ledger: &L, root_hash: &RootHash) -> LedgerResult<Lookup> {
    let raw = ledger.get_record(root_hash).await?;
    Ok(Lookup::from_raw(root_hash.clone(), raw))
}

/// Full records registered by `owner`, most recent first.
pub async fn documents<L: Ledger + ?Sized>(
    ledger: &L,
    owner: &Address,
) -> LedgerResult<Vec<NotarizationRecord>> {
    let roots = ledger.get_by_owner(owner).await?;
    let mut records = Vec::with_capacity(roots.len());
    for root in roots.iter().rev() {
        if let Some(record) = lookup(ledger, root).await?.into_record() {
            records.push(record);
        }
    }
    Ok(records)
}

/// `Notarized` events as a stream.
///
/// A consumer that falls behind the channel capacity skips the missed
/// events; a warning records how many.
pub fn events<L: Ledger + ?Sized>(ledger: &L) -> impl Stream<Item = NotarizedEvent> {
    BroadcastStream::new(ledger.subscribe()).filter_map(|item| match item {
        Ok(event) => Some(event),
        Err(BroadcastStreamRecvError::Lagged(missed)) => {
            warn!("event stream lagged, {} events skipped", missed);
            None
        }
    })
}
