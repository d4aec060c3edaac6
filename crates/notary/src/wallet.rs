//! Wallet context passed explicitly into every attestation.
//!
//! Holds the chain the wallet is pointed at and, once connected, the signer
//! for the active account. Nothing here is global: callers own the context
//! and hand it to the orchestrator.

use std::sync::Arc;

use notary_core::Address;
use tracing::info;

use crate::config::ChainConfig;
use crate::signer::Signer;

pub struct WalletContext {
    chain: ChainConfig,
    signer: Option<Arc<dyn Signer>>,
}

impl WalletContext {
    /// Disconnected context on `chain`.
    pub fn new(chain: ChainConfig) -> Self {
        Self {
            chain,
            signer: None,
        }
    }

    pub fn connect(&mut self, signer: Arc<dyn Signer>) {
        info!("wallet connected: {}", signer.address());
        self.signer = Some(signer);
    }

    pub fn disconnect(&mut self) {
        if let Some(signer) = self.signer.take() {
            info!("wallet disconnected: {}", signer.address());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.signer.is_some()
    }

    /// Active account, if connected.
    pub fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    pub fn signer(&self) -> Option<&Arc<dyn Signer>> {
        self.signer.as_ref()
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// Point the wallet at another chain. The account stays connected.
    pub fn switch_chain(&mut self, chain: ChainConfig) {
        info!("wallet switched to chain {} ({})", chain.chain_id, chain.name);
        self.chain = chain;
    }
}

impl std::fmt::Debug for WalletContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletContext")
            .field("chain_id", &self.chain.chain_id)
            .field("address", &self.address())
            .finish()
    }
}
