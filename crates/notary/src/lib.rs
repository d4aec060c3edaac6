//! # Notary
//!
//! Off-chain storage plus on-chain attestation for documents:
//!
//! - **storage**: the `ContentStore` boundary and its in-memory and filesystem implementations
//! - **ledger**: the `Ledger` boundary and `LocalLedger`, an in-process chain over any `LedgerBook`
//! - **signer** / **wallet**: secp256k1 signing and the explicit wallet context
//! - **orchestrator**: the `Notarizer` state machine that stores first and attests second
//! - **config**, **error**, **tracing**: ambient configuration, error type and logging setup
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use notary::{NotaryConfig, LocalLedger, LocalWallet, MemoryContentStore, Notarizer, WalletContext};
//! use notary_core::MemoryBook;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> notary::Result<()> {
//! let config = NotaryConfig::default();
//! let store = Arc::new(MemoryContentStore::new());
//! let ledger = Arc::new(LocalLedger::new(MemoryBook::new(), config.chain.chain_id, config.contract()));
//!
//! let mut wallet = WalletContext::new(config.chain.clone());
//! wallet.connect(Arc::new(LocalWallet::from_hex(&"11".repeat(32))?));
//!
//! let mut notarizer = Notarizer::new(store, ledger, config.timeouts.clone());
//! let record = notarizer
//!     .notarize("a.txt", b"hello1234\n".to_vec(), "", &wallet, &CancellationToken::new())
//!     .await?;
//! println!("{}", record.root_hash);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod signer;
pub mod storage;
pub mod tracing;
pub mod wallet;

// Re-export commonly used items at crate root
pub use config::{ChainConfig, NotaryConfig, Timeouts};
pub use error::{Error, Result};
pub use ledger::{Ledger, LedgerError, LocalLedger, Receipt, ReceiptStatus, SignedCall};
pub use orchestrator::{Actions, Failure, Notarizer, Phase, Submission};
pub use signer::{LocalWallet, SignError, Signature, Signer};
pub use storage::{ContentStore, FsContentStore, MemoryContentStore, StorageError, StoredContent};
pub use wallet::WalletContext;
