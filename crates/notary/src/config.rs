//! Notary configuration
//!
//! Defaults describe the 0G Galileo testnet deployment. A JSON file can
//! replace any subset of fields, and `NOTARY_*` environment variables are
//! applied on top:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `NOTARY_RPC_URL` | `chain.rpc_url` |
//! | `NOTARY_CHAIN_ID` | `chain.chain_id` |
//! | `NOTARY_EXPLORER_URL` | `chain.explorer_url` |
//! | `NOTARY_CONTRACT_ADDRESS` | `contract_address` |
//! | `NOTARY_PRIVATE_KEY` | `private_key` |
//! | `NOTARY_DATA_DIR` | `data_dir` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use notary_core::Address;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::{Error, Result};

/// The chain the wallet and ledger talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 16602,
            name: "0G Galileo Testnet".to_string(),
            rpc_url: "https://evmrpc-testnet.0g.ai".to_string(),
            explorer_url: "https://chainscan-galileo.0g.ai".to_string(),
        }
    }
}

/// Bounds on every collaborator call. Nothing is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// One content store upload or download
    #[serde(with = "millis")]
    pub storage: Duration,
    /// One ledger read or submission
    #[serde(with = "millis")]
    pub ledger: Duration,
    /// Waiting for the wallet to sign
    #[serde(with = "millis")]
    pub signature: Duration,
    /// Waiting for a submitted transaction to be included
    #[serde(with = "millis")]
    pub finality: Duration,
    /// Delay between receipt polls while waiting for finality
    #[serde(with = "millis")]
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            storage: Duration::from_secs(120),
            ledger: Duration::from_secs(30),
            signature: Duration::from_secs(300),
            finality: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotaryConfig {
    pub chain: ChainConfig,
    /// Deployed notary contract; `None` until deployed
    pub contract_address: Option<Address>,
    /// Hex private key for the local wallet
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
    /// Directory for the local content store and ledger database
    pub data_dir: PathBuf,
    pub timeouts: Timeouts,
}

impl Default for NotaryConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            contract_address: None,
            private_key: None,
            data_dir: PathBuf::from(".notary"),
            timeouts: Timeouts::default(),
        }
    }
}

impl NotaryConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Apply `NOTARY_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source. Empty values are ignored.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("NOTARY_RPC_URL") {
            self.chain.rpc_url = url;
        }
        if let Some(id) = get("NOTARY_CHAIN_ID") {
            self.chain.chain_id = id
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("NOTARY_CHAIN_ID {:?}: {}", id, e)))?;
        }
        if let Some(url) = get("NOTARY_EXPLORER_URL") {
            self.chain.explorer_url = url;
        }
        if let Some(addr) = get("NOTARY_CONTRACT_ADDRESS") {
            self.contract_address = Some(
                addr.parse()
                    .map_err(|e| Error::Config(format!("NOTARY_CONTRACT_ADDRESS: {}", e)))?,
            );
        }
        if let Some(key) = get("NOTARY_PRIVATE_KEY") {
            self.private_key = Some(key);
        }
        if let Some(dir) = get("NOTARY_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Configured contract, or the fixed address used by a local ledger.
    pub fn contract(&self) -> Address {
        self.contract_address.unwrap_or_else(local_contract_address)
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger.db")
    }
}

/// Deterministic contract address for ledgers that were never deployed.
pub fn local_contract_address() -> Address {
    let hash = Keccak256::digest(b"notary.local.contract");
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address::from_bytes(out)
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_describe_galileo() {
        let config = NotaryConfig::default();
        assert_eq!(config.chain.chain_id, 16602);
        assert_eq!(config.chain.rpc_url, "https://evmrpc-testnet.0g.ai");
        assert!(config.contract_address.is_none());
        assert_eq!(config.contract(), local_contract_address());
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("NOTARY_CHAIN_ID", "31337"),
            ("NOTARY_RPC_URL", "http://localhost:8545"),
            ("NOTARY_CONTRACT_ADDRESS", "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
            ("NOTARY_DATA_DIR", "/tmp/notary"),
            ("NOTARY_PRIVATE_KEY", ""),
        ]
        .into_iter()
        .collect();

        let mut config = NotaryConfig::default();
        config
            .apply_vars(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.chain.chain_id, 31337);
        assert_eq!(config.chain.rpc_url, "http://localhost:8545");
        assert_eq!(
            config.contract().to_string(),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
        assert_eq!(config.ledger_path(), PathBuf::from("/tmp/notary/ledger.db"));
        assert!(config.private_key.is_none());
    }

    #[test]
    fn bad_env_value_is_config_error() {
        let mut config = NotaryConfig::default();
        let result = config.apply_vars(|k| (k == "NOTARY_CHAIN_ID").then(|| "galileo".to_string()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn json_partial_config() {
        let config: NotaryConfig = serde_json::from_str(
            r#"{"chain":{"chain_id":1},"timeouts":{"finality":500}}"#,
        )
        .unwrap();
        assert_eq!(config.chain.chain_id, 1);
        assert_eq!(config.chain.name, "0G Galileo Testnet");
        assert_eq!(config.timeouts.finality, Duration::from_millis(500));
        assert_eq!(config.timeouts.ledger, Duration::from_secs(30));
    }

    #[test]
    fn private_key_is_never_serialized() {
        let config = NotaryConfig {
            private_key: Some("11".repeat(32)),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("private_key"));
    }
}
