//! Configuration for the teller core

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Transfer destination policy
///
/// Whether a transfer may leave the owning customer's set of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPolicy {
    /// Both legs must belong to the requesting customer (default)
    IntraOwner,
    /// The destination may belong to any customer
    CrossOwner,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        TransferPolicy::IntraOwner
    }
}

impl TransferPolicy {
    /// Parse from string (as used in `TELLER_TRANSFER_POLICY`)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intra_owner" => Some(TransferPolicy::IntraOwner),
            "cross_owner" => Some(TransferPolicy::CrossOwner),
            _ => None,
        }
    }
}

/// Teller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for the durable account store
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// First account number handed out by a fresh store
    pub starting_account_number: u32,

    /// Transfer destination policy
    pub transfer_policy: TransferPolicy,

    /// Actor configuration
    pub actor: ActorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/teller"),
            service_name: "teller-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            starting_account_number: 1000,
            transfer_policy: TransferPolicy::default(),
            actor: ActorConfig::default(),
        }
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Mailbox capacity (bounded channel, provides backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("TELLER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(policy) = std::env::var("TELLER_TRANSFER_POLICY") {
            config.transfer_policy = TransferPolicy::from_str(&policy).ok_or_else(|| {
                Error::Config(format!("Unknown transfer policy: {}", policy))
            })?;
        }

        if let Ok(start) = std::env::var("TELLER_STARTING_ACCOUNT_NUMBER") {
            config.starting_account_number = start.parse().map_err(|_| {
                Error::Config(format!("Invalid starting account number: {}", start))
            })?;
        }

        Ok(config)
    }
}
