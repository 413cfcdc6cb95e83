//! Configuration for the marketplace

use serde::{Deserialize, Serialize};

/// Marketplace configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Record store configuration
    pub store: record_store::Config,

    /// Ledger gateway configuration
    pub ledger: ledger_gateway::Config,
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::Store(record_store::Error::Config(format!(
                "Failed to read config: {}",
                e
            )))
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            crate::Error::Store(record_store::Error::Config(format!(
                "Failed to parse config: {}",
                e
            )))
        })?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        Ok(Self {
            store: record_store::Config::from_env()?,
            ledger: ledger_gateway::Config::from_env(),
        })
    }
}
