//! Configuration for the ledger gateway

use serde::{Deserialize, Serialize};

/// Gateway configuration
///
/// A missing endpoint or contract address means the gateway runs
/// disabled: every mirror call short-circuits to absorbed. This is
/// resolved once at startup, not re-checked in business logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON-RPC endpoint of the chain node
    pub endpoint: Option<String>,

    /// Address of the land registry contract
    pub contract_address: Option<String>,

    /// Reference to the submitting signer key
    pub signer_key: Option<String>,

    /// Per-request timeout (seconds); the gateway resolves to
    /// `Unavailable`/`Timeout` rather than hang on confirmation
    pub request_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            contract_address: None,
            signer_key: None,
            request_timeout_seconds: 30,
        }
    }
}

impl Config {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(endpoint) = std::env::var("LEDGER_RPC_URL") {
            config.endpoint = Some(endpoint);
        }
        if let Ok(address) = std::env::var("LEDGER_CONTRACT_ADDRESS") {
            config.contract_address = Some(address);
        }
        if let Ok(key) = std::env::var("LEDGER_SIGNER_KEY") {
            config.signer_key = Some(key);
        }

        config
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// True when both the endpoint and the contract are configured
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.contract_address.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disabled() {
        let config = Config::default();
        assert!(!config.is_configured());
        assert_eq!(config.request_timeout_seconds, 30);
    }

    #[test]
    fn test_configured_requires_both() {
        let mut config = Config::default();
        config.endpoint = Some("http://localhost:8545".to_string());
        assert!(!config.is_configured());

        config.contract_address = Some("0xdeadbeef".to_string());
        assert!(config.is_configured());
    }
}
