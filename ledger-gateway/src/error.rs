//! Error types for the ledger gateway

use thiserror::Error;

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Gateway errors
///
/// Every variant is absorbable: nothing here ever becomes the
/// user-visible error of a marketplace operation.
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger unreachable or refused the request
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// Operation timed out waiting on the chain
    #[error("Timeout after {seconds}s: {operation}")]
    Timeout {
        /// Timeout duration
        seconds: u64,
        /// Operation
        operation: String,
    },

    /// Transaction hash unknown to the chain
    #[error("Transaction not found: {0}")]
    TxNotFound(String),

    /// Contract-level failure (revert, bad method, bad ABI)
    #[error("Contract error: {0}")]
    Contract(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
