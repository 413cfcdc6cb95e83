//! Error types for the record store

use crate::types::RequestStatus;
use thiserror::Error;
use uuid::Uuid;

/// Result type for record store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Record store errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Land not found
    #[error("Land not found: {0}")]
    LandNotFound(Uuid),

    /// User not found
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Purchase request not found on the land
    #[error("Purchase request not found: {0}")]
    RequestNotFound(Uuid),

    /// Notification not found on the user
    #[error("Notification not found: {0}")]
    NotificationNotFound(Uuid),

    /// Email already registered to another user
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// Wallet reference already bound to another user
    #[error("Wallet reference already registered: {0}")]
    DuplicateWallet(String),

    /// Buyer already has a pending request on this land
    #[error("Buyer {buyer} already has a pending purchase request on land {land}")]
    DuplicatePending {
        /// Land ID
        land: Uuid,
        /// Buyer ID
        buyer: Uuid,
    },

    /// Land is not listed for sale
    #[error("Land is not for sale: {0}")]
    LandNotForSale(Uuid),

    /// Conditional status update failed: the guard did not hold
    #[error("Status conflict: expected {expected}, found {actual}")]
    StatusConflict {
        /// Status the caller expected
        expected: RequestStatus,
        /// Status actually stored
        actual: RequestStatus,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
