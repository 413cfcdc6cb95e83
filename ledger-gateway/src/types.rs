//! Wire types exchanged with the ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fields mirrored on registration of a land parcel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationFields {
    /// Location string
    pub location: String,

    /// Parcel size
    pub size: Decimal,

    /// Asking price in value units
    pub price: Decimal,

    /// Fixed-length fingerprint of the document content (hex SHA-256)
    pub document_fingerprint: String,
}

/// Receipt for a confirmed chain transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: String,

    /// Block the transaction was included in
    pub block_number: u64,

    /// Whether the transaction succeeded on-chain
    pub success: bool,
}
