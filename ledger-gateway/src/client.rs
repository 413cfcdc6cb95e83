//! Ledger client interface

use crate::{types::*, Result};
use async_trait::async_trait;
use record_store::{LedgerId, WalletRef};

/// Ledger client trait
///
/// All operations may block on network confirmation and are always
/// fallible. Implementations enforce their own timeouts and resolve to
/// an error rather than hang indefinitely.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit a registration transaction; returns the ledger-assigned ID
    async fn submit_registration(&self, fields: &RegistrationFields) -> Result<LedgerId>;

    /// Mirror a purchase approval for a buyer wallet
    async fn submit_approval(&self, ledger_id: LedgerId, wallet: &WalletRef) -> Result<()>;

    /// Mirror a purchase rejection (releases any on-chain reservation)
    async fn submit_rejection(&self, ledger_id: LedgerId, wallet: &WalletRef) -> Result<()>;

    /// Mirror an ownership transfer to a buyer wallet
    async fn submit_transfer(&self, ledger_id: LedgerId, wallet: &WalletRef) -> Result<()>;

    /// Read the current verification flag for a parcel
    async fn read_verification(&self, ledger_id: LedgerId) -> Result<bool>;

    /// Look up a transaction receipt by hash
    async fn read_transaction(&self, tx_hash: &str) -> Result<TxReceipt>;

    /// Health check
    async fn health_check(&self) -> Result<()>;

    /// Get client name (for logs and metrics)
    fn name(&self) -> &str;
}
