//! Gateway handle and mirror absorption
//!
//! [`LedgerGateway`] is the only way the registry and workflow reach the
//! chain. It is constructed once at startup as either configured or
//! disabled, and every operation funnels through [`LedgerGateway::mirror`],
//! which turns any client error into an absorbed outcome: logged, counted,
//! and invisible to the primary operation.

use crate::{
    client::LedgerClient, metrics::LEDGER_MIRROR_TOTAL, rpc::RpcClient, types::*, Config, Result,
};
use record_store::{LedgerId, WalletRef};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a best-effort mirror attempt
#[derive(Debug)]
pub enum MirrorOutcome<T> {
    /// The ledger confirmed the operation
    Mirrored(T),
    /// The attempt failed or the gateway is disabled; already logged
    Absorbed,
}

impl<T> MirrorOutcome<T> {
    /// Get the mirrored value, if any
    pub fn mirrored(self) -> Option<T> {
        match self {
            MirrorOutcome::Mirrored(value) => Some(value),
            MirrorOutcome::Absorbed => None,
        }
    }

    /// True when the attempt was absorbed
    pub fn is_absorbed(&self) -> bool {
        matches!(self, MirrorOutcome::Absorbed)
    }
}

/// Gateway to the external ledger
#[derive(Clone)]
pub struct LedgerGateway {
    inner: Inner,
}

#[derive(Clone)]
enum Inner {
    Configured(Arc<dyn LedgerClient>),
    Disabled,
}

impl std::fmt::Debug for LedgerGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.inner {
            Inner::Configured(client) => client.name(),
            Inner::Disabled => "disabled",
        };
        f.debug_struct("LedgerGateway").field("state", &state).finish()
    }
}

impl LedgerGateway {
    /// Build from configuration, resolving configured-vs-disabled once
    pub fn from_config(config: &Config) -> Result<Self> {
        if !config.is_configured() {
            info!("Ledger endpoint or contract not configured; gateway disabled");
            return Ok(Self::disabled());
        }

        let client = RpcClient::new(config)?;
        info!(endpoint = ?config.endpoint, "Ledger gateway configured");
        Ok(Self::with_client(Arc::new(client)))
    }

    /// Wrap an explicit client (used by tests and alternative transports)
    pub fn with_client(client: Arc<dyn LedgerClient>) -> Self {
        Self {
            inner: Inner::Configured(client),
        }
    }

    /// A gateway that absorbs everything
    pub fn disabled() -> Self {
        Self {
            inner: Inner::Disabled,
        }
    }

    /// True when a client is configured
    pub fn is_enabled(&self) -> bool {
        matches!(self.inner, Inner::Configured(_))
    }

    /// Mirror a land registration; absorbed yields no ledger ID
    pub async fn register(&self, fields: &RegistrationFields) -> MirrorOutcome<LedgerId> {
        match &self.inner {
            Inner::Disabled => Self::skip("register_land"),
            Inner::Configured(client) => {
                Self::mirror("register_land", client.submit_registration(fields)).await
            }
        }
    }

    /// Mirror a purchase approval
    pub async fn approve(&self, ledger_id: LedgerId, wallet: &WalletRef) -> MirrorOutcome<()> {
        match &self.inner {
            Inner::Disabled => Self::skip("approve_request"),
            Inner::Configured(client) => {
                Self::mirror("approve_request", client.submit_approval(ledger_id, wallet)).await
            }
        }
    }

    /// Mirror a purchase rejection (releases any on-chain reservation)
    pub async fn reject(&self, ledger_id: LedgerId, wallet: &WalletRef) -> MirrorOutcome<()> {
        match &self.inner {
            Inner::Disabled => Self::skip("reject_request"),
            Inner::Configured(client) => {
                Self::mirror("reject_request", client.submit_rejection(ledger_id, wallet)).await
            }
        }
    }

    /// Mirror an ownership transfer
    pub async fn transfer(&self, ledger_id: LedgerId, wallet: &WalletRef) -> MirrorOutcome<()> {
        match &self.inner {
            Inner::Disabled => Self::skip("transfer_land"),
            Inner::Configured(client) => {
                Self::mirror("transfer_land", client.submit_transfer(ledger_id, wallet)).await
            }
        }
    }

    /// Read the ledger-side verification flag for reconciliation
    pub async fn read_verification(&self, ledger_id: LedgerId) -> MirrorOutcome<bool> {
        match &self.inner {
            Inner::Disabled => Self::skip("read_verification"),
            Inner::Configured(client) => {
                Self::mirror("read_verification", client.read_verification(ledger_id)).await
            }
        }
    }

    /// Look up a payment proof on the chain
    pub async fn verify_payment(&self, tx_hash: &str) -> MirrorOutcome<TxReceipt> {
        match &self.inner {
            Inner::Disabled => Self::skip("verify_payment"),
            Inner::Configured(client) => {
                Self::mirror("verify_payment", client.read_transaction(tx_hash)).await
            }
        }
    }

    /// The single absorption point for ledger failures
    async fn mirror<T>(
        operation: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> MirrorOutcome<T> {
        match fut.await {
            Ok(value) => {
                LEDGER_MIRROR_TOTAL
                    .with_label_values(&[operation, "mirrored"])
                    .inc();
                debug!(operation, "Ledger mirror confirmed");
                MirrorOutcome::Mirrored(value)
            }
            Err(e) => {
                LEDGER_MIRROR_TOTAL
                    .with_label_values(&[operation, "absorbed"])
                    .inc();
                warn!(operation, error = %e, "Ledger mirror failed; continuing without it");
                MirrorOutcome::Absorbed
            }
        }
    }

    fn skip<T>(operation: &'static str) -> MirrorOutcome<T> {
        LEDGER_MIRROR_TOTAL
            .with_label_values(&[operation, "absorbed"])
            .inc();
        debug!(operation, "Gateway disabled; mirror skipped");
        MirrorOutcome::Absorbed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    /// Client whose failures are scriptable per test
    struct FlakyClient {
        fail: AtomicBool,
        calls: AtomicU32,
    }

    impl FlakyClient {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail: AtomicBool::new(fail),
                calls: AtomicU32::new(0),
            })
        }

        fn check(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(Error::Unavailable("injected failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl LedgerClient for FlakyClient {
        async fn submit_registration(&self, _fields: &RegistrationFields) -> Result<LedgerId> {
            self.check()?;
            Ok(LedgerId(42))
        }

        async fn submit_approval(&self, _id: LedgerId, _wallet: &WalletRef) -> Result<()> {
            self.check()
        }

        async fn submit_rejection(&self, _id: LedgerId, _wallet: &WalletRef) -> Result<()> {
            self.check()
        }

        async fn submit_transfer(&self, _id: LedgerId, _wallet: &WalletRef) -> Result<()> {
            self.check()
        }

        async fn read_verification(&self, _id: LedgerId) -> Result<bool> {
            self.check()?;
            Ok(true)
        }

        async fn read_transaction(&self, tx_hash: &str) -> Result<TxReceipt> {
            self.check()?;
            Ok(TxReceipt {
                tx_hash: tx_hash.to_string(),
                block_number: 1,
                success: true,
            })
        }

        async fn health_check(&self) -> Result<()> {
            self.check()
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn fields() -> RegistrationFields {
        RegistrationFields {
            location: "Greenwich".to_string(),
            size: rust_decimal::Decimal::from(500),
            price: rust_decimal::Decimal::from(1250),
            document_fingerprint: "00".repeat(32),
        }
    }

    #[tokio::test]
    async fn test_register_mirrored() {
        let gateway = LedgerGateway::with_client(FlakyClient::new(false));

        let outcome = gateway.register(&fields()).await;
        assert_eq!(outcome.mirrored(), Some(LedgerId(42)));
    }

    #[tokio::test]
    async fn test_failures_are_absorbed() {
        let client = FlakyClient::new(true);
        let gateway = LedgerGateway::with_client(client.clone());
        let wallet = WalletRef::new("0xbuyer");

        assert!(gateway.register(&fields()).await.is_absorbed());
        assert!(gateway.approve(LedgerId(1), &wallet).await.is_absorbed());
        assert!(gateway.reject(LedgerId(1), &wallet).await.is_absorbed());
        assert!(gateway.transfer(LedgerId(1), &wallet).await.is_absorbed());
        assert!(gateway.read_verification(LedgerId(1)).await.is_absorbed());
        assert!(gateway.verify_payment("0xhash").await.is_absorbed());
        assert_eq!(client.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_disabled_short_circuits() {
        let gateway = LedgerGateway::disabled();
        assert!(!gateway.is_enabled());

        // No client behind it, yet every call resolves immediately
        assert!(gateway.register(&fields()).await.is_absorbed());
        assert!(gateway
            .read_verification(LedgerId(9))
            .await
            .is_absorbed());
    }

    #[tokio::test]
    async fn test_from_config_unconfigured_is_disabled() {
        let gateway = LedgerGateway::from_config(&Config::default()).unwrap();
        assert!(!gateway.is_enabled());
    }
}
