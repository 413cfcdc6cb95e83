//! JSON-RPC ledger client
//!
//! Talks to a chain node that fronts the land registry contract. Request
//! shaping is plain JSON-RPC 2.0; the contract address and signer key
//! ride along as parameters so the node-side signer can submit on our
//! behalf.

use crate::{client::LedgerClient, metrics::LEDGER_RPC_DURATION, types::*, Config, Error, Result};
use async_trait::async_trait;
use record_store::{LedgerId, WalletRef};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// JSON-RPC client for the land registry contract
pub struct RpcClient {
    endpoint: String,
    contract_address: String,
    signer_key: Option<String>,
    timeout_seconds: u64,
    client: Client,
    next_id: AtomicU64,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoint", &self.endpoint)
            .field("contract_address", &self.contract_address)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcClient {
    /// Create new RPC client from gateway configuration
    ///
    /// Fails with `Config` when the endpoint or contract address is
    /// missing; use [`crate::LedgerGateway::from_config`] to fall back
    /// to a disabled gateway instead.
    pub fn new(config: &Config) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| Error::Config("ledger endpoint not set".to_string()))?;
        let contract_address = config
            .contract_address
            .clone()
            .ok_or_else(|| Error::Config("contract address not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            endpoint,
            contract_address,
            signer_key: config.signer_key.clone(),
            timeout_seconds: config.request_timeout_seconds,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// One JSON-RPC round trip; waits for node-side confirmation
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        debug!(method, id, "Ledger RPC call");

        let timer = LEDGER_RPC_DURATION
            .with_label_values(&[method])
            .start_timer();
        let result = self.client.post(&self.endpoint).json(&body).send().await;
        timer.observe_duration();

        let response = result.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    seconds: self.timeout_seconds,
                    operation: method.to_string(),
                }
            } else {
                Error::Unavailable(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(Error::Unavailable(format!(
                "node returned HTTP {}",
                response.status()
            )));
        }

        let rpc: RpcResponse = response.json().await?;

        if let Some(err) = rpc.error {
            return Err(Error::Contract(format!("{} ({})", err.message, err.code)));
        }

        rpc.result
            .ok_or_else(|| Error::Contract("empty result".to_string()))
    }

    fn write_params(&self, call_args: Value) -> Value {
        json!({
            "contract": self.contract_address,
            "signer": self.signer_key,
            "args": call_args,
        })
    }
}

#[async_trait]
impl LedgerClient for RpcClient {
    async fn submit_registration(&self, fields: &RegistrationFields) -> Result<LedgerId> {
        let result = self
            .call(
                "registry_registerLand",
                self.write_params(json!({
                    "location": fields.location,
                    "size": fields.size,
                    "price": fields.price,
                    "documentFingerprint": fields.document_fingerprint,
                })),
            )
            .await?;

        let id = result
            .get("landId")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::Contract("registration returned no landId".to_string()))?;

        Ok(LedgerId(id))
    }

    async fn submit_approval(&self, ledger_id: LedgerId, wallet: &WalletRef) -> Result<()> {
        self.call(
            "registry_approveRequest",
            self.write_params(json!({
                "landId": ledger_id.0,
                "buyer": wallet.as_str(),
            })),
        )
        .await?;
        Ok(())
    }

    async fn submit_rejection(&self, ledger_id: LedgerId, wallet: &WalletRef) -> Result<()> {
        self.call(
            "registry_rejectRequest",
            self.write_params(json!({
                "landId": ledger_id.0,
                "buyer": wallet.as_str(),
            })),
        )
        .await?;
        Ok(())
    }

    async fn submit_transfer(&self, ledger_id: LedgerId, wallet: &WalletRef) -> Result<()> {
        self.call(
            "registry_transferLand",
            self.write_params(json!({
                "landId": ledger_id.0,
                "newOwner": wallet.as_str(),
            })),
        )
        .await?;
        Ok(())
    }

    async fn read_verification(&self, ledger_id: LedgerId) -> Result<bool> {
        let result = self
            .call(
                "registry_getLand",
                json!({
                    "contract": self.contract_address,
                    "landId": ledger_id.0,
                }),
            )
            .await?;

        result
            .get("isVerified")
            .and_then(Value::as_bool)
            .ok_or_else(|| Error::Contract("land details missing isVerified".to_string()))
    }

    async fn read_transaction(&self, tx_hash: &str) -> Result<TxReceipt> {
        let result = self
            .call("chain_getTransactionReceipt", json!({ "hash": tx_hash }))
            .await?;

        if result.is_null() {
            return Err(Error::TxNotFound(tx_hash.to_string()));
        }

        let receipt: TxReceipt = serde_json::from_value(result)?;
        Ok(receipt)
    }

    async fn health_check(&self) -> Result<()> {
        self.call("chain_health", json!({})).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "json-rpc"
    }
}
