//! `monero-wallet-rpc` JSON-RPC client.
//!
//! # Responsibilities
//! - Open the configured wallet file at startup
//! - Refresh the wallet and check transaction proofs
//! - Query chain height and the receiving address
//! - Bound every call with a timeout

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::TxReference;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, Network, VerificationResult, WalletConfig,
};
use crate::blockchain::verifier::PaymentVerifier;

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResult {
    #[serde(default)]
    blocks_fetched: u64,
    #[serde(default)]
    received_money: bool,
}

#[derive(Debug, Deserialize)]
struct CheckTxProofResult {
    good: bool,
    #[serde(default)]
    received: u64,
    #[serde(default)]
    in_pool: bool,
    #[serde(default)]
    confirmations: u64,
}

#[derive(Debug, Deserialize)]
struct HeightResult {
    height: u64,
}

#[derive(Debug, Deserialize)]
struct AddressResult {
    address: String,
}

#[derive(Debug, Deserialize)]
struct Empty {}

/// Wallet RPC client used as the proxy's payment verifier.
#[derive(Clone)]
pub struct WalletRpcClient {
    http: reqwest::Client,
    endpoint: url::Url,
    config: WalletConfig,
}

impl WalletRpcClient {
    /// Create a new client for the configured endpoint.
    ///
    /// No request is made; use [`WalletRpcClient::open_wallet`] and
    /// [`WalletRpcClient::verify_network`] during startup.
    pub fn new(config: WalletConfig) -> BlockchainResult<Self> {
        let endpoint: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid wallet RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.rpc_timeout_secs))
            .build()
            .map_err(|e| BlockchainError::Rpc(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    async fn call<P, R>(&self, method: &str, params: P) -> BlockchainResult<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned + Send,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: "0",
            method,
            params,
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BlockchainError::Timeout(self.config.rpc_timeout_secs)
                } else {
                    BlockchainError::Rpc(format!("{} failed: {}", method, e))
                }
            })?
            .error_for_status()
            .map_err(|e| BlockchainError::Rpc(format!("{} failed: {}", method, e)))?;

        let body: RpcResponse<R> = response
            .json()
            .await
            .map_err(|e| BlockchainError::Rpc(format!("{} returned invalid JSON: {}", method, e)))?;

        match (body.result, body.error) {
            (_, Some(err)) => Err(BlockchainError::Remote {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(BlockchainError::Rpc(format!("{} returned no result", method))),
        }
    }

    /// Open the configured wallet file, if any.
    ///
    /// The password is read from the environment variable named in the
    /// configuration; an unset variable means an empty password.
    pub async fn open_wallet(&self) -> BlockchainResult<()> {
        let Some(filename) = self.config.wallet_file.as_deref() else {
            return Ok(());
        };
        let password = std::env::var(&self.config.password_env).unwrap_or_default();
        let _: Empty = self
            .call("open_wallet", json!({ "filename": filename, "password": password }))
            .await
            .map_err(|e| BlockchainError::Wallet(format!("cannot open '{}': {}", filename, e)))?;
        tracing::info!(wallet = %filename, "Wallet opened");
        Ok(())
    }

    /// Verify the wallet's address belongs to the configured network.
    pub async fn verify_network(&self) -> BlockchainResult<String> {
        let AddressResult { address } = self.call("get_address", json!({ "account_index": 0 })).await?;
        let expected: Network = self.config.network;
        if !expected.matches_address(&address) {
            return Err(BlockchainError::NetworkMismatch { expected, address });
        }
        Ok(address)
    }
}

#[async_trait]
impl PaymentVerifier for WalletRpcClient {
    async fn refresh(&mut self) -> BlockchainResult<()> {
        let result: RefreshResult = self.call("refresh", json!({})).await?;
        tracing::debug!(
            blocks_fetched = result.blocks_fetched,
            received_money = result.received_money,
            "Wallet refreshed"
        );
        Ok(())
    }

    async fn verify_proof(
        &mut self,
        tx: &TxReference,
        address: &str,
        signature: &str,
    ) -> BlockchainResult<VerificationResult> {
        let result: CheckTxProofResult = self
            .call(
                "check_tx_proof",
                json!({
                    "txid": tx.to_string(),
                    "address": address,
                    "message": "",
                    "signature": signature,
                }),
            )
            .await?;

        Ok(VerificationResult {
            amount_received: result.received,
            confirmations: result.confirmations,
            in_mempool: result.in_pool,
            proof_valid: result.good,
        })
    }

    async fn current_height(&mut self) -> BlockchainResult<u64> {
        let HeightResult { height } = self.call("get_height", json!({})).await?;
        Ok(height)
    }

    async fn address(&mut self) -> BlockchainResult<String> {
        let AddressResult { address } = self.call("get_address", json!({ "account_index": 0 })).await?;
        Ok(address)
    }
}

impl std::fmt::Debug for WalletRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRpcClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("network", &self.config.network)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
