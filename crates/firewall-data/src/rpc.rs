//! JSON-RPC client for the chain reads the firewall needs.
//!
//! Covers contract-code presence (`eth_getCode`), gas price and pending nonce
//! lookups for filling in transaction fields, and an `eth_call` based
//! simulator that predicts reverts.

use alloy::hex;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use eyre::{eyre, Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::oracle::{ChainOracle, SimulationOutcome, Simulator};
use crate::types::Transaction;

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// Error returned by a node for a call that reached execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeError {
    pub code: i64,
    pub message: String,
}

impl NodeError {
    /// True when the node reports that execution reverted.
    pub fn is_revert(&self) -> bool {
        self.code == 3 || self.message.to_lowercase().contains("execution reverted")
    }
}

/// Thin JSON-RPC client over HTTP.
#[derive(Clone, Debug)]
pub struct RpcClient {
    client: Client,
    rpc_url: String,
}

impl RpcClient {
    /// Creates a client for `rpc_url`. No request is made until the first call.
    ///
    /// # Errors
    /// Returns error if `rpc_url` is not a valid URL.
    pub fn new(rpc_url: &str) -> Result<Self> {
        reqwest::Url::parse(rpc_url).wrap_err("invalid RPC URL format")?;
        Ok(Self {
            client: Client::new(),
            rpc_url: rpc_url.to_string(),
        })
    }

    /// Sends one request and returns either the string result or the node's
    /// error object. Transport and decoding failures are `Err`.
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<std::result::Result<String, NodeError>> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| eyre!("{} request failed: {}", method, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("{} HTTP status: {}", method, status));
        }

        let rpc: RpcResponse<String> = response
            .json()
            .await
            .map_err(|e| eyre!("failed to decode {} response: {}", method, e))?;

        if let Some(error) = rpc.error {
            return Ok(Err(NodeError {
                code: error.code,
                message: error.message,
            }));
        }

        rpc.result
            .map(Ok)
            .ok_or_else(|| eyre!("{} missing result", method))
    }

    /// Like [`Self::request`] but treats node errors as failures.
    async fn hex_result(&self, method: &str, params: serde_json::Value) -> Result<String> {
        self.request(method, params).await?.map_err(|error| {
            eyre!("{} RPC error {}: {}", method, error.code, error.message)
        })
    }

    /// Deployed code at `address` on the latest block (`0x` for EOAs).
    #[tracing::instrument(skip(self))]
    pub async fn get_code(&self, address: Address) -> Result<String> {
        let params = serde_json::json!([format!("{address:#x}"), "latest"]);
        self.hex_result("eth_getCode", params).await
    }

    /// Current gas price in wei.
    #[tracing::instrument(skip(self))]
    pub async fn gas_price(&self) -> Result<U256> {
        let raw = self
            .hex_result("eth_gasPrice", serde_json::json!([]))
            .await?;
        parse_quantity(&raw).wrap_err("failed to parse eth_gasPrice result")
    }

    /// Transaction count of `address` including pending transactions.
    #[tracing::instrument(skip(self))]
    pub async fn pending_nonce(&self, address: Address) -> Result<u64> {
        let params = serde_json::json!([format!("{address:#x}"), "pending"]);
        let raw = self.hex_result("eth_getTransactionCount", params).await?;
        let nonce = parse_quantity(&raw).wrap_err("failed to parse transaction count")?;
        u64::try_from(nonce).map_err(|_| eyre!("transaction count {} exceeds u64", nonce))
    }

    /// Executes `tx` with `eth_call` from `from` against the latest block.
    ///
    /// The inner result is the node's error when the call did not succeed.
    #[tracing::instrument(skip(self, tx), fields(to = %tx.to))]
    pub async fn call(
        &self,
        from: Address,
        tx: &Transaction,
    ) -> Result<std::result::Result<String, NodeError>> {
        let params = serde_json::json!([
            {
                "from": format!("{from:#x}"),
                "to": format!("{:#x}", tx.to),
                "value": format!("0x{:x}", tx.value),
                "gas": format!("0x{:x}", tx.gas_limit),
                "gasPrice": format!("0x{:x}", tx.gas_price),
                "data": format!("0x{}", hex::encode(&tx.data)),
            },
            "latest"
        ]);
        self.request("eth_call", params).await
    }
}

#[async_trait]
impl ChainOracle for RpcClient {
    async fn is_contract(&self, address: Address) -> Result<bool> {
        let code = self.get_code(address).await?;
        Ok(has_code(&code))
    }
}

/// Simulates transactions with `eth_call` and flags predicted reverts.
///
/// A reverting transaction still costs its gas fee, which is the loss reported.
#[derive(Clone, Debug)]
pub struct CallSimulator {
    rpc: RpcClient,
}

impl CallSimulator {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl Simulator for CallSimulator {
    async fn simulate(&self, tx: &Transaction) -> Result<Option<SimulationOutcome>> {
        let Some(from) = tx.from else {
            tracing::debug!("no sender address, skipping simulation");
            return Ok(None);
        };

        match self.rpc.call(from, tx).await? {
            Ok(_) => Ok(Some(SimulationOutcome {
                predicts_loss: false,
                loss_description: String::new(),
            })),
            Err(error) if error.is_revert() => Ok(Some(SimulationOutcome {
                predicts_loss: true,
                loss_description: format!(
                    "Simulation predicts the transaction will revert ({}); the gas fee would be spent with no effect",
                    error.message
                ),
            })),
            Err(error) => Err(eyre!(
                "eth_call RPC error {}: {}",
                error.code,
                error.message
            )),
        }
    }
}

/// True when an `eth_getCode` result holds any bytecode.
fn has_code(code_hex: &str) -> bool {
    let raw = code_hex.trim().trim_start_matches("0x");
    !raw.is_empty() && raw.chars().any(|c| c != '0')
}

/// Parses a hex `QUANTITY` (`0x`-prefixed) into a U256.
fn parse_quantity(value: &str) -> Result<U256> {
    let trimmed = value.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(hex, 16).map_err(|e| eyre!("invalid quantity {}: {}", value, e))
}
