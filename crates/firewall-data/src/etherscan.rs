//! Etherscan source-verification lookups.
//!
//! Uses the V2 multichain `getsourcecode` endpoint. A contract counts as
//! verified when Etherscan returns non-empty `SourceCode` for it.

use alloy::primitives::Address;
use async_trait::async_trait;
use eyre::{eyre, Result};
use serde::Deserialize;

use crate::oracle::SourceVerifier;

/// Etherscan V2 API base URL.
pub const ETHERSCAN_V2_API: &str = "https://api.etherscan.io/v2/api";

/// Etherscan API response envelope.
#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: Option<String>,
    message: Option<String>,
    result: Option<serde_json::Value>,
}

/// Source-verification client backed by Etherscan.
#[derive(Clone, Debug)]
pub struct EtherscanVerifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    chain_id: u64,
}

impl EtherscanVerifier {
    pub fn new(api_key: impl Into<String>, chain_id: u64) -> Self {
        Self::with_base_url(ETHERSCAN_V2_API, api_key, chain_id)
    }

    /// Same as [`Self::new`] against a different API host.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        chain_id: u64,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            chain_id,
        }
    }

    fn source_code_url(&self, address: Address) -> String {
        format!(
            "{base}?chainid={chain}&module=contract&action=getsourcecode\
             &address={address:#x}&apikey={key}",
            base = self.base_url,
            chain = self.chain_id,
            key = self.api_key,
        )
    }
}

#[async_trait]
impl SourceVerifier for EtherscanVerifier {
    #[tracing::instrument(skip(self))]
    async fn is_verified_source(&self, address: Address) -> Result<bool> {
        let response = self
            .client
            .get(self.source_code_url(address))
            .send()
            .await
            .map_err(|e| eyre!("getsourcecode request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("getsourcecode HTTP status: {}", status));
        }

        let body: EtherscanResponse = response
            .json()
            .await
            .map_err(|e| eyre!("failed to decode getsourcecode response: {}", e))?;

        interpret_source_response(body)
    }
}

/// Maps a `getsourcecode` body to a verification flag.
///
/// `status` other than `"1"` (bad key, rate limit, unsupported chain) is an
/// error rather than "not verified".
fn interpret_source_response(body: EtherscanResponse) -> Result<bool> {
    if body.status.as_deref() != Some("1") {
        let detail = match body.result {
            Some(serde_json::Value::String(ref s)) => s.clone(),
            _ => body.message.unwrap_or_default(),
        };
        return Err(eyre!("etherscan returned non-success status: {}", detail));
    }

    let entries = match body.result {
        Some(serde_json::Value::Array(entries)) => entries,
        _ => return Err(eyre!("etherscan getsourcecode result is not an array")),
    };

    let verified = entries.iter().any(|entry| {
        entry
            .get("SourceCode")
            .and_then(|v| v.as_str())
            .map(|source| !source.trim().is_empty())
            .unwrap_or(false)
    });

    Ok(verified)
}

/// Verifier used when no registry credentials are configured.
///
/// Always fails so the engine reports the status as unknown.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredVerifier;

#[async_trait]
impl SourceVerifier for UnconfiguredVerifier {
    async fn is_verified_source(&self, _address: Address) -> Result<bool> {
        Err(eyre!("no source-verification registry configured"))
    }
}
