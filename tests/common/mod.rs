//! Shared test helpers and utilities.
//!
//! In-memory oracle doubles and calldata factories for exercising the risk
//! engine without a node or block explorer.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{address, Address, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use eyre::{eyre, Result};
use firewall_data::{ChainOracle, SimulationOutcome, Simulator, SourceVerifier, Transaction};
use firewall_engine::decoder::{erc20::IERC20, erc721::IERC721};
use firewall_engine::{FirewallConfig, RiskEngine};

/// Sepolia USDT.
pub const TOKEN: Address = address!("aA8E23Fb1079EA71e0a56F48a2aA51851D8433D0");
/// An NFT collection contract.
pub const COLLECTION: Address = address!("BC4CA0EdA7647A8aB7C2061c2E118A18a936f13D");
pub const SPENDER: Address = address!("742d35Cc6634C0532925a3b844Bc9e7595f0bEB0");
/// A regular wallet (no code).
pub const WALLET: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
pub const SIGNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// Contract-code oracle backed by a fixed list.
pub struct StubChain {
    pub contracts: Vec<Address>,
}

#[async_trait]
impl ChainOracle for StubChain {
    async fn is_contract(&self, address: Address) -> Result<bool> {
        Ok(self.contracts.contains(&address))
    }
}

/// Node that refuses every code lookup.
pub struct FailingChain;

#[async_trait]
impl ChainOracle for FailingChain {
    async fn is_contract(&self, _address: Address) -> Result<bool> {
        Err(eyre!("connection refused"))
    }
}

/// Verification registry backed by a fixed list.
pub struct StubVerifier {
    pub verified: Vec<Address>,
}

#[async_trait]
impl SourceVerifier for StubVerifier {
    async fn is_verified_source(&self, address: Address) -> Result<bool> {
        Ok(self.verified.contains(&address))
    }
}

/// Registry that never answers in time.
pub struct StalledVerifier;

#[async_trait]
impl SourceVerifier for StalledVerifier {
    async fn is_verified_source(&self, _address: Address) -> Result<bool> {
        tokio::time::sleep(Duration::from_secs(3_600)).await;
        Ok(true)
    }
}

/// Registry whose client crashes.
pub struct PanickingVerifier;

#[async_trait]
impl SourceVerifier for PanickingVerifier {
    async fn is_verified_source(&self, _address: Address) -> Result<bool> {
        panic!("verifier client crashed");
    }
}

/// Simulator returning a fixed outcome, or failing when `outcome` is `Err`.
pub struct StubSimulator {
    pub outcome: std::result::Result<Option<SimulationOutcome>, String>,
}

#[async_trait]
impl Simulator for StubSimulator {
    async fn simulate(&self, _tx: &Transaction) -> Result<Option<SimulationOutcome>> {
        self.outcome.clone().map_err(|e| eyre!(e))
    }
}

/// Engine where `contracts` have code and `verified` have verified source.
pub fn engine(contracts: &[Address], verified: &[Address]) -> RiskEngine {
    RiskEngine::new(
        Arc::new(StubChain {
            contracts: contracts.to_vec(),
        }),
        Arc::new(StubVerifier {
            verified: verified.to_vec(),
        }),
    )
}

/// The standard fixture: a verified token, an unverified collection.
pub fn default_engine() -> RiskEngine {
    engine(&[TOKEN, COLLECTION], &[TOKEN])
}

pub fn engine_with_config(config: FirewallConfig) -> RiskEngine {
    default_engine().with_config(config)
}

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

pub fn gwei(n: u64) -> U256 {
    U256::from(n) * U256::from(1_000_000_000u64)
}

pub fn approve(spender: Address, amount: U256) -> Vec<u8> {
    IERC20::approveCall { spender, amount }.abi_encode()
}

pub fn transfer(to: Address, amount: U256) -> Vec<u8> {
    IERC20::transferCall { to, amount }.abi_encode()
}

pub fn transfer_from(from: Address, to: Address, amount: U256) -> Vec<u8> {
    IERC20::transferFromCall { from, to, amount }.abi_encode()
}

pub fn set_approval_for_all(operator: Address, approved: bool) -> Vec<u8> {
    IERC721::setApprovalForAllCall { operator, approved }.abi_encode()
}

/// Contract call to `to` with a typical 20 gwei gas price.
pub fn sample_call(to: Address, data: Vec<u8>) -> Transaction {
    Transaction::call(to, data)
        .with_from(SIGNER)
        .with_gas_price(gwei(20))
        .with_nonce(3)
}
