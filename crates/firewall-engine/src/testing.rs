//! Oracle doubles and calldata builders for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{address, Address, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use eyre::{eyre, Result};
use firewall_data::{ChainOracle, SimulationOutcome, Simulator, SourceVerifier, Transaction};

use crate::decoder::{erc20::IERC20, erc721::IERC721};
use crate::lookup::Lookups;
use crate::RiskEngine;

/// Sepolia USDT, used as a token contract.
pub(crate) const TOKEN: Address = address!("aA8E23Fb1079EA71e0a56F48a2aA51851D8433D0");
pub(crate) const SPENDER: Address = address!("742d35Cc6634C0532925a3b844Bc9e7595f0bEB0");
pub(crate) const WALLET: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

#[derive(Default)]
pub(crate) struct MockChain {
    contracts: Vec<Address>,
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl ChainOracle for MockChain {
    async fn is_contract(&self, address: Address) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(eyre!("rpc unavailable"));
        }
        Ok(self.contracts.contains(&address))
    }
}

impl MockChain {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub(crate) struct MockVerifier {
    verified: Vec<Address>,
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl SourceVerifier for MockVerifier {
    async fn is_verified_source(&self, address: Address) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(eyre!("registry unavailable"));
        }
        Ok(self.verified.contains(&address))
    }
}

impl MockVerifier {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub(crate) struct MockSimulator {
    outcome: Option<SimulationOutcome>,
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl Simulator for MockSimulator {
    async fn simulate(&self, _tx: &Transaction) -> Result<Option<SimulationOutcome>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(eyre!("simulation backend unavailable"));
        }
        Ok(self.outcome.clone())
    }
}

impl MockSimulator {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Oracle set with no contracts, nothing verified and no simulation.
#[derive(Default)]
pub(crate) struct MockOracles {
    pub(crate) chain: Arc<MockChain>,
    pub(crate) verifier: Arc<MockVerifier>,
    pub(crate) simulator: Arc<MockSimulator>,
}

impl MockOracles {
    pub(crate) fn with_contract(mut self, address: Address) -> Self {
        let mut contracts = self.chain.contracts.clone();
        contracts.push(address);
        self.chain = Arc::new(MockChain {
            contracts,
            fail: self.chain.fail,
            ..Default::default()
        });
        self
    }

    pub(crate) fn with_verified_contract(mut self, address: Address) -> Self {
        let mut verified = self.verifier.verified.clone();
        verified.push(address);
        self.verifier = Arc::new(MockVerifier {
            verified,
            fail: self.verifier.fail,
            ..Default::default()
        });
        self.with_contract(address)
    }

    pub(crate) fn failing_chain(mut self) -> Self {
        self.chain = Arc::new(MockChain {
            fail: true,
            ..Default::default()
        });
        self
    }

    pub(crate) fn failing_verifier(mut self) -> Self {
        self.verifier = Arc::new(MockVerifier {
            fail: true,
            ..Default::default()
        });
        self
    }

    pub(crate) fn predicting_loss(mut self, description: &str) -> Self {
        self.simulator = Arc::new(MockSimulator {
            outcome: Some(SimulationOutcome {
                predicts_loss: true,
                loss_description: description.to_string(),
            }),
            ..Default::default()
        });
        self
    }

    pub(crate) fn failing_simulation(mut self) -> Self {
        self.simulator = Arc::new(MockSimulator {
            fail: true,
            ..Default::default()
        });
        self
    }

    pub(crate) fn lookups(&self) -> Lookups<'_> {
        Lookups::new(
            self.chain.as_ref(),
            self.verifier.as_ref(),
            self.simulator.as_ref(),
            Duration::from_secs(1),
        )
    }

    pub(crate) fn engine(&self) -> RiskEngine {
        RiskEngine::new(self.chain.clone(), self.verifier.clone())
            .with_simulator(self.simulator.clone())
    }
}

pub(crate) fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

pub(crate) fn gwei(n: u64) -> U256 {
    U256::from(n) * U256::from(1_000_000_000u64)
}

pub(crate) fn approve_data(spender: Address, amount: U256) -> Vec<u8> {
    IERC20::approveCall { spender, amount }.abi_encode()
}

pub(crate) fn transfer_data(to: Address, amount: U256) -> Vec<u8> {
    IERC20::transferCall { to, amount }.abi_encode()
}

pub(crate) fn transfer_from_data(from: Address, to: Address, amount: U256) -> Vec<u8> {
    IERC20::transferFromCall { from, to, amount }.abi_encode()
}

pub(crate) fn set_approval_for_all_data(operator: Address, approved: bool) -> Vec<u8> {
    IERC721::setApprovalForAllCall { operator, approved }.abi_encode()
}
