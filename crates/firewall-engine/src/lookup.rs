//! Oracle access with timeouts and fail-open semantics.
//!
//! Failures and timeouts never surface as errors here: a failed contract
//! check reads as [`ContractStatus::Unknown`], a failed verification as
//! [`Verification::Unknown`], a failed simulation as "no prediction". Each
//! evaluator then continues with less information.

use std::future::Future;
use std::time::Duration;

use alloy::primitives::Address;
use eyre::Result;
use firewall_data::{ChainOracle, SimulationOutcome, Simulator, SourceVerifier, Transaction};

/// Whether an address carries contract code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContractStatus {
    Contract,
    NotContract,
    /// Lookup failed or timed out.
    Unknown,
}

impl ContractStatus {
    pub fn is_contract(&self) -> bool {
        matches!(self, ContractStatus::Contract)
    }
}

/// Source-verification status of a contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verification {
    Verified,
    Unverified,
    /// Lookup failed or timed out.
    Unknown,
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified)
    }
}

/// Borrowed oracle set for one analysis.
pub struct Lookups<'a> {
    chain: &'a dyn ChainOracle,
    verifier: &'a dyn SourceVerifier,
    simulator: &'a dyn Simulator,
    timeout: Duration,
}

impl<'a> Lookups<'a> {
    pub fn new(
        chain: &'a dyn ChainOracle,
        verifier: &'a dyn SourceVerifier,
        simulator: &'a dyn Simulator,
        timeout: Duration,
    ) -> Self {
        Self {
            chain,
            verifier,
            simulator,
            timeout,
        }
    }

    pub async fn contract_status(&self, address: Address) -> ContractStatus {
        match guarded("is_contract", self.timeout, self.chain.is_contract(address)).await {
            Some(true) => ContractStatus::Contract,
            Some(false) => ContractStatus::NotContract,
            None => ContractStatus::Unknown,
        }
    }

    pub async fn verification(&self, address: Address) -> Verification {
        match guarded(
            "is_verified_source",
            self.timeout,
            self.verifier.is_verified_source(address),
        )
        .await
        {
            Some(true) => Verification::Verified,
            Some(false) => Verification::Unverified,
            None => Verification::Unknown,
        }
    }

    /// Simulation result; `None` when unavailable, failed, or timed out.
    pub async fn simulate(&self, tx: &Transaction) -> Option<SimulationOutcome> {
        guarded("simulate", self.timeout, self.simulator.simulate(tx))
            .await
            .flatten()
    }
}

async fn guarded<T>(
    lookup: &'static str,
    timeout: Duration,
    call: impl Future<Output = Result<T>>,
) -> Option<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::warn!(lookup, error = %e, "oracle lookup failed, treating as unknown");
            None
        }
        Err(_) => {
            tracing::warn!(
                lookup,
                timeout_ms = timeout.as_millis() as u64,
                "oracle lookup timed out, treating as unknown"
            );
            None
        }
    }
}
