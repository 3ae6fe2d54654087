//! External lookups consumed by the risk engine.
//!
//! Every lookup is a side-effect-free read. Implementations report failures as
//! `Err`; deciding what a failure means for the verdict is left to the engine.

use alloy::primitives::Address;
use async_trait::async_trait;
use eyre::Result;

use crate::types::Transaction;

/// Contract-code presence lookup.
#[async_trait]
pub trait ChainOracle: Send + Sync {
    /// Returns `true` when `address` has deployed code.
    async fn is_contract(&self, address: Address) -> Result<bool>;
}

/// Source-verification registry lookup.
#[async_trait]
pub trait SourceVerifier: Send + Sync {
    /// Returns `true` when the registry holds verified source for `address`.
    async fn is_verified_source(&self, address: Address) -> Result<bool>;
}

/// Predicted execution effect of a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// The signer is predicted to lose funds.
    pub predicts_loss: bool,
    /// Human-readable description of the predicted loss.
    pub loss_description: String,
}

/// Execution-simulation oracle.
#[async_trait]
pub trait Simulator: Send + Sync {
    /// Simulates `tx` without committing it. `Ok(None)` means no prediction.
    async fn simulate(&self, tx: &Transaction) -> Result<Option<SimulationOutcome>>;
}

/// Simulator used when no simulation backend is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSimulation;

#[async_trait]
impl Simulator for NoSimulation {
    async fn simulate(&self, _tx: &Transaction) -> Result<Option<SimulationOutcome>> {
        Ok(None)
    }
}
