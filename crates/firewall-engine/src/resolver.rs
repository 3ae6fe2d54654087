//! Risk resolver: runs the evaluators in priority order.
//!
//! ```text
//! Start → Decoded → Priority1Checked → Priority2Checked → [Priority3Checked] → Done
//! ```
//!
//! A Priority-1 verdict is terminal. A Priority-2 candidate with findings is
//! final; otherwise Priority-3 classifies, except for value sent with no
//! calldata to a contract, which keeps the Priority-2 candidate. Any error or
//! panic along the way resolves to [`RiskAssessment::analysis_incomplete`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use eyre::Result;
use firewall_data::{
    ChainOracle, NoSimulation, RiskAssessment, Simulator, SourceVerifier, Transaction,
};
use futures::FutureExt;

use crate::config::FirewallConfig;
use crate::decoder::decode;
use crate::evaluate::{evaluate_caution, evaluate_critical, evaluate_safe, SafeOutcome};
use crate::lookup::Lookups;

/// Resolver progress, logged on every transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Start,
    Decoded,
    Priority1Checked,
    Priority2Checked,
    Priority3Checked,
    Done,
}

impl Stage {
    fn advance(&mut self, next: Stage) {
        tracing::debug!(from = ?*self, to = ?next, "resolver transition");
        *self = next;
    }
}

/// How an analysis ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// A critical condition fired.
    High(RiskAssessment),
    /// Caution or Safe verdict from the later stages. `reached` is the last
    /// stage that ran.
    Settled {
        assessment: RiskAssessment,
        reached: Stage,
    },
    /// Analysis failed internally.
    Fallback { cause: String },
}

impl Resolution {
    pub fn into_assessment(self) -> RiskAssessment {
        match self {
            Resolution::High(assessment) | Resolution::Settled { assessment, .. } => assessment,
            Resolution::Fallback { .. } => RiskAssessment::analysis_incomplete(),
        }
    }

    /// Last evaluator stage that ran; `None` for a fallback.
    pub fn reached(&self) -> Option<Stage> {
        match self {
            Resolution::High(_) => Some(Stage::Priority1Checked),
            Resolution::Settled { reached, .. } => Some(*reached),
            Resolution::Fallback { .. } => None,
        }
    }
}

/// Transaction risk engine.
///
/// Holds no per-analysis state; one engine can serve concurrent analyses.
#[derive(Clone)]
pub struct RiskEngine {
    chain: Arc<dyn ChainOracle>,
    verifier: Arc<dyn SourceVerifier>,
    simulator: Arc<dyn Simulator>,
    config: FirewallConfig,
}

impl RiskEngine {
    /// Engine without a simulation backend and with default configuration.
    pub fn new(chain: Arc<dyn ChainOracle>, verifier: Arc<dyn SourceVerifier>) -> Self {
        Self {
            chain,
            verifier,
            simulator: Arc::new(NoSimulation),
            config: FirewallConfig::default(),
        }
    }

    pub fn with_simulator(mut self, simulator: Arc<dyn Simulator>) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn with_config(mut self, config: FirewallConfig) -> Self {
        self.config = config;
        self
    }

    /// Analyzes `tx`. Never fails.
    #[tracing::instrument(skip_all, fields(to = %tx.to, value = %tx.value, data_len = tx.data.len()))]
    pub async fn analyze(&self, tx: &Transaction) -> RiskAssessment {
        let assessment = self.resolve(tx).await.into_assessment();
        tracing::info!(
            level = assessment.level().label(),
            score = assessment.score(),
            function = assessment.function().label(),
            "risk verdict"
        );
        assessment
    }

    /// Runs the stages and reports how the analysis ended.
    pub async fn resolve(&self, tx: &Transaction) -> Resolution {
        match AssertUnwindSafe(self.run(tx)).catch_unwind().await {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "risk analysis failed");
                Resolution::Fallback {
                    cause: format!("{e:#}"),
                }
            }
            Err(panic) => {
                let cause = panic_message(panic.as_ref());
                tracing::error!(%cause, "risk analysis panicked");
                Resolution::Fallback { cause }
            }
        }
    }

    async fn run(&self, tx: &Transaction) -> Result<Resolution> {
        let mut stage = Stage::Start;
        let lookups = Lookups::new(
            self.chain.as_ref(),
            self.verifier.as_ref(),
            self.simulator.as_ref(),
            self.config.oracle_timeout,
        );

        let decoded = decode(&tx.data);
        stage.advance(Stage::Decoded);

        let critical = evaluate_critical(tx, &decoded, &lookups).await?;
        stage.advance(Stage::Priority1Checked);
        if let Some(assessment) = critical {
            stage.advance(Stage::Done);
            return Ok(Resolution::High(assessment));
        }

        let caution = evaluate_caution(tx, &decoded, &lookups, &self.config).await?;
        stage.advance(Stage::Priority2Checked);
        if caution.has_findings {
            let reached = stage;
            stage.advance(Stage::Done);
            return Ok(Resolution::Settled {
                assessment: caution.assessment,
                reached,
            });
        }

        let outcome = evaluate_safe(tx, &decoded, caution.recipient, &caution.notes)?;
        stage.advance(Stage::Priority3Checked);
        let assessment = match outcome {
            SafeOutcome::Classified(assessment) => assessment,
            SafeOutcome::DeferToCaution => caution.assessment,
        };
        let reached = stage;
        stage.advance(Stage::Done);
        Ok(Resolution::Settled { assessment, reached })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        approve_data, ether, gwei, set_approval_for_all_data, transfer_data, MockOracles,
        SPENDER, TOKEN, WALLET,
    };
    use alloy::primitives::{Address, U256};
    use async_trait::async_trait;
    use firewall_data::{FunctionKind, RiskLevel};

    struct PanickingChain;

    #[async_trait]
    impl ChainOracle for PanickingChain {
        async fn is_contract(&self, _address: Address) -> Result<bool> {
            panic!("oracle bug");
        }
    }

    #[tokio::test]
    async fn critical_verdict_is_terminal() {
        let oracles = MockOracles::default().with_contract(TOKEN);
        let tx = Transaction::call(TOKEN, approve_data(SPENDER, U256::MAX));

        let resolution = oracles.engine().resolve(&tx).await;
        assert!(matches!(resolution, Resolution::High(ref a) if a.score() == 10));
        assert_eq!(resolution.reached(), Some(Stage::Priority1Checked));
        assert_eq!(oracles.chain.calls(), 0, "later stages must not run");
    }

    #[tokio::test]
    async fn caution_findings_settle() {
        let oracles = MockOracles::default().with_verified_contract(TOKEN);
        let tx = Transaction::call(TOKEN, approve_data(SPENDER, ether(100)));

        let resolution = oracles.engine().resolve(&tx).await;
        assert_eq!(resolution.reached(), Some(Stage::Priority2Checked));
        let assessment = resolution.into_assessment();
        assert_eq!(assessment.level(), RiskLevel::Caution);
        assert_eq!(assessment.score(), 55);
    }

    #[tokio::test]
    async fn plain_transfer_falls_through_to_safe() {
        let oracles = MockOracles::default();
        let tx = Transaction::transfer(WALLET, ether(1)).with_gas_price(gwei(20));

        let resolution = oracles.engine().resolve(&tx).await;
        assert_eq!(resolution.reached(), Some(Stage::Priority3Checked));
        let assessment = resolution.into_assessment();
        assert_eq!(assessment.level(), RiskLevel::Safe);
        assert_eq!(assessment.score(), 98);
        assert_eq!(oracles.chain.calls(), 1);
    }

    #[tokio::test]
    async fn unreachable_chain_keeps_plain_transfer_in_caution() {
        let oracles = MockOracles::default().failing_chain();
        let tx = Transaction::transfer(TOKEN, ether(1)).with_gas_price(gwei(20));

        let resolution = oracles.engine().resolve(&tx).await;
        assert_eq!(resolution.reached(), Some(Stage::Priority2Checked));
        let assessment = resolution.into_assessment();
        assert_eq!(assessment.level(), RiskLevel::Caution);
        assert_eq!(assessment.score(), 55);
        assert!(!assessment
            .reasons()
            .iter()
            .any(|r| r == "No contract code will execute"));
    }

    #[tokio::test]
    async fn verified_token_transfer_keeps_note() {
        let oracles = MockOracles::default().with_verified_contract(TOKEN);
        let tx = Transaction::call(TOKEN, transfer_data(SPENDER, ether(1)));

        let assessment = oracles.engine().analyze(&tx).await;
        assert_eq!(assessment.level(), RiskLevel::Safe);
        assert_eq!(assessment.score(), 85);
        assert_eq!(assessment.reasons()[0], "Contract source code is verified");
        assert_eq!(oracles.chain.calls(), 1, "contract status is looked up once");
    }

    #[tokio::test]
    async fn zero_data_to_contract_evaluates_once() {
        let oracles = MockOracles::default().with_verified_contract(TOKEN);
        let tx = Transaction::transfer(TOKEN, ether(1));

        let resolution = oracles.engine().resolve(&tx).await;
        assert_eq!(resolution.reached(), Some(Stage::Priority2Checked));
        let assessment = resolution.into_assessment();
        assert_eq!(assessment.level(), RiskLevel::Caution);
        assert_eq!(assessment.score(), 60);
        assert_eq!(assessment.function(), FunctionKind::None);
        assert_eq!(oracles.verifier.calls(), 1);
    }

    #[tokio::test]
    async fn revoked_approval_is_safe() {
        let oracles = MockOracles::default().with_verified_contract(TOKEN);
        let tx = Transaction::call(TOKEN, set_approval_for_all_data(SPENDER, false));

        let assessment = oracles.engine().analyze(&tx).await;
        assert_eq!(assessment.level(), RiskLevel::Safe);
        assert_eq!(assessment.score(), 75);
    }

    #[tokio::test]
    async fn panicking_oracle_falls_back() {
        let oracles = MockOracles::default();
        let engine = RiskEngine::new(Arc::new(PanickingChain), oracles.verifier.clone());
        let tx = Transaction::transfer(WALLET, ether(1));

        let resolution = engine.resolve(&tx).await;
        assert_eq!(resolution.reached(), None);
        assert_eq!(
            resolution,
            Resolution::Fallback {
                cause: "oracle bug".to_string()
            }
        );
        assert_eq!(
            resolution.into_assessment(),
            RiskAssessment::analysis_incomplete()
        );
    }

    #[tokio::test]
    async fn failing_oracles_never_yield_safe_for_contract_calls() {
        let oracles = MockOracles::default()
            .with_contract(TOKEN)
            .failing_verifier()
            .failing_simulation();
        let tx = Transaction::call(TOKEN, transfer_data(SPENDER, ether(1)));

        let assessment = oracles.engine().analyze(&tx).await;
        assert_eq!(assessment.level(), RiskLevel::Caution);
        assert_eq!(assessment.score(), 50);
    }

    #[tokio::test]
    async fn analysis_is_idempotent() {
        let oracles = MockOracles::default().with_contract(TOKEN);
        let engine = oracles.engine();
        let tx = Transaction::call(TOKEN, vec![0xde, 0xad, 0xbe, 0xef]).with_gas_price(gwei(120));

        let first = engine.analyze(&tx).await;
        let second = engine.analyze(&tx).await;
        assert_eq!(first, second);
    }
}
