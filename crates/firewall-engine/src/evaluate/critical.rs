//! Priority-1 evaluator: critical conditions.
//!
//! Rules, first match wins:
//! 1. `approve` for the maximum uint256 amount (unlimited allowance) → score 10
//! 2. `setApprovalForAll(operator, true)` → score 15
//! 3. simulation oracle predicts a loss → score 5
//!
//! The simulator is only consulted when neither approval rule fires. A missing
//! or failed simulation never produces a verdict.

use alloy::primitives::U256;
use eyre::Result;
use firewall_data::{FunctionKind, RiskAssessment, RiskLevel, Transaction};

use crate::decoder::{CallParams, DecodedCall};
use crate::lookup::Lookups;

pub const UNLIMITED_APPROVAL_SCORE: u8 = 10;
pub const APPROVAL_FOR_ALL_SCORE: u8 = 15;
pub const PREDICTED_LOSS_SCORE: u8 = 5;

/// Returns a High assessment when a critical rule fires, `None` otherwise.
#[tracing::instrument(skip_all, fields(to = %tx.to, function = ?decoded.function()))]
pub async fn evaluate_critical(
    tx: &Transaction,
    decoded: &DecodedCall,
    lookups: &Lookups<'_>,
) -> Result<Option<RiskAssessment>> {
    match decoded.params() {
        Some(CallParams::Approve { spender, amount }) if *amount == U256::MAX => {
            tracing::debug!(%spender, "unlimited approval");
            return high(
                UNLIMITED_APPROVAL_SCORE,
                FunctionKind::Approve,
                vec![
                    format!(
                        "Unlimited token approval: {spender} would be allowed to spend ALL of this token from your wallet"
                    ),
                    "Unlimited approvals can drain your wallet if the spender is malicious or later compromised"
                        .to_string(),
                ],
            )
            .map(Some);
        }
        Some(CallParams::SetApprovalForAll {
            operator,
            approved: true,
        }) => {
            tracing::debug!(%operator, "collection-wide approval");
            return high(
                APPROVAL_FOR_ALL_SCORE,
                FunctionKind::SetApprovalForAll,
                vec![
                    format!(
                        "Collection-wide approval: {operator} would be allowed to transfer EVERY token you own in this collection"
                    ),
                    "Granting an operator full collection access is a common drainer technique"
                        .to_string(),
                ],
            )
            .map(Some);
        }
        _ => {}
    }

    match lookups.simulate(tx).await {
        Some(outcome) if outcome.predicts_loss => {
            tracing::debug!(description = %outcome.loss_description, "simulation predicts loss");
            high(
                PREDICTED_LOSS_SCORE,
                decoded.function(),
                vec![
                    "Simulation predicts this transaction will lose funds".to_string(),
                    outcome.loss_description,
                ],
            )
            .map(Some)
        }
        _ => Ok(None),
    }
}

fn high(score: u8, function: FunctionKind, reasons: Vec<String>) -> Result<RiskAssessment> {
    RiskAssessment::new(RiskLevel::High, score, function, reasons)
}
