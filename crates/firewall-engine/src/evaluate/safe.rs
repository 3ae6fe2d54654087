//! Priority-3 evaluator: default classification for unflagged transactions.

use eyre::Result;
use firewall_data::{FunctionKind, RiskAssessment, RiskLevel, Transaction};

use crate::decoder::DecodedCall;
use crate::lookup::ContractStatus;

pub const PEER_TO_PEER_SCORE: u8 = 98;
pub const KNOWN_TRANSFER_SCORE: u8 = 85;
pub const DEFAULT_SAFE_SCORE: u8 = 75;

/// What the Priority-3 stage decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SafeOutcome {
    Classified(RiskAssessment),
    /// Value with no calldata to a contract, or to an address whose code
    /// could not be checked; the Priority-2 candidate stands.
    DeferToCaution,
}

/// Classifies a transaction no earlier stage flagged.
///
/// `notes` are Priority-2 observations that did not lower the score; they are
/// placed ahead of the reasons produced here.
pub fn evaluate_safe(
    tx: &Transaction,
    decoded: &DecodedCall,
    recipient: ContractStatus,
    notes: &[String],
) -> Result<SafeOutcome> {
    let (score, own_reasons) = if tx.has_empty_data() {
        if recipient != ContractStatus::NotContract {
            return Ok(SafeOutcome::DeferToCaution);
        }
        (
            PEER_TO_PEER_SCORE,
            vec![
                "Plain peer-to-peer transfer to a regular wallet address".to_string(),
                "No contract code will execute".to_string(),
            ],
        )
    } else {
        match decoded.function() {
            kind @ (FunctionKind::Transfer | FunctionKind::TransferFrom) => (
                KNOWN_TRANSFER_SCORE,
                vec![
                    format!("Standard token {} operation", kind.label()),
                    "Well-known function with predictable behavior".to_string(),
                ],
            ),
            _ => (
                DEFAULT_SAFE_SCORE,
                vec!["No suspicious behavior detected".to_string()],
            ),
        }
    };

    let reasons = notes.iter().cloned().chain(own_reasons).collect();
    RiskAssessment::new(RiskLevel::Safe, score, decoded.function(), reasons)
        .map(SafeOutcome::Classified)
}
