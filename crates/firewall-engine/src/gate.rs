//! Confirmation gate boundary.
//!
//! The engine never prompts. A gate implementation renders the verdict and
//! returns whether the signer authorized the transaction.

use eyre::Result;
use firewall_data::{RiskAssessment, RiskLevel, Transaction};

use crate::format::{format_ether, format_gwei};

/// Literal acknowledgement required before a High-risk transaction proceeds.
pub const HIGH_RISK_ACKNOWLEDGEMENT: &str = "CONFIRM";

pub trait ConfirmationGate {
    /// Shows `assessment` for `tx` and returns the signer's decision.
    fn confirm(&mut self, assessment: &RiskAssessment, tx: &Transaction) -> Result<bool>;
}

/// Whether `response` authorizes a transaction at `level`.
///
/// High risk needs the exact acknowledgement (only the line terminator is
/// stripped); other levels accept `y` or `yes` in any case.
pub fn acknowledgement_authorizes(level: RiskLevel, response: &str) -> bool {
    let line = response.trim_end_matches(['\r', '\n']);
    match level {
        RiskLevel::High => line == HIGH_RISK_ACKNOWLEDGEMENT,
        RiskLevel::Caution | RiskLevel::Safe => {
            matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        }
    }
}

/// Label/value rows every gate must show, in display order. Reasons follow
/// separately.
pub fn summary_rows(assessment: &RiskAssessment, tx: &Transaction) -> Vec<(&'static str, String)> {
    vec![
        ("Risk level", assessment.level().label().to_string()),
        (
            "Safety score",
            format!("{}/{}", assessment.score(), RiskAssessment::MAX_SCORE),
        ),
        ("Function", assessment.function().label().to_string()),
        ("To", tx.to.to_checksum(None)),
        ("Value", format_ether(tx.value)),
        ("Gas price", format_gwei(tx.gas_price)),
        ("Gas limit", tx.gas_limit.to_string()),
        ("Nonce", tx.nonce.to_string()),
    ]
}
