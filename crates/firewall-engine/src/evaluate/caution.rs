//! Priority-2 evaluator: stackable caution findings.
//!
//! A running score starts at [`CAUTION_BASE_SCORE`] and each finding lowers it;
//! the result is floored at [`CAUTION_FLOOR_SCORE`]. Value sent with no calldata
//! to a contract is the dominant case and short-circuits the other rules.

use alloy::hex;
use alloy::primitives::U256;
use eyre::Result;
use firewall_data::{FunctionKind, RiskAssessment, RiskLevel, Transaction};

use crate::config::FirewallConfig;
use crate::decoder::{CallParams, DecodeOutcome, DecodedCall};
use crate::format::{format_ether, format_gwei, format_units, DEFAULT_DECIMALS};
use crate::lookup::{ContractStatus, Lookups, Verification};

pub const CAUTION_BASE_SCORE: u8 = 70;
pub const CAUTION_FLOOR_SCORE: u8 = 40;
pub const ZERO_DATA_CONTRACT_SCORE: u8 = 60;
pub const FINITE_APPROVAL_SCORE: u8 = 55;

const UNVERIFIED_DEFAULT_HANDLER_PENALTY: u8 = 15;
const UNDECODED_APPROVAL_PENALTY: u8 = 15;
const UNKNOWN_FUNCTION_PENALTY: u8 = 15;
const UNKNOWN_RECIPIENT_PENALTY: u8 = 15;
const UNVERIFIED_CONTRACT_PENALTY: u8 = 20;
const HIGH_GAS_PRICE_PENALTY: u8 = 5;
const LARGE_VALUE_PENALTY: u8 = 10;

pub const NO_FINDINGS_REASON: &str = "No specific risk indicators were found for this transaction";

/// Priority-2 candidate plus the facts later stages reuse.
#[derive(Clone, Debug)]
pub struct CautionReport {
    pub assessment: RiskAssessment,
    /// At least one rule set or lowered the score.
    pub has_findings: bool,
    pub recipient: ContractStatus,
    /// Informational reasons that did not affect the score.
    pub notes: Vec<String>,
}

#[derive(Default)]
struct Scan {
    reasons: Vec<String>,
    notes: Vec<String>,
    has_findings: bool,
}

impl Scan {
    fn finding(&mut self, reason: String) {
        self.has_findings = true;
        self.reasons.push(reason);
    }

    fn note(&mut self, reason: String) {
        self.notes.push(reason.clone());
        self.reasons.push(reason);
    }
}

#[tracing::instrument(skip_all, fields(to = %tx.to, function = ?decoded.function()))]
pub async fn evaluate_caution(
    tx: &Transaction,
    decoded: &DecodedCall,
    lookups: &Lookups<'_>,
    config: &FirewallConfig,
) -> Result<CautionReport> {
    let recipient = lookups.contract_status(tx.to).await;
    let mut scan = Scan::default();

    if tx.has_empty_data() && recipient.is_contract() {
        let mut score = ZERO_DATA_CONTRACT_SCORE;
        scan.finding(
            "Sending value to a contract with no calldata executes its default receive/fallback handler"
                .to_string(),
        );
        match lookups.verification(tx.to).await {
            Verification::Verified => {
                scan.reasons.push("Contract source code is verified".to_string());
            }
            Verification::Unverified => {
                score = score.saturating_sub(UNVERIFIED_DEFAULT_HANDLER_PENALTY);
                scan.finding(
                    "Contract source code is NOT verified: what its default handler does cannot be inspected"
                        .to_string(),
                );
            }
            Verification::Unknown => {
                score = score.saturating_sub(UNVERIFIED_DEFAULT_HANDLER_PENALTY);
                scan.finding(
                    "Contract verification status could not be determined: what its default handler does is unknown"
                        .to_string(),
                );
            }
        }
        tracing::debug!(score, "zero-data call to contract");
        return report(score, decoded, scan, recipient);
    }

    let mut score = CAUTION_BASE_SCORE;

    match &decoded.outcome {
        DecodeOutcome::Decoded(CallParams::Approve { spender, amount }) if *amount != U256::MAX => {
            score = FINITE_APPROVAL_SCORE;
            scan.finding(format!(
                "Token approval: {spender} may spend up to {} tokens from your wallet",
                format_units(*amount, DEFAULT_DECIMALS)
            ));
        }
        DecodeOutcome::DecodedNoPayload(
            kind @ (FunctionKind::Approve | FunctionKind::SetApprovalForAll),
        ) => {
            score = score.saturating_sub(UNDECODED_APPROVAL_PENALTY);
            scan.finding(format!(
                "{} call parameters could not be decoded; the granted authority is unknown",
                kind.label()
            ));
        }
        DecodeOutcome::Unrecognized => {
            score = score.saturating_sub(UNKNOWN_FUNCTION_PENALTY);
            let identifier = decoded
                .selector_hex()
                .unwrap_or_else(|| format!("0x{}", hex::encode(&tx.data)));
            scan.finding(format!(
                "Unknown function {identifier}: the call's effect cannot be determined"
            ));
        }
        _ => {}
    }

    if recipient == ContractStatus::Unknown {
        score = score.saturating_sub(UNKNOWN_RECIPIENT_PENALTY);
        scan.finding(
            "Could not determine whether the recipient is a contract; its code may execute".to_string(),
        );
    }

    if recipient.is_contract() && !tx.has_empty_data() {
        match lookups.verification(tx.to).await {
            Verification::Verified => {
                scan.note("Contract source code is verified".to_string());
            }
            Verification::Unverified => {
                score = score.saturating_sub(UNVERIFIED_CONTRACT_PENALTY);
                scan.finding(
                    "Contract source code is NOT verified: interacting with unverified contracts is risky"
                        .to_string(),
                );
            }
            Verification::Unknown => {
                score = score.saturating_sub(UNVERIFIED_CONTRACT_PENALTY);
                scan.finding(
                    "Could not verify the contract's source code; treat it as unverified".to_string(),
                );
            }
        }
    }

    if tx.gas_price > config.high_gas_price_wei() {
        score = score.saturating_sub(HIGH_GAS_PRICE_PENALTY);
        scan.finding(format!(
            "High gas price: {} (threshold {} gwei)",
            format_gwei(tx.gas_price),
            config.high_gas_price_gwei
        ));
    }

    if let Some(limit) = config.large_value_wei.filter(|limit| tx.value > *limit) {
        score = score.saturating_sub(LARGE_VALUE_PENALTY);
        scan.finding(format!(
            "Large value transfer: {} (above {})",
            format_ether(tx.value),
            format_ether(limit)
        ));
    }

    report(score, decoded, scan, recipient)
}

fn report(
    score: u8,
    decoded: &DecodedCall,
    mut scan: Scan,
    recipient: ContractStatus,
) -> Result<CautionReport> {
    if scan.reasons.is_empty() {
        scan.reasons.push(NO_FINDINGS_REASON.to_string());
    }
    let assessment = RiskAssessment::new(
        RiskLevel::Caution,
        score.max(CAUTION_FLOOR_SCORE),
        decoded.function(),
        scan.reasons,
    )?;
    Ok(CautionReport {
        assessment,
        has_findings: scan.has_findings,
        recipient,
        notes: scan.notes,
    })
}
