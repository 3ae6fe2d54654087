//! Type definitions for transactions under review and risk verdicts.

use alloy::primitives::{Address, Bytes, U256};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};

/// Proposed outgoing transaction, read-only for the duration of an analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Signer address, if known. Only the simulation oracle needs it.
    pub from: Option<Address>,
    /// Recipient address.
    pub to: Address,
    /// Value in wei.
    pub value: U256,
    /// Calldata (possibly empty).
    pub data: Bytes,
    /// Gas price in wei.
    pub gas_price: U256,
    /// Gas limit.
    pub gas_limit: u64,
    /// Nonce.
    pub nonce: u64,
}

impl Transaction {
    /// Plain value transfer with a 21000 gas limit.
    pub fn transfer(to: Address, value: U256) -> Self {
        Self {
            from: None,
            to,
            value,
            data: Bytes::new(),
            gas_price: U256::ZERO,
            gas_limit: 21_000,
            nonce: 0,
        }
    }

    /// Contract call carrying `data` and no value.
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            gas_limit: 100_000,
            ..Self::transfer(to, U256::ZERO)
        }
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// True when no calldata is attached.
    pub fn has_empty_data(&self) -> bool {
        self.data.is_empty()
    }
}

/// Recognized function identity of a transaction's calldata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    /// ERC-20 `transfer(address,uint256)`
    Transfer,
    /// ERC-20 `approve(address,uint256)`
    Approve,
    /// `transferFrom(address,address,uint256)`
    TransferFrom,
    /// ERC-721 / ERC-1155 `setApprovalForAll(address,bool)`
    SetApprovalForAll,
    /// Calldata present but not recognized.
    Unknown,
    /// No calldata (plain value transfer).
    None,
}

impl FunctionKind {
    /// Display name used in reasons and rendered reports.
    pub fn label(&self) -> &'static str {
        match self {
            FunctionKind::Transfer => "transfer",
            FunctionKind::Approve => "approve",
            FunctionKind::TransferFrom => "transferFrom",
            FunctionKind::SetApprovalForAll => "setApprovalForAll",
            FunctionKind::Unknown => "unknown",
            FunctionKind::None => "none (value transfer)",
        }
    }
}

/// Risk classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Safe,
    Caution,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Caution => "CAUTION",
            RiskLevel::High => "HIGH RISK",
        }
    }
}

/// Final verdict for one transaction.
///
/// Immutable once built. Reasons are kept in the order the evaluators
/// produced them. Deserialization goes through [`RiskAssessment::new`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AssessmentFields")]
pub struct RiskAssessment {
    level: RiskLevel,
    score: u8,
    function: FunctionKind,
    reasons: Vec<String>,
}

impl RiskAssessment {
    /// Upper bound of the safety score.
    pub const MAX_SCORE: u8 = 100;

    /// Builds an assessment, rejecting scores above [`Self::MAX_SCORE`].
    ///
    /// The score is not clamped: each evaluator is responsible for emitting a
    /// score consistent with its level.
    pub fn new(
        level: RiskLevel,
        score: u8,
        function: FunctionKind,
        reasons: Vec<String>,
    ) -> Result<Self> {
        if score > Self::MAX_SCORE {
            return Err(eyre!(
                "safety score {} outside 0..={}",
                score,
                Self::MAX_SCORE
            ));
        }
        Ok(Self {
            level,
            score,
            function,
            reasons,
        })
    }

    /// Fixed Caution/50 verdict returned when analysis could not complete.
    pub fn analysis_incomplete() -> Self {
        Self {
            level: RiskLevel::Caution,
            score: 50,
            function: FunctionKind::Unknown,
            reasons: vec![
                "Risk analysis could not be completed for this transaction".to_string(),
                "Proceed with maximum caution: verify the recipient and calldata independently before signing"
                    .to_string(),
            ],
        }
    }

    pub fn level(&self) -> RiskLevel {
        self.level
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn function(&self) -> FunctionKind {
        self.function
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }
}

#[derive(Deserialize)]
struct AssessmentFields {
    level: RiskLevel,
    score: u8,
    function: FunctionKind,
    reasons: Vec<String>,
}

impl TryFrom<AssessmentFields> for RiskAssessment {
    type Error = eyre::Report;

    fn try_from(fields: AssessmentFields) -> Result<Self> {
        Self::new(fields.level, fields.score, fields.function, fields.reasons)
    }
}
