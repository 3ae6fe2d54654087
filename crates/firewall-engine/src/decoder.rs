//! Calldata decoder for the token-authority functions the firewall scores.
//!
//! Selectors come from compile-time `sol!` definitions; parameter words are
//! read directly from the ABI head so that malformed payloads degrade to
//! "identity known, payload absent" instead of failing the whole decode.

use alloy::hex;
use alloy::primitives::{Address, FixedBytes, U256};
use firewall_data::FunctionKind;

/// Compile-time ABI definitions for ERC-20 transfer/approval functions.
pub mod erc20 {
    use alloy::sol;

    sol! {
        interface IERC20 {
            /// Move `amount` tokens from the caller to `to`
            function transfer(address to, uint256 amount) external returns (bool);

            /// Let `spender` move up to `amount` of the caller's tokens
            function approve(address spender, uint256 amount) external returns (bool);

            /// Move tokens on behalf of `from` using an allowance
            function transferFrom(address from, address to, uint256 amount) external returns (bool);
        }
    }
}

/// Compile-time ABI definitions for collection-wide approvals (ERC-721 / ERC-1155).
pub mod erc721 {
    use alloy::sol;

    sol! {
        interface IERC721 {
            /// Grant or revoke `operator` authority over every token the caller owns
            function setApprovalForAll(address operator, bool approved) external;
        }
    }
}

/// 4-byte selectors recognized by [`decode`].
pub mod selectors {
    use alloy::sol_types::SolCall;

    use super::{erc20::IERC20, erc721::IERC721};

    /// `transfer(address,uint256)` = `0xa9059cbb`
    pub const TRANSFER: [u8; 4] = <IERC20::transferCall as SolCall>::SELECTOR;
    /// `approve(address,uint256)` = `0x095ea7b3`
    pub const APPROVE: [u8; 4] = <IERC20::approveCall as SolCall>::SELECTOR;
    /// `transferFrom(address,address,uint256)` = `0x23b872dd`
    pub const TRANSFER_FROM: [u8; 4] = <IERC20::transferFromCall as SolCall>::SELECTOR;
    /// `setApprovalForAll(address,bool)` = `0xa22cb465`
    pub const SET_APPROVAL_FOR_ALL: [u8; 4] =
        <IERC721::setApprovalForAllCall as SolCall>::SELECTOR;
}

const SELECTOR_LEN: usize = 4;
const WORD_LEN: usize = 32;
const ADDRESS_LEN: usize = 20;

/// Typed parameters of a recognized call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallParams {
    Transfer { to: Address, amount: U256 },
    Approve { spender: Address, amount: U256 },
    SetApprovalForAll { operator: Address, approved: bool },
}

impl CallParams {
    pub fn function(&self) -> FunctionKind {
        match self {
            CallParams::Transfer { .. } => FunctionKind::Transfer,
            CallParams::Approve { .. } => FunctionKind::Approve,
            CallParams::SetApprovalForAll { .. } => FunctionKind::SetApprovalForAll,
        }
    }
}

/// Result of decoding calldata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// No calldata: a plain value transfer.
    Empty,
    /// Calldata too short for a selector, or selector not recognized.
    Unrecognized,
    /// Known selector whose payload is absent, malformed, or not decoded.
    DecodedNoPayload(FunctionKind),
    /// Known selector with a typed payload.
    Decoded(CallParams),
}

/// Decoded calldata: selector (if present) plus outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedCall {
    /// First 4 bytes of calldata; `None` when calldata is empty or shorter.
    pub selector: Option<FixedBytes<4>>,
    pub outcome: DecodeOutcome,
}

impl DecodedCall {
    /// Function identity implied by the outcome.
    pub fn function(&self) -> FunctionKind {
        match &self.outcome {
            DecodeOutcome::Empty => FunctionKind::None,
            DecodeOutcome::Unrecognized => FunctionKind::Unknown,
            DecodeOutcome::DecodedNoPayload(kind) => *kind,
            DecodeOutcome::Decoded(params) => params.function(),
        }
    }

    /// Typed payload, when one was decoded.
    pub fn params(&self) -> Option<&CallParams> {
        match &self.outcome {
            DecodeOutcome::Decoded(params) => Some(params),
            _ => None,
        }
    }

    /// Selector as `0x`-prefixed hex.
    pub fn selector_hex(&self) -> Option<String> {
        self.selector
            .map(|selector| format!("0x{}", hex::encode(selector)))
    }
}

/// Decodes transaction calldata. Never fails.
///
/// - empty calldata → [`DecodeOutcome::Empty`]
/// - fewer than 4 bytes or unknown selector → [`DecodeOutcome::Unrecognized`]
/// - `transferFrom` → identity only, payload is not decoded
/// - `transfer` / `approve` / `setApprovalForAll` → typed payload, or
///   [`DecodeOutcome::DecodedNoPayload`] when the parameter words are short or
///   the address word carries non-zero upper bytes
pub fn decode(calldata: &[u8]) -> DecodedCall {
    if calldata.is_empty() {
        return DecodedCall {
            selector: None,
            outcome: DecodeOutcome::Empty,
        };
    }

    if calldata.len() < SELECTOR_LEN {
        return DecodedCall {
            selector: None,
            outcome: DecodeOutcome::Unrecognized,
        };
    }

    let (selector_bytes, args) = calldata.split_at(SELECTOR_LEN);
    let selector = FixedBytes::<4>::from_slice(selector_bytes);

    let outcome = match selector.0 {
        selectors::TRANSFER => with_payload(FunctionKind::Transfer, decode_transfer(args)),
        selectors::APPROVE => with_payload(FunctionKind::Approve, decode_approve(args)),
        selectors::TRANSFER_FROM => DecodeOutcome::DecodedNoPayload(FunctionKind::TransferFrom),
        selectors::SET_APPROVAL_FOR_ALL => with_payload(
            FunctionKind::SetApprovalForAll,
            decode_set_approval_for_all(args),
        ),
        _ => DecodeOutcome::Unrecognized,
    };

    if matches!(outcome, DecodeOutcome::DecodedNoPayload(kind) if kind != FunctionKind::TransferFrom)
    {
        tracing::debug!(
            selector = %format!("0x{}", hex::encode(selector)),
            args_len = args.len(),
            "known selector with undecodable payload"
        );
    }

    DecodedCall {
        selector: Some(selector),
        outcome,
    }
}

fn with_payload(kind: FunctionKind, params: Option<CallParams>) -> DecodeOutcome {
    match params {
        Some(params) => DecodeOutcome::Decoded(params),
        None => DecodeOutcome::DecodedNoPayload(kind),
    }
}

fn decode_transfer(args: &[u8]) -> Option<CallParams> {
    let to = word_address(word(args, 0)?)?;
    let amount = word_u256(word(args, 1)?);
    Some(CallParams::Transfer { to, amount })
}

fn decode_approve(args: &[u8]) -> Option<CallParams> {
    let spender = word_address(word(args, 0)?)?;
    let amount = word_u256(word(args, 1)?);
    Some(CallParams::Approve { spender, amount })
}

fn decode_set_approval_for_all(args: &[u8]) -> Option<CallParams> {
    let operator = word_address(word(args, 0)?)?;
    let approved = word_low_bit(word(args, 1)?);
    Some(CallParams::SetApprovalForAll { operator, approved })
}

/// The `index`-th 32-byte head word of `args`.
fn word(args: &[u8], index: usize) -> Option<&[u8]> {
    args.get(index * WORD_LEN..(index + 1) * WORD_LEN)
}

/// Address right-aligned in a word; upper 12 bytes must be zero.
fn word_address(word: &[u8]) -> Option<Address> {
    let (padding, address) = word.split_at(WORD_LEN - ADDRESS_LEN);
    if padding.iter().any(|b| *b != 0) {
        return None;
    }
    Some(Address::from_slice(address))
}

fn word_u256(word: &[u8]) -> U256 {
    U256::from_be_slice(word)
}

fn word_low_bit(word: &[u8]) -> bool {
    word[WORD_LEN - 1] & 1 == 1
}
