//! Human-readable formatting of on-chain integer amounts.

use alloy::primitives::U256;

/// Decimals of ETH and of the token amounts shown in approval reasons.
pub const DEFAULT_DECIMALS: u8 = 18;
const GWEI_DECIMALS: u8 = 9;

/// Formats `value` scaled down by `10^decimals`, trimming trailing zeros.
///
/// `100 * 10^18` with 18 decimals formats as `"100"`, `1.5 * 10^18` as `"1.5"`.
pub fn format_units(value: U256, decimals: u8) -> String {
    let scale = U256::from(10u64).pow(U256::from(decimals));
    let whole = value / scale;
    let fractional = value % scale;

    if fractional.is_zero() {
        return whole.to_string();
    }

    let digits = fractional.to_string();
    let padded = format!("{:0>width$}", digits, width = decimals as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}

/// Formats wei as ETH, e.g. `"0.5 ETH"`.
pub fn format_ether(wei: U256) -> String {
    format!("{} ETH", format_units(wei, DEFAULT_DECIMALS))
}

/// Formats wei as gwei, e.g. `"150 gwei"`.
pub fn format_gwei(wei: U256) -> String {
    format!("{} gwei", format_units(wei, GWEI_DECIMALS))
}

/// Converts a whole-gwei amount to wei.
pub fn gwei_to_wei(gwei: u64) -> U256 {
    U256::from(gwei) * U256::from(1_000_000_000u64)
}

/// Parses a decimal amount such as `"0.5"` into base units with `decimals`.
///
/// Returns `None` for malformed input or more fractional digits than
/// `decimals` allows.
pub fn parse_units(value: &str, decimals: u8) -> Option<U256> {
    let trimmed = value.trim();
    let (whole, fractional) = match trimmed.split_once('.') {
        Some((whole, fractional)) => (whole, fractional),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fractional.is_empty() {
        return None;
    }
    if fractional.len() > decimals as usize
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fractional.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let scale = U256::from(10u64).pow(U256::from(decimals));
    let whole_units = if whole.is_empty() {
        U256::ZERO
    } else {
        whole.parse::<U256>().ok()?
    };
    let padded = format!("{:0<width$}", fractional, width = decimals as usize);
    let fractional_units = if padded.is_empty() {
        U256::ZERO
    } else {
        padded.parse::<U256>().ok()?
    };

    whole_units
        .checked_mul(scale)?
        .checked_add(fractional_units)
}
