//! Risk engine configuration.

use std::time::Duration;

use alloy::primitives::U256;

use crate::format::gwei_to_wei;

/// Default per-call oracle timeout.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Gas price (in gwei) above which a transaction gets a caution finding.
pub const DEFAULT_HIGH_GAS_PRICE_GWEI: u64 = 100;

/// Tunables for [`crate::RiskEngine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirewallConfig {
    /// Upper bound on each oracle call; a timeout counts as "unknown".
    pub oracle_timeout: Duration,
    /// Gas price threshold in gwei (strictly greater triggers the rule).
    pub high_gas_price_gwei: u64,
    /// Value threshold in wei for the large-transfer rule. `None` disables it.
    pub large_value_wei: Option<U256>,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            high_gas_price_gwei: DEFAULT_HIGH_GAS_PRICE_GWEI,
            large_value_wei: None,
        }
    }
}

impl FirewallConfig {
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub fn with_high_gas_price_gwei(mut self, gwei: u64) -> Self {
        self.high_gas_price_gwei = gwei;
        self
    }

    pub fn with_large_value_wei(mut self, wei: Option<U256>) -> Self {
        self.large_value_wei = wei;
        self
    }

    /// Gas price threshold converted to wei.
    pub fn high_gas_price_wei(&self) -> U256 {
        gwei_to_wei(self.high_gas_price_gwei)
    }
}
