//! firewall-engine crate
//!
//! Pre-signing risk analysis: calldata decoding, the three priority-ordered
//! evaluators, and the resolver that combines them into one verdict.

pub mod config;
pub mod decoder;
pub mod evaluate;
pub mod format;
pub mod gate;
pub mod lookup;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use config::FirewallConfig;
pub use decoder::{decode, CallParams, DecodeOutcome, DecodedCall};
pub use gate::{acknowledgement_authorizes, ConfirmationGate, HIGH_RISK_ACKNOWLEDGEMENT};
pub use resolver::{Resolution, RiskEngine, Stage};
