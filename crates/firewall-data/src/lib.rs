//! firewall-data crate
//!
//! Transaction and verdict types shared by the firewall, the oracle traits the
//! risk engine consumes, and their JSON-RPC / Etherscan implementations.

pub mod etherscan;
pub mod oracle;
pub mod rpc;
pub mod types;

pub use oracle::{ChainOracle, NoSimulation, SimulationOutcome, Simulator, SourceVerifier};
pub use types::{FunctionKind, RiskAssessment, RiskLevel, Transaction};
