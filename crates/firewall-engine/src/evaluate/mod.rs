//! Priority-ordered risk evaluators.
//!
//! - [`critical`]: conditions that classify as High and override everything
//! - [`caution`]: stackable medium-risk findings
//! - [`safe`]: default classification for unflagged transactions

pub mod caution;
pub mod critical;
pub mod safe;

pub use caution::{evaluate_caution, CautionReport};
pub use critical::evaluate_critical;
pub use safe::{evaluate_safe, SafeOutcome};
