//! Typed ledger and governance operations.
//!
//! Ops own the candid shapes of each command and turn raw replies into
//! Nerva types and errors. They hold no policy and no workflow state.

pub mod governance;
pub mod ledger;

pub use {governance::GovernanceOps, ledger::LedgerOps};
