//! Inter-canister implementations of the client seams.
//!
//! Everything here is mechanical: build the candid arguments, perform the
//! call, decode the reply. No validation and no logging.

pub mod call;
pub mod clock;
pub mod governance;
pub mod ledger;

pub use {clock::IcClock, governance::IcGovernance, ledger::IcLedger};
