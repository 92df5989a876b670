//!
//! Shared value types re-exported for the ops and workflow layers so callers
//! can `use nerva_cdk::types::*` without reaching into SDK crates.
//!

mod tokens;

pub use crate::icrc_ledger_types::icrc1::account::{Account, Subaccount};
pub use candid::{Int, Nat, Principal};
pub use tokens::*;
