//!
//! Canonical representations of external IC specs (ICRC ledgers, SNS
//! governance). This module corrals the verbose candid bindings so the rest of
//! the codebase can import clean wrappers with consistent naming.
//!

pub mod icrc;
pub mod sns;

/// Shared imports for spec modules so type definitions stay concise.
pub mod prelude {
    pub use crate::{
        candid::{CandidType, Principal},
        types::{Account, Nat, Subaccount},
    };
    pub use serde::{Deserialize, Serialize};
    pub use serde_bytes::ByteBuf;
}
