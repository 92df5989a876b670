//! Host-side test doubles for Nerva.
//!
//! [`Sandbox`] simulates an ICRC-1 ledger and an SNS governance canister
//! sharing one in-memory state, plus a clock that only moves when told to.
//! Faults can be queued against specific calls to drive failure paths.

mod clock;
mod governance;
mod ledger;
mod sandbox;

pub use clock::SandboxClock;
pub use governance::SandboxGovernance;
pub use ledger::SandboxLedger;
pub use sandbox::{Call, CommandKind, Fault, FaultPoint, LedgerBlock, Sandbox, SandboxHandles};

use nerva_cdk::types::{Account, Principal};

///
/// Fake
///

pub struct Fake;

impl Fake {
    ///
    /// Deterministically derive an [`Account`] from `seed`.
    ///
    #[must_use]
    pub fn account(seed: u32) -> Account {
        let mut sub = [0u8; 32];
        sub[..4].copy_from_slice(&seed.to_be_bytes());

        Account {
            owner: Self::principal(seed),
            subaccount: Some(sub),
        }
    }

    ///
    /// Deterministically derive a [`Principal`] from `seed`.
    ///
    #[must_use]
    pub fn principal(seed: u32) -> Principal {
        let mut buf = [0u8; 29];
        buf[..4].copy_from_slice(&seed.to_be_bytes());

        Principal::from_slice(&buf)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_principals_are_deterministic_and_distinct() {
        assert_eq!(Fake::principal(7), Fake::principal(7));
        assert_ne!(Fake::principal(7), Fake::principal(8));
        assert_eq!(Fake::account(7).owner, Fake::principal(7));
    }
}
