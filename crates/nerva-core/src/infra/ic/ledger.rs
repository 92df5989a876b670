//! ICRC-1 ledger over inter-canister calls.

use crate::{
    cdk::{
        candid::{Nat, Principal},
        spec::icrc::icrc1::{TransferArg, TransferResult},
        types::Account,
    },
    infra::{InfraError, LedgerClient, ic::call::Call},
};
use async_trait::async_trait;

///
/// IcLedger
///

#[derive(Clone, Copy, Debug)]
pub struct IcLedger {
    canister_id: Principal,
}

impl IcLedger {
    #[must_use]
    pub const fn new(canister_id: Principal) -> Self {
        Self { canister_id }
    }
}

#[async_trait(?Send)]
impl LedgerClient for IcLedger {
    async fn icrc1_transfer(&self, arg: TransferArg) -> Result<TransferResult, InfraError> {
        Call::unbounded_wait(self.canister_id, "icrc1_transfer")
            .try_with_arg(arg)?
            .execute()
            .await?
            .candid()
    }

    async fn icrc1_balance_of(&self, account: Account) -> Result<Nat, InfraError> {
        Call::bounded_wait(self.canister_id, "icrc1_balance_of")
            .try_with_arg(account)?
            .execute()
            .await?
            .candid()
    }
}
