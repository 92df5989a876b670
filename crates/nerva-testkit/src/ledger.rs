use crate::{
    Sandbox,
    sandbox::{Call, Fault, FaultPoint},
};
use async_trait::async_trait;
use nerva_cdk::{
    spec::icrc::icrc1::{TransferArg, TransferError, TransferResult},
    types::{Account, Nat, Principal, Tokens},
};
use nerva_core::infra::{InfraError, LedgerClient};

///
/// SandboxLedger
/// ICRC-1 semantics: fee check, balance check, deduplication on
/// `created_at_time`.
///

#[derive(Clone)]
pub struct SandboxLedger {
    sandbox: Sandbox,
    caller: Principal,
}

impl SandboxLedger {
    pub(crate) const fn new(sandbox: Sandbox, caller: Principal) -> Self {
        Self { sandbox, caller }
    }
}

#[async_trait(?Send)]
impl LedgerClient for SandboxLedger {
    async fn icrc1_transfer(&self, arg: TransferArg) -> Result<TransferResult, InfraError> {
        let mut state = self.sandbox.state.borrow_mut();

        let amount = Tokens::from_nat_saturating(&arg.amount).e8s();
        let memo = arg.memo.as_ref().map(|m| m.0.to_vec());
        state.calls.push(Call::Transfer {
            from: self.caller,
            to: arg.to,
            amount,
            fee: arg.fee.as_ref().map(|f| Tokens::from_nat_saturating(f).e8s()),
            memo: memo.clone(),
        });

        if let Some(fault) = state.take_fault(FaultPoint::Transfer) {
            let err = match fault.into_reply("icrc1_transfer")? {
                Fault::Ledger(err) => err,
                Fault::Reject {
                    error_type,
                    message,
                } => TransferError::GenericError {
                    error_code: Nat::from(u64::try_from(error_type).unwrap_or_default()),
                    message,
                },
                Fault::NotExecuted | Fault::OutcomeUnknown => TransferError::TemporarilyUnavailable,
            };
            return Ok(Err(err));
        }

        let fee = state.fee();
        if let Some(given) = &arg.fee
            && *given != Nat::from(fee)
        {
            return Ok(Err(TransferError::BadFee {
                expected_fee: Nat::from(fee),
            }));
        }

        let from = Account {
            owner: self.caller,
            subaccount: arg.from_subaccount,
        };

        if arg.created_at_time.is_some()
            && let Some(index) = state.blocks.iter().position(|b| {
                b.from == Some(Account {
                    owner: from.owner,
                    subaccount: Some(*from.effective_subaccount()),
                }) && b.to.owner == arg.to.owner
                    && b.to.effective_subaccount() == arg.to.effective_subaccount()
                    && b.amount == amount
                    && b.memo == memo
                    && b.created_at_time == arg.created_at_time
            })
        {
            return Ok(Err(TransferError::Duplicate {
                duplicate_of: Nat::from(index as u64),
            }));
        }

        Ok(state
            .move_tokens(&from, &arg.to, amount, fee, memo, arg.created_at_time)
            .map(Nat::from))
    }

    async fn icrc1_balance_of(&self, account: Account) -> Result<Nat, InfraError> {
        let mut state = self.sandbox.state.borrow_mut();
        state.calls.push(Call::BalanceOf(account));

        Ok(Nat::from(state.balance(&account)))
    }
}
