use crate::{
    Error,
    cdk::{
        candid::Nat,
        spec::icrc::icrc1::{Memo, TransferArg, TransferError},
        types::{Account, Tokens},
    },
    error::LedgerTransferError,
    infra::LedgerClient,
    log,
    log::Topic,
};

///
/// LedgerOps
///

pub struct LedgerOps<'a> {
    client: &'a dyn LedgerClient,
}

impl<'a> LedgerOps<'a> {
    #[must_use]
    pub const fn new(client: &'a dyn LedgerClient) -> Self {
        Self { client }
    }

    /// ICRC-1 transfer from the caller's default account.
    ///
    /// A `Duplicate` rejection means an identical transfer already landed,
    /// so its block index is returned as the result.
    pub async fn transfer(
        &self,
        to: Account,
        amount: Tokens,
        fee: Tokens,
        memo: Option<&[u8]>,
        created_at_time: u64,
    ) -> Result<Nat, Error> {
        let arg = TransferArg {
            from_subaccount: None,
            to,
            fee: Some(fee.to_nat()),
            created_at_time: Some(created_at_time),
            memo: memo.map(|m| Memo::from(m.to_vec())),
            amount: amount.to_nat(),
        };

        match self.client.icrc1_transfer(arg).await? {
            Ok(block_index) => Ok(block_index),
            Err(TransferError::Duplicate { duplicate_of }) => {
                log!(
                    Topic::Ledger,
                    Warn,
                    "transfer of {amount} to {to} already recorded at block {duplicate_of}"
                );
                Ok(duplicate_of)
            }
            Err(err) => Err(LedgerTransferError::from(err).into()),
        }
    }

    pub async fn balance_of(&self, account: Account) -> Result<Tokens, Error> {
        let balance = self.client.icrc1_balance_of(account).await?;

        Ok(Tokens::from_nat_saturating(&balance))
    }
}
