//!
//! ICRC-1 ledger bindings used for neuron funding.
//!

pub use crate::icrc_ledger_types::icrc1::transfer::{BlockIndex, Memo, TransferArg, TransferError};

/// Raw `icrc1_transfer` reply.
pub type TransferResult = Result<BlockIndex, TransferError>;
