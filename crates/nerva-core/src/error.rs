use crate::{
    cdk::{
        candid::Principal,
        spec::icrc::icrc1::TransferError,
        types::{Tokens, TokensParseError},
    },
    config::ConfigError,
    domain::{
        DomainError,
        dissolve::{DissolveAction, DissolveStatus},
        permission::{Capability, CapabilitySet},
    },
    workflow::progress::Step,
};
use derive_more::Display;
use thiserror::Error as ThisError;

///
/// Error
///
/// Every failure a neuron operation can surface. The variant says what kind
/// of failure it is; [`StepFailure`] adds where in a workflow it happened.
///

#[derive(Debug, ThisError)]
pub enum Error {
    /// Rejected before any call was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The ledger refused the transfer; no funds moved.
    #[error(transparent)]
    Transfer(#[from] LedgerTransferError),

    /// Funds already sit at the neuron's subaccount but governance did not
    /// register or refresh the neuron.
    #[error("claim of neuron {subaccount} failed after funding: {message}")]
    Claim {
        subaccount: String,
        nonce: Option<u64>,
        message: String,
    },

    /// Governance refused a command, or a permission read-back did not hold.
    #[error("{command} refused: {message}")]
    Permission {
        command: &'static str,
        error_type: Option<i32>,
        message: String,
    },

    /// Transport failure; see [`Delivery`] for what is known about the call.
    #[error("{method} call failed ({delivery}): {message}")]
    Network {
        method: String,
        delivery: Delivery,
        message: String,
    },

    #[error("no free nonce below {limit}")]
    NonceExhausted { limit: u64 },

    #[error("neuron {0} not found")]
    NeuronNotFound(String),

    #[error("neuron {0} already has an operation in flight")]
    Busy(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::Validation,
            Self::Transfer(_) => ErrorClass::Transfer,
            Self::Claim { .. } => ErrorClass::Claim,
            Self::Permission { .. } => ErrorClass::Permission,
            Self::Network { .. } => ErrorClass::Network,
            Self::NonceExhausted { .. } | Self::NeuronNotFound(_) | Self::Busy(_) => {
                ErrorClass::Precondition
            }
            Self::Config(_) | Self::Domain(_) | Self::Invariant(_) => ErrorClass::Internal,
        }
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorClass {
    Claim,
    Internal,
    Network,
    Permission,
    Precondition,
    Transfer,
    Validation,
}

///
/// Delivery
/// What is known about a call that failed in transport.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Delivery {
    /// The call did not execute; retrying cannot duplicate it.
    #[display("not executed")]
    NotExecuted,

    /// The call may or may not have executed.
    #[display("outcome unknown")]
    Unknown,
}

///
/// ValidationError
///

#[derive(Debug, ThisError)]
pub enum ValidationError {
    #[error("invalid amount: {0}")]
    BadAmount(#[from] TokensParseError),

    #[error("invalid nonce '{0}': expected a non-negative integer")]
    BadNonce(String),

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("amount {0} overflows once the fee is added")]
    AmountOverflow(Tokens),

    #[error("stake {stake} is below the minimum stake {minimum}")]
    BelowMinimumStake { stake: Tokens, minimum: Tokens },

    #[error("split amount {amount} is below the minimum split {minimum} (minimum stake + fee)")]
    SplitBelowMinimum { amount: Tokens, minimum: Tokens },

    #[error("split of {amount} leaves {remainder}, below the minimum stake {minimum}")]
    SplitRemainderBelowMinimum {
        amount: Tokens,
        remainder: Tokens,
        minimum: Tokens,
    },

    #[error("nonce {nonce} is already used by an existing neuron")]
    NonceTaken { nonce: u64 },

    #[error("dissolve delay {requested}s exceeds the maximum {maximum}s")]
    DelayAboveMaximum { requested: u64, maximum: u64 },

    #[error("dissolve delay increase must be greater than zero")]
    ZeroDelayIncrease,

    #[error("recipient {0} already owns this neuron")]
    SelfTransfer(Principal),

    #[error("sending a neuron is irreversible and must be confirmed")]
    Unconfirmed,

    #[error("{principal} lacks {capability} on this neuron")]
    MissingCapability {
        principal: Principal,
        capability: Capability,
    },

    #[error("governance does not allow granting {0}")]
    NotGrantable(CapabilitySet),

    #[error("{action} is not permitted while the neuron is {status}")]
    ActionNotPermitted {
        action: DissolveAction,
        status: DissolveStatus,
    },

    #[error("auto-stake maturity is already {0}")]
    AutoStakeUnchanged(bool),

    #[error("disburse percentage {0} is outside 1..=100")]
    BadPercentage(u32),

    #[error("neuron has no maturity to disburse")]
    NoMaturity,
}

///
/// LedgerTransferError
/// Ledger-reported transfer rejections. The ledger state is unchanged.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum LedgerTransferError {
    #[error("insufficient funds: balance is {balance}")]
    InsufficientFunds { balance: Tokens },

    #[error("bad fee: the ledger expects {expected}")]
    BadFee { expected: Tokens },

    #[error("ledger error: {message}")]
    GenericError { message: String },
}

impl From<TransferError> for LedgerTransferError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::InsufficientFunds { balance } => Self::InsufficientFunds {
                balance: Tokens::from_nat_saturating(&balance),
            },
            TransferError::BadFee { expected_fee } => Self::BadFee {
                expected: Tokens::from_nat_saturating(&expected_fee),
            },
            TransferError::GenericError {
                error_code,
                message,
            } => Self::GenericError {
                message: format!("{message} (code {error_code})"),
            },
            other => Self::GenericError {
                message: format!("{other:?}"),
            },
        }
    }
}

///
/// Recovery
/// What the caller should do after a workflow failed.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Recovery {
    /// Change the request (amount, nonce, recipient, confirmation) first.
    #[display("revise the request")]
    ReviseRequest,

    /// Nothing changed remotely; the whole flow can run again.
    #[display("retry the whole operation")]
    RetryFlow,

    /// Earlier steps took effect; resume at this step only.
    #[display("retry the {_0} step only")]
    RetryStep(Step),

    /// Another operation on this neuron is in flight.
    #[display("wait for the in-flight operation")]
    Wait,

    /// Remote state is uncertain; inspect the neuron before doing anything.
    #[display("reconcile the neuron state manually")]
    Reconcile,
}

///
/// StepFailure
///

#[derive(Debug, ThisError)]
#[error("{step} failed: {error}")]
pub struct StepFailure {
    pub step: Step,
    pub error: Error,
}

impl StepFailure {
    #[must_use]
    pub const fn new(step: Step, error: Error) -> Self {
        Self { step, error }
    }

    #[must_use]
    pub const fn recovery(&self) -> Recovery {
        match &self.error {
            Error::Transfer(_) => Recovery::RetryFlow,
            Error::Claim { .. } => Recovery::RetryStep(Step::Claiming),
            Error::Network {
                delivery: Delivery::NotExecuted,
                ..
            } => match self.step {
                Step::Revoking => Recovery::Reconcile,
                step => Recovery::RetryStep(step),
            },
            Error::Network { .. } | Error::Invariant(_) | Error::Domain(_) => Recovery::Reconcile,
            Error::Permission { .. } if matches!(self.step, Step::Revoking) => Recovery::Reconcile,
            Error::Busy(_) => Recovery::Wait,
            Error::Validation(_)
            | Error::Permission { .. }
            | Error::NonceExhausted { .. }
            | Error::NeuronNotFound(_)
            | Error::Config(_) => Recovery::ReviseRequest,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdk::candid::Nat;

    #[test]
    fn ledger_errors_fold_into_three_kinds() {
        let insufficient = LedgerTransferError::from(TransferError::InsufficientFunds {
            balance: Nat::from(5u64),
        });
        assert_eq!(
            insufficient,
            LedgerTransferError::InsufficientFunds {
                balance: Tokens::from_e8s(5)
            }
        );

        let fee = LedgerTransferError::from(TransferError::BadFee {
            expected_fee: Nat::from(10_000u64),
        });
        assert_eq!(
            fee,
            LedgerTransferError::BadFee {
                expected: Tokens::from_e8s(10_000)
            }
        );

        assert!(matches!(
            LedgerTransferError::from(TransferError::TemporarilyUnavailable),
            LedgerTransferError::GenericError { .. }
        ));
    }

    #[test]
    fn recovery_follows_the_failed_phase() {
        let transfer = StepFailure::new(
            Step::Transferring,
            LedgerTransferError::GenericError {
                message: "x".into(),
            }
            .into(),
        );
        assert_eq!(transfer.recovery(), Recovery::RetryFlow);

        let claim = StepFailure::new(
            Step::Claiming,
            Error::Claim {
                subaccount: "00".into(),
                nonce: Some(1),
                message: "x".into(),
            },
        );
        assert_eq!(claim.recovery(), Recovery::RetryStep(Step::Claiming));

        let unknown = StepFailure::new(
            Step::Transferring,
            Error::Network {
                method: "icrc1_transfer".into(),
                delivery: Delivery::Unknown,
                message: "x".into(),
            },
        );
        assert_eq!(unknown.recovery(), Recovery::Reconcile);

        let undelivered = StepFailure::new(
            Step::Configuring,
            Error::Network {
                method: "manage_neuron".into(),
                delivery: Delivery::NotExecuted,
                message: "x".into(),
            },
        );
        assert_eq!(undelivered.recovery(), Recovery::RetryStep(Step::Configuring));

        let invalid = StepFailure::new(Step::Validating, ValidationError::Unconfirmed.into());
        assert_eq!(invalid.recovery(), Recovery::ReviseRequest);
        assert_eq!(invalid.error.class(), ErrorClass::Validation);
    }
}
