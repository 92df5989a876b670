//! Client seams for the two canisters Nerva talks to, plus a clock.
//!
//! Workflows only ever see these traits. `ic/` holds the implementations that
//! perform real inter-canister calls; tests substitute in-memory fakes.

pub mod ic;

use crate::{
    cdk::{
        candid::{Nat, Principal},
        spec::{
            icrc::icrc1::{TransferArg, TransferResult},
            sns::governance::{
                GetNeuron, GetNeuronResponse, ListNeurons, ListNeuronsResponse, ManageNeuron,
                ManageNeuronResponse, NervousSystemParameters,
            },
        },
        types::Account,
    },
    error::{Delivery, Error},
};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error as ThisError;

///
/// InfraError
/// Mechanical call failures, tagged with what is known about delivery.
///

#[derive(Debug, ThisError)]
pub enum InfraError {
    #[error("{method}: call was not executed: {message}")]
    NotExecuted { method: String, message: String },

    #[error("{method}: outcome unknown: {message}")]
    OutcomeUnknown { method: String, message: String },

    #[error("{method}: cannot encode arguments: {message}")]
    Encode { method: String, message: String },

    #[error("{method}: cannot decode reply: {message}")]
    Decode { method: String, message: String },
}

impl InfraError {
    #[must_use]
    pub const fn delivery(&self) -> Delivery {
        match self {
            Self::NotExecuted { .. } | Self::Encode { .. } => Delivery::NotExecuted,
            // a reply that cannot be decoded was still produced by an executed call
            Self::OutcomeUnknown { .. } | Self::Decode { .. } => Delivery::Unknown,
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::NotExecuted { method, .. }
            | Self::OutcomeUnknown { method, .. }
            | Self::Encode { method, .. }
            | Self::Decode { method, .. } => method,
        }
    }
}

impl From<InfraError> for Error {
    fn from(err: InfraError) -> Self {
        let message = match &err {
            InfraError::NotExecuted { message, .. }
            | InfraError::OutcomeUnknown { message, .. }
            | InfraError::Encode { message, .. }
            | InfraError::Decode { message, .. } => message.clone(),
        };

        Self::Network {
            method: err.method().to_string(),
            delivery: err.delivery(),
            message,
        }
    }
}

///
/// LedgerClient
/// The ICRC-1 ledger of the SNS token.
///

#[async_trait(?Send)]
pub trait LedgerClient {
    async fn icrc1_transfer(&self, arg: TransferArg) -> Result<TransferResult, InfraError>;

    async fn icrc1_balance_of(&self, account: Account) -> Result<Nat, InfraError>;
}

///
/// GovernanceClient
/// The SNS governance canister, seen from one calling principal.
///

#[async_trait(?Send)]
pub trait GovernanceClient {
    fn canister_id(&self) -> Principal;

    /// Principal that governance will see as the caller of `manage_neuron`.
    fn caller(&self) -> Principal;

    async fn manage_neuron(&self, arg: ManageNeuron) -> Result<ManageNeuronResponse, InfraError>;

    async fn get_neuron(&self, arg: GetNeuron) -> Result<GetNeuronResponse, InfraError>;

    async fn list_neurons(&self, arg: ListNeurons) -> Result<ListNeuronsResponse, InfraError>;

    async fn get_nervous_system_parameters(&self)
    -> Result<NervousSystemParameters, InfraError>;
}

///
/// Clock
///

#[async_trait(?Send)]
pub trait Clock {
    fn now_nanos(&self) -> u64;

    fn now_secs(&self) -> u64 {
        self.now_nanos() / 1_000_000_000
    }

    async fn sleep(&self, duration: Duration);
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infra_errors_map_to_network_delivery() {
        let err: Error = InfraError::Decode {
            method: "icrc1_transfer".into(),
            message: "bad reply".into(),
        }
        .into();

        assert!(matches!(
            err,
            Error::Network {
                delivery: Delivery::Unknown,
                ref method,
                ..
            } if method == "icrc1_transfer"
        ));

        let err: Error = InfraError::NotExecuted {
            method: "manage_neuron".into(),
            message: "queue full".into(),
        }
        .into();
        assert!(matches!(
            err,
            Error::Network {
                delivery: Delivery::NotExecuted,
                ..
            }
        ));
    }
}
