//! SNS governance over inter-canister calls. The calling canister is the
//! principal governance authorizes `manage_neuron` against.

use crate::{
    cdk::{
        api::canister_self,
        candid::Principal,
        spec::sns::governance::{
            GetNeuron, GetNeuronResponse, ListNeurons, ListNeuronsResponse, ManageNeuron,
            ManageNeuronResponse, NervousSystemParameters,
        },
    },
    infra::{GovernanceClient, InfraError, ic::call::Call},
};
use async_trait::async_trait;

///
/// IcGovernance
///

#[derive(Clone, Copy, Debug)]
pub struct IcGovernance {
    canister_id: Principal,
}

impl IcGovernance {
    #[must_use]
    pub const fn new(canister_id: Principal) -> Self {
        Self { canister_id }
    }
}

#[async_trait(?Send)]
impl GovernanceClient for IcGovernance {
    fn canister_id(&self) -> Principal {
        self.canister_id
    }

    fn caller(&self) -> Principal {
        canister_self()
    }

    async fn manage_neuron(&self, arg: ManageNeuron) -> Result<ManageNeuronResponse, InfraError> {
        Call::unbounded_wait(self.canister_id, "manage_neuron")
            .try_with_arg(arg)?
            .execute()
            .await?
            .candid()
    }

    async fn get_neuron(&self, arg: GetNeuron) -> Result<GetNeuronResponse, InfraError> {
        Call::bounded_wait(self.canister_id, "get_neuron")
            .try_with_arg(arg)?
            .execute()
            .await?
            .candid()
    }

    async fn list_neurons(&self, arg: ListNeurons) -> Result<ListNeuronsResponse, InfraError> {
        Call::bounded_wait(self.canister_id, "list_neurons")
            .try_with_arg(arg)?
            .execute()
            .await?
            .candid()
    }

    async fn get_nervous_system_parameters(
        &self,
    ) -> Result<NervousSystemParameters, InfraError> {
        Call::bounded_wait(self.canister_id, "get_nervous_system_parameters")
            .try_with_arg(())?
            .execute()
            .await?
            .candid()
    }
}
