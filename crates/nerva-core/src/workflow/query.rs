//! Read-only views of neurons and the staking parameters.

use crate::{
    Error,
    cdk::{
        candid::Principal,
        types::{Account, Subaccount, Tokens},
    },
    domain::{
        dissolve::{DissolveAction, DissolveStatus},
        neuron::NeuronSnapshot,
        params::StakingParameters,
        voting_power::neuron_voting_power,
    },
    workflow::{Services, Session},
};

///
/// NeuronSummary
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NeuronSummary {
    pub neuron: NeuronSnapshot,
    pub status: DissolveStatus,
    pub dissolve_delay_seconds: u64,
    pub age_seconds: u64,
    pub permitted_actions: &'static [DissolveAction],
    pub voting_power: u64,
}

impl NeuronSummary {
    #[must_use]
    pub fn new(neuron: NeuronSnapshot, now: u64, params: &StakingParameters) -> Self {
        let status = neuron.dissolve_status(now);

        Self {
            status,
            dissolve_delay_seconds: status.remaining_delay(now),
            age_seconds: neuron.age_seconds(now),
            permitted_actions: status.permitted_actions(),
            voting_power: neuron_voting_power(&neuron, now, params),
            neuron,
        }
    }
}

pub async fn get_neuron(
    services: Services<'_>,
    session: &Session,
    neuron: &Subaccount,
) -> Result<NeuronSummary, Error> {
    let governance = services.governance_ops();
    let params = session.parameters(&governance).await?;
    let snapshot = governance.require_neuron(neuron).await?;

    Ok(NeuronSummary::new(snapshot, services.clock.now_secs(), &params))
}

/// Neurons `owner` holds any capability on, up to the session's list limit.
pub async fn list_neurons(
    services: Services<'_>,
    session: &Session,
    owner: Principal,
) -> Result<Vec<NeuronSummary>, Error> {
    let governance = services.governance_ops();
    let params = session.parameters(&governance).await?;
    let now = services.clock.now_secs();

    let neurons = governance
        .list_neurons(owner, session.settings().list_limit)
        .await?;

    Ok(neurons
        .into_iter()
        .map(|n| NeuronSummary::new(n, now, &params))
        .collect())
}

pub async fn parameters(
    services: Services<'_>,
    session: &Session,
) -> Result<StakingParameters, Error> {
    session.parameters(&services.governance_ops()).await
}

/// Ledger balance of a neuron's subaccount, which may run ahead of the
/// cached stake until the neuron is refreshed.
pub async fn staking_balance(services: Services<'_>, neuron: Subaccount) -> Result<Tokens, Error> {
    let account = Account {
        owner: services.governance.canister_id(),
        subaccount: Some(neuron),
    };

    services.ledger_ops().balance_of(account).await
}
