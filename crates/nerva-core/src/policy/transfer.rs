//! Guards and planning for handing a neuron to another principal.

use crate::{
    cdk::candid::Principal,
    domain::{
        neuron::NeuronSnapshot,
        params::StakingParameters,
        permission::{Capability, CapabilitySet, Grant},
    },
    error::ValidationError,
    policy::require_capability,
};

///
/// Confirmation
/// Sending a neuron cannot be undone; callers must opt in explicitly.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Confirmation {
    Confirmed,
    Unconfirmed,
}

/// Checks that hold before any permission is touched.
pub fn validate_handoff(
    neuron: &NeuronSnapshot,
    params: &StakingParameters,
    sender: Principal,
    recipient: Principal,
    confirmation: Confirmation,
) -> Result<(), ValidationError> {
    if recipient == sender {
        return Err(ValidationError::SelfTransfer(recipient));
    }
    if confirmation != Confirmation::Confirmed {
        return Err(ValidationError::Unconfirmed);
    }
    require_capability(neuron, sender, Capability::ManagePrincipals)?;

    // governance refuses grants outside its grantable set
    let missing = missing_for_full(neuron, &recipient);
    if let Some(grantable) = params.grantable
        && !grantable.is_superset(missing)
    {
        return Err(ValidationError::NotGrantable(missing.difference(grantable)));
    }

    Ok(())
}

/// Capabilities the recipient still needs to hold the full set.
#[must_use]
pub fn missing_for_full(neuron: &NeuronSnapshot, recipient: &Principal) -> CapabilitySet {
    CapabilitySet::FULL.difference(neuron.capabilities_of(recipient))
}

/// Removals that leave `recipient` as the only holder.
///
/// Each entry removes exactly what its principal holds now. The sender goes
/// last so it keeps `ManagePrincipals` while the others are removed.
#[must_use]
pub fn revocation_plan(
    neuron: &NeuronSnapshot,
    sender: &Principal,
    recipient: &Principal,
) -> Vec<Grant> {
    let (mut senders, mut plan): (Vec<Grant>, Vec<Grant>) = neuron
        .other_holders(recipient)
        .into_iter()
        .partition(|g| &g.principal == sender);

    plan.append(&mut senders);
    plan
}

/// True when `recipient` is the sole holder of any capability and holds all of them.
#[must_use]
pub fn is_sole_owner(neuron: &NeuronSnapshot, recipient: &Principal) -> bool {
    neuron.capabilities_of(recipient).is_full() && neuron.other_holders(recipient).is_empty()
}

///
/// TESTS
///
