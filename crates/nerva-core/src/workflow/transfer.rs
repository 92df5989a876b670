//! Handing a neuron to another principal: grant → verify → revoke.
//!
//! The recipient is given the full capability set and the grant is read back
//! before anything is removed, so the neuron always has at least one full
//! holder. Removal then takes every other holder's capabilities away, the
//! sender's last.

use crate::{
    Error,
    cdk::{candid::Principal, spec::sns::governance::NeuronId, types::Subaccount},
    domain::permission::CapabilitySet,
    error::StepFailure,
    log,
    log::Topic,
    policy::transfer::{
        Confirmation, is_sole_owner, missing_for_full, revocation_plan, validate_handoff,
    },
    workflow::{ProgressSink, Services, Session, Step, progress::Tracker},
};

///
/// SendNeuronRequest
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SendNeuronRequest {
    pub neuron: Subaccount,
    pub recipient: Principal,
    pub confirmation: Confirmation,
}

///
/// TransferStatus
///

#[derive(Debug)]
pub enum TransferStatus {
    /// The recipient is the only principal with any capability.
    Completed,

    /// The recipient holds every capability, but removal stopped at
    /// `principal`; `revoked` lists who was already removed.
    RevokeIncomplete {
        principal: Principal,
        cause: Error,
        revoked: Vec<Principal>,
    },

    /// Every removal was accepted but the final read did not confirm it.
    Unverified { cause: Error },
}

impl TransferStatus {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

///
/// OwnershipTransfer
///

#[derive(Debug)]
pub struct OwnershipTransfer {
    pub neuron_id: NeuronId,
    pub recipient: Principal,
    /// Capabilities the grant added; empty if the recipient already had them.
    pub granted: CapabilitySet,
    pub status: TransferStatus,
}

pub async fn send_neuron(
    services: Services<'_>,
    session: &Session,
    request: SendNeuronRequest,
    progress: &dyn ProgressSink,
) -> Result<OwnershipTransfer, StepFailure> {
    let tracker = Tracker::new(progress);
    let governance = services.governance_ops();
    let sender = governance.caller();
    let recipient = request.recipient;

    let _guard = session
        .acquire(request.neuron)
        .map_err(|e| tracker.fail(e))?;
    let neuron = governance
        .require_neuron(&request.neuron)
        .await
        .map_err(|e| tracker.fail(e))?;
    let params = session
        .parameters(&governance)
        .await
        .map_err(|e| tracker.fail(e))?;
    validate_handoff(&neuron, &params, sender, recipient, request.confirmation)
        .map_err(|e| tracker.fail(e))?;
    let neuron_id = neuron.id();

    // grant
    tracker.enter(Step::Granting);
    let granted = missing_for_full(&neuron, &recipient);
    if !granted.is_empty() {
        governance
            .add_permissions(&request.neuron, recipient, granted)
            .await
            .map_err(|e| tracker.fail(e))?;
    }

    // verify
    tracker.enter(Step::Verifying);
    let neuron = governance
        .require_neuron(&request.neuron)
        .await
        .map_err(|e| tracker.fail(e))?;
    let held = neuron.capabilities_of(&recipient);
    if !held.is_full() {
        return Err(tracker.fail(Error::Permission {
            command: "add_neuron_permissions",
            error_type: None,
            message: format!("{recipient} holds {held} after the grant"),
        }));
    }

    log!(Topic::Transfer, Info, "{recipient} holds every capability on {neuron_id}");

    // revoke
    tracker.enter(Step::Revoking);
    let mut revoked = Vec::new();
    for grant in revocation_plan(&neuron, &sender, &recipient) {
        if let Err(cause) = governance
            .remove_permissions(&request.neuron, grant.principal, grant.capabilities)
            .await
        {
            log!(
                Topic::Transfer,
                Warn,
                "neuron {neuron_id} handed to {recipient}, but {} keeps {}: {cause}",
                grant.principal,
                grant.capabilities
            );
            tracker.degrade(&cause);
            tracker.done();

            return Ok(OwnershipTransfer {
                neuron_id,
                recipient,
                granted,
                status: TransferStatus::RevokeIncomplete {
                    principal: grant.principal,
                    cause,
                    revoked,
                },
            });
        }
        revoked.push(grant.principal);
    }

    // confirm
    tracker.enter(Step::Verifying);
    let status = match governance.require_neuron(&request.neuron).await {
        Ok(neuron) if is_sole_owner(&neuron, &recipient) => TransferStatus::Completed,
        Ok(neuron) => {
            let others: Vec<String> = neuron
                .other_holders(&recipient)
                .iter()
                .map(|g| g.principal.to_string())
                .collect();
            TransferStatus::Unverified {
                cause: Error::invariant(format!(
                    "holders besides {recipient} remain: {}",
                    others.join(", ")
                )),
            }
        }
        Err(cause) => TransferStatus::Unverified { cause },
    };

    match &status {
        TransferStatus::Unverified { cause } => {
            log!(Topic::Transfer, Warn, "transfer of {neuron_id} unconfirmed: {cause}");
            tracker.degrade(cause);
        }
        _ => log!(Topic::Transfer, Ok, "neuron {neuron_id} now belongs to {recipient}"),
    }
    tracker.done();

    Ok(OwnershipTransfer {
        neuron_id,
        recipient,
        granted,
        status,
    })
}
