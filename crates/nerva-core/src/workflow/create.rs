//! Neuron creation: fund a fresh staking subaccount, then claim it.
//!
//! Order: validate → pick nonce → derive account → transfer → wait for
//! settlement → claim → optionally increase the dissolve delay. Once the
//! transfer has landed the funds are at the subaccount; a failed claim can be
//! resumed with [`retry_claim`] without sending them again.

use crate::{
    Error,
    cdk::{
        candid::{Nat, Principal},
        spec::sns::governance::{IncreaseDissolveDelay, NeuronId, Operation},
        types::{Subaccount, Tokens},
    },
    domain::subaccount::{creation_memo, neuron_subaccount, staking_account},
    error::{StepFailure, ValidationError},
    log,
    log::Topic,
    policy::stake::validate_creation,
    workflow::{
        ProgressSink, Services, Session, Step,
        nonce::{NonceSlot, allocate_nonce, check_nonce},
        progress::Tracker,
    },
};

///
/// NonceChoice
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NonceChoice {
    /// Lowest free nonce.
    Next,

    /// This nonce, which must be free.
    Exact(u64),
}

///
/// CreateNeuronRequest
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CreateNeuronRequest {
    pub owner: Principal,
    pub stake: Tokens,
    pub nonce: NonceChoice,
    /// Zero leaves the neuron dissolved.
    pub dissolve_delay_seconds: u64,
}

///
/// DelayOutcome
///

#[derive(Debug)]
pub enum DelayOutcome {
    NotRequested,
    Applied { seconds: u32 },
    /// The neuron exists but keeps no delay; set it again later.
    Failed(Error),
}

///
/// NeuronCreated
///

#[derive(Debug)]
pub struct NeuronCreated {
    pub neuron_id: NeuronId,
    pub nonce: u64,
    pub subaccount: Subaccount,
    pub block_index: Nat,
    pub delay: DelayOutcome,
}

pub async fn create_neuron(
    services: Services<'_>,
    session: &Session,
    request: CreateNeuronRequest,
    progress: &dyn ProgressSink,
) -> Result<NeuronCreated, StepFailure> {
    let tracker = Tracker::new(progress);
    let governance = services.governance_ops();
    let ledger = services.ledger_ops();
    let owner = request.owner;

    let params = session
        .parameters(&governance)
        .await
        .map_err(|e| tracker.fail(e))?;
    let plan = validate_creation(request.stake, request.dissolve_delay_seconds, &params)
        .map_err(|e| tracker.fail(e))?;

    // nonce
    tracker.enter(Step::Allocating);
    let nonce = match request.nonce {
        NonceChoice::Next => allocate_nonce(services, session, owner)
            .await
            .map_err(|e| tracker.fail(e))?,
        NonceChoice::Exact(nonce) => {
            let slot = check_nonce(services, session, owner, nonce)
                .await
                .map_err(|e| tracker.fail(e))?;
            if slot == NonceSlot::Taken {
                return Err(tracker.fail(ValidationError::NonceTaken { nonce }));
            }
            nonce
        }
    };

    // account
    tracker.enter(Step::Deriving);
    let subaccount = neuron_subaccount(&owner, nonce);
    let account = staking_account(governance.canister_id(), &owner, nonce);
    let _guard = session.acquire(subaccount).map_err(|e| tracker.fail(e))?;

    // funds
    tracker.enter(Step::Transferring);
    let memo = creation_memo(nonce);
    let block_index = ledger
        .transfer(
            account,
            plan.transfer_amount,
            plan.fee,
            Some(memo.as_slice()),
            services.clock.now_nanos(),
        )
        .await
        .map_err(|e| tracker.fail(e))?;
    session.mark_taken(subaccount);

    log!(
        Topic::Stake,
        Ok,
        "funded {account} with {} for nonce {nonce} (block {block_index})",
        plan.transfer_amount
    );

    tracker.enter(Step::AwaitingSettlement);
    services.clock.sleep(session.settings().settlement_delay).await;

    // claim
    tracker.enter(Step::Claiming);
    let neuron_id = claim(services, owner, nonce, &subaccount)
        .await
        .map_err(|e| tracker.fail(e))?;

    // delay
    let delay = if plan.dissolve_delay_seconds == 0 {
        DelayOutcome::NotRequested
    } else {
        tracker.enter(Step::Configuring);
        let op = Operation::IncreaseDissolveDelay(IncreaseDissolveDelay {
            additional_dissolve_delay_seconds: plan.dissolve_delay_seconds,
        });

        match governance.configure(&subaccount, op).await {
            Ok(()) => DelayOutcome::Applied {
                seconds: plan.dissolve_delay_seconds,
            },
            Err(err) => {
                log!(
                    Topic::Dissolve,
                    Warn,
                    "neuron {neuron_id} created without its dissolve delay: {err}"
                );
                tracker.degrade(&err);
                DelayOutcome::Failed(err)
            }
        }
    };

    tracker.done();

    Ok(NeuronCreated {
        neuron_id,
        nonce,
        subaccount,
        block_index,
        delay,
    })
}

/// Resume a creation whose funding transfer landed but whose claim failed.
pub async fn retry_claim(
    services: Services<'_>,
    session: &Session,
    owner: Principal,
    nonce: u64,
    progress: &dyn ProgressSink,
) -> Result<NeuronId, StepFailure> {
    let tracker = Tracker::new(progress);
    let subaccount = neuron_subaccount(&owner, nonce);
    let _guard = session.acquire(subaccount).map_err(|e| tracker.fail(e))?;

    tracker.enter(Step::Claiming);
    let neuron_id = claim(services, owner, nonce, &subaccount)
        .await
        .map_err(|e| tracker.fail(e))?;
    session.mark_taken(subaccount);

    tracker.done();

    Ok(neuron_id)
}

// every claim failure happens after funding, so it is reported as a claim error
async fn claim(
    services: Services<'_>,
    owner: Principal,
    nonce: u64,
    subaccount: &Subaccount,
) -> Result<NeuronId, Error> {
    match services
        .governance_ops()
        .claim_by_memo(subaccount, nonce, owner)
        .await
    {
        Ok(neuron_id) => {
            log!(Topic::Governance, Ok, "claimed neuron {neuron_id} for {owner}");
            Ok(neuron_id)
        }
        Err(err) => {
            log!(Topic::Governance, Error, "claim for {owner} nonce {nonce} failed: {err}");
            Err(Error::Claim {
                subaccount: hex::encode(subaccount),
                nonce: Some(nonce),
                message: err.to_string(),
            })
        }
    }
}
