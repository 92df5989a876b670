//! Splitting stake off into a new neuron.

use crate::{
    cdk::{
        spec::sns::governance::NeuronId,
        types::{Subaccount, Tokens},
    },
    domain::permission::Capability,
    error::StepFailure,
    log,
    log::Topic,
    policy::{require_capability, split::validate_split},
    workflow::{ProgressSink, Services, Session, Step, nonce::allocate_nonce, progress::Tracker},
};

///
/// SplitRequest
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SplitRequest {
    pub neuron: Subaccount,
    pub amount: Tokens,
    /// Memo the child neuron is derived from; `None` picks the caller's
    /// lowest free nonce.
    pub memo: Option<u64>,
}

///
/// SplitOutcome
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SplitOutcome {
    pub created_neuron_id: NeuronId,
    pub memo: u64,
    /// Stake the source neuron keeps.
    pub remaining_stake: Tokens,
}

pub async fn split_neuron(
    services: Services<'_>,
    session: &Session,
    request: SplitRequest,
    progress: &dyn ProgressSink,
) -> Result<SplitOutcome, StepFailure> {
    let tracker = Tracker::new(progress);
    let governance = services.governance_ops();
    let caller = governance.caller();

    let _guard = session
        .acquire(request.neuron)
        .map_err(|e| tracker.fail(e))?;
    let params = session
        .parameters(&governance)
        .await
        .map_err(|e| tracker.fail(e))?;

    // always a fresh read: the stake may have moved since the last look
    let neuron = governance
        .require_neuron(&request.neuron)
        .await
        .map_err(|e| tracker.fail(e))?;
    require_capability(&neuron, caller, Capability::Split).map_err(|e| tracker.fail(e))?;
    let remaining_stake = validate_split(neuron.effective_stake(), request.amount, &params)
        .map_err(|e| tracker.fail(e))?;

    let memo = match request.memo {
        Some(memo) => memo,
        None => {
            tracker.enter(Step::Allocating);
            allocate_nonce(services, session, caller)
                .await
                .map_err(|e| tracker.fail(e))?
        }
    };

    tracker.enter(Step::Splitting);
    let created_neuron_id = governance
        .split(&request.neuron, request.amount, memo)
        .await
        .map_err(|e| tracker.fail(e))?;

    if let Some(child) = created_neuron_id.subaccount() {
        session.mark_taken(child);
    }

    log!(
        Topic::Split,
        Ok,
        "split {} off neuron {} into {created_neuron_id}",
        request.amount,
        neuron.id()
    );
    tracker.done();

    Ok(SplitOutcome {
        created_neuron_id,
        memo,
        remaining_stake,
    })
}
