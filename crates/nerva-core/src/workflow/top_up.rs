//! Adding stake to an existing neuron.
//!
//! The tokens go straight to the neuron's subaccount; governance only counts
//! them after a refresh by neuron id.

use crate::{
    Error,
    cdk::{
        candid::Nat,
        spec::sns::governance::NeuronId,
        types::{Account, Subaccount, Tokens},
    },
    error::StepFailure,
    log,
    log::Topic,
    policy::stake::validate_top_up,
    workflow::{ProgressSink, Services, Session, Step, progress::Tracker},
};

///
/// TopUpRequest
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TopUpRequest {
    pub neuron: Subaccount,
    pub amount: Tokens,
}

///
/// ToppedUp
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToppedUp {
    pub neuron_id: NeuronId,
    pub block_index: Nat,
    /// Cached stake after the refresh; `None` if the read-back failed.
    pub cached_stake: Option<Tokens>,
}

pub async fn top_up_neuron(
    services: Services<'_>,
    session: &Session,
    request: TopUpRequest,
    progress: &dyn ProgressSink,
) -> Result<ToppedUp, StepFailure> {
    let tracker = Tracker::new(progress);
    let governance = services.governance_ops();
    let subaccount = request.neuron;

    let amount = validate_top_up(request.amount).map_err(|e| tracker.fail(e))?;
    let params = session
        .parameters(&governance)
        .await
        .map_err(|e| tracker.fail(e))?;
    let _guard = session.acquire(subaccount).map_err(|e| tracker.fail(e))?;
    governance
        .require_neuron(&subaccount)
        .await
        .map_err(|e| tracker.fail(e))?;

    tracker.enter(Step::Transferring);
    let account = Account {
        owner: governance.canister_id(),
        subaccount: Some(subaccount),
    };
    let block_index = services
        .ledger_ops()
        .transfer(
            account,
            amount,
            params.transaction_fee,
            None,
            services.clock.now_nanos(),
        )
        .await
        .map_err(|e| tracker.fail(e))?;

    tracker.enter(Step::AwaitingSettlement);
    services.clock.sleep(session.settings().settlement_delay).await;

    tracker.enter(Step::Claiming);
    let neuron_id = governance
        .refresh(&subaccount)
        .await
        .map_err(|err| {
            tracker.fail(Error::Claim {
                subaccount: hex::encode(subaccount),
                nonce: None,
                message: err.to_string(),
            })
        })?;

    log!(Topic::Stake, Ok, "topped up neuron {neuron_id} with {amount}");

    tracker.enter(Step::Querying);
    let cached_stake = match governance.require_neuron(&subaccount).await {
        Ok(neuron) => Some(neuron.cached_stake),
        Err(err) => {
            tracker.degrade(&err);
            None
        }
    };

    tracker.done();

    Ok(ToppedUp {
        neuron_id,
        block_index,
        cached_stake,
    })
}
