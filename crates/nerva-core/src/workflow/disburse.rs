//! Paying out a dissolved neuron's stake, or a share of its maturity.

use crate::{
    cdk::types::{Account, Subaccount, Tokens},
    domain::{dissolve::DissolveAction, permission::Capability},
    error::StepFailure,
    log,
    log::Topic,
    policy::{
        dissolve::{validate_action, validate_disburse_maturity},
        require_capability,
    },
    workflow::{ProgressSink, Services, Session, Step, progress::Tracker},
};

///
/// DisburseRequest
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DisburseRequest {
    pub neuron: Subaccount,
    /// Defaults to the caller's account.
    pub to: Option<Account>,
    /// Defaults to the whole stake.
    pub amount: Option<Tokens>,
}

///
/// DisburseMaturityRequest
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DisburseMaturityRequest {
    pub neuron: Subaccount,
    pub to: Option<Account>,
    /// Share of current maturity, `1..=100`.
    pub percentage: u32,
}

///
/// MaturityDisbursed
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MaturityDisbursed {
    pub amount_disbursed: Tokens,
    pub amount_deducted: Option<Tokens>,
}

/// Disburse stake; only a dissolved neuron can pay out. Returns the ledger
/// block height of the payout.
pub async fn disburse(
    services: Services<'_>,
    session: &Session,
    request: DisburseRequest,
    progress: &dyn ProgressSink,
) -> Result<u64, StepFailure> {
    let tracker = Tracker::new(progress);
    let governance = services.governance_ops();

    let _guard = session
        .acquire(request.neuron)
        .map_err(|e| tracker.fail(e))?;
    let neuron = governance
        .require_neuron(&request.neuron)
        .await
        .map_err(|e| tracker.fail(e))?;
    require_capability(&neuron, governance.caller(), Capability::Disburse)
        .map_err(|e| tracker.fail(e))?;
    validate_action(
        neuron.dissolve_status(services.clock.now_secs()),
        DissolveAction::Disburse,
    )
    .map_err(|e| tracker.fail(e))?;

    tracker.enter(Step::Disbursing);
    let block_height = governance
        .disburse(&request.neuron, request.to, request.amount)
        .await
        .map_err(|e| tracker.fail(e))?;

    log!(
        Topic::Stake,
        Ok,
        "disbursed neuron {} at block {block_height}",
        neuron.id()
    );
    tracker.done();

    Ok(block_height)
}

pub async fn disburse_maturity(
    services: Services<'_>,
    session: &Session,
    request: DisburseMaturityRequest,
    progress: &dyn ProgressSink,
) -> Result<MaturityDisbursed, StepFailure> {
    let tracker = Tracker::new(progress);
    let governance = services.governance_ops();

    let _guard = session
        .acquire(request.neuron)
        .map_err(|e| tracker.fail(e))?;
    let neuron = governance
        .require_neuron(&request.neuron)
        .await
        .map_err(|e| tracker.fail(e))?;
    require_capability(&neuron, governance.caller(), Capability::DisburseMaturity)
        .map_err(|e| tracker.fail(e))?;
    validate_disburse_maturity(&neuron, request.percentage).map_err(|e| tracker.fail(e))?;

    tracker.enter(Step::Disbursing);
    let res = governance
        .disburse_maturity(&request.neuron, request.to, request.percentage)
        .await
        .map_err(|e| tracker.fail(e))?;

    let disbursed = MaturityDisbursed {
        amount_disbursed: Tokens::from_e8s(res.amount_disbursed_e8s),
        amount_deducted: res.amount_deducted_e8s.map(Tokens::from_e8s),
    };
    log!(
        Topic::Stake,
        Ok,
        "disbursing {}% of maturity from neuron {}: {}",
        request.percentage,
        neuron.id(),
        disbursed.amount_disbursed
    );
    tracker.done();

    Ok(disbursed)
}
