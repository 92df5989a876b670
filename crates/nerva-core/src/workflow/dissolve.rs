//! Dissolve-state changes: start or stop dissolving, lengthen the delay,
//! toggle auto-staking of maturity.

use crate::{
    cdk::{
        spec::sns::governance::{
            ChangeAutoStakeMaturity, IncreaseDissolveDelay, Operation, StartDissolving,
            StopDissolving,
        },
        types::Subaccount,
    },
    domain::{
        dissolve::{DissolveAction, DissolveStatus},
        neuron::NeuronSnapshot,
        params::StakingParameters,
        permission::Capability,
    },
    error::{StepFailure, ValidationError},
    log,
    log::Topic,
    policy::{
        dissolve::{validate_action, validate_auto_stake, validate_delay_increase},
        require_capability,
    },
    workflow::{ProgressSink, Services, Session, Step, progress::Tracker},
};

///
/// DissolveCommand
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DissolveCommand {
    StartDissolving,
    StopDissolving,
    IncreaseDelay { additional_seconds: u64 },
    SetAutoStakeMaturity(bool),
}

impl DissolveCommand {
    fn to_operation(
        self,
        neuron: &NeuronSnapshot,
        now: u64,
        params: &StakingParameters,
    ) -> Result<Operation, ValidationError> {
        let status = neuron.dissolve_status(now);

        match self {
            Self::StartDissolving => {
                validate_action(status, DissolveAction::StartDissolving)?;
                Ok(Operation::StartDissolving(StartDissolving {}))
            }
            Self::StopDissolving => {
                validate_action(status, DissolveAction::StopDissolving)?;
                Ok(Operation::StopDissolving(StopDissolving {}))
            }
            Self::IncreaseDelay { additional_seconds } => {
                let additional = validate_delay_increase(neuron, now, additional_seconds, params)?;
                Ok(Operation::IncreaseDissolveDelay(IncreaseDissolveDelay {
                    additional_dissolve_delay_seconds: additional,
                }))
            }
            Self::SetAutoStakeMaturity(requested) => {
                validate_auto_stake(neuron, requested)?;
                Ok(Operation::ChangeAutoStakeMaturity(ChangeAutoStakeMaturity {
                    requested_setting_for_auto_stake_maturity: requested,
                }))
            }
        }
    }
}

///
/// DissolveChanged
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DissolveChanged {
    pub before: DissolveStatus,
    /// Status read back after the command; `None` if that read failed.
    pub after: Option<DissolveStatus>,
}

/// Gate `command` on the neuron's current state, then submit it.
pub async fn configure_dissolve(
    services: Services<'_>,
    session: &Session,
    neuron: Subaccount,
    command: DissolveCommand,
    progress: &dyn ProgressSink,
) -> Result<DissolveChanged, StepFailure> {
    let tracker = Tracker::new(progress);
    let governance = services.governance_ops();

    let _guard = session.acquire(neuron).map_err(|e| tracker.fail(e))?;
    let params = session
        .parameters(&governance)
        .await
        .map_err(|e| tracker.fail(e))?;
    let snapshot = governance
        .require_neuron(&neuron)
        .await
        .map_err(|e| tracker.fail(e))?;
    require_capability(
        &snapshot,
        governance.caller(),
        Capability::ConfigureDissolveState,
    )
    .map_err(|e| tracker.fail(e))?;

    let now = services.clock.now_secs();
    let before = snapshot.dissolve_status(now);
    let operation = command
        .to_operation(&snapshot, now, &params)
        .map_err(|e| tracker.fail(e))?;

    tracker.enter(Step::Configuring);
    governance
        .configure(&neuron, operation)
        .await
        .map_err(|e| tracker.fail(e))?;

    log!(Topic::Dissolve, Ok, "{command:?} applied to neuron {}", snapshot.id());

    tracker.enter(Step::Querying);
    let after = match governance.require_neuron(&neuron).await {
        Ok(n) => Some(n.dissolve_status(services.clock.now_secs())),
        Err(err) => {
            tracker.degrade(&err);
            None
        }
    };
    tracker.done();

    Ok(DissolveChanged { before, after })
}

pub async fn start_dissolving(
    services: Services<'_>,
    session: &Session,
    neuron: Subaccount,
    progress: &dyn ProgressSink,
) -> Result<DissolveChanged, StepFailure> {
    configure_dissolve(services, session, neuron, DissolveCommand::StartDissolving, progress).await
}

pub async fn stop_dissolving(
    services: Services<'_>,
    session: &Session,
    neuron: Subaccount,
    progress: &dyn ProgressSink,
) -> Result<DissolveChanged, StepFailure> {
    configure_dissolve(services, session, neuron, DissolveCommand::StopDissolving, progress).await
}

pub async fn increase_dissolve_delay(
    services: Services<'_>,
    session: &Session,
    neuron: Subaccount,
    additional_seconds: u64,
    progress: &dyn ProgressSink,
) -> Result<DissolveChanged, StepFailure> {
    let command = DissolveCommand::IncreaseDelay { additional_seconds };

    configure_dissolve(services, session, neuron, command, progress).await
}

pub async fn set_auto_stake_maturity(
    services: Services<'_>,
    session: &Session,
    neuron: Subaccount,
    enabled: bool,
    progress: &dyn ProgressSink,
) -> Result<DissolveChanged, StepFailure> {
    let command = DissolveCommand::SetAutoStakeMaturity(enabled);

    configure_dissolve(services, session, neuron, command, progress).await
}
