use crate::{
    Error,
    cdk::{
        candid::Principal,
        spec::sns::governance::NeuronId,
        types::{Subaccount, Tokens},
    },
    config::{Config, ConfigError},
    domain::params::StakingParameters,
    error::StepFailure,
    infra::ic::{IcClock, IcGovernance, IcLedger},
    workflow::{
        BusySet, Services, Session, Step, WorkflowSettings,
        create::{self, CreateNeuronRequest, NeuronCreated},
        disburse::{self, DisburseMaturityRequest, DisburseRequest, MaturityDisbursed},
        dissolve::{self, DissolveChanged, DissolveCommand},
        query::{self, NeuronSummary},
        split::{self, SplitOutcome, SplitRequest},
        top_up::{self, ToppedUp, TopUpRequest},
        transfer::{self, OwnershipTransfer, SendNeuronRequest},
    },
};

thread_local! {
    // in-flight neurons outlive any single call
    static BUSY: BusySet = BusySet::default();
}

/// A session with fresh caches that shares the canister-wide busy flags.
fn call_session(settings: WorkflowSettings) -> Session {
    Session::sharing(settings, BUSY.with(BusySet::clone))
}

///
/// Wiring
/// IC clients and a session for one call.
///

struct Wiring {
    ledger: IcLedger,
    governance: IcGovernance,
    clock: IcClock,
    session: Session,
}

impl Wiring {
    fn from_config() -> Result<Self, Error> {
        let cfg = Config::get()?;
        let ledger = cfg
            .ledger
            .canister
            .ok_or(ConfigError::MissingCanister("ledger"))?;
        let governance = cfg
            .governance
            .canister
            .ok_or(ConfigError::MissingCanister("governance"))?;

        Ok(Self {
            ledger: IcLedger::new(ledger),
            governance: IcGovernance::new(governance),
            clock: IcClock,
            session: call_session(WorkflowSettings::from(&cfg.workflow)),
        })
    }

    fn for_workflow() -> Result<Self, StepFailure> {
        Self::from_config().map_err(|e| StepFailure::new(Step::Validating, e))
    }

    fn services(&self) -> Services<'_> {
        Services::new(&self.ledger, &self.governance, &self.clock)
    }
}

///
/// NeuronApi
///

pub struct NeuronApi;

impl NeuronApi {
    pub async fn create_neuron(request: CreateNeuronRequest) -> Result<NeuronCreated, StepFailure> {
        let w = Wiring::for_workflow()?;

        create::create_neuron(w.services(), &w.session, request, &()).await
    }

    pub async fn retry_claim(owner: Principal, nonce: u64) -> Result<NeuronId, StepFailure> {
        let w = Wiring::for_workflow()?;

        create::retry_claim(w.services(), &w.session, owner, nonce, &()).await
    }

    pub async fn top_up_neuron(neuron: Subaccount, amount: Tokens) -> Result<ToppedUp, StepFailure> {
        let w = Wiring::for_workflow()?;
        let request = TopUpRequest { neuron, amount };

        top_up::top_up_neuron(w.services(), &w.session, request, &()).await
    }

    pub async fn split_neuron(request: SplitRequest) -> Result<SplitOutcome, StepFailure> {
        let w = Wiring::for_workflow()?;

        split::split_neuron(w.services(), &w.session, request, &()).await
    }

    pub async fn send_neuron(request: SendNeuronRequest) -> Result<OwnershipTransfer, StepFailure> {
        let w = Wiring::for_workflow()?;

        transfer::send_neuron(w.services(), &w.session, request, &()).await
    }

    pub async fn configure_dissolve(
        neuron: Subaccount,
        command: DissolveCommand,
    ) -> Result<DissolveChanged, StepFailure> {
        let w = Wiring::for_workflow()?;

        dissolve::configure_dissolve(w.services(), &w.session, neuron, command, &()).await
    }

    pub async fn disburse(request: DisburseRequest) -> Result<u64, StepFailure> {
        let w = Wiring::for_workflow()?;

        disburse::disburse(w.services(), &w.session, request, &()).await
    }

    pub async fn disburse_maturity(
        request: DisburseMaturityRequest,
    ) -> Result<MaturityDisbursed, StepFailure> {
        let w = Wiring::for_workflow()?;

        disburse::disburse_maturity(w.services(), &w.session, request, &()).await
    }

    pub async fn get_neuron(neuron: Subaccount) -> Result<NeuronSummary, Error> {
        let w = Wiring::from_config()?;

        query::get_neuron(w.services(), &w.session, &neuron).await
    }

    pub async fn list_neurons(owner: Principal) -> Result<Vec<NeuronSummary>, Error> {
        let w = Wiring::from_config()?;

        query::list_neurons(w.services(), &w.session, owner).await
    }

    pub async fn parameters() -> Result<StakingParameters, Error> {
        let w = Wiring::from_config()?;

        query::parameters(w.services(), &w.session).await
    }

    pub async fn staking_balance(neuron: Subaccount) -> Result<Tokens, Error> {
        let w = Wiring::from_config()?;

        query::staking_balance(w.services(), neuron).await
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_share_busy_flags_but_not_caches() {
        let neuron: Subaccount = [4; 32];
        let first = call_session(WorkflowSettings::default());
        let second = call_session(WorkflowSettings::default());

        let guard = first.acquire(neuron).unwrap();
        assert!(second.is_busy(&neuron));
        assert!(matches!(second.acquire(neuron), Err(Error::Busy(_))));

        first.mark_taken(neuron);
        assert!(!second.is_known_taken(&neuron));

        drop(guard);
        assert!(!call_session(WorkflowSettings::default()).is_busy(&neuron));
    }
}
