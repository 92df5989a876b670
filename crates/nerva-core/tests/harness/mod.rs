//! Shared fixtures: one sandbox, one owner with funds, one session.

#![allow(dead_code)]

use nerva_core::{
    cdk::{
        spec::sns::governance::{DissolveState, Neuron, NeuronId, NeuronPermission},
        types::{Account, Principal, Subaccount},
    },
    domain::{permission::CapabilitySet, subaccount::neuron_subaccount},
    workflow::{Services, Session, StepStatus},
};
use nerva_testkit::{Call, Fake, Sandbox, SandboxHandles};
use std::cell::RefCell;

pub const OWNER_FUNDS: u64 = 1_000_000;

pub struct Harness {
    pub sandbox: Sandbox,
    pub owner: Principal,
    pub handles: SandboxHandles,
    pub session: Session,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_session(Session::default())
    }

    pub fn with_session(session: Session) -> Self {
        let sandbox = Sandbox::new();
        let owner = Fake::principal(1);
        sandbox.mint(default_account(owner), OWNER_FUNDS);
        let handles = sandbox.handles(owner);

        Self {
            sandbox,
            owner,
            handles,
            session,
        }
    }

    pub fn services(&self) -> Services<'_> {
        self.handles.services()
    }

    pub fn owner_balance(&self) -> u64 {
        self.sandbox.balance(default_account(self.owner))
    }

    /// Seed a neuron at the owner's `nonce`, held by `holders`.
    pub fn seed(
        &self,
        nonce: u64,
        stake: u64,
        dissolve_state: DissolveState,
        holders: &[(Principal, CapabilitySet)],
    ) -> Subaccount {
        let subaccount = neuron_subaccount(&self.owner, nonce);
        let now = self.sandbox.now_secs();

        self.sandbox.seed_neuron(Neuron {
            id: Some(NeuronId::from_subaccount(&subaccount)),
            permissions: holders
                .iter()
                .map(|(principal, caps)| NeuronPermission {
                    principal: Some(*principal),
                    permission_type: caps.to_codes(),
                })
                .collect(),
            cached_neuron_stake_e8s: stake,
            created_timestamp_seconds: now,
            aging_since_timestamp_seconds: now,
            dissolve_state: Some(dissolve_state),
            voting_power_percentage_multiplier: 100,
            ..Default::default()
        });

        subaccount
    }

    /// Seed a locked neuron the owner fully controls.
    pub fn seed_owned(&self, nonce: u64, stake: u64, delay_seconds: u64) -> Subaccount {
        self.seed(
            nonce,
            stake,
            DissolveState::DissolveDelaySeconds(delay_seconds),
            &[(self.owner, CapabilitySet::FULL)],
        )
    }

    /// Holders of `subaccount` as `(principal, capabilities)`, in stored order.
    pub fn holders(&self, subaccount: &Subaccount) -> Vec<(Principal, CapabilitySet)> {
        self.sandbox
            .neuron(subaccount)
            .expect("neuron exists")
            .permissions
            .iter()
            .filter_map(|p| Some((p.principal?, CapabilitySet::from_codes(&p.permission_type))))
            .collect()
    }

    pub fn manage_calls(&self) -> Vec<Call> {
        self.sandbox
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Manage { .. }))
            .collect()
    }

    pub fn transfer_calls(&self) -> Vec<Call> {
        self.sandbox
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Transfer { .. }))
            .collect()
    }
}

pub const fn default_account(owner: Principal) -> Account {
    Account {
        owner,
        subaccount: None,
    }
}

pub fn progress() -> RefCell<Vec<StepStatus>> {
    RefCell::new(Vec::new())
}

pub use futures::executor::block_on;
