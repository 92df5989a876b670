use crate::{SandboxClock, SandboxGovernance, SandboxLedger};
use nerva_cdk::{
    spec::{
        icrc::icrc1::TransferError,
        sns::governance::{Command, NervousSystemParameters, Neuron, NeuronId},
    },
    types::{Account, Nat, Principal, Subaccount},
};
use nerva_core::{infra::InfraError, workflow::Services};
use std::{cell::RefCell, collections::BTreeMap, rc::Rc, time::Duration};

const DAY: u64 = 86_400;
const YEAR: u64 = 365 * DAY;

/// 2023-11-14T22:13:20Z
const GENESIS_NANOS: u64 = 1_700_000_000_000_000_000;

///
/// Call
/// One recorded request, in arrival order.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    Transfer {
        from: Principal,
        to: Account,
        amount: u64,
        fee: Option<u64>,
        memo: Option<Vec<u8>>,
    },
    BalanceOf(Account),
    Manage {
        caller: Principal,
        subaccount: Subaccount,
        command: Command,
    },
    GetNeuron(Subaccount),
    ListNeurons(Principal),
    GetParameters,
}

///
/// CommandKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandKind {
    ClaimOrRefresh,
    Configure,
    Split,
    Disburse,
    DisburseMaturity,
    AddPermissions,
    RemovePermissions,
}

impl CommandKind {
    pub(crate) const fn of(command: &Command) -> Self {
        match command {
            Command::ClaimOrRefresh(_) => Self::ClaimOrRefresh,
            Command::Configure(_) => Self::Configure,
            Command::Split(_) => Self::Split,
            Command::Disburse(_) => Self::Disburse,
            Command::DisburseMaturity(_) => Self::DisburseMaturity,
            Command::AddNeuronPermissions(_) => Self::AddPermissions,
            Command::RemoveNeuronPermissions(_) => Self::RemovePermissions,
        }
    }
}

///
/// FaultPoint
/// Where a queued fault fires. Each fault fires once, on the first match.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FaultPoint {
    Transfer,
    Command(CommandKind),
    /// `RemoveNeuronPermissions` targeting this principal.
    RemovePermissionsOf(Principal),
    GetNeuron,
    ListNeurons,
    Parameters,
}

///
/// Fault
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Fault {
    /// Governance answers with an error of this type.
    Reject { error_type: i32, message: String },
    /// The ledger refuses the transfer.
    Ledger(TransferError),
    /// The call never reached the canister.
    NotExecuted,
    /// The reply was lost.
    OutcomeUnknown,
}

impl Fault {
    /// Transport faults become the call's error; the rest are handed back.
    pub(crate) fn into_reply(self, method: &str) -> Result<Self, InfraError> {
        let method = method.to_string();
        let message = "injected fault".to_string();

        match self {
            Self::NotExecuted => Err(InfraError::NotExecuted { method, message }),
            Self::OutcomeUnknown => Err(InfraError::OutcomeUnknown { method, message }),
            other => Ok(other),
        }
    }
}

///
/// LedgerBlock
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerBlock {
    pub from: Option<Account>,
    pub to: Account,
    pub amount: u64,
    pub fee: u64,
    pub memo: Option<Vec<u8>>,
    pub created_at_time: Option<u64>,
}

///
/// State
///

pub(crate) struct State {
    pub balances: BTreeMap<Account, u64>,
    pub blocks: Vec<LedgerBlock>,
    pub neurons: BTreeMap<Subaccount, Neuron>,
    pub params: NervousSystemParameters,
    pub now_nanos: u64,
    pub sleeps: Vec<Duration>,
    pub calls: Vec<Call>,
    pub faults: Vec<(FaultPoint, Fault)>,
}

impl State {
    fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
            blocks: Vec::new(),
            neurons: BTreeMap::new(),
            params: default_parameters(),
            now_nanos: GENESIS_NANOS,
            sleeps: Vec::new(),
            calls: Vec::new(),
            faults: Vec::new(),
        }
    }

    pub fn take_fault(&mut self, point: FaultPoint) -> Option<Fault> {
        let pos = self.faults.iter().position(|(p, _)| *p == point)?;

        Some(self.faults.remove(pos).1)
    }

    pub const fn now_secs(&self) -> u64 {
        self.now_nanos / 1_000_000_000
    }

    pub fn fee(&self) -> u64 {
        self.params.transaction_fee_e8s.unwrap_or(0)
    }

    pub fn balance(&self, account: &Account) -> u64 {
        self.balances.get(&normalize(account)).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, account: &Account, amount: u64) {
        *self.balances.entry(normalize(account)).or_default() += amount;
    }

    /// Move `amount` plus `fee` out of `from`, `amount` into `to`; the fee burns.
    pub fn move_tokens(
        &mut self,
        from: &Account,
        to: &Account,
        amount: u64,
        fee: u64,
        memo: Option<Vec<u8>>,
        created_at_time: Option<u64>,
    ) -> Result<u64, TransferError> {
        let balance = self.balance(from);
        let debit = amount.saturating_add(fee);
        if balance < debit {
            return Err(TransferError::InsufficientFunds {
                balance: Nat::from(balance),
            });
        }

        self.balances.insert(normalize(from), balance - debit);
        self.credit(to, amount);
        self.blocks.push(LedgerBlock {
            from: Some(normalize(from)),
            to: normalize(to),
            amount,
            fee,
            memo,
            created_at_time,
        });

        Ok(u64::try_from(self.blocks.len() - 1).unwrap_or(u64::MAX))
    }
}

fn normalize(account: &Account) -> Account {
    Account {
        owner: account.owner,
        subaccount: Some(*account.effective_subaccount()),
    }
}

/// Small round numbers: minimum stake 100 e8s, fee 1 e8s.
fn default_parameters() -> NervousSystemParameters {
    NervousSystemParameters {
        neuron_minimum_stake_e8s: Some(100),
        transaction_fee_e8s: Some(1),
        neuron_minimum_dissolve_delay_to_vote_seconds: Some(30 * DAY),
        max_dissolve_delay_seconds: Some(8 * YEAR),
        max_neuron_age_for_age_bonus: Some(4 * YEAR),
        max_dissolve_delay_bonus_percentage: Some(100),
        max_age_bonus_percentage: Some(25),
        neuron_claimer_permissions: None,
        neuron_grantable_permissions: None,
        max_number_of_principals_per_neuron: Some(5),
    }
}

///
/// Sandbox
///

#[derive(Clone)]
pub struct Sandbox {
    pub(crate) state: Rc<RefCell<State>>,
    ledger_id: Principal,
    governance_id: Principal,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State::new())),
            ledger_id: crate::Fake::principal(0x00_ff_00_01),
            governance_id: crate::Fake::principal(0x00_ff_00_02),
        }
    }

    #[must_use]
    pub const fn ledger_id(&self) -> Principal {
        self.ledger_id
    }

    #[must_use]
    pub const fn governance_id(&self) -> Principal {
        self.governance_id
    }

    /// Ledger and governance clients that act as `caller`.
    #[must_use]
    pub fn handles(&self, caller: Principal) -> SandboxHandles {
        SandboxHandles {
            ledger: SandboxLedger::new(self.clone(), caller),
            governance: SandboxGovernance::new(self.clone(), caller),
            clock: SandboxClock::new(self.clone()),
        }
    }

    // ---------------------------------------------------------------------
    // parameters and time
    // ---------------------------------------------------------------------

    pub fn update_parameters(&self, f: impl FnOnce(&mut NervousSystemParameters)) {
        f(&mut self.state.borrow_mut().params);
    }

    #[must_use]
    pub fn parameters(&self) -> NervousSystemParameters {
        self.state.borrow().params.clone()
    }

    #[must_use]
    pub fn now_secs(&self) -> u64 {
        self.state.borrow().now_secs()
    }

    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        let mut state = self.state.borrow_mut();
        state.now_nanos = state.now_nanos.saturating_add(nanos);
    }

    /// Every duration a workflow slept for, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.borrow().sleeps.clone()
    }

    // ---------------------------------------------------------------------
    // ledger
    // ---------------------------------------------------------------------

    pub fn mint(&self, account: Account, amount: u64) {
        self.state.borrow_mut().credit(&account, amount);
    }

    #[must_use]
    pub fn balance(&self, account: Account) -> u64 {
        self.state.borrow().balance(&account)
    }

    #[must_use]
    pub fn blocks(&self) -> Vec<LedgerBlock> {
        self.state.borrow().blocks.clone()
    }

    // ---------------------------------------------------------------------
    // governance
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn neuron(&self, subaccount: &Subaccount) -> Option<Neuron> {
        self.state.borrow().neurons.get(subaccount).cloned()
    }

    /// Store `neuron` as-is and back its cached stake with ledger funds.
    pub fn seed_neuron(&self, neuron: Neuron) {
        let subaccount = neuron
            .id
            .as_ref()
            .and_then(NeuronId::subaccount)
            .unwrap_or_default();
        let governance = Account {
            owner: self.governance_id,
            subaccount: Some(subaccount),
        };

        let mut state = self.state.borrow_mut();
        state.credit(&governance, neuron.cached_neuron_stake_e8s);
        state.neurons.insert(subaccount, neuron);
    }

    /// Edit a stored neuron in place, as another actor would.
    pub fn update_neuron(&self, subaccount: &Subaccount, f: impl FnOnce(&mut Neuron)) {
        if let Some(neuron) = self.state.borrow_mut().neurons.get_mut(subaccount) {
            f(neuron);
        }
    }

    // ---------------------------------------------------------------------
    // calls and faults
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Queue `fault` for the next call matching `point`.
    pub fn inject(&self, point: FaultPoint, fault: Fault) {
        self.state.borrow_mut().faults.push((point, fault));
    }
}

///
/// SandboxHandles
///

pub struct SandboxHandles {
    pub ledger: SandboxLedger,
    pub governance: SandboxGovernance,
    pub clock: SandboxClock,
}

impl SandboxHandles {
    #[must_use]
    pub fn services(&self) -> Services<'_> {
        Services::new(&self.ledger, &self.governance, &self.clock)
    }
}
