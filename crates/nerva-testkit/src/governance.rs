use crate::{
    Sandbox,
    sandbox::{Call, CommandKind, Fault, FaultPoint, State},
};
use async_trait::async_trait;
use nerva_cdk::{
    spec::sns::governance::{
        AddNeuronPermissions, By, ClaimOrRefresh, ClaimOrRefreshResponse, Command,
        CommandResponse, Configure, Disburse, DisburseMaturity, DisburseMaturityInProgress,
        DisburseMaturityResponse, DisburseResponse, DissolveState, Empty, GetNeuron,
        GetNeuronResponse, GetNeuronResult, GovernanceAccount, GovernanceError, ListNeurons,
        ListNeuronsResponse, ManageNeuron, ManageNeuronResponse, NervousSystemParameters, Neuron,
        NeuronId, NeuronPermission, Operation, RemoveNeuronPermissions, Split, SplitResponse,
        error_type,
    },
    types::{Account, Principal, Subaccount},
};
use nerva_core::{
    domain::{
        dissolve::DissolveStatus,
        permission::{Capability, CapabilitySet, grants_from_permissions},
        subaccount::neuron_subaccount,
    },
    infra::{GovernanceClient, InfraError},
};

const DAY: u64 = 86_400;
const INVALID_COMMAND: i32 = 4;

///
/// SandboxGovernance
/// SNS governance as seen by one calling principal.
///

#[derive(Clone)]
pub struct SandboxGovernance {
    sandbox: Sandbox,
    caller: Principal,
}

impl SandboxGovernance {
    pub(crate) const fn new(sandbox: Sandbox, caller: Principal) -> Self {
        Self { sandbox, caller }
    }
}

#[async_trait(?Send)]
impl GovernanceClient for SandboxGovernance {
    fn canister_id(&self) -> Principal {
        self.sandbox.governance_id()
    }

    fn caller(&self) -> Principal {
        self.caller
    }

    async fn manage_neuron(&self, arg: ManageNeuron) -> Result<ManageNeuronResponse, InfraError> {
        let mut state = self.sandbox.state.borrow_mut();
        let subaccount: Subaccount = arg.subaccount.as_slice().try_into().unwrap_or_default();

        let Some(command) = arg.command else {
            return Ok(reply(Err(reject(INVALID_COMMAND, "no command"))));
        };
        state.calls.push(Call::Manage {
            caller: self.caller,
            subaccount,
            command: command.clone(),
        });

        let targeted = match &command {
            Command::RemoveNeuronPermissions(RemoveNeuronPermissions {
                principal_id: Some(principal),
                ..
            }) => state.take_fault(FaultPoint::RemovePermissionsOf(*principal)),
            _ => None,
        };
        let fault =
            targeted.or_else(|| state.take_fault(FaultPoint::Command(CommandKind::of(&command))));
        if let Some(fault) = fault {
            return Ok(reply(Err(injected(fault.into_reply("manage_neuron")?))));
        }

        let mut engine = Engine {
            state: &mut *state,
            governance: self.sandbox.governance_id(),
            caller: self.caller,
        };

        Ok(reply(engine.execute(subaccount, command)))
    }

    async fn get_neuron(&self, arg: GetNeuron) -> Result<GetNeuronResponse, InfraError> {
        let mut state = self.sandbox.state.borrow_mut();
        let subaccount = arg
            .neuron_id
            .as_ref()
            .and_then(NeuronId::subaccount)
            .unwrap_or_default();
        state.calls.push(Call::GetNeuron(subaccount));

        let result = if let Some(fault) = state.take_fault(FaultPoint::GetNeuron) {
            GetNeuronResult::Error(injected(fault.into_reply("get_neuron")?))
        } else {
            match state.neurons.get(&subaccount) {
                Some(neuron) => GetNeuronResult::Neuron(neuron.clone()),
                None => GetNeuronResult::Error(reject(error_type::NOT_FOUND, "no such neuron")),
            }
        };

        Ok(GetNeuronResponse {
            result: Some(result),
        })
    }

    async fn list_neurons(&self, arg: ListNeurons) -> Result<ListNeuronsResponse, InfraError> {
        let mut state = self.sandbox.state.borrow_mut();
        let principal = arg.of_principal.unwrap_or(self.caller);
        state.calls.push(Call::ListNeurons(principal));

        if let Some(fault) = state.take_fault(FaultPoint::ListNeurons) {
            fault.into_reply("list_neurons")?;
            return Ok(ListNeuronsResponse::default());
        }

        let limit = usize::try_from(arg.limit).unwrap_or(usize::MAX);
        let neurons = state
            .neurons
            .values()
            .filter(|n| {
                n.permissions
                    .iter()
                    .any(|p| p.principal == Some(principal) && !p.permission_type.is_empty())
            })
            .take(limit)
            .cloned()
            .collect();

        Ok(ListNeuronsResponse { neurons })
    }

    async fn get_nervous_system_parameters(
        &self,
    ) -> Result<NervousSystemParameters, InfraError> {
        let mut state = self.sandbox.state.borrow_mut();
        state.calls.push(Call::GetParameters);

        if let Some(fault) = state.take_fault(FaultPoint::Parameters) {
            fault.into_reply("get_nervous_system_parameters")?;
        }

        Ok(state.params.clone())
    }
}

fn reply(result: Result<CommandResponse, GovernanceError>) -> ManageNeuronResponse {
    ManageNeuronResponse {
        command: Some(result.unwrap_or_else(CommandResponse::Error)),
    }
}

fn reject(error_type: i32, message: impl Into<String>) -> GovernanceError {
    GovernanceError {
        error_type,
        error_message: message.into(),
    }
}

fn injected(fault: Fault) -> GovernanceError {
    match fault {
        Fault::Reject {
            error_type,
            message,
        } => reject(error_type, message),
        other => reject(error_type::PRECONDITION_FAILED, format!("{other:?}")),
    }
}

fn capabilities_of(neuron: &Neuron, principal: Principal) -> CapabilitySet {
    grants_from_permissions(&neuron.permissions)
        .into_iter()
        .filter(|g| g.principal == principal)
        .fold(CapabilitySet::EMPTY, |acc, g| acc.union(g.capabilities))
}

fn set_capabilities(neuron: &mut Neuron, principal: Principal, capabilities: CapabilitySet) {
    let at = neuron
        .permissions
        .iter()
        .position(|p| p.principal == Some(principal));
    neuron.permissions.retain(|p| p.principal != Some(principal));

    if !capabilities.is_empty() {
        let entry = NeuronPermission {
            principal: Some(principal),
            permission_type: capabilities.to_codes(),
        };
        let at = at.unwrap_or(neuron.permissions.len()).min(neuron.permissions.len());
        neuron.permissions.insert(at, entry);
    }
}

fn require(neuron: &Neuron, caller: Principal, capability: Capability) -> Result<(), GovernanceError> {
    if capabilities_of(neuron, caller).contains(capability) {
        Ok(())
    } else {
        Err(reject(
            error_type::NOT_AUTHORIZED,
            format!("{caller} lacks {capability}"),
        ))
    }
}

fn to_account(account: Option<GovernanceAccount>, caller: Principal) -> Account {
    account.map_or(
        Account {
            owner: caller,
            subaccount: None,
        },
        |a| Account {
            owner: a.owner.unwrap_or(caller),
            subaccount: a
                .subaccount
                .and_then(|s| s.subaccount.as_slice().try_into().ok()),
        },
    )
}

///
/// Engine
/// Applies one `manage_neuron` command to the sandbox state.
///

struct Engine<'a> {
    state: &'a mut State,
    governance: Principal,
    caller: Principal,
}

impl Engine<'_> {
    fn execute(
        &mut self,
        subaccount: Subaccount,
        command: Command,
    ) -> Result<CommandResponse, GovernanceError> {
        match command {
            Command::ClaimOrRefresh(ClaimOrRefresh { by }) => self.claim_or_refresh(subaccount, by),
            Command::Configure(Configure { operation }) => self.configure(subaccount, operation),
            Command::Split(split) => self.split(subaccount, &split),
            Command::Disburse(disburse) => self.disburse(subaccount, disburse),
            Command::DisburseMaturity(disburse) => self.disburse_maturity(subaccount, disburse),
            Command::AddNeuronPermissions(add) => self.add_permissions(subaccount, add),
            Command::RemoveNeuronPermissions(remove) => {
                self.remove_permissions(subaccount, remove)
            }
        }
    }

    const fn account(&self, subaccount: Subaccount) -> Account {
        Account {
            owner: self.governance,
            subaccount: Some(subaccount),
        }
    }

    fn neuron(&self, subaccount: &Subaccount) -> Result<&Neuron, GovernanceError> {
        self.state
            .neurons
            .get(subaccount)
            .ok_or_else(|| reject(error_type::NOT_FOUND, "no such neuron"))
    }

    fn neuron_mut(&mut self, subaccount: &Subaccount) -> Result<&mut Neuron, GovernanceError> {
        self.state
            .neurons
            .get_mut(subaccount)
            .ok_or_else(|| reject(error_type::NOT_FOUND, "no such neuron"))
    }

    fn params(&self) -> &NervousSystemParameters {
        &self.state.params
    }

    fn claim_or_refresh(
        &mut self,
        subaccount: Subaccount,
        by: Option<By>,
    ) -> Result<CommandResponse, GovernanceError> {
        let (subaccount, controller) = match by {
            Some(By::MemoAndController(m)) => {
                let controller = m.controller.unwrap_or(self.caller);
                (neuron_subaccount(&controller, m.memo), controller)
            }
            Some(By::NeuronId(_)) => {
                self.neuron(&subaccount)?;
                (subaccount, self.caller)
            }
            None => return Err(reject(INVALID_COMMAND, "claim needs a `by`")),
        };

        let balance = self.state.balance(&self.account(subaccount));
        let id = NeuronId::from_subaccount(&subaccount);

        if let Some(neuron) = self.state.neurons.get_mut(&subaccount) {
            neuron.cached_neuron_stake_e8s = balance;
        } else {
            let minimum = self.params().neuron_minimum_stake_e8s.unwrap_or(0);
            if balance == 0 || balance < minimum {
                return Err(reject(
                    error_type::PRECONDITION_FAILED,
                    format!("balance {balance} is below the minimum stake {minimum}"),
                ));
            }

            let claimer = self
                .params()
                .neuron_claimer_permissions
                .as_ref()
                .map_or(CapabilitySet::FULL, CapabilitySet::from);
            let now = self.state.now_secs();

            self.state.neurons.insert(
                subaccount,
                Neuron {
                    id: Some(id.clone()),
                    permissions: vec![NeuronPermission {
                        principal: Some(controller),
                        permission_type: claimer.to_codes(),
                    }],
                    cached_neuron_stake_e8s: balance,
                    created_timestamp_seconds: now,
                    aging_since_timestamp_seconds: now,
                    dissolve_state: Some(DissolveState::DissolveDelaySeconds(0)),
                    auto_stake_maturity: Some(false),
                    voting_power_percentage_multiplier: 100,
                    ..Default::default()
                },
            );
        }

        Ok(CommandResponse::ClaimOrRefresh(ClaimOrRefreshResponse {
            refreshed_neuron_id: Some(id),
        }))
    }

    fn configure(
        &mut self,
        subaccount: Subaccount,
        operation: Option<Operation>,
    ) -> Result<CommandResponse, GovernanceError> {
        let now = self.state.now_secs();
        let max_delay = self.params().max_dissolve_delay_seconds.unwrap_or(0);
        let caller = self.caller;

        let neuron = self.neuron_mut(&subaccount)?;
        require(neuron, caller, Capability::ConfigureDissolveState)?;
        let status = DissolveStatus::classify(neuron.dissolve_state, now);

        match operation {
            Some(Operation::StartDissolving(_)) => {
                let DissolveStatus::Locked { delay_seconds } = status else {
                    return Err(reject(error_type::PRECONDITION_FAILED, "neuron is not locked"));
                };
                neuron.dissolve_state = Some(DissolveState::WhenDissolvedTimestampSeconds(
                    now + delay_seconds,
                ));
            }
            Some(Operation::StopDissolving(_)) => {
                let DissolveStatus::Dissolving { dissolve_at } = status else {
                    return Err(reject(error_type::PRECONDITION_FAILED, "neuron is not dissolving"));
                };
                neuron.dissolve_state = Some(DissolveState::DissolveDelaySeconds(dissolve_at - now));
                neuron.aging_since_timestamp_seconds = now;
            }
            Some(Operation::IncreaseDissolveDelay(inc)) => {
                let additional = u64::from(inc.additional_dissolve_delay_seconds);
                neuron.dissolve_state = Some(match status {
                    DissolveStatus::Locked { delay_seconds } => {
                        DissolveState::DissolveDelaySeconds((delay_seconds + additional).min(max_delay))
                    }
                    DissolveStatus::Dissolving { dissolve_at } => {
                        DissolveState::WhenDissolvedTimestampSeconds(
                            (dissolve_at + additional).min(now + max_delay),
                        )
                    }
                    DissolveStatus::Dissolved => {
                        neuron.aging_since_timestamp_seconds = now;
                        DissolveState::DissolveDelaySeconds(additional.min(max_delay))
                    }
                });
            }
            Some(Operation::ChangeAutoStakeMaturity(change)) => {
                neuron.auto_stake_maturity = Some(change.requested_setting_for_auto_stake_maturity);
            }
            None => return Err(reject(INVALID_COMMAND, "configure needs an operation")),
        }

        Ok(CommandResponse::Configure(Empty {}))
    }

    fn split(&mut self, subaccount: Subaccount, split: &Split) -> Result<CommandResponse, GovernanceError> {
        let minimum = self.params().neuron_minimum_stake_e8s.unwrap_or(0);
        let fee = self.state.fee();
        let now = self.state.now_secs();

        let parent = self.neuron(&subaccount)?.clone();
        require(&parent, self.caller, Capability::Split)?;

        let stake = parent
            .cached_neuron_stake_e8s
            .saturating_sub(parent.neuron_fees_e8s);
        if split.amount_e8s < minimum + fee {
            return Err(reject(
                error_type::PRECONDITION_FAILED,
                format!("split amount {} is below {}", split.amount_e8s, minimum + fee),
            ));
        }
        if stake < split.amount_e8s || stake - split.amount_e8s < minimum {
            return Err(reject(
                error_type::PRECONDITION_FAILED,
                "split would leave the parent below the minimum stake",
            ));
        }

        let child = neuron_subaccount(&self.caller, split.memo);
        if self.state.neurons.contains_key(&child) {
            return Err(reject(
                error_type::PRECONDITION_FAILED,
                format!("memo {} already used", split.memo),
            ));
        }

        let (from, to) = (self.account(subaccount), self.account(child));
        self.state
            .move_tokens(&from, &to, split.amount_e8s - fee, fee, None, None)
            .map_err(|e| reject(error_type::PRECONDITION_FAILED, format!("{e:?}")))?;

        let child_id = NeuronId::from_subaccount(&child);
        self.state.neurons.insert(
            child,
            Neuron {
                id: Some(child_id.clone()),
                cached_neuron_stake_e8s: split.amount_e8s - fee,
                created_timestamp_seconds: now,
                ..parent
            },
        );
        self.neuron_mut(&subaccount)?.cached_neuron_stake_e8s -= split.amount_e8s;

        Ok(CommandResponse::Split(SplitResponse {
            created_neuron_id: Some(child_id),
        }))
    }

    fn disburse(
        &mut self,
        subaccount: Subaccount,
        disburse: Disburse,
    ) -> Result<CommandResponse, GovernanceError> {
        let now = self.state.now_secs();
        let fee = self.state.fee();

        let neuron = self.neuron(&subaccount)?;
        require(neuron, self.caller, Capability::Disburse)?;
        if DissolveStatus::classify(neuron.dissolve_state, now) != DissolveStatus::Dissolved {
            return Err(reject(error_type::PRECONDITION_FAILED, "neuron is not dissolved"));
        }

        let stake = neuron
            .cached_neuron_stake_e8s
            .saturating_sub(neuron.neuron_fees_e8s);
        let amount = disburse.amount.map_or(stake, |a| a.e8s);
        if amount > stake || amount <= fee {
            return Err(reject(
                error_type::PRECONDITION_FAILED,
                format!("cannot disburse {amount} of {stake}"),
            ));
        }

        let (from, to) = (
            self.account(subaccount),
            to_account(disburse.to_account, self.caller),
        );
        let block = self
            .state
            .move_tokens(&from, &to, amount - fee, fee, None, None)
            .map_err(|e| reject(error_type::PRECONDITION_FAILED, format!("{e:?}")))?;
        self.neuron_mut(&subaccount)?.cached_neuron_stake_e8s -= amount;

        Ok(CommandResponse::Disburse(DisburseResponse {
            transfer_block_height: block,
        }))
    }

    fn disburse_maturity(
        &mut self,
        subaccount: Subaccount,
        disburse: DisburseMaturity,
    ) -> Result<CommandResponse, GovernanceError> {
        let now = self.state.now_secs();
        let caller = self.caller;

        let neuron = self.neuron_mut(&subaccount)?;
        require(neuron, caller, Capability::DisburseMaturity)?;

        let pct = disburse.percentage_to_disburse;
        if pct == 0 || pct > 100 || neuron.maturity_e8s_equivalent == 0 {
            return Err(reject(
                error_type::PRECONDITION_FAILED,
                format!("cannot disburse {pct}% of {}", neuron.maturity_e8s_equivalent),
            ));
        }

        let amount = u64::try_from(
            u128::from(neuron.maturity_e8s_equivalent) * u128::from(pct) / 100,
        )
        .unwrap_or(u64::MAX);
        neuron.maturity_e8s_equivalent -= amount;
        neuron
            .disburse_maturity_in_progress
            .push(DisburseMaturityInProgress {
                amount_e8s: amount,
                timestamp_of_disbursement_seconds: now,
                finalize_disbursement_timestamp_seconds: Some(now + 7 * DAY),
                account_to_disburse_to: disburse.to_account,
            });

        Ok(CommandResponse::DisburseMaturity(DisburseMaturityResponse {
            amount_disbursed_e8s: amount,
            amount_deducted_e8s: Some(amount),
        }))
    }

    fn add_permissions(
        &mut self,
        subaccount: Subaccount,
        add: AddNeuronPermissions,
    ) -> Result<CommandResponse, GovernanceError> {
        let grantable = self
            .params()
            .neuron_grantable_permissions
            .as_ref()
            .map_or(CapabilitySet::FULL, CapabilitySet::from);
        let max_principals = self
            .params()
            .max_number_of_principals_per_neuron
            .and_then(|m| usize::try_from(m).ok())
            .unwrap_or(usize::MAX);
        let caller = self.caller;

        let (Some(principal), Some(list)) = (add.principal_id, add.permissions_to_add) else {
            return Err(reject(INVALID_COMMAND, "principal and permissions are required"));
        };
        let requested = CapabilitySet::from(&list);
        if !grantable.is_superset(requested) {
            return Err(reject(
                error_type::ACCESS_CONTROL_LIST,
                format!("{requested} is not grantable"),
            ));
        }

        let neuron = self.neuron_mut(&subaccount)?;
        require(neuron, caller, Capability::ManagePrincipals)?;

        let held = capabilities_of(neuron, principal);
        if held.is_empty() && grants_from_permissions(&neuron.permissions).len() >= max_principals {
            return Err(reject(
                error_type::PRECONDITION_FAILED,
                "neuron has the maximum number of principals",
            ));
        }
        set_capabilities(neuron, principal, held.union(requested));

        Ok(CommandResponse::AddNeuronPermission(Empty {}))
    }

    fn remove_permissions(
        &mut self,
        subaccount: Subaccount,
        remove: RemoveNeuronPermissions,
    ) -> Result<CommandResponse, GovernanceError> {
        let caller = self.caller;

        let (Some(principal), Some(list)) = (remove.principal_id, remove.permissions_to_remove)
        else {
            return Err(reject(INVALID_COMMAND, "principal and permissions are required"));
        };
        let requested = CapabilitySet::from(&list);

        let neuron = self.neuron_mut(&subaccount)?;
        if principal != caller {
            require(neuron, caller, Capability::ManagePrincipals)?;
        }

        let held = capabilities_of(neuron, principal);
        if !held.is_superset(requested) {
            return Err(reject(
                error_type::ACCESS_CONTROL_LIST,
                format!("{principal} does not hold {requested}"),
            ));
        }
        set_capabilities(neuron, principal, held.difference(requested));

        Ok(CommandResponse::RemoveNeuronPermission(Empty {}))
    }
}
