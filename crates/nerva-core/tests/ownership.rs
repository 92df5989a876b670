// Handing a neuron to another principal: grant, verify, revoke.

mod harness;

use async_trait::async_trait;
use harness::{Harness, block_on, progress};
use nerva_core::{
    Error,
    cdk::{
        spec::sns::governance::{
            Command, CommandResponse, DissolveState, GetNeuron, GetNeuronResponse, ListNeurons,
            ListNeuronsResponse, ManageNeuron, ManageNeuronResponse, NervousSystemParameters,
            Neuron, NeuronPermission, error_type,
        },
        types::{Principal, Subaccount},
    },
    domain::permission::{Capability, CapabilitySet},
    error::{Recovery, StepFailure, ValidationError},
    infra::{GovernanceClient, InfraError},
    policy::transfer::Confirmation,
    workflow::{
        Services, Session, Step, StepStatus, WorkflowSettings,
        transfer::{OwnershipTransfer, SendNeuronRequest, TransferStatus, send_neuron},
    },
};
use nerva_testkit::{Call, CommandKind, Fake, Fault, FaultPoint, Sandbox, SandboxGovernance};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

const DAY: u64 = 86_400;

fn recipient() -> Principal {
    Fake::principal(2)
}

fn hotkey() -> Principal {
    Fake::principal(3)
}

fn hotkey_caps() -> CapabilitySet {
    CapabilitySet::EMPTY
        .with(Capability::Vote)
        .with(Capability::SubmitProposal)
}

/// Owner holds everything; a hotkey can vote and propose.
fn seed_shared(h: &Harness) -> Subaccount {
    h.seed(
        0,
        500,
        DissolveState::DissolveDelaySeconds(DAY),
        &[(h.owner, CapabilitySet::FULL), (hotkey(), hotkey_caps())],
    )
}

fn send(
    h: &Harness,
    neuron: Subaccount,
    to: Principal,
    confirmation: Confirmation,
) -> Result<OwnershipTransfer, StepFailure> {
    block_on(send_neuron(
        h.services(),
        &h.session,
        SendNeuronRequest {
            neuron,
            recipient: to,
            confirmation,
        },
        &(),
    ))
}

fn confirmed(neuron: Subaccount) -> SendNeuronRequest {
    SendNeuronRequest {
        neuron,
        recipient: recipient(),
        confirmation: Confirmation::Confirmed,
    }
}

///
/// AfterGrant
/// Sandbox governance where another actor edits the neuron as soon as a
/// permission grant has been accepted.
///

struct AfterGrant<F> {
    inner: SandboxGovernance,
    sandbox: Sandbox,
    edit: F,
}

impl<F: Fn(&mut Neuron)> AfterGrant<F> {
    fn new(h: &Harness, edit: F) -> Self {
        Self {
            inner: h.handles.governance.clone(),
            sandbox: h.sandbox.clone(),
            edit,
        }
    }
}

#[async_trait(?Send)]
impl<F: Fn(&mut Neuron)> GovernanceClient for AfterGrant<F> {
    fn canister_id(&self) -> Principal {
        self.inner.canister_id()
    }

    fn caller(&self) -> Principal {
        self.inner.caller()
    }

    async fn manage_neuron(&self, arg: ManageNeuron) -> Result<ManageNeuronResponse, InfraError> {
        let grant = matches!(arg.command, Some(Command::AddNeuronPermissions(_)));
        let subaccount: Subaccount = arg.subaccount.as_slice().try_into().unwrap_or_default();

        let reply = self.inner.manage_neuron(arg).await?;
        if grant && !matches!(reply.command, Some(CommandResponse::Error(_))) {
            self.sandbox.update_neuron(&subaccount, &self.edit);
        }

        Ok(reply)
    }

    async fn get_neuron(&self, arg: GetNeuron) -> Result<GetNeuronResponse, InfraError> {
        self.inner.get_neuron(arg).await
    }

    async fn list_neurons(&self, arg: ListNeurons) -> Result<ListNeuronsResponse, InfraError> {
        self.inner.list_neurons(arg).await
    }

    async fn get_nervous_system_parameters(
        &self,
    ) -> Result<NervousSystemParameters, InfraError> {
        self.inner.get_nervous_system_parameters().await
    }
}

///
/// YieldingReads
/// Every neuron read gives other futures one turn first.
///

struct YieldingReads {
    inner: SandboxGovernance,
}

#[async_trait(?Send)]
impl GovernanceClient for YieldingReads {
    fn canister_id(&self) -> Principal {
        self.inner.canister_id()
    }

    fn caller(&self) -> Principal {
        self.inner.caller()
    }

    async fn manage_neuron(&self, arg: ManageNeuron) -> Result<ManageNeuronResponse, InfraError> {
        self.inner.manage_neuron(arg).await
    }

    async fn get_neuron(&self, arg: GetNeuron) -> Result<GetNeuronResponse, InfraError> {
        YieldOnce(false).await;
        self.inner.get_neuron(arg).await
    }

    async fn list_neurons(&self, arg: ListNeurons) -> Result<ListNeuronsResponse, InfraError> {
        self.inner.list_neurons(arg).await
    }

    async fn get_nervous_system_parameters(
        &self,
    ) -> Result<NervousSystemParameters, InfraError> {
        self.inner.get_nervous_system_parameters().await
    }
}

struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();

        Poll::Pending
    }
}

/// `(command kind, principal)` of every permission change, in order.
fn permission_changes(h: &Harness) -> Vec<(CommandKind, Principal)> {
    h.manage_calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Manage {
                command: Command::AddNeuronPermissions(add),
                ..
            } => Some((CommandKind::AddPermissions, add.principal_id?)),
            Call::Manage {
                command: Command::RemoveNeuronPermissions(remove),
                ..
            } => Some((CommandKind::RemovePermissions, remove.principal_id?)),
            _ => None,
        })
        .collect()
}

#[test]
fn recipient_ends_as_the_only_holder() {
    let h = Harness::new();
    let neuron = seed_shared(&h);
    let steps = progress();

    let transfer = block_on(send_neuron(
        h.services(),
        &h.session,
        SendNeuronRequest {
            neuron,
            recipient: recipient(),
            confirmation: Confirmation::Confirmed,
        },
        &steps,
    ))
    .expect("send neuron");

    assert!(transfer.status.is_completed());
    assert_eq!(transfer.granted, CapabilitySet::FULL);
    assert_eq!(h.holders(&neuron), vec![(recipient(), CapabilitySet::FULL)]);

    // grant first, sender removed last
    assert_eq!(
        permission_changes(&h),
        vec![
            (CommandKind::AddPermissions, recipient()),
            (CommandKind::RemovePermissions, hotkey()),
            (CommandKind::RemovePermissions, h.owner),
        ]
    );

    let entered: Vec<Step> = steps
        .into_inner()
        .into_iter()
        .filter_map(|s| match s {
            StepStatus::Entered(step) => Some(step),
            _ => None,
        })
        .collect();
    assert_eq!(
        entered,
        vec![
            Step::Validating,
            Step::Granting,
            Step::Verifying,
            Step::Revoking,
            Step::Verifying,
        ]
    );
}

#[test]
fn partial_recipient_is_granted_only_what_it_lacks() {
    let h = Harness::new();
    let vote = CapabilitySet::EMPTY.with(Capability::Vote);
    let neuron = h.seed(
        0,
        500,
        DissolveState::DissolveDelaySeconds(DAY),
        &[(h.owner, CapabilitySet::FULL), (recipient(), vote)],
    );

    let transfer =
        send(&h, neuron, recipient(), Confirmation::Confirmed).expect("send neuron");

    assert_eq!(transfer.granted, CapabilitySet::FULL.difference(vote));
    assert!(transfer.status.is_completed());
    assert_eq!(h.holders(&neuron), vec![(recipient(), CapabilitySet::FULL)]);
}

#[test]
fn failed_removal_leaves_the_recipient_in_control() {
    let h = Harness::new();
    let neuron = seed_shared(&h);
    h.sandbox.inject(
        FaultPoint::RemovePermissionsOf(h.owner),
        Fault::Reject {
            error_type: error_type::NOT_AUTHORIZED,
            message: "caller lacks permission".to_string(),
        },
    );

    let transfer =
        send(&h, neuron, recipient(), Confirmation::Confirmed).expect("handoff reaches revoke");

    match transfer.status {
        TransferStatus::RevokeIncomplete {
            principal,
            revoked,
            cause,
        } => {
            assert_eq!(principal, h.owner);
            assert_eq!(revoked, vec![hotkey()]);
            assert!(matches!(cause, Error::Permission { .. }));
        }
        other => panic!("expected an incomplete revoke, got {other:?}"),
    }

    // the neuron never lost a full holder
    let holders = h.holders(&neuron);
    assert!(holders.contains(&(recipient(), CapabilitySet::FULL)));
    assert!(holders.contains(&(h.owner, CapabilitySet::FULL)));
    assert!(!holders.iter().any(|(p, _)| *p == hotkey()));
}

#[test]
fn failed_grant_revokes_nothing() {
    let h = Harness::new();
    let neuron = seed_shared(&h);
    h.sandbox.inject(
        FaultPoint::Command(CommandKind::AddPermissions),
        Fault::Reject {
            error_type: error_type::ACCESS_CONTROL_LIST,
            message: "not grantable".to_string(),
        },
    );

    let failure = send(&h, neuron, recipient(), Confirmation::Confirmed).unwrap_err();

    assert_eq!(failure.step, Step::Granting);
    assert!(matches!(
        failure.error,
        Error::Permission {
            error_type: Some(error_type::ACCESS_CONTROL_LIST),
            ..
        }
    ));
    assert_eq!(failure.recovery(), Recovery::ReviseRequest);
    assert_eq!(
        permission_changes(&h),
        vec![(CommandKind::AddPermissions, recipient())]
    );
    assert_eq!(
        h.holders(&neuron),
        vec![(h.owner, CapabilitySet::FULL), (hotkey(), hotkey_caps())]
    );
}

#[test]
fn ungrantable_capabilities_are_refused_before_any_change() {
    let h = Harness::new();
    let neuron = seed_shared(&h);
    let disburse = CapabilitySet::EMPTY.with(Capability::Disburse);
    h.sandbox.update_parameters(|p| {
        p.neuron_grantable_permissions =
            Some(CapabilitySet::FULL.difference(disburse).to_permission_list());
    });

    let failure = send(&h, neuron, recipient(), Confirmation::Confirmed).unwrap_err();

    assert_eq!(failure.step, Step::Validating);
    match failure.error {
        Error::Validation(ValidationError::NotGrantable(missing)) => assert_eq!(missing, disburse),
        other => panic!("expected NotGrantable, got {other:?}"),
    }
    assert_eq!(failure.recovery(), Recovery::ReviseRequest);
    assert!(h.manage_calls().is_empty());
}

#[test]
fn grant_missing_on_read_back_stops_before_any_removal() {
    let h = Harness::new();
    let neuron = seed_shared(&h);
    let disburse = CapabilitySet::EMPTY.with(Capability::Disburse);
    let governance = AfterGrant::new(&h, |n: &mut Neuron| {
        for entry in &mut n.permissions {
            if entry.principal == Some(recipient()) {
                let held = CapabilitySet::from_codes(&entry.permission_type);
                entry.permission_type = held.difference(disburse).to_codes();
            }
        }
    });
    let services = Services::new(&h.handles.ledger, &governance, &h.handles.clock);

    let failure = block_on(send_neuron(services, &h.session, confirmed(neuron), &())).unwrap_err();

    assert_eq!(failure.step, Step::Verifying);
    assert!(matches!(
        failure.error,
        Error::Permission {
            command: "add_neuron_permissions",
            ..
        }
    ));
    assert_eq!(
        permission_changes(&h),
        vec![(CommandKind::AddPermissions, recipient())]
    );

    let holders = h.holders(&neuron);
    assert!(holders.contains(&(h.owner, CapabilitySet::FULL)));
    assert!(holders.contains(&(hotkey(), hotkey_caps())));
    assert!(!h.session.is_busy(&neuron));
}

#[test]
fn holder_added_during_the_handoff_is_removed_too() {
    let h = Harness::new();
    let neuron = seed_shared(&h);
    let intruder = Fake::principal(9);
    let governance = AfterGrant::new(&h, move |n: &mut Neuron| {
        n.permissions.push(NeuronPermission {
            principal: Some(intruder),
            permission_type: CapabilitySet::FULL.to_codes(),
        });
    });
    let services = Services::new(&h.handles.ledger, &governance, &h.handles.clock);

    let transfer =
        block_on(send_neuron(services, &h.session, confirmed(neuron), &())).expect("send neuron");

    assert!(transfer.status.is_completed());
    assert_eq!(h.holders(&neuron), vec![(recipient(), CapabilitySet::FULL)]);

    // removals follow the read taken after the grant, sender still last
    assert_eq!(
        permission_changes(&h),
        vec![
            (CommandKind::AddPermissions, recipient()),
            (CommandKind::RemovePermissions, hotkey()),
            (CommandKind::RemovePermissions, intruder),
            (CommandKind::RemovePermissions, h.owner),
        ]
    );
}

#[test]
fn overlapping_sends_of_one_neuron_are_refused() {
    let h = Harness::new();
    let neuron = seed_shared(&h);
    let governance = YieldingReads {
        inner: h.handles.governance.clone(),
    };
    let services = Services::new(&h.handles.ledger, &governance, &h.handles.clock);
    let other = Session::sharing(WorkflowSettings::default(), h.session.busy_set().clone());

    let (first, second) = block_on(async {
        futures::join!(
            send_neuron(services, &h.session, confirmed(neuron), &()),
            send_neuron(services, &other, confirmed(neuron), &()),
        )
    });

    assert!(first.expect("first send").status.is_completed());
    let failure = second.unwrap_err();
    assert!(matches!(failure.error, Error::Busy(_)));
    assert_eq!(failure.recovery(), Recovery::Wait);

    // only the first send touched permissions
    let grants = permission_changes(&h)
        .into_iter()
        .filter(|(kind, _)| *kind == CommandKind::AddPermissions)
        .count();
    assert_eq!(grants, 1);
    assert!(!h.session.is_busy(&neuron));
    assert!(!other.is_busy(&neuron));
}

#[test]
fn sending_to_yourself_is_rejected() {
    let h = Harness::new();
    let neuron = seed_shared(&h);

    let failure = send(&h, neuron, h.owner, Confirmation::Confirmed).unwrap_err();

    assert!(matches!(
        failure.error,
        Error::Validation(ValidationError::SelfTransfer(_))
    ));
    assert!(h.manage_calls().is_empty());
}

#[test]
fn unconfirmed_send_is_rejected() {
    let h = Harness::new();
    let neuron = seed_shared(&h);

    let failure = send(&h, neuron, recipient(), Confirmation::Unconfirmed).unwrap_err();

    assert!(matches!(
        failure.error,
        Error::Validation(ValidationError::Unconfirmed)
    ));
    assert_eq!(failure.recovery(), Recovery::ReviseRequest);
    assert!(h.manage_calls().is_empty());
}

#[test]
fn sender_without_manage_principals_cannot_send() {
    let h = Harness::new();
    let neuron = h.seed(
        0,
        500,
        DissolveState::DissolveDelaySeconds(DAY),
        &[
            (Fake::principal(8), CapabilitySet::FULL),
            (h.owner, hotkey_caps()),
        ],
    );

    let failure = send(&h, neuron, recipient(), Confirmation::Confirmed).unwrap_err();

    assert!(matches!(
        failure.error,
        Error::Validation(ValidationError::MissingCapability {
            capability: Capability::ManagePrincipals,
            ..
        })
    ));
    assert!(h.manage_calls().is_empty());
}

#[test]
fn unreachable_governance_fails_before_any_change() {
    let h = Harness::new();
    let neuron = seed_shared(&h);
    h.sandbox.inject(FaultPoint::GetNeuron, Fault::NotExecuted);

    let failure = send(&h, neuron, recipient(), Confirmation::Confirmed).unwrap_err();

    assert_eq!(failure.step, Step::Validating);
    assert!(matches!(failure.error, Error::Network { .. }));
    assert_eq!(failure.recovery(), Recovery::RetryStep(Step::Validating));
    assert!(h.manage_calls().is_empty());
    assert!(!h.session.is_busy(&neuron));
}
