//! Multi-step neuron workflows.
//!
//! Each workflow takes the [`Services`] it may call, the caller's
//! [`Session`], a request and a progress sink. It performs its calls in a
//! fixed order and, on failure, reports the step that failed so the caller
//! knows what already took effect (see [`StepFailure::recovery`]).
//!
//! [`StepFailure::recovery`]: crate::error::StepFailure::recovery

pub mod create;
pub mod disburse;
pub mod dissolve;
pub mod nonce;
pub mod progress;
pub mod query;
pub mod session;
pub mod split;
pub mod top_up;
pub mod transfer;

use crate::{
    infra::{Clock, GovernanceClient, LedgerClient},
    ops::{GovernanceOps, LedgerOps},
};

pub use {
    progress::{ProgressSink, Step, StepStatus},
    session::{BusySet, Session, WorkflowSettings},
};

///
/// Services
/// The clients one workflow run talks to.
///

#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub ledger: &'a dyn LedgerClient,
    pub governance: &'a dyn GovernanceClient,
    pub clock: &'a dyn Clock,
}

impl<'a> Services<'a> {
    #[must_use]
    pub const fn new(
        ledger: &'a dyn LedgerClient,
        governance: &'a dyn GovernanceClient,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            ledger,
            governance,
            clock,
        }
    }

    pub(crate) const fn ledger_ops(&self) -> LedgerOps<'a> {
        LedgerOps::new(self.ledger)
    }

    pub(crate) const fn governance_ops(&self) -> GovernanceOps<'a> {
        GovernanceOps::new(self.governance)
    }
}
