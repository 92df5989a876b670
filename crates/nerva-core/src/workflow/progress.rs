//! Typed progress reporting.
//!
//! Workflows emit a [`StepStatus`] each time they enter a step, finish, or
//! fail. Sinks decide what to do with them: drop them, collect them, or
//! forward them over a channel to whatever renders them.

use crate::error::{Error, StepFailure};
use derive_more::Display;
use futures::channel::mpsc::UnboundedSender;
use std::cell::{Cell, RefCell};

///
/// Step
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Step {
    #[display("validating request")]
    Validating,

    #[display("allocating nonce")]
    Allocating,

    #[display("deriving staking account")]
    Deriving,

    #[display("transferring tokens")]
    Transferring,

    #[display("awaiting settlement")]
    AwaitingSettlement,

    #[display("claiming neuron")]
    Claiming,

    #[display("configuring neuron")]
    Configuring,

    #[display("splitting neuron")]
    Splitting,

    #[display("granting permissions")]
    Granting,

    #[display("verifying permissions")]
    Verifying,

    #[display("revoking permissions")]
    Revoking,

    #[display("disbursing")]
    Disbursing,

    #[display("reading neuron")]
    Querying,
}

///
/// StepStatus
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StepStatus {
    Entered(Step),

    /// A non-essential step failed; the workflow carries on.
    Degraded { step: Step, cause: String },

    Done,

    Failed { step: Step, cause: String },
}

impl StepStatus {
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Entered(step) => step.to_string(),
            Self::Degraded { step, cause } => format!("{step} incomplete: {cause}"),
            Self::Done => "done".to_string(),
            Self::Failed { step, cause } => format!("{step} failed: {cause}"),
        }
    }
}

///
/// ProgressSink
///

pub trait ProgressSink {
    fn emit(&self, status: StepStatus);
}

impl ProgressSink for () {
    fn emit(&self, _: StepStatus) {}
}

impl ProgressSink for RefCell<Vec<StepStatus>> {
    fn emit(&self, status: StepStatus) {
        self.borrow_mut().push(status);
    }
}

impl ProgressSink for UnboundedSender<StepStatus> {
    fn emit(&self, status: StepStatus) {
        // a closed receiver just means nobody is watching
        let _ = self.unbounded_send(status);
    }
}

///
/// Tracker
/// Remembers the current step so failures are attributed to it.
///

pub(crate) struct Tracker<'a> {
    sink: &'a dyn ProgressSink,
    current: Cell<Step>,
}

impl<'a> Tracker<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink) -> Self {
        sink.emit(StepStatus::Entered(Step::Validating));

        Self {
            sink,
            current: Cell::new(Step::Validating),
        }
    }

    pub(crate) fn enter(&self, step: Step) {
        self.current.set(step);
        self.sink.emit(StepStatus::Entered(step));
    }

    pub(crate) fn step(&self) -> Step {
        self.current.get()
    }

    pub(crate) fn degrade(&self, cause: &Error) {
        self.sink.emit(StepStatus::Degraded {
            step: self.step(),
            cause: cause.to_string(),
        });
    }

    pub(crate) fn done(&self) {
        self.sink.emit(StepStatus::Done);
    }

    /// Report `error` against the current step.
    pub(crate) fn fail(&self, error: impl Into<Error>) -> StepFailure {
        let error = error.into();
        self.sink.emit(StepStatus::Failed {
            step: self.step(),
            cause: error.to_string(),
        });

        StepFailure::new(self.step(), error)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use futures::{StreamExt, channel::mpsc, executor::block_on};

    #[test]
    fn tracker_attributes_failures_to_the_current_step() {
        let sink = RefCell::new(Vec::new());
        let tracker = Tracker::new(&sink);

        tracker.enter(Step::Transferring);
        let failure = tracker.fail(ValidationError::ZeroAmount);

        assert_eq!(failure.step, Step::Transferring);
        assert_eq!(
            sink.into_inner(),
            vec![
                StepStatus::Entered(Step::Validating),
                StepStatus::Entered(Step::Transferring),
                StepStatus::Failed {
                    step: Step::Transferring,
                    cause: "amount must be greater than zero".to_string(),
                },
            ]
        );
    }

    #[test]
    fn channel_sink_forwards_statuses() {
        let (tx, rx) = mpsc::unbounded();
        tx.emit(StepStatus::Entered(Step::Claiming));
        tx.emit(StepStatus::Done);
        drop(tx);

        let labels: Vec<_> = block_on(rx.map(|s| s.label()).collect());
        assert_eq!(labels, vec!["claiming neuron", "done"]);
    }
}
