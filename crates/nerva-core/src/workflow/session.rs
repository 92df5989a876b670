//! Per-invocation state shared by the workflows of one caller.
//!
//! A `Session` owns the caches a sequence of operations may reuse and the
//! advisory busy flags that stop two workflows from driving the same neuron
//! at once. Caches die with the session; the [`BusySet`] can be shared so
//! sessions built per call still see each other's in-flight neurons.

use crate::{
    Error,
    cdk::types::Subaccount,
    config::schema::WorkflowConfig,
    domain::params::StakingParameters,
    ops::GovernanceOps,
};
use std::{
    cell::RefCell,
    collections::{BTreeSet, HashSet},
    rc::Rc,
    time::Duration,
};

///
/// WorkflowSettings
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WorkflowSettings {
    pub settlement_delay: Duration,
    pub nonce_scan_limit: u64,
    pub list_limit: u32,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from(&WorkflowConfig::default())
    }
}

impl From<&WorkflowConfig> for WorkflowSettings {
    fn from(cfg: &WorkflowConfig) -> Self {
        Self {
            settlement_delay: Duration::from_millis(cfg.settlement_delay_ms),
            nonce_scan_limit: cfg.nonce_scan_limit,
            list_limit: cfg.list_limit,
        }
    }
}

///
/// BusySet
/// Neurons with a workflow in flight. Clones share the same set.
///

#[derive(Clone, Debug, Default)]
pub struct BusySet(Rc<RefCell<BTreeSet<Subaccount>>>);

impl BusySet {
    #[must_use]
    pub fn contains(&self, subaccount: &Subaccount) -> bool {
        self.0.borrow().contains(subaccount)
    }

    fn insert(&self, subaccount: Subaccount) -> bool {
        self.0.borrow_mut().insert(subaccount)
    }

    fn remove(&self, subaccount: &Subaccount) {
        self.0.borrow_mut().remove(subaccount);
    }
}

///
/// Session
///

#[derive(Debug, Default)]
pub struct Session {
    settings: WorkflowSettings,
    parameters: RefCell<Option<StakingParameters>>,
    // neurons are never deleted, so a slot seen taken stays taken
    taken: RefCell<HashSet<Subaccount>>,
    busy: BusySet,
}

impl Session {
    #[must_use]
    pub fn new(settings: WorkflowSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// A session with fresh caches whose busy flags live in `busy`.
    #[must_use]
    pub fn sharing(settings: WorkflowSettings, busy: BusySet) -> Self {
        Self {
            settings,
            busy,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn busy_set(&self) -> &BusySet {
        &self.busy
    }

    #[must_use]
    pub const fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Nervous-system parameters, fetched once per session.
    pub(crate) async fn parameters(
        &self,
        governance: &GovernanceOps<'_>,
    ) -> Result<StakingParameters, Error> {
        if let Some(params) = *self.parameters.borrow() {
            return Ok(params);
        }

        let params = governance.parameters().await?;
        *self.parameters.borrow_mut() = Some(params);

        Ok(params)
    }

    /// Forget cached parameters so the next read goes to governance.
    pub fn invalidate_parameters(&self) {
        self.parameters.borrow_mut().take();
    }

    #[must_use]
    pub fn is_known_taken(&self, subaccount: &Subaccount) -> bool {
        self.taken.borrow().contains(subaccount)
    }

    pub(crate) fn mark_taken(&self, subaccount: Subaccount) {
        self.taken.borrow_mut().insert(subaccount);
    }

    #[must_use]
    pub fn is_busy(&self, subaccount: &Subaccount) -> bool {
        self.busy.contains(subaccount)
    }

    /// Flag `subaccount` as in flight until the guard drops.
    pub(crate) fn acquire(&self, subaccount: Subaccount) -> Result<BusyGuard<'_>, Error> {
        if !self.busy.insert(subaccount) {
            return Err(Error::Busy(hex::encode(subaccount)));
        }

        Ok(BusyGuard {
            session: self,
            subaccount,
        })
    }
}

///
/// BusyGuard
///

pub(crate) struct BusyGuard<'a> {
    session: &'a Session,
    subaccount: Subaccount,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.session.busy.remove(&self.subaccount);
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_flag_releases_on_drop() {
        let session = Session::default();

        let guard = session.acquire([1; 32]).unwrap();
        assert!(session.is_busy(&[1; 32]));
        assert!(matches!(session.acquire([1; 32]), Err(Error::Busy(_))));
        assert!(session.acquire([2; 32]).is_ok());

        drop(guard);
        assert!(!session.is_busy(&[1; 32]));
        assert!(session.acquire([1; 32]).is_ok());
    }

    #[test]
    fn sharing_sessions_see_each_others_flags() {
        let first = Session::default();
        let second = Session::sharing(WorkflowSettings::default(), first.busy_set().clone());

        let guard = first.acquire([7; 32]).unwrap();
        assert!(second.is_busy(&[7; 32]));
        assert!(matches!(second.acquire([7; 32]), Err(Error::Busy(_))));

        drop(guard);
        assert!(second.acquire([7; 32]).is_ok());
        assert!(!Session::default().is_busy(&[7; 32]));
    }

    #[test]
    fn settings_follow_the_workflow_config() {
        let settings = WorkflowSettings::default();

        assert_eq!(settings.settlement_delay, Duration::from_secs(5));
        assert_eq!(settings.nonce_scan_limit, 100);
        assert_eq!(Session::new(settings).settings().list_limit, 100);
    }
}
