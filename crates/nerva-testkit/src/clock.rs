use crate::Sandbox;
use async_trait::async_trait;
use nerva_core::infra::Clock;
use std::time::Duration;

///
/// SandboxClock
/// Sleeping returns at once, advancing sandbox time by the full duration.
///

#[derive(Clone)]
pub struct SandboxClock {
    sandbox: Sandbox,
}

impl SandboxClock {
    pub(crate) const fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait(?Send)]
impl Clock for SandboxClock {
    fn now_nanos(&self) -> u64 {
        self.sandbox.state.borrow().now_nanos
    }

    async fn sleep(&self, duration: Duration) {
        self.sandbox.state.borrow_mut().sleeps.push(duration);
        self.sandbox.advance(duration);
    }
}
