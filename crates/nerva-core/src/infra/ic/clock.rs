use crate::{
    cdk::{timers::set_timer, utils::time::now_nanos},
    infra::Clock,
};
use async_trait::async_trait;
use futures::channel::oneshot;
use std::time::Duration;

///
/// IcClock
/// Replica time; sleeping parks the workflow on a one-shot timer.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct IcClock;

#[async_trait(?Send)]
impl Clock for IcClock {
    fn now_nanos(&self) -> u64 {
        now_nanos()
    }

    async fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }

        let (tx, rx) = oneshot::channel::<()>();
        set_timer(duration, async move {
            let _ = tx.send(());
        });

        // a dropped sender only happens if the timer is cleared; treat as elapsed
        let _ = rx.await;
    }
}
