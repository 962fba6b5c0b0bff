//! Short-lived status messages for the presentation layer.

use crate::config::STATUS_TTL;
use std::sync::{
    Arc,
    Mutex,
};
use tokio::time::sleep;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Pending,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionStatus {
    pub kind: StatusKind,
    pub message: String,
}

#[derive(Default)]
struct Slot {
    status: Option<ActionStatus>,
    epoch: u64,
}

/// Single-slot status holder with a 5 second auto-expiry. Each publish bumps
/// an epoch; the expiry task only clears the slot if its epoch is still the
/// latest, so a newer status always outlives an older timer.
#[derive(Clone, Default)]
pub struct StatusChannel {
    inner: Arc<Mutex<Slot>>,
}

impl StatusChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, kind: StatusKind, message: impl Into<String>) {
        let epoch = {
            let mut slot = self.inner.lock().unwrap();
            slot.epoch += 1;
            slot.status = Some(ActionStatus {
                kind,
                message: message.into(),
            });
            slot.epoch
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            sleep(STATUS_TTL).await;
            let mut slot = inner.lock().unwrap();
            if slot.epoch == epoch {
                slot.status = None;
            }
        });
    }

    pub fn clear(&self) {
        let mut slot = self.inner.lock().unwrap();
        slot.epoch += 1;
        slot.status = None;
    }

    pub fn current(&self) -> Option<ActionStatus> {
        self.inner.lock().unwrap().status.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use std::time::Duration;
    use tokio::{
        task::yield_now,
        time::advance,
    };

    #[tokio::test(start_paused = true)]
    async fn publish__expires_after_exactly_five_seconds() {
        // given
        let channel = StatusChannel::new();
        channel.publish(StatusKind::Success, "Pixel painted successfully!");

        // when
        advance(Duration::from_millis(4_999)).await;
        yield_now().await;

        // then
        assert!(channel.current().is_some());

        // when
        advance(Duration::from_millis(2)).await;
        yield_now().await;

        // then
        assert_eq!(channel.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn publish__newer_status_survives_older_timer() {
        // given
        let channel = StatusChannel::new();
        channel.publish(StatusKind::Pending, "Preparing transaction...");

        // when the first status is superseded before it expires
        advance(Duration::from_millis(3_000)).await;
        channel.publish(StatusKind::Success, "Pixel painted successfully!");
        advance(Duration::from_millis(3_000)).await;
        yield_now().await;

        // then the older timer firing at t=5s did not clear the newer status
        let current = channel.current().unwrap();
        assert_eq!(current.kind, StatusKind::Success);

        // when the newer status reaches its own five seconds
        advance(Duration::from_millis(2_001)).await;
        yield_now().await;

        // then
        assert_eq!(channel.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn clear__cancels_the_pending_expiry() {
        // given
        let channel = StatusChannel::new();
        channel.publish(StatusKind::Error, "Transaction failed");

        // when
        channel.clear();
        channel.publish(StatusKind::Pending, "Preparing transaction...");
        advance(Duration::from_millis(1)).await;
        yield_now().await;

        // then the clear did not eat the fresh status
        assert!(channel.current().is_some());
    }
}
