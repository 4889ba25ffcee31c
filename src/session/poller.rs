//! Status polling timer
//!
//! The controller owns exactly one [`Poller`]. It holds at most one live
//! tick task, always aimed at the current session.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::models::SessionId;

/// Fixed polling cadence
pub const POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// A running tick task for one session. Aborts the task when dropped.
#[derive(Debug)]
pub struct PollingHandle {
    target: SessionId,
    task: JoinHandle<()>,
}

impl PollingHandle {
    pub fn target(&self) -> &SessionId {
        &self.target
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Owner of the polling timer
#[derive(Debug)]
pub struct Poller {
    period: Duration,
    active: Option<PollingHandle>,
}

impl Poller {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            active: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Session the live timer targets, if any
    pub fn target(&self) -> Option<&SessionId> {
        self.active.as_ref().map(PollingHandle::target)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Cancel any live timer, then start one for `target`.
    ///
    /// Each tick sends `make_tick(target)` on `tx`. The first tick fires
    /// one period after the call. The task ends when `tx` is closed.
    pub fn replace<E, F>(&mut self, target: SessionId, tx: UnboundedSender<E>, make_tick: F)
    where
        E: Send + 'static,
        F: Fn(SessionId) -> E + Send + 'static,
    {
        self.release();

        let period = self.period;
        let id = target.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(make_tick(id.clone())).is_err() {
                    break;
                }
            }
        });

        self.active = Some(PollingHandle { target, task });
    }

    /// Stop the live timer. Returns `false` if none was running.
    pub fn release(&mut self) -> bool {
        self.active.take().is_some()
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(POLL_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_fixed_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = Poller::default();
        poller.replace("a".into(), tx, |id| id);

        let started = Instant::now();
        assert_eq!(rx.recv().await, Some(SessionId::new("a")));
        assert_eq!(started.elapsed(), POLL_INTERVAL);
        assert_eq!(rx.recv().await, Some(SessionId::new("a")));
        assert_eq!(started.elapsed(), POLL_INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_cancels_previous_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = Poller::default();
        poller.replace("a".into(), tx.clone(), |id| id);
        poller.replace("b".into(), tx, |id| id);
        assert_eq!(poller.target(), Some(&SessionId::new("b")));

        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(SessionId::new("b")));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_is_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel::<SessionId>();
        let mut poller = Poller::default();
        assert!(!poller.release());

        poller.replace("a".into(), tx, |id| id);
        assert!(poller.release());
        assert!(!poller.release());
        assert!(!poller.is_active());

        // The aborted task dropped its sender, so the channel closes
        assert_eq!(rx.recv().await, None);
    }
}
