//! Session lifecycle state machine
//!
//! Pure, synchronous bookkeeping for the controller: which session is
//! current, whether its readiness latch has fired, and which in-flight
//! upload/seed responses are still allowed to take effect.

use std::fmt;

use crate::models::{ReadinessThreshold, SessionId, TransferStatus};

/// Generation tag attached to every upload/seed request.
///
/// Tags are issued in increasing order; a response only takes effect if
/// its tag is newer than the last one applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTag(u64);

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Controller phase
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// No session yet
    Idle,
    /// A current session and its readiness latch
    HasSession { id: SessionId, ready: bool },
    /// Torn down; nothing is accepted any more
    TornDown,
}

/// Result of offering a status snapshot to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// The snapshot targets a session that is no longer current
    Stale,
    /// Publish the snapshot; readiness unchanged
    Updated,
    /// Publish the snapshot and attach playback (latch just fired)
    BecameReady,
}

/// Session bookkeeping owned by the controller
#[derive(Debug)]
pub struct SessionState {
    phase: Phase,
    threshold: ReadinessThreshold,
    issued: u64,
    applied: u64,
}

impl SessionState {
    pub fn new(threshold: ReadinessThreshold) -> Self {
        Self {
            phase: Phase::Idle,
            threshold,
            issued: 0,
            applied: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn threshold(&self) -> ReadinessThreshold {
        self.threshold
    }

    /// Current session id, if any
    pub fn current(&self) -> Option<&SessionId> {
        match &self.phase {
            Phase::HasSession { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Whether the current session's latch has fired
    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::HasSession { ready: true, .. })
    }

    pub fn is_torn_down(&self) -> bool {
        self.phase == Phase::TornDown
    }

    /// Whether `id` names the current session
    pub fn is_current(&self, id: &SessionId) -> bool {
        self.current() == Some(id)
    }

    /// Issue a tag for a new upload/seed request
    pub fn issue_request(&mut self) -> RequestTag {
        self.issued += 1;
        RequestTag(self.issued)
    }

    /// Apply a successful upload/seed response.
    ///
    /// Returns `true` if `id` became the current session (latch reset to
    /// `false`). Returns `false` if the response is older than one already
    /// applied, or the controller is torn down.
    pub fn accept_session(&mut self, tag: RequestTag, id: SessionId) -> bool {
        if self.is_torn_down() || tag.0 <= self.applied {
            return false;
        }
        self.applied = tag.0;
        self.phase = Phase::HasSession { id, ready: false };
        true
    }

    /// Offer a polled status snapshot for `id`
    pub fn observe_status(&mut self, id: &SessionId, status: &TransferStatus) -> StatusOutcome {
        let threshold = self.threshold;
        match &mut self.phase {
            Phase::HasSession { id: current, ready } if current == id => {
                if !*ready && threshold.is_met(status.progress) {
                    *ready = true;
                    StatusOutcome::BecameReady
                } else {
                    StatusOutcome::Updated
                }
            }
            _ => StatusOutcome::Stale,
        }
    }

    /// Enter the terminal phase. Idempotent.
    pub fn teardown(&mut self) {
        self.phase = Phase::TornDown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(progress: f64) -> TransferStatus {
        TransferStatus {
            progress,
            ..Default::default()
        }
    }

    #[test]
    fn test_starts_idle() {
        let state = SessionState::new(ReadinessThreshold::default());
        assert_eq!(state.phase(), &Phase::Idle);
        assert!(state.current().is_none());
        assert!(!state.is_ready());
    }

    #[test]
    fn test_accept_session_resets_latch() {
        let mut state = SessionState::new(ReadinessThreshold::Percent(10.0));
        let tag = state.issue_request();
        assert!(state.accept_session(tag, "a".into()));
        assert_eq!(state.observe_status(&"a".into(), &status(50.0)), StatusOutcome::BecameReady);
        assert!(state.is_ready());

        let tag = state.issue_request();
        assert!(state.accept_session(tag, "b".into()));
        assert_eq!(
            state.phase(),
            &Phase::HasSession {
                id: "b".into(),
                ready: false
            }
        );
    }

    #[test]
    fn test_latch_fires_once_at_first_crossing() {
        let mut state = SessionState::new(ReadinessThreshold::Percent(10.0));
        let tag = state.issue_request();
        state.accept_session(tag, "abc123".into());
        let id = SessionId::new("abc123");

        let outcomes: Vec<_> = [0.0, 5.0, 10.0, 15.0, 100.0]
            .iter()
            .map(|p| state.observe_status(&id, &status(*p)))
            .collect();

        assert_eq!(
            outcomes,
            vec![
                StatusOutcome::Updated,
                StatusOutcome::Updated,
                StatusOutcome::BecameReady,
                StatusOutcome::Updated,
                StatusOutcome::Updated,
            ]
        );
    }

    #[test]
    fn test_latch_never_resets_on_regressing_progress() {
        let mut state = SessionState::new(ReadinessThreshold::AnyProgress);
        let tag = state.issue_request();
        state.accept_session(tag, "a".into());
        state.observe_status(&"a".into(), &status(1.0));
        state.observe_status(&"a".into(), &status(0.0));
        assert!(state.is_ready());
    }

    #[test]
    fn test_stale_status_ignored() {
        let mut state = SessionState::new(ReadinessThreshold::AnyProgress);
        let first = state.issue_request();
        state.accept_session(first, "old".into());
        let second = state.issue_request();
        state.accept_session(second, "new".into());

        assert_eq!(
            state.observe_status(&"old".into(), &status(90.0)),
            StatusOutcome::Stale
        );
        assert!(!state.is_ready());
    }

    #[test]
    fn test_older_response_discarded_after_newer_applied() {
        let mut state = SessionState::new(ReadinessThreshold::default());
        let first = state.issue_request();
        let second = state.issue_request();

        assert!(state.accept_session(second, "second".into()));
        assert!(!state.accept_session(first, "first".into()));
        assert_eq!(state.current(), Some(&SessionId::new("second")));
    }

    #[test]
    fn test_older_response_applies_when_newer_failed() {
        let mut state = SessionState::new(ReadinessThreshold::default());
        let first = state.issue_request();
        let _failed = state.issue_request();

        assert!(state.accept_session(first, "first".into()));
        assert_eq!(state.current(), Some(&SessionId::new("first")));
    }

    #[test]
    fn test_teardown_is_terminal() {
        let mut state = SessionState::new(ReadinessThreshold::default());
        let tag = state.issue_request();
        state.accept_session(tag, "a".into());
        state.teardown();
        state.teardown();

        assert!(state.is_torn_down());
        let tag = state.issue_request();
        assert!(!state.accept_session(tag, "b".into()));
        assert_eq!(
            state.observe_status(&"a".into(), &status(50.0)),
            StatusOutcome::Stale
        );
    }

    #[test]
    fn test_tags_are_ordered() {
        let mut state = SessionState::new(ReadinessThreshold::default());
        let a = state.issue_request();
        let b = state.issue_request();
        assert!(a < b);
        assert_eq!(a.to_string(), "#1");
    }
}
