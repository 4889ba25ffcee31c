//! Controller outputs
//!
//! The controller never draws anything itself. It reports to a status
//! sink (the status panel) and a playback sink (the video surface).

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::api::BackendError;
use crate::models::{SessionId, TransferKind, TransferStatus};

/// Status display abstraction
pub trait StatusSink: Send + 'static {
    /// A new session became current
    fn session_started(&mut self, id: &SessionId, kind: TransferKind);

    /// A fresh status snapshot for the current session
    fn publish(&mut self, id: &SessionId, status: &TransferStatus);

    /// An upload or seed request failed; the current session is untouched
    fn report_failure(&mut self, kind: TransferKind, error: &BackendError);
}

/// Video element abstraction
pub trait PlaybackSink: Send + 'static {
    /// Begin loading the stream of a session that just became ready
    fn attach(&mut self, id: &SessionId, stream_url: &str);
}

/// Everything a sink can be told, as a message.
///
/// Lets a frontend running on another task (the TUI event loop) receive
/// controller output over a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkEvent {
    SessionStarted { id: SessionId, kind: TransferKind },
    Status { id: SessionId, status: TransferStatus },
    Failure { kind: TransferKind, message: String },
    PlaybackReady { id: SessionId, stream_url: String },
}

/// Forwards controller output to a channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<SinkEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: SinkEvent) {
        // Receiver gone means the frontend is shutting down
        let _ = self.tx.send(event);
    }
}

impl StatusSink for ChannelSink {
    fn session_started(&mut self, id: &SessionId, kind: TransferKind) {
        self.send(SinkEvent::SessionStarted {
            id: id.clone(),
            kind,
        });
    }

    fn publish(&mut self, id: &SessionId, status: &TransferStatus) {
        self.send(SinkEvent::Status {
            id: id.clone(),
            status: *status,
        });
    }

    fn report_failure(&mut self, kind: TransferKind, error: &BackendError) {
        self.send(SinkEvent::Failure {
            kind,
            message: error.to_string(),
        });
    }
}

impl PlaybackSink for ChannelSink {
    fn attach(&mut self, id: &SessionId, stream_url: &str) {
        self.send(SinkEvent::PlaybackReady {
            id: id.clone(),
            stream_url: stream_url.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_channel_sink_forwards_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = ChannelSink::new(tx);
        let id = SessionId::new("abc123");

        StatusSink::session_started(&mut sink, &id, TransferKind::Upload);
        sink.publish(&id, &TransferStatus::default());
        sink.report_failure(TransferKind::Seed, &BackendError::Http(500));
        sink.attach(&id, "http://localhost:8000/stream/abc123");

        assert_eq!(
            rx.try_recv().ok(),
            Some(SinkEvent::SessionStarted {
                id: id.clone(),
                kind: TransferKind::Upload
            })
        );
        assert!(matches!(rx.try_recv(), Ok(SinkEvent::Status { .. })));
        assert_eq!(
            rx.try_recv().ok(),
            Some(SinkEvent::Failure {
                kind: TransferKind::Seed,
                message: "Backend returned HTTP 500".to_string()
            })
        );
        assert!(matches!(rx.try_recv(), Ok(SinkEvent::PlaybackReady { .. })));
    }

    #[test]
    fn test_channel_sink_tolerates_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        sink.attach(&SessionId::new("a"), "http://x/stream/a");
    }
}
