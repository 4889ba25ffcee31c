//! Session controller
//!
//! Creates sessions, polls their transfer status on a fixed cadence,
//! decides when playback may begin and tears polling down.
//!
//! The controller is an actor: a single task owns every piece of mutable
//! state and reacts to two queues:
//! - [`Command`]s sent by frontends through a [`ControllerHandle`]
//! - internal events from its own spawned work (upload responses, ticks,
//!   status responses), each tagged with what it targets
//!
//! Nothing runs in parallel with the state it touches, so no locks are
//! involved. Stale results are recognised by their tag and dropped.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{Backend, BackendError};
use crate::models::{ReadinessThreshold, SessionId, TransferKind, TransferStatus};
use crate::session::poller::{Poller, POLL_INTERVAL};
use crate::session::sink::{PlaybackSink, StatusSink};
use crate::session::state::{RequestTag, SessionState, StatusOutcome};

/// Controller errors surfaced to frontends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("No active session")]
    NoSession,

    #[error("Session controller has shut down")]
    Closed,
}

/// Tunables for a controller instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerOptions {
    pub threshold: ReadinessThreshold,
    pub poll_interval: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            threshold: ReadinessThreshold::default(),
            poll_interval: POLL_INTERVAL,
        }
    }
}

/// Where to fetch the download artifact of the current session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRequest {
    pub session: SessionId,
    pub url: String,
}

/// Point-in-time view of the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerSnapshot {
    pub session: Option<SessionId>,
    pub ready: bool,
    pub polling: Option<SessionId>,
}

/// Requests from frontends
#[derive(Debug)]
pub enum Command {
    Begin {
        kind: TransferKind,
        file: PathBuf,
    },
    RequestArtifact(oneshot::Sender<Result<ArtifactRequest, ControllerError>>),
    Snapshot(oneshot::Sender<ControllerSnapshot>),
    Teardown(oneshot::Sender<()>),
}

/// Results of the controller's own spawned work
#[derive(Debug)]
enum Event {
    Created {
        tag: RequestTag,
        kind: TransferKind,
        result: Result<SessionId, BackendError>,
    },
    Tick(SessionId),
    Status {
        id: SessionId,
        result: Result<TransferStatus, BackendError>,
    },
}

/// Cloneable handle for driving a running controller
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: UnboundedSender<Command>,
}

impl ControllerHandle {
    /// Upload a video file for seeding. Resolves in the background.
    pub fn begin_upload(&self, file: impl Into<PathBuf>) -> Result<(), ControllerError> {
        self.send(Command::Begin {
            kind: TransferKind::Upload,
            file: file.into(),
        })
    }

    /// Seed from a `.torrent` descriptor. Resolves in the background.
    pub fn begin_seed(&self, torrent: impl Into<PathBuf>) -> Result<(), ControllerError> {
        self.send(Command::Begin {
            kind: TransferKind::Seed,
            file: torrent.into(),
        })
    }

    /// Resolve the download-artifact location of the current session
    pub async fn request_download_artifact(&self) -> Result<ArtifactRequest, ControllerError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::RequestArtifact(tx))?;
        rx.await.map_err(|_| ControllerError::Closed)?
    }

    pub async fn snapshot(&self) -> Result<ControllerSnapshot, ControllerError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| ControllerError::Closed)
    }

    /// Release the polling timer and stop the controller.
    ///
    /// Returns once the timer is released. Calling it on a controller that
    /// already stopped is a no-op.
    pub async fn teardown(&self) {
        let (tx, rx) = oneshot::channel();
        if self.send(Command::Teardown(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, command: Command) -> Result<(), ControllerError> {
        self.tx.send(command).map_err(|_| ControllerError::Closed)
    }
}

/// The session lifecycle and playback-readiness controller
pub struct SessionController<B, S, P> {
    backend: Arc<B>,
    status_sink: S,
    playback_sink: P,
    state: SessionState,
    poller: Poller,
    commands: UnboundedReceiver<Command>,
    events_tx: UnboundedSender<Event>,
    events_rx: UnboundedReceiver<Event>,
}

impl<B, S, P> SessionController<B, S, P>
where
    B: Backend,
    S: StatusSink,
    P: PlaybackSink,
{
    /// Build a controller and its handle. Nothing runs until [`run`](Self::run).
    pub fn new(
        backend: Arc<B>,
        status_sink: S,
        playback_sink: P,
        options: ControllerOptions,
    ) -> (Self, ControllerHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let controller = Self {
            backend,
            status_sink,
            playback_sink,
            state: SessionState::new(options.threshold),
            poller: Poller::new(options.poll_interval),
            commands,
            events_tx,
            events_rx,
        };

        (controller, ControllerHandle { tx: commands_tx })
    }

    /// Build a controller and run it on its own task
    pub fn spawn(
        backend: Arc<B>,
        status_sink: S,
        playback_sink: P,
        options: ControllerOptions,
    ) -> (ControllerHandle, JoinHandle<()>) {
        let (controller, handle) = Self::new(backend, status_sink, playback_sink, options);
        let task = tokio::spawn(controller.run());
        (handle, task)
    }

    /// Event loop. Ends on teardown or when every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    let Some(command) = command else {
                        self.teardown();
                        break;
                    };
                    if self.handle_command(command).is_break() {
                        break;
                    }
                }

                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }
        }
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Begin { kind, file } => self.begin(kind, file),
            Command::RequestArtifact(reply) => {
                let _ = reply.send(self.artifact_request());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Teardown(ack) => {
                self.teardown();
                let _ = ack.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_event(&mut self, event: Event) {
        if self.state.is_torn_down() {
            return;
        }
        match event {
            Event::Created { tag, kind, result } => self.on_created(tag, kind, result),
            Event::Tick(id) => self.on_tick(id),
            Event::Status { id, result } => self.on_status(id, result),
        }
    }

    /// Issue an upload/seed request tagged with a fresh generation
    fn begin(&mut self, kind: TransferKind, file: PathBuf) {
        let tag = self.state.issue_request();
        debug!(%tag, %kind, file = %file.display(), "starting request");

        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.create_session(kind, &file).await;
            let _ = tx.send(Event::Created { tag, kind, result });
        });
    }

    fn on_created(
        &mut self,
        tag: RequestTag,
        kind: TransferKind,
        result: Result<SessionId, BackendError>,
    ) {
        match result {
            Ok(id) => {
                if !self.state.accept_session(tag, id.clone()) {
                    debug!(%tag, session = %id, "discarding superseded session response");
                    return;
                }
                info!(%tag, %kind, session = %id, "session started");
                self.status_sink.session_started(&id, kind);
                self.start_polling(id);
            }
            Err(error) => {
                warn!(%tag, %kind, %error, "request failed; keeping current session");
                self.status_sink.report_failure(kind, &error);
            }
        }
    }

    /// Replace the polling timer with one aimed at `id`
    fn start_polling(&mut self, id: SessionId) {
        let tx = self.events_tx.clone();
        self.poller.replace(id, tx, Event::Tick);
    }

    fn on_tick(&mut self, id: SessionId) {
        if !self.state.is_current(&id) {
            debug!(session = %id, "dropping tick for superseded session");
            return;
        }

        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.status(&id).await;
            let _ = tx.send(Event::Status { id, result });
        });
    }

    fn on_status(&mut self, id: SessionId, result: Result<TransferStatus, BackendError>) {
        let status = match result {
            Ok(status) => status,
            Err(error) => {
                debug!(session = %id, %error, "status poll failed");
                return;
            }
        };

        match self.state.observe_status(&id, &status) {
            StatusOutcome::Stale => {
                debug!(session = %id, "dropping status for superseded session");
            }
            StatusOutcome::Updated => {
                self.status_sink.publish(&id, &status);
            }
            StatusOutcome::BecameReady => {
                self.status_sink.publish(&id, &status);
                let stream_url = self.backend.stream_url(&id);
                info!(
                    session = %id,
                    progress = status.progress,
                    threshold = %self.state.threshold(),
                    "playback ready"
                );
                self.playback_sink.attach(&id, &stream_url);
            }
        }
    }

    fn artifact_request(&self) -> Result<ArtifactRequest, ControllerError> {
        let id = self.state.current().ok_or(ControllerError::NoSession)?;
        Ok(ArtifactRequest {
            session: id.clone(),
            url: self.backend.download_url(id),
        })
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            session: self.state.current().cloned(),
            ready: self.state.is_ready(),
            polling: self.poller.target().cloned(),
        }
    }

    fn teardown(&mut self) {
        let released = self.poller.release();
        self.state.teardown();
        debug!(released, "controller torn down");
    }
}
