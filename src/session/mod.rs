//! Session lifecycle and progressive-playback readiness
//!
//! - State: pure session/readiness bookkeeping with request tags
//! - Poller: the single owned status polling timer
//! - Sink: status and playback outputs
//! - Controller: the actor tying it together

pub mod controller;
pub mod poller;
pub mod sink;
pub mod state;

pub use controller::{
    ArtifactRequest, ControllerError, ControllerHandle, ControllerOptions, ControllerSnapshot,
    SessionController,
};
pub use poller::POLL_INTERVAL;
pub use sink::{ChannelSink, PlaybackSink, SinkEvent, StatusSink};
pub use state::{Phase, RequestTag, SessionState, StatusOutcome};
