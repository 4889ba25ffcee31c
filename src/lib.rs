//! EchoFlix - decentralized video streaming from your terminal
//!
//! Uploads a video (or a .torrent) to an EchoFlix backend, polls its
//! transfer status and starts playback once enough has arrived.
//!
//! # Modules
//!
//! - `models` - Session ids, transfer status, readiness thresholds
//! - `api` - Backend HTTP client
//! - `session` - Session lifecycle and playback-readiness controller
//! - `stream` - Local player (VLC/mpv)
//! - `config` - Config file and settings resolution
//! - `cli` / `commands` - Scriptable subcommands
//! - `ui` / `app` - Interactive TUI

pub mod models;
pub mod api;
pub mod session;
pub mod stream;
pub mod config;
pub mod logging;
pub mod cli;
pub mod commands;
pub mod ui;
pub mod app;

// Re-export commonly used types
pub use models::{
    ReadinessThreshold, SessionId, TransferKind, TransferStatus,
};

pub use api::{Backend, BackendClient, BackendError};
pub use app::App;
pub use session::{ControllerHandle, SessionController};
