//! Playback infrastructure
//!
//! - Player: VLC/mpv launcher for ready streams

pub mod player;

pub use player::{LocalPlayer, PlayerError, PlayerType};
