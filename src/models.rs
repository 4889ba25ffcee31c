//! Data structures and types for EchoFlix
//!
//! Shared models used across the controller, backend client and frontends:
//! - **Session**: opaque session ids and the kind of transfer that created them
//! - **Status**: transfer status snapshots polled from the backend
//! - **Readiness**: the threshold that gates progressive playback

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// Session Models
// =============================================================================

/// Opaque identifier issued by the backend for one transfer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// How a session was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// A video file uploaded for seeding
    Upload,
    /// A `.torrent` descriptor the backend fetches from the swarm
    Seed,
}

/// Video extensions accepted by the upload picker
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mkv", "webm", "mov", "avi", "ogv", "ts"];

impl TransferKind {
    /// Backend endpoint path for this kind
    pub fn endpoint(&self) -> &'static str {
        match self {
            TransferKind::Upload => "/upload",
            TransferKind::Seed => "/seed",
        }
    }

    /// Check whether a file looks like the right input for this kind
    pub fn accepts(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match (self, ext.as_deref()) {
            (TransferKind::Seed, Some("torrent")) => true,
            (TransferKind::Upload, Some(ext)) => VIDEO_EXTENSIONS.contains(&ext),
            _ => false,
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferKind::Upload => write!(f, "upload"),
            TransferKind::Seed => write!(f, "seed"),
        }
    }
}

/// Backend response to `/upload` and `/seed`
#[derive(Debug, Clone, Deserialize)]
pub struct SessionCreated {
    pub session_id: SessionId,
}

// =============================================================================
// Status Models
// =============================================================================

/// Snapshot of a transfer, as returned by `/status/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransferStatus {
    /// Percent complete, 0-100
    pub progress: f64,
    /// Bytes per second
    pub download_rate: f64,
    /// Bytes per second
    pub upload_rate: f64,
    pub num_peers: u32,
}

impl TransferStatus {
    /// Format a byte rate as KB/s
    pub fn format_rate(bytes_per_sec: f64) -> String {
        format!("{:.2} KB/s", bytes_per_sec / 1024.0)
    }

    pub fn format_progress(&self) -> String {
        format!("{:.2}%", self.progress)
    }

    pub fn format_download_rate(&self) -> String {
        Self::format_rate(self.download_rate)
    }

    pub fn format_upload_rate(&self) -> String {
        Self::format_rate(self.upload_rate)
    }

    /// Progress as a ratio clamped to 0.0 - 1.0 (for gauges)
    pub fn ratio(&self) -> f64 {
        (self.progress / 100.0).clamp(0.0, 1.0)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | down {} | up {} | {} peers",
            self.format_progress(),
            self.format_download_rate(),
            self.format_upload_rate(),
            self.num_peers
        )
    }
}

// =============================================================================
// Readiness Models
// =============================================================================

/// Default threshold: start playback once 10% has been transferred
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 10.0;

/// Progress threshold that gates the first attachment of the stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadinessThreshold {
    /// Any nonzero progress
    AnyProgress,
    /// Progress at or above a percentage in (0, 100]
    Percent(f64),
}

impl ReadinessThreshold {
    /// Whether a polled progress value satisfies the threshold
    pub fn is_met(&self, progress: f64) -> bool {
        match self {
            ReadinessThreshold::AnyProgress => progress > 0.0,
            ReadinessThreshold::Percent(p) => progress >= *p,
        }
    }

    /// Human-readable form ("10%", "any progress")
    pub fn label(&self) -> String {
        match self {
            ReadinessThreshold::AnyProgress => "any progress".to_string(),
            ReadinessThreshold::Percent(p) => format!("{}%", p),
        }
    }
}

impl Default for ReadinessThreshold {
    fn default() -> Self {
        ReadinessThreshold::Percent(DEFAULT_THRESHOLD_PERCENT)
    }
}

impl fmt::Display for ReadinessThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessThreshold::AnyProgress => write!(f, "any"),
            ReadinessThreshold::Percent(p) => write!(f, "{}", p),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    #[error("Invalid threshold '{0}' (expected 'any' or a percentage)")]
    Unparseable(String),

    #[error("Threshold {0} out of range (expected 0 < t <= 100, or 'any')")]
    OutOfRange(f64),
}

impl FromStr for ReadinessThreshold {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("any") || s.eq_ignore_ascii_case("nonzero") {
            return Ok(ReadinessThreshold::AnyProgress);
        }

        let pct: f64 = s
            .trim_end_matches('%')
            .parse()
            .map_err(|_| ThresholdError::Unparseable(s.to_string()))?;

        if pct > 0.0 && pct <= 100.0 {
            Ok(ReadinessThreshold::Percent(pct))
        } else {
            Err(ThresholdError::OutOfRange(pct))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_parsing() {
        let parse = |s: &str| s.parse::<ReadinessThreshold>();
        assert_eq!(parse("any"), Ok(ReadinessThreshold::AnyProgress));
        assert_eq!(parse("NonZero"), Ok(ReadinessThreshold::AnyProgress));
        assert_eq!(parse("10"), Ok(ReadinessThreshold::Percent(10.0)));
        assert_eq!(parse("100%"), Ok(ReadinessThreshold::Percent(100.0)));
        assert_eq!(
            "0".parse::<ReadinessThreshold>(),
            Err(ThresholdError::OutOfRange(0.0))
        );
        assert!("101".parse::<ReadinessThreshold>().is_err());
        assert!("soon".parse::<ReadinessThreshold>().is_err());
    }

    #[test]
    fn test_threshold_predicates() {
        assert!(!ReadinessThreshold::AnyProgress.is_met(0.0));
        assert!(ReadinessThreshold::AnyProgress.is_met(0.01));

        let ten = ReadinessThreshold::Percent(10.0);
        assert!(!ten.is_met(9.99));
        assert!(ten.is_met(10.0));

        let full = ReadinessThreshold::Percent(100.0);
        assert!(!full.is_met(99.9));
        assert!(full.is_met(100.0));
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(
            ReadinessThreshold::default(),
            ReadinessThreshold::Percent(DEFAULT_THRESHOLD_PERCENT)
        );
    }

    #[test]
    fn test_status_formatting() {
        let status = TransferStatus {
            progress: 15.5,
            download_rate: 2048.0,
            upload_rate: 512.0,
            num_peers: 3,
        };
        assert_eq!(status.format_progress(), "15.50%");
        assert_eq!(status.format_download_rate(), "2.00 KB/s");
        assert_eq!(status.format_upload_rate(), "0.50 KB/s");
        assert_eq!(
            status.to_string(),
            "15.50% | down 2.00 KB/s | up 0.50 KB/s | 3 peers"
        );
    }

    #[test]
    fn test_status_ratio_clamped() {
        let over = TransferStatus {
            progress: 150.0,
            ..Default::default()
        };
        assert_eq!(over.ratio(), 1.0);

        let partial = TransferStatus {
            progress: 42.0,
            ..Default::default()
        };
        assert!((partial.ratio() - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_status_deserialize() {
        let json = r#"{"progress": 12.5, "download_rate": 1024, "upload_rate": 0, "num_peers": 4}"#;
        let status: TransferStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.progress, 12.5);
        assert_eq!(status.download_rate, 1024.0);
        assert_eq!(status.num_peers, 4);
    }

    #[test]
    fn test_transfer_kind_accepts() {
        assert!(TransferKind::Upload.accepts(Path::new("movie.MP4")));
        assert!(TransferKind::Upload.accepts(Path::new("/tmp/clip.webm")));
        assert!(!TransferKind::Upload.accepts(Path::new("notes.txt")));
        assert!(!TransferKind::Upload.accepts(Path::new("noext")));
        assert!(TransferKind::Seed.accepts(Path::new("film.torrent")));
        assert!(!TransferKind::Seed.accepts(Path::new("film.mp4")));
    }

    #[test]
    fn test_session_id_transparent_serde() {
        let created: SessionCreated = serde_json::from_str(r#"{"session_id": "abc123"}"#).unwrap();
        assert_eq!(created.session_id, SessionId::new("abc123"));
        assert_eq!(serde_json::to_string(&created.session_id).unwrap(), "\"abc123\"");
    }
}
