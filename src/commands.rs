//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the backend client or driving a
//! session controller. Each handler takes CLI args, resolved settings and
//! Output, returns ExitCode.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::api::BackendClient;
use crate::cli::{
    validate_session_id, ConfigCmd, DownloadCmd, ExitCode, Output, StatusCmd, TransferCmd, UrlCmd,
};
use crate::config::{Config, Overrides, Settings};
use crate::models::{SessionId, TransferKind};
use crate::session::{ChannelSink, ControllerOptions, SessionController, SinkEvent};
use crate::stream::LocalPlayer;

/// Session endpoints, as printed by `url` and `--detach`
#[derive(Debug, Serialize)]
struct SessionEndpoints {
    session_id: SessionId,
    stream_url: String,
    download_url: String,
}

impl SessionEndpoints {
    fn new(client: &BackendClient, id: SessionId) -> Self {
        Self {
            stream_url: client.stream_url(&id),
            download_url: client.download_url(&id),
            session_id: id,
        }
    }
}

// =============================================================================
// Upload / Seed Commands
// =============================================================================

pub async fn upload_cmd(cmd: TransferCmd, settings: &Settings, output: &Output) -> ExitCode {
    transfer_cmd(TransferKind::Upload, cmd, settings, output).await
}

pub async fn seed_cmd(cmd: TransferCmd, settings: &Settings, output: &Output) -> ExitCode {
    transfer_cmd(TransferKind::Seed, cmd, settings, output).await
}

/// Check a file argument before any request is made
fn validate_transfer_file(kind: TransferKind, file: &Path) -> Result<(), String> {
    if !file.is_file() {
        return Err(format!("File not found: {}", file.display()));
    }
    if !kind.accepts(file) {
        return Err(match kind {
            TransferKind::Upload => format!("Not a video file: {}", file.display()),
            TransferKind::Seed => format!("Not a .torrent file: {}", file.display()),
        });
    }
    Ok(())
}

async fn transfer_cmd(
    kind: TransferKind,
    cmd: TransferCmd,
    settings: &Settings,
    output: &Output,
) -> ExitCode {
    if let Err(e) = validate_transfer_file(kind, &cmd.file) {
        return output.error(e, ExitCode::InvalidArgs);
    }

    let client = BackendClient::new(&settings.api_base);

    if cmd.detach {
        output.info(format!("Starting {} of {}...", kind, cmd.file.display()));
        let result = match kind {
            TransferKind::Upload => client.upload(&cmd.file).await,
            TransferKind::Seed => client.seed(&cmd.file).await,
        };
        return match result {
            Ok(id) => {
                if let Err(e) = output.print(SessionEndpoints::new(&client, id)) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
                ExitCode::Success
            }
            Err(e) => output.error(format!("{} failed: {}", kind, e), ExitCode::UploadFailed),
        };
    }

    let player = match settings.player {
        Some(player_type) if !cmd.no_play => {
            let player = LocalPlayer::new(player_type);
            if !player.is_available().await {
                return output.error(
                    format!(
                        "{} not found. Install it first, or pass --no-play / --player none.",
                        player_type.display_name()
                    ),
                    ExitCode::PlayerFailed,
                );
            }
            Some(player)
        }
        _ => None,
    };

    watch_session(kind, cmd, client, settings, player, output).await
}

/// Drive a controller headless until Ctrl-C (or readiness with --exit-on-ready)
async fn watch_session(
    kind: TransferKind,
    cmd: TransferCmd,
    client: BackendClient,
    settings: &Settings,
    player: Option<LocalPlayer>,
    output: &Output,
) -> ExitCode {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink = ChannelSink::new(tx);
    let options = ControllerOptions {
        threshold: settings.threshold,
        ..Default::default()
    };
    let (handle, task) = SessionController::spawn(Arc::new(client), sink.clone(), sink, options);

    output.info(format!(
        "Starting {} of {} (playback at {})...",
        kind,
        cmd.file.display(),
        settings.threshold.label()
    ));

    let begun = match kind {
        TransferKind::Upload => handle.begin_upload(&cmd.file),
        TransferKind::Seed => handle.begin_seed(&cmd.file),
    };
    if let Err(e) = begun {
        return output.error(e.to_string(), ExitCode::Error);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut has_session = false;
    let mut exit_code = ExitCode::Success;

    loop {
        let event = tokio::select! {
            _ = &mut ctrl_c => {
                output.info("Stopping...");
                break;
            }
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        if output.json {
            if let Err(e) = output.print_line(&event) {
                exit_code = output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                break;
            }
        }

        match event {
            SinkEvent::SessionStarted { id, .. } => {
                has_session = true;
                output.info(format!("Session {} started", id));
            }
            SinkEvent::Status { status, .. } => {
                output.info(format!("  {}", status));
            }
            SinkEvent::Failure { kind, message } => {
                if !has_session {
                    exit_code = output.error(
                        format!("{} failed: {}", kind, message),
                        ExitCode::UploadFailed,
                    );
                    break;
                }
                output.info(format!("{} failed: {}", kind, message));
            }
            SinkEvent::PlaybackReady { stream_url, .. } => {
                output.info(format!("Ready to play: {}", stream_url));
                if let Some(player) = &player {
                    match player.launch(&stream_url) {
                        Ok(_child) => {
                            output.info(format!("Opened in {}", player.player_type()))
                        }
                        Err(e) => {
                            warn!(error = %e, "player launch failed");
                            exit_code = output.error(e.to_string(), ExitCode::PlayerFailed);
                            break;
                        }
                    }
                }
                if cmd.exit_on_ready {
                    break;
                }
            }
        }
    }

    handle.teardown().await;
    let _ = task.await;
    exit_code
}

// =============================================================================
// Status Command
// =============================================================================

pub async fn status_cmd(cmd: StatusCmd, settings: &Settings, output: &Output) -> ExitCode {
    let id = match validate_session_id(&cmd.session_id) {
        Ok(id) => SessionId::new(id),
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };
    let client = BackendClient::new(&settings.api_base);

    if !cmd.watch {
        return match client.status(&id).await {
            Ok(status) => {
                if let Err(e) = output.print(status) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
                ExitCode::Success
            }
            Err(e) => output.error(format!("Status failed: {}", e), ExitCode::NetworkError),
        };
    }

    let interval = Duration::from_secs(cmd.interval.max(1));
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    watch_status(&client, &id, interval, output, shutdown).await
}

/// Print a status line every `interval` until `shutdown` resolves.
///
/// Shutdown also interrupts a fetch that is still in flight.
pub async fn watch_status(
    client: &BackendClient,
    id: &SessionId,
    interval: Duration,
    output: &Output,
    shutdown: impl Future<Output = ()>,
) -> ExitCode {
    let mut ticker = tokio::time::interval(interval);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => return ExitCode::Success,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = &mut shutdown => return ExitCode::Success,
            result = client.status(id) => result,
        };

        match result {
            Ok(status) if output.json => {
                if let Err(e) = output.print_line(&status) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
            }
            Ok(status) => println!("{}", status),
            // Keep watching; the backend may come back
            Err(e) => output.info(format!("Status failed: {}", e)),
        }
    }
}

// =============================================================================
// Download Command
// =============================================================================

pub async fn download_cmd(cmd: DownloadCmd, settings: &Settings, output: &Output) -> ExitCode {
    let id = match validate_session_id(&cmd.session_id) {
        Ok(id) => SessionId::new(id),
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };
    let client = BackendClient::new(&settings.api_base);

    output.info(format!("Downloading .torrent for session {}...", id));

    match client.download_artifact(&id, &settings.download_dir).await {
        Ok(path) => {
            #[derive(Serialize)]
            struct DownloadSuccess {
                session_id: SessionId,
                path: String,
            }

            let response = DownloadSuccess {
                session_id: id,
                path: path.display().to_string(),
            };
            if let Err(e) = output.print(&response) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(format!("Download failed: {}", e), ExitCode::NetworkError),
    }
}

// =============================================================================
// Url Command
// =============================================================================

pub fn url_cmd(cmd: UrlCmd, settings: &Settings, output: &Output) -> ExitCode {
    let id = match validate_session_id(&cmd.session_id) {
        Ok(id) => SessionId::new(id),
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };
    let client = BackendClient::new(&settings.api_base);

    if let Err(e) = output.print(SessionEndpoints::new(&client, id)) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Config Command
// =============================================================================

pub fn config_cmd(
    cmd: ConfigCmd,
    config_path: Option<&Path>,
    mut config: Config,
    overrides: &Overrides,
    settings: &Settings,
    output: &Output,
) -> ExitCode {
    if cmd.save {
        if let Some(api_base) = &overrides.api_base {
            config.api_base = Some(settings.api_base.clone());
            output.info(format!("api_base = {}", api_base));
        }
        if overrides.threshold.is_some() {
            config.readiness_threshold = Some(settings.threshold.to_string());
        }
        if let Some(player) = &overrides.player {
            config.player = Some(player.clone());
        }

        let saved = match config_path {
            Some(path) => config.save_to(path).map(|_| path.to_path_buf()),
            None => config.save(),
        };
        match saved {
            Ok(path) => output.info(format!("Saved {}", path.display())),
            Err(e) => return output.error(format!("Failed to save config: {}", e), ExitCode::Error),
        }
    }

    if let Err(e) = output.print(settings) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_transfer_file_missing() {
        let err = validate_transfer_file(TransferKind::Upload, Path::new("/nonexistent/movie.mp4"))
            .unwrap_err();
        assert!(err.starts_with("File not found"));
    }

    #[test]
    fn test_validate_transfer_file_kind_mismatch() {
        let path = std::env::temp_dir().join(format!("echoflix-{}.txt", std::process::id()));
        std::fs::write(&path, b"not a video").unwrap();

        let upload = validate_transfer_file(TransferKind::Upload, &path).unwrap_err();
        assert!(upload.starts_with("Not a video file"));
        let seed = validate_transfer_file(TransferKind::Seed, &path).unwrap_err();
        assert!(seed.starts_with("Not a .torrent file"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_session_endpoints() {
        let client = BackendClient::new("http://localhost:8000");
        let endpoints = SessionEndpoints::new(&client, SessionId::new("abc123"));
        let json = serde_json::to_value(&endpoints).unwrap();
        assert_eq!(json["session_id"], "abc123");
        assert_eq!(json["stream_url"], "http://localhost:8000/stream/abc123");
        assert_eq!(json["download_url"], "http://localhost:8000/download/abc123");
    }
}
