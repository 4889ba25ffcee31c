//! EchoFlix - decentralized video streaming from your terminal
//!
//! Upload a video to seed it, or hand over a .torrent to fetch it from the
//! swarm, and start watching as soon as enough of it has arrived.
//!
//! # Usage
//!
//! ```bash
//! # Launch interactive TUI
//! echoflix
//!
//! # CLI mode (for automation)
//! echoflix upload movie.mp4
//! echoflix seed movie.torrent --player mpv
//! echoflix status abc123 --json
//! ```

use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use echoflix::api::BackendClient;
use echoflix::app::{Action, App, Notice};
use echoflix::cli::{Cli, Command, ExitCode, Output};
use echoflix::commands;
use echoflix::config::{Config, Settings};
use echoflix::logging::{self, LogTarget};
use echoflix::models::TransferKind;
use echoflix::session::{ChannelSink, ControllerHandle, ControllerOptions, SessionController, SinkEvent};
use echoflix::stream::LocalPlayer;

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(&cli);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let overrides = cli.overrides();
    let settings = match Settings::resolve(&config, &overrides) {
        Ok(settings) => settings,
        Err(e) => {
            let code = output.error(e.to_string(), ExitCode::InvalidArgs);
            std::process::exit(code.into());
        }
    };

    if cli.is_cli_mode() {
        // CLI mode: execute command and exit
        logging::init(LogTarget::Stderr, cli.verbose);
        let exit_code = run_cli(cli, config, settings, output).await;
        std::process::exit(exit_code.into());
    } else {
        // TUI mode: launch interactive interface
        logging::init(LogTarget::File, cli.verbose);
        run_tui(settings).await
    }
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, config: Config, settings: Settings, output: Output) -> ExitCode {
    let overrides = cli.overrides();

    match cli.command {
        Some(Command::Upload(cmd)) => commands::upload_cmd(cmd, &settings, &output).await,

        Some(Command::Seed(cmd)) => commands::seed_cmd(cmd, &settings, &output).await,

        Some(Command::Status(cmd)) => commands::status_cmd(cmd, &settings, &output).await,

        Some(Command::Download(cmd)) => commands::download_cmd(cmd, &settings, &output).await,

        Some(Command::Url(cmd)) => commands::url_cmd(cmd, &settings, &output),

        Some(Command::Config(cmd)) => commands::config_cmd(
            cmd,
            cli.config.as_deref(),
            config,
            &overrides,
            &settings,
            &output,
        ),

        None => {
            // This shouldn't happen (handled by is_cli_mode check)
            ExitCode::Success
        }
    }
}

// =============================================================================
// TUI Mode
// =============================================================================

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Everything the event loop talks to besides the terminal
struct Runtime {
    client: Arc<BackendClient>,
    handle: ControllerHandle,
    events: UnboundedReceiver<SinkEvent>,
    notices_tx: UnboundedSender<Notice>,
    notices: UnboundedReceiver<Notice>,
    player: Option<LocalPlayer>,
    settings: Settings,
}

/// Run interactive TUI
async fn run_tui(settings: Settings) -> Result<()> {
    let client = Arc::new(BackendClient::new(&settings.api_base));
    let (events_tx, events) = mpsc::unbounded_channel();
    let sink = ChannelSink::new(events_tx);
    let options = ControllerOptions {
        threshold: settings.threshold,
        ..Default::default()
    };
    let (handle, task) = SessionController::spawn(client.clone(), sink.clone(), sink, options);
    let (notices_tx, notices) = mpsc::unbounded_channel();

    let mut app = App::new(&settings);
    let mut runtime = Runtime {
        client,
        handle: handle.clone(),
        events,
        notices_tx,
        notices,
        player: settings.player.map(LocalPlayer::new),
        settings,
    };

    let mut terminal = init_terminal()?;

    // Run the main event loop
    let result = run_event_loop(&mut terminal, &mut app, &mut runtime).await;

    // Always restore terminal, even on error
    restore_terminal(&mut terminal)?;

    // The polling timer must not outlive the screen
    handle.teardown().await;
    let _ = task.await;
    info!("TUI closed");

    result
}

/// Main event loop - handles input, applies controller output, renders UI
async fn run_event_loop(terminal: &mut Tui, app: &mut App, runtime: &mut Runtime) -> Result<()> {
    const TICK_RATE: Duration = Duration::from_millis(100);

    while app.running {
        terminal.draw(|frame| echoflix::ui::render(frame, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (ignore releases on Windows)
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = app.handle_key(key) {
                        dispatch(action, app, runtime);
                    }
                }
            }
        }

        while let Ok(event) = runtime.events.try_recv() {
            if let SinkEvent::PlaybackReady { stream_url, .. } = &event {
                launch_player(app, runtime.player.as_ref(), stream_url);
            }
            app.apply(event);
        }

        while let Ok(notice) = runtime.notices.try_recv() {
            app.set_notice(notice);
        }
    }

    Ok(())
}

fn dispatch(action: Action, app: &mut App, runtime: &Runtime) {
    match action {
        Action::Begin { kind, path } => {
            let sent = match kind {
                TransferKind::Upload => runtime.handle.begin_upload(path),
                TransferKind::Seed => runtime.handle.begin_seed(path),
            };
            if let Err(e) = sent {
                app.set_notice(Notice::Error(e.to_string()));
            }
        }
        Action::DownloadArtifact => {
            let handle = runtime.handle.clone();
            let client = runtime.client.clone();
            let dir = runtime.settings.download_dir.clone();
            let notices = runtime.notices_tx.clone();
            tokio::spawn(async move {
                let notice = match handle.request_download_artifact().await {
                    Ok(request) => match client.download_artifact(&request.session, &dir).await {
                        Ok(path) => Notice::Info(format!("Saved {}", path.display())),
                        Err(e) => Notice::Error(format!("Download failed: {}", e)),
                    },
                    Err(e) => Notice::Error(e.to_string()),
                };
                let _ = notices.send(notice);
            });
        }
        Action::Quit => {}
    }
}

fn launch_player(app: &mut App, player: Option<&LocalPlayer>, stream_url: &str) {
    let Some(player) = player else {
        return;
    };
    match player.launch(stream_url) {
        Ok(_child) => {
            info!(player = %player.player_type(), url = stream_url, "player launched");
            app.set_notice(Notice::Info(format!("Playing in {}", player.player_type())));
        }
        Err(e) => {
            warn!(error = %e, "player launch failed");
            app.set_notice(Notice::Error(e.to_string()));
        }
    }
}
