//! CLI - Command Line Interface for EchoFlix
//!
//! Every TUI action is scriptable. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Upload a video, watch status, open VLC once it is ready
//! echoflix upload ./movie.mp4
//!
//! # Start fetching from a .torrent without blocking
//! echoflix seed ./movie.torrent --detach --json
//!
//! # Inspect and fetch an existing session
//! echoflix status abc123 --watch
//! echoflix download abc123 -o ~/Downloads
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::config::Overrides;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Upload or seed request rejected
    UploadFailed = 4,
    /// Local player could not be started
    PlayerFailed = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// EchoFlix - decentralized video streaming from your terminal
///
/// Run without arguments to launch interactive TUI.
/// Use subcommands for scriptable automation.
#[derive(Parser, Debug)]
#[command(
    name = "echoflix",
    version,
    about = "Decentralized video streaming from your terminal",
    long_about = "Upload a video for seeding or a .torrent to fetch from the swarm, \
                  then watch it while it streams from the EchoFlix backend.\n\n\
                  Run without arguments to launch the interactive TUI.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  echoflix                              Launch interactive TUI\n\
                  echoflix upload movie.mp4             Upload, poll, play when ready\n\
                  echoflix seed movie.torrent --detach  Start a session and exit\n\
                  echoflix status abc123 --json         One status snapshot"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides ECHOFLIX_API_BASE and config)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Readiness threshold: a percentage (e.g. 10) or "any"
    #[arg(long, short = 't', global = true)]
    pub threshold: Option<String>,

    /// Local player for playback
    #[arg(long, short = 'p', global = true, value_enum)]
    pub player: Option<PlayerChoice>,

    /// Subcommand to run (omit for TUI mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running in CLI mode (has subcommand)
    pub fn is_cli_mode(&self) -> bool {
        self.command.is_some()
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }

    /// Settings overrides carried by global flags
    pub fn overrides(&self) -> Overrides {
        let download_dir = match &self.command {
            Some(Command::Download(cmd)) => cmd.output.clone(),
            _ => None,
        };
        Overrides {
            api_base: self.api_base.clone(),
            threshold: self.threshold.clone(),
            player: self.player.map(|p| p.as_str().to_string()),
            download_dir,
        }
    }
}

/// Local player selection
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerChoice {
    /// VLC media player (default)
    #[default]
    Vlc,
    /// mpv media player
    Mpv,
    /// Don't launch a player; just report the stream URL
    None,
}

impl PlayerChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerChoice::Vlc => "vlc",
            PlayerChoice::Mpv => "mpv",
            PlayerChoice::None => "none",
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a video file for seeding and stream it
    #[command(visible_alias = "up")]
    Upload(TransferCmd),

    /// Fetch a video from the swarm using a .torrent file and stream it
    Seed(TransferCmd),

    /// Get the transfer status of a session
    #[command(visible_alias = "st")]
    Status(StatusCmd),

    /// Download the .torrent artifact of a session
    #[command(visible_alias = "dl")]
    Download(DownloadCmd),

    /// Print the stream and download URLs of a session
    Url(UrlCmd),

    /// Show effective settings, optionally persisting flag overrides
    Config(ConfigCmd),
}

// =============================================================================
// Upload / Seed Commands
// =============================================================================

/// Start a session from a local file
#[derive(Args, Debug)]
pub struct TransferCmd {
    /// Video file (upload) or .torrent descriptor (seed)
    #[arg(required = true)]
    pub file: PathBuf,

    /// Create the session, print its id and exit without polling
    #[arg(long)]
    pub detach: bool,

    /// Poll and report readiness but don't open a player
    #[arg(long)]
    pub no_play: bool,

    /// Stop once playback is ready instead of polling until Ctrl-C
    #[arg(long)]
    pub exit_on_ready: bool,
}

// =============================================================================
// Session Commands
// =============================================================================

/// Get transfer status of a session
#[derive(Args, Debug)]
pub struct StatusCmd {
    /// Session id returned by upload/seed
    #[arg(required = true)]
    pub session_id: String,

    /// Watch mode: continuously update status
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Update interval in seconds (for watch mode)
    #[arg(long, short = 'i', default_value = "1")]
    pub interval: u64,
}

/// Download the .torrent artifact of a session
#[derive(Args, Debug)]
pub struct DownloadCmd {
    /// Session id returned by upload/seed
    #[arg(required = true)]
    pub session_id: String,

    /// Directory to write the .torrent into
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Print endpoints of a session
#[derive(Args, Debug)]
pub struct UrlCmd {
    /// Session id returned by upload/seed
    #[arg(required = true)]
    pub session_id: String,
}

/// Show or persist settings
#[derive(Args, Debug)]
pub struct ConfigCmd {
    /// Write --api-base/--threshold/--player into the config file
    #[arg(long)]
    pub save: bool,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print one compact JSON line (for streamed updates)
    pub fn print_line<T: Serialize>(&self, data: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string(data)?);
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Session ID Validation
// =============================================================================

/// Validate a session id before putting it in a URL
pub fn validate_session_id(id: &str) -> Result<&str, &'static str> {
    let id = id.trim();
    if id.is_empty() {
        Err("Session id cannot be empty")
    } else if id.chars().any(|c| c.is_control() || c.is_whitespace()) {
        Err("Session id cannot contain whitespace or control characters")
    } else {
        Ok(id)
    }
}

// =============================================================================
// Tests
// =============================================================================
