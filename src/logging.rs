//! Tracing setup
//!
//! CLI runs log to stderr. The TUI owns the terminal, so it logs to a file
//! under the cache directory instead. Filter with `RUST_LOG`.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "echoflix=warn";

/// Where log output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File,
}

/// Log file used in TUI mode (~/.cache/echoflix/echoflix.log)
pub fn log_file_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("echoflix").join("echoflix.log"))
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "echoflix=debug" } else { DEFAULT_FILTER })
    })
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed or the log file
/// could not be opened; the existing setup is left in place.
pub fn init(target: LogTarget, verbose: bool) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_target(true);

    let result = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File => {
            let file = log_file_path().and_then(|path| {
                std::fs::create_dir_all(path.parent()?).ok()?;
                OpenOptions::new().create(true).append(true).open(path).ok()
            });
            match file {
                Some(file) => builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init(),
                // No writable cache dir: stay silent rather than corrupt the screen
                None => return false,
            }
        }
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "log subscriber already installed");
            false
        }
    }
}
