//! Integration tests for EchoFlix
//!
//! Tests are organized by component:
//! - backend_test: Backend HTTP client (multipart upload, status, artifact download)
//! - controller_test: Session controller on a paused clock with a scripted backend
//! - cli_test: Argument parsing, JSON output, command handlers
//! - ui_test: TUI rendering against a TestBackend

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
