//! UI rendering tests for EchoFlix
//!
//! Renders the full TUI into a ratatui TestBackend and inspects the buffer.
//!
//! ## Test Cases
//! - idle screen shows key hints
//! - session panel shows progress, rates, peers and readiness
//! - ready session shows the stream URL
//! - picker shows the typed path with a cursor
//! - errors pop up, info goes to the status bar
//! - tiny terminals don't panic

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use echoflix::app::{App, Notice};
use echoflix::models::{SessionId, TransferKind, TransferStatus};
use echoflix::session::SinkEvent;
use ratatui::{backend::TestBackend, Terminal};

// =============================================================================
// Helpers
// =============================================================================

fn test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).unwrap()
}

/// Render the app and return the screen as lines of text
fn render(app: &App, width: u16, height: u16) -> Vec<String> {
    let mut terminal = test_terminal(width, height);
    terminal
        .draw(|frame| echoflix::ui::render(frame, app))
        .unwrap();

    let buffer = terminal.backend().buffer();
    buffer
        .content
        .chunks(width as usize)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect())
        .collect()
}

fn screen_contains(screen: &[String], needle: &str) -> bool {
    screen.iter().any(|line| line.contains(needle))
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn with_session() -> App {
    let mut app = App::default();
    app.apply(SinkEvent::SessionStarted {
        id: SessionId::new("abc123"),
        kind: TransferKind::Upload,
    });
    app.clear_notice();
    app
}

fn status(progress: f64) -> TransferStatus {
    TransferStatus {
        progress,
        download_rate: 2048.0,
        upload_rate: 512.0,
        num_peers: 3,
    }
}

// =============================================================================
// Screens
// =============================================================================

#[test]
fn test_idle_screen() {
    let screen = render(&App::default(), 80, 24);

    assert!(screen_contains(&screen, "ECHO"));
    assert!(screen_contains(&screen, "No session yet"));
    assert!(screen_contains(&screen, "Upload a video to seed"));
    assert!(screen_contains(&screen, "v:upload"));
    assert!(screen_contains(&screen, "http://localhost:8000"));
}

#[test]
fn test_session_waiting_for_first_status() {
    let screen = render(&with_session(), 80, 24);

    assert!(screen_contains(&screen, "abc123"));
    assert!(screen_contains(&screen, "[upload]"));
    assert!(screen_contains(&screen, "Waiting for first status..."));
}

#[test]
fn test_session_buffering() {
    let mut app = with_session();
    app.apply(SinkEvent::Status {
        id: SessionId::new("abc123"),
        status: status(5.25),
    });
    let screen = render(&app, 80, 24);

    assert!(screen_contains(&screen, "5.25%"));
    assert!(screen_contains(&screen, "2.00 KB/s"));
    assert!(screen_contains(&screen, "0.50 KB/s"));
    assert!(screen_contains(&screen, "peers 3"));
    assert!(screen_contains(&screen, "Buffering (plays at 10%)"));
    assert!(!screen_contains(&screen, "READY"));
}

#[test]
fn test_session_ready_shows_stream() {
    let mut app = with_session();
    app.apply(SinkEvent::Status {
        id: SessionId::new("abc123"),
        status: status(15.5),
    });
    app.apply(SinkEvent::PlaybackReady {
        id: SessionId::new("abc123"),
        stream_url: "http://localhost:8000/stream/abc123".into(),
    });
    let screen = render(&app, 80, 24);

    assert!(screen_contains(&screen, "15.50%"));
    assert!(screen_contains(&screen, "READY"));
    assert!(screen_contains(&screen, "http://localhost:8000/stream/abc123"));
    assert!(screen_contains(&screen, "save .torrent"));
}

#[test]
fn test_picker_shows_typed_path() {
    let mut app = App::default();
    app.handle_key(key(KeyCode::Char('t')));
    for c in "big.torrent".chars() {
        app.handle_key(key(KeyCode::Char(c)));
    }
    let screen = render(&app, 80, 24);

    assert!(screen_contains(&screen, "TORRENT FILE"));
    assert!(screen_contains(&screen, "big.torrent│"));
    assert!(screen_contains(&screen, "INSERT"));
}

// =============================================================================
// Notices
// =============================================================================

#[test]
fn test_error_notice_pops_up() {
    let mut app = with_session();
    app.apply(SinkEvent::Failure {
        kind: TransferKind::Upload,
        message: "Backend returned HTTP 500".into(),
    });
    let screen = render(&app, 80, 24);

    assert!(screen_contains(&screen, "ERROR"));
    assert!(screen_contains(&screen, "upload failed: Backend returned HTTP 500"));
}

#[test]
fn test_info_notice_in_status_bar() {
    let mut app = App::default();
    app.set_notice(Notice::Info("Saved abc123.torrent".into()));
    let screen = render(&app, 100, 24);

    assert!(screen[23].contains("Saved abc123.torrent"));
    assert!(!screen_contains(&screen, "ERROR"));
}

// =============================================================================
// Layout
// =============================================================================

#[test]
fn test_tiny_terminal_does_not_panic() {
    let mut app = with_session();
    app.apply(SinkEvent::Status {
        id: SessionId::new("abc123"),
        status: status(50.0),
    });
    app.set_notice(Notice::Error("x".repeat(200)));

    for (w, h) in [(20, 6), (1, 1), (200, 50)] {
        render(&app, w, h);
    }
}
