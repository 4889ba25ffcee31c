//! App state and core application logic
//!
//! Holds what the TUI displays (current session, last status snapshot,
//! readiness, notices) and turns key presses into actions for the
//! session controller.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::Settings;
use crate::models::{ReadinessThreshold, SessionId, TransferKind, TransferStatus};
use crate::session::SinkEvent;

// =============================================================================
// Input Mode
// =============================================================================

/// Current input mode for keyboard handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Typing a path into the file picker
    Editing(TransferKind),
}

// =============================================================================
// Path Input
// =============================================================================

/// Single-line text input for the file picker. Cursor counts characters.
#[derive(Debug, Clone, Default)]
pub struct PathInput {
    pub value: String,
    pub cursor: usize,
}

impl PathInput {
    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    /// Insert character at cursor
    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.value.insert(idx, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    /// Delete character at cursor
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.char_len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Split around the cursor (for rendering)
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.value.split_at(self.byte_index(self.cursor))
    }

    /// The entered path with `~/` expanded
    pub fn path(&self) -> PathBuf {
        let raw = self.value.trim();
        match (raw.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(raw),
        }
    }
}

// =============================================================================
// Session View
// =============================================================================

/// What the status and playback panels show
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub id: SessionId,
    pub kind: TransferKind,
    pub status: Option<TransferStatus>,
    pub ready: bool,
    pub stream_url: Option<String>,
}

impl SessionView {
    fn new(id: SessionId, kind: TransferKind) -> Self {
        Self {
            id,
            kind,
            status: None,
            ready: false,
            stream_url: None,
        }
    }
}

/// Transient message shown in a popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Info(msg) | Notice::Error(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

/// Something the event loop must do on behalf of the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Start an upload or seed from a file
    Begin { kind: TransferKind, path: PathBuf },
    /// Fetch the current session's .torrent artifact
    DownloadArtifact,
    Quit,
}

// =============================================================================
// Main Application State
// =============================================================================

/// Main application state
#[derive(Debug)]
pub struct App {
    /// Whether the app is running
    pub running: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// File picker text
    pub input: PathInput,
    /// Current session, if any
    pub session: Option<SessionView>,
    /// Popup message
    pub notice: Option<Notice>,
    /// Backend base URL (for the header)
    pub api_base: String,
    /// Readiness threshold in effect
    pub threshold: ReadinessThreshold,
}

impl Default for App {
    fn default() -> Self {
        Self {
            running: true,
            input_mode: InputMode::Normal,
            input: PathInput::default(),
            session: None,
            notice: None,
            api_base: crate::api::DEFAULT_API_BASE.to_string(),
            threshold: ReadinessThreshold::default(),
        }
    }
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        Self {
            api_base: settings.api_base.clone(),
            threshold: settings.threshold,
            ..Default::default()
        }
    }

    /// Quit the application
    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Open the file picker for an upload or seed
    pub fn open_picker(&mut self, kind: TransferKind) {
        self.input.clear();
        self.input_mode = InputMode::Editing(kind);
    }

    /// Apply controller output
    pub fn apply(&mut self, event: SinkEvent) {
        match event {
            SinkEvent::SessionStarted { id, kind } => {
                self.set_notice(Notice::Info(format!("Session {} started", id)));
                self.session = Some(SessionView::new(id, kind));
            }
            SinkEvent::Status { id, status } => {
                if let Some(session) = self.session.as_mut().filter(|s| s.id == id) {
                    session.status = Some(status);
                }
            }
            SinkEvent::Failure { kind, message } => {
                self.set_notice(Notice::Error(format!("{} failed: {}", kind, message)));
            }
            SinkEvent::PlaybackReady { id, stream_url } => {
                if let Some(session) = self.session.as_mut().filter(|s| s.id == id) {
                    session.ready = true;
                    session.stream_url = Some(stream_url);
                }
            }
        }
    }

    // =========================================================================
    // Key Handling
    // =========================================================================

    /// Handle a key press, returning an action for the event loop if any
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        // Global: Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return Some(Action::Quit);
        }

        match self.input_mode {
            InputMode::Editing(kind) => self.handle_editing_key(kind, key),
            InputMode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_editing_key(&mut self, kind: TransferKind, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.input.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => return self.submit_path(kind),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.cursor_left(),
            KeyCode::Right => self.input.cursor_right(),
            KeyCode::Home => self.input.cursor_home(),
            KeyCode::End => self.input.cursor_end(),
            KeyCode::Char(c) => self.input.insert(c),
            _ => {}
        }
        None
    }

    fn submit_path(&mut self, kind: TransferKind) -> Option<Action> {
        if self.input.value.trim().is_empty() {
            return None;
        }

        let path = self.input.path();
        self.input.clear();
        self.input_mode = InputMode::Normal;

        if !kind.accepts(&path) {
            let expected = match kind {
                TransferKind::Upload => "a video file",
                TransferKind::Seed => "a .torrent file",
            };
            self.set_notice(Notice::Error(format!(
                "{} is not {}",
                path.display(),
                expected
            )));
            return None;
        }

        self.set_notice(Notice::Info(format!(
            "Starting {} of {}...",
            kind,
            path.display()
        )));
        Some(Action::Begin { kind, path })
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Option<Action> {
        // First keypress dismisses a popup
        if self.notice.is_some() && key.code == KeyCode::Esc {
            self.clear_notice();
            return None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.quit();
                Some(Action::Quit)
            }
            KeyCode::Char('v') | KeyCode::Char('u') => {
                self.open_picker(TransferKind::Upload);
                None
            }
            KeyCode::Char('t') | KeyCode::Char('s') => {
                self.open_picker(TransferKind::Seed);
                None
            }
            KeyCode::Char('d') => {
                if self.session.is_some() {
                    Some(Action::DownloadArtifact)
                } else {
                    self.set_notice(Notice::Error("No session yet".to_string()));
                    None
                }
            }
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_path_input_editing() {
        let mut input = PathInput::default();
        for c in "movie.mp4".chars() {
            input.insert(c);
        }
        assert_eq!(input.value, "movie.mp4");

        input.cursor_home();
        input.delete();
        assert_eq!(input.value, "ovie.mp4");

        input.cursor_end();
        input.backspace();
        assert_eq!(input.value, "ovie.mp");
        assert_eq!(input.cursor, 7);
    }

    #[test]
    fn test_path_input_multibyte() {
        let mut input = PathInput::default();
        for c in "película.mkv".chars() {
            input.insert(c);
        }
        input.cursor = 5;
        input.backspace();
        assert_eq!(input.value, "pelcula.mkv");
        let (before, after) = input.split_at_cursor();
        assert_eq!(before, "pel");
        assert_eq!(after, "cula.mkv");
    }

    #[test]
    fn test_submit_video_path() {
        let mut app = App::default();
        app.handle_key(key(KeyCode::Char('v')));
        assert_eq!(app.input_mode, InputMode::Editing(TransferKind::Upload));

        type_str(&mut app, "/videos/clip.mp4");
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            action,
            Some(Action::Begin {
                kind: TransferKind::Upload,
                path: PathBuf::from("/videos/clip.mp4")
            })
        );
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.input.value.is_empty());
    }

    #[test]
    fn test_submit_wrong_kind_shows_error() {
        let mut app = App::default();
        app.handle_key(key(KeyCode::Char('t')));
        type_str(&mut app, "clip.mp4");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
        assert!(app.notice.as_ref().is_some_and(Notice::is_error));
    }

    #[test]
    fn test_escape_cancels_picker() {
        let mut app = App::default();
        app.handle_key(key(KeyCode::Char('t')));
        type_str(&mut app, "abc");
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.running);
    }

    #[test]
    fn test_download_requires_session() {
        let mut app = App::default();
        assert_eq!(app.handle_key(key(KeyCode::Char('d'))), None);
        assert!(app.notice.is_some());

        app.apply(SinkEvent::SessionStarted {
            id: "abc123".into(),
            kind: TransferKind::Upload,
        });
        app.clear_notice();
        assert_eq!(
            app.handle_key(key(KeyCode::Char('d'))),
            Some(Action::DownloadArtifact)
        );
    }

    #[test]
    fn test_new_session_replaces_view() {
        let mut app = App::default();
        app.apply(SinkEvent::SessionStarted {
            id: "a".into(),
            kind: TransferKind::Upload,
        });
        app.apply(SinkEvent::PlaybackReady {
            id: "a".into(),
            stream_url: "http://x/stream/a".into(),
        });
        assert!(app.session.as_ref().unwrap().ready);

        app.apply(SinkEvent::SessionStarted {
            id: "b".into(),
            kind: TransferKind::Seed,
        });
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.id, SessionId::new("b"));
        assert!(!session.ready);
        assert!(session.stream_url.is_none());
    }

    #[test]
    fn test_status_for_other_session_ignored() {
        let mut app = App::default();
        app.apply(SinkEvent::SessionStarted {
            id: "b".into(),
            kind: TransferKind::Upload,
        });
        app.apply(SinkEvent::Status {
            id: "a".into(),
            status: TransferStatus {
                progress: 50.0,
                ..Default::default()
            },
        });
        assert!(app.session.as_ref().unwrap().status.is_none());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = App::default();
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Some(Action::Quit));
        assert!(!app.running);

        let mut app = App::default();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.handle_key(ctrl_c), Some(Action::Quit));
    }

    #[test]
    fn test_escape_dismisses_notice_before_quitting() {
        let mut app = App::default();
        app.set_notice(Notice::Info("hello".into()));
        assert_eq!(app.handle_key(key(KeyCode::Esc)), None);
        assert!(app.running);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Some(Action::Quit));
    }
}
