//! Terminal UI components
//!
//! Built with ratatui. Keyboard-first: every action has a single key.

pub mod picker;
pub mod status;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, Notice};

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    frame.render_widget(Clear, area);
    frame.render_widget(
        Block::default().style(Style::default().bg(Theme::BACKGROUND)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Picker
            Constraint::Min(1),    // Session
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    picker::render(frame, chunks[1], app);
    status::render(frame, chunks[2], app);
    render_status_bar(frame, chunks[3], app);

    // Info notices live in the status bar; errors get a popup
    if let Some(notice) = app.notice.as_ref().filter(|n| n.is_error()) {
        render_error_popup(frame, area, notice.message());
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(14), Constraint::Min(1)])
        .split(area);

    let logo = Paragraph::new(Line::from(vec![
        Span::styled("ECHO", Theme::title()),
        Span::styled(
            "FLIX",
            Style::default().fg(Theme::TEXT).add_modifier(Modifier::BOLD),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border()),
    );
    frame.render_widget(logo, chunks[0]);

    let backend = Paragraph::new(Line::from(vec![
        Span::styled("backend ", Theme::dimmed()),
        Span::styled(app.api_base.as_str(), Theme::link()),
        Span::styled("   plays at ", Theme::dimmed()),
        Span::styled(app.threshold.label(), Theme::text()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border()),
    );
    frame.render_widget(backend, chunks[1]);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mode = match app.input_mode {
        InputMode::Normal => Span::styled(
            " NORMAL ",
            Style::default().fg(Theme::BACKGROUND).bg(Theme::PRIMARY),
        ),
        InputMode::Editing(_) => Span::styled(
            " INSERT ",
            Style::default().fg(Theme::BACKGROUND).bg(Theme::ACCENT),
        ),
    };

    let help = match app.input_mode {
        InputMode::Normal => " v:upload  t:torrent  d:download  q:quit ",
        InputMode::Editing(_) => " ↵:start  ESC:cancel ",
    };

    let mut spans = vec![mode, Span::styled(help, Theme::dimmed())];
    if let Some(Notice::Info(msg)) = &app.notice {
        spans.push(Span::raw("│ "));
        spans.push(Span::styled(msg.as_str(), Theme::text()));
    }

    let line = Line::from(spans);
    frame.render_widget(Paragraph::new(line).style(Theme::status_bar()), area);
}

fn render_error_popup(frame: &mut Frame, area: Rect, message: &str) {
    let width = 64.min(area.width.saturating_sub(4));
    let height = 6;

    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup);
    let body = Paragraph::new(vec![
        Line::from(Span::styled(message, Theme::error())),
        Line::from(""),
        Line::from(Span::styled("ESC to dismiss", Theme::dimmed())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Theme::error())
            .title(Span::styled(" ✗ ERROR ", Theme::error()))
            .style(Style::default().bg(Theme::BACKGROUND)),
    );
    frame.render_widget(body, popup);
}
