//! Session status panel
//!
//! Shows the current session, a progress gauge, transfer rates, peers,
//! and the stream URL once playback is ready.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph},
    Frame,
};

use crate::app::{App, SessionView};
use crate::models::ReadinessThreshold;
use crate::ui::Theme;

/// Label for the readiness line
pub fn readiness_label(session: &SessionView, threshold: ReadinessThreshold) -> String {
    if session.ready {
        return "READY".to_string();
    }
    match (session.status, threshold) {
        (None, _) => "Waiting for first status...".to_string(),
        (Some(_), ReadinessThreshold::AnyProgress) => "Buffering (plays on first data)".to_string(),
        (Some(_), ReadinessThreshold::Percent(p)) => format!("Buffering (plays at {}%)", p),
    }
}

/// Render the session panel
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(" SESSION ", Theme::title()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(session) = app.session.as_ref() else {
        render_empty(frame, inner);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Id + kind
            Constraint::Length(1), // Gauge
            Constraint::Length(1),
            Constraint::Length(2), // Rates + peers
            Constraint::Length(2), // Readiness
            Constraint::Min(0),    // Stream URL
        ])
        .split(inner);

    let header = Paragraph::new(Line::from(vec![
        Span::styled("Session ", Theme::dimmed()),
        Span::styled(session.id.as_str(), Theme::text()),
        Span::styled(format!("  [{}]", session.kind), Theme::dimmed()),
    ]));
    frame.render_widget(header, chunks[0]);

    let status = session.status.unwrap_or_default();
    let gauge = Gauge::default()
        .gauge_style(Theme::gauge(session.ready))
        .ratio(status.ratio())
        .label(status.format_progress());
    frame.render_widget(gauge, chunks[1]);

    let rates = Paragraph::new(Line::from(vec![
        Span::styled("↓ ", Theme::dimmed()),
        Span::styled(status.format_download_rate(), Theme::text()),
        Span::styled("   ↑ ", Theme::dimmed()),
        Span::styled(status.format_upload_rate(), Theme::text()),
        Span::styled("   peers ", Theme::dimmed()),
        Span::styled(status.num_peers.to_string(), Theme::peers(status.num_peers)),
    ]));
    frame.render_widget(rates, chunks[3]);

    let readiness_style = if session.ready {
        Theme::success()
    } else {
        Theme::warning()
    };
    let readiness = Paragraph::new(Span::styled(
        readiness_label(session, app.threshold),
        readiness_style,
    ));
    frame.render_widget(readiness, chunks[4]);

    if let Some(url) = &session.stream_url {
        let stream = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("Stream ", Theme::dimmed()),
                Span::styled(url.as_str(), Theme::link()),
            ]),
            Line::from(vec![
                Span::styled(" d ", Theme::keybind()),
                Span::styled("save .torrent", Theme::dimmed()),
            ]),
        ]);
        frame.render_widget(stream, chunks[5]);
    }
}

fn render_empty(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("No session yet", Theme::text())),
        Line::from(""),
        Line::from(vec![
            Span::styled("  v  ", Theme::keybind()),
            Span::styled("Upload a video to seed", Theme::dimmed()),
        ]),
        Line::from(vec![
            Span::styled("  t  ", Theme::keybind()),
            Span::styled("Stream from a .torrent file", Theme::dimmed()),
        ]),
        Line::from(vec![
            Span::styled("  q  ", Theme::keybind()),
            Span::styled("Quit", Theme::dimmed()),
        ]),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionId, TransferKind, TransferStatus};

    fn view(status: Option<TransferStatus>, ready: bool) -> SessionView {
        SessionView {
            id: SessionId::new("abc123"),
            kind: TransferKind::Upload,
            status,
            ready,
            stream_url: None,
        }
    }

    #[test]
    fn test_readiness_label() {
        let threshold = ReadinessThreshold::Percent(10.0);
        assert_eq!(
            readiness_label(&view(None, false), threshold),
            "Waiting for first status..."
        );
        assert_eq!(
            readiness_label(&view(Some(TransferStatus::default()), false), threshold),
            "Buffering (plays at 10%)"
        );
        assert_eq!(
            readiness_label(
                &view(Some(TransferStatus::default()), false),
                ReadinessThreshold::AnyProgress
            ),
            "Buffering (plays on first data)"
        );
        assert_eq!(readiness_label(&view(None, true), threshold), "READY");
    }
}
