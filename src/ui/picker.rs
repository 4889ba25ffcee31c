//! File picker input box

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::app::{App, InputMode};
use crate::models::TransferKind;
use crate::ui::Theme;

fn title(kind: TransferKind) -> &'static str {
    match kind {
        TransferKind::Upload => " VIDEO FILE ",
        TransferKind::Seed => " TORRENT FILE ",
    }
}

/// Render the path input; a hint line when the picker is closed
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let (text, border, block_title) = match app.input_mode {
        InputMode::Editing(kind) => {
            let (before, after) = app.input.split_at_cursor();
            (
                Line::from(vec![
                    Span::styled("› ", Theme::keybind()),
                    Span::styled(format!("{}│{}", before, after), Theme::input()),
                ]),
                Theme::border_focused(),
                title(kind),
            )
        }
        InputMode::Normal => (
            Line::from(Span::styled(
                "Press v to upload a video or t to open a .torrent",
                Theme::dimmed(),
            )),
            Theme::border(),
            " FILE ",
        ),
    };

    let input = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title(Span::styled(block_title, Theme::title())),
    );
    frame.render_widget(input, area);
}
