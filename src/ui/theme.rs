//! Color palette and style helpers for the TUI

use ratatui::style::{Color, Modifier, Style};

/// EchoFlix palette
pub struct Theme;

impl Theme {
    // ═══════════════════════════════════════════════════════════════════════
    // CORE PALETTE
    // ═══════════════════════════════════════════════════════════════════════

    /// Background: #0b0b10
    pub const BACKGROUND: Color = Color::Rgb(0x0b, 0x0b, 0x10);

    /// Panels and the status bar: #16161f
    pub const PANEL: Color = Color::Rgb(0x16, 0x16, 0x1f);

    /// Brand red: #e50914
    pub const PRIMARY: Color = Color::Rgb(0xe5, 0x09, 0x14);

    /// Links and URLs: #4fc3f7
    pub const LINK: Color = Color::Rgb(0x4f, 0xc3, 0xf7);

    /// Key hints: #ffd54f
    pub const ACCENT: Color = Color::Rgb(0xff, 0xd5, 0x4f);

    /// Text: #e6e6e6
    pub const TEXT: Color = Color::Rgb(0xe6, 0xe6, 0xe6);

    /// Muted: #6b6b7b
    pub const DIM: Color = Color::Rgb(0x6b, 0x6b, 0x7b);

    /// Ready / success: #2ecc71
    pub const SUCCESS: Color = Color::Rgb(0x2e, 0xcc, 0x71);

    /// Buffering: #f39c12
    pub const WARNING: Color = Color::Rgb(0xf3, 0x9c, 0x12);

    /// Error: #ff4d4f
    pub const ERROR: Color = Color::Rgb(0xff, 0x4d, 0x4f);

    pub const BORDER: Color = Color::Rgb(0x3a, 0x3a, 0x4a);

    // ═══════════════════════════════════════════════════════════════════════
    // STYLE HELPERS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn text() -> Style {
        Style::default().fg(Self::TEXT)
    }

    pub fn dimmed() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn link() -> Style {
        Style::default()
            .fg(Self::LINK)
            .add_modifier(Modifier::UNDERLINED)
    }

    pub fn keybind() -> Style {
        Style::default().fg(Self::ACCENT)
    }

    pub fn success() -> Style {
        Style::default()
            .fg(Self::SUCCESS)
            .add_modifier(Modifier::BOLD)
    }

    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    pub fn error() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    /// Border of the panel that has keyboard focus
    pub fn border_focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn input() -> Style {
        Style::default().fg(Self::TEXT).bg(Self::PANEL)
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Self::TEXT).bg(Self::PANEL)
    }

    /// Gauge colors follow readiness: amber while buffering, green once ready
    pub fn gauge(ready: bool) -> Style {
        let fg = if ready { Self::SUCCESS } else { Self::WARNING };
        Style::default().fg(fg).bg(Self::PANEL)
    }

    /// Peer count (no peers = red, a few = amber, healthy = green)
    pub fn peers(count: u32) -> Style {
        match count {
            0 => Style::default().fg(Self::ERROR),
            1..=4 => Style::default().fg(Self::WARNING),
            _ => Style::default().fg(Self::SUCCESS),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// COLOR UTILITIES
// ═══════════════════════════════════════════════════════════════════════════

/// Relative luminance, per WCAG 2.0
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    fn channel(c: u8) -> f64 {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
}

/// Contrast ratio between two colors, 1.0 to 21.0.
/// `None` unless both are `Color::Rgb`.
pub fn contrast_ratio(fg: Color, bg: Color) -> Option<f64> {
    match (fg, bg) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let l1 = relative_luminance(r1, g1, b1);
            let l2 = relative_luminance(r2, g2, b2);
            let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
            Some((lighter + 0.05) / (darker + 0.05))
        }
        _ => None,
    }
}
