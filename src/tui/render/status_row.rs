use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::App;
use crate::util::unicode::display_width;

const KEY_HINTS: [(&str, &str); 9] = [
    ("F1", "About"),
    ("F2", "Add"),
    ("F3", "Edit"),
    ("F4", "Note"),
    ("F5", "Archive"),
    ("F6", "Select"),
    ("F7", "Lane"),
    ("F8", "Sort"),
    ("F10", "Exit"),
];

const MOVE_HINT: &str = "moving: \u{2190}\u{2191}\u{2193}\u{2192} move, Enter/Esc drop";

/// Render the status row (bottom of screen): key hints on the left, then
/// the move-mode hint or a transient message, and the mode name on the right.
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bg = theme.status_bg;
    let width = area.width as usize;
    let text_style = Style::default().fg(theme.status_fg).bg(bg);
    let key_style = Style::default()
        .fg(theme.key_hint)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut spans: Vec<Span> = Vec::new();
    if app.show_key_hints {
        for (key, label) in KEY_HINTS {
            spans.push(Span::styled(key, key_style));
            spans.push(Span::styled(format!(" {label} "), text_style));
        }
    }

    let message = if let Some(message) = &app.status_message {
        Some(message.as_str())
    } else if app.in_select {
        Some(MOVE_HINT)
    } else {
        None
    };
    if let Some(message) = message {
        spans.push(Span::styled(
            format!(" {message}"),
            text_style.add_modifier(Modifier::BOLD),
        ));
    }

    // mode name right-aligned, if it still fits
    let mode = format!(" [{}] ", app.mode());
    let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    let mode_w = display_width(&mode);
    if used + mode_w <= width {
        spans.push(Span::styled(" ".repeat(width - used - mode_w), text_style));
        spans.push(Span::styled(mode, text_style));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
