pub mod dialog_popup;
pub mod lanes_view;
pub mod status_row;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::App;

/// Main render function: lanes, status row, then the open dialog on top
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: lanes | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    lanes_view::render_lanes(frame, app, chunks[0]);
    status_row::render_status_row(frame, app, chunks[1]);

    if app.dialog.is_some() {
        dialog_popup::render_dialog(frame, app, area);
    }
}
