use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

use crate::tui::app::{App, LaneView};
use crate::util::unicode::truncate_to_width;

/// Render all lanes as equal-width columns
pub fn render_lanes(frame: &mut Frame, app: &App, area: Rect) {
    if app.lanes.is_empty() {
        return;
    }
    let count = app.lanes.len() as u32;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..count).map(|_| Constraint::Ratio(1, count)))
        .split(area);

    for (i, (lane, column)) in app.lanes.iter().zip(columns.iter()).enumerate() {
        render_lane(frame, app, lane, i == app.active, *column);
    }
}

fn render_lane(frame: &mut Frame, app: &App, lane: &LaneView, focused: bool, area: Rect) {
    let theme = &app.theme;
    let bg = theme.lane_bg(&lane.color);
    let border = if focused { theme.border_focused } else { theme.border };
    let mut title_style = Style::default().fg(border).bg(bg);
    if focused {
        title_style = title_style.add_modifier(Modifier::BOLD);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border).bg(bg))
        .title(Span::styled(lane.header(), title_style))
        .style(Style::default().bg(bg));

    // borders take two cells
    let text_w = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = lane
        .rows
        .iter()
        .map(|row| {
            let title = Line::from(Span::styled(
                truncate_to_width(&row.display_title(), text_w),
                Style::default().fg(theme.task_fg(&row.color)),
            ));
            let secondary = Line::from(Span::styled(
                truncate_to_width(&row.secondary, text_w),
                Style::default().fg(theme.dim),
            ));
            ListItem::new(vec![title, secondary])
        })
        .collect();

    let highlight = if app.in_select {
        Style::default().fg(theme.select_fg).bg(theme.select_bg)
    } else {
        Style::default().fg(theme.cursor_fg).bg(theme.cursor_bg)
    };

    let list = List::new(items)
        .block(block)
        .style(Style::default().fg(theme.text).bg(bg))
        .highlight_style(highlight);

    // only the focused lane shows its cursor
    let mut state = ListState::default().with_selected(
        (focused && !lane.rows.is_empty()).then_some(lane.cursor),
    );
    frame.render_stateful_widget(list, area, &mut state);
}
