use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::model::priority_mark;
use crate::tui::app::App;
use crate::tui::dialog::{Confirm, Dialog, FormField, NameInput, Picker, TaskForm, TextField, color_label};
use crate::tui::theme::{Theme, color_token};
use crate::util::unicode::{display_width, truncate_to_width};

const POPUP_W: u16 = 56;
const LABEL_W: usize = 10;

/// Content of a popup plus where the terminal cursor should sit, relative to
/// the first content cell
struct Popup<'a> {
    title: String,
    lines: Vec<Line<'a>>,
    cursor: Option<(u16, u16)>,
    border: ratatui::style::Color,
}

/// Render the open dialog, if any, centered over `area`
pub fn render_dialog(frame: &mut Frame, app: &App, area: Rect) {
    let Some(dialog) = &app.dialog else {
        return;
    };
    let theme = &app.theme;
    let popup_w = POPUP_W.min(area.width.saturating_sub(2)).max(10);
    let inner_w = popup_w.saturating_sub(4) as usize;

    let popup = match dialog {
        Dialog::Confirm(confirm) => confirm_popup(confirm, theme, inner_w),
        Dialog::TaskForm(form) => form_popup(form, theme, inner_w),
        Dialog::LaneMenu { picker, .. } => picker_popup(picker, theme, inner_w),
        Dialog::Name(input) => name_popup(input, theme, inner_w),
        Dialog::Color { picker, .. } => picker_popup(picker, theme, inner_w),
        Dialog::Sort { picker, .. } => picker_popup(picker, theme, inner_w),
        Dialog::RemoveLane { picker, .. } => picker_popup(picker, theme, inner_w),
        Dialog::Mode(picker) => picker_popup(picker, theme, inner_w),
        Dialog::Error { message, .. } => error_popup(message, theme, inner_w),
        Dialog::About => about_popup(theme),
    };

    let popup_h = (popup.lines.len() as u16 + 2).min(area.height);
    let popup_area = centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(Span::styled(
            popup.title,
            Style::default()
                .fg(popup.border)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(popup.border))
        .style(Style::default().bg(theme.popup_bg));

    // one column of padding inside the border
    let inner = block.inner(popup_area);
    let content = Rect {
        x: inner.x + 1,
        width: inner.width.saturating_sub(2),
        ..inner
    };
    frame.render_widget(block, popup_area);
    frame.render_widget(
        Paragraph::new(popup.lines).style(Style::default().fg(theme.text).bg(theme.popup_bg)),
        content,
    );

    if let Some((x, y)) = popup.cursor
        && y < content.height
    {
        frame.set_cursor_position(Position::new(content.x + x.min(content.width), content.y + y));
    }
}

fn text_lines<'a>(text: &str, style: Style, width: usize) -> Vec<Line<'a>> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<Line> = text
        .lines()
        .flat_map(|para| wrap_text(para, width))
        .map(|l| Line::from(Span::styled(l, style)))
        .collect();
    lines.push(Line::from(""));
    lines
}

fn picker_popup<'a, T>(picker: &Picker<T>, theme: &Theme, width: usize) -> Popup<'a> {
    let mut lines = text_lines(&picker.text, Style::default().fg(theme.text), width);
    for (i, (label, _)) in picker.options.iter().enumerate() {
        let line = if i == picker.selected {
            Line::from(Span::styled(
                format!("\u{25b8} {label}"),
                Style::default()
                    .fg(theme.cursor_fg)
                    .bg(theme.cursor_bg)
                    .add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(format!("  {label}"), Style::default().fg(theme.text)))
        };
        lines.push(line);
    }
    Popup {
        title: picker.title.clone(),
        lines,
        cursor: None,
        border: theme.border_focused,
    }
}

fn confirm_popup<'a>(confirm: &Confirm, theme: &Theme, width: usize) -> Popup<'a> {
    let mut lines = text_lines(&confirm.text, Style::default().fg(theme.text), width);
    let active = Style::default()
        .fg(theme.cursor_fg)
        .bg(theme.cursor_bg)
        .add_modifier(Modifier::BOLD);
    let idle = Style::default().fg(theme.text);
    let (yes, no) = if confirm.yes { (active, idle) } else { (idle, active) };
    lines.push(Line::from(vec![
        Span::styled("[ Yes ]", yes),
        Span::raw("  "),
        Span::styled("[ No ]", no),
    ]));
    Popup {
        title: confirm.title.clone(),
        lines,
        cursor: None,
        border: theme.border_focused,
    }
}

fn error_popup<'a>(message: &str, theme: &Theme, width: usize) -> Popup<'a> {
    let mut lines = text_lines(message, Style::default().fg(theme.error), width);
    lines.push(Line::from(Span::styled(
        "[ OK ]",
        Style::default()
            .fg(theme.cursor_fg)
            .bg(theme.cursor_bg)
            .add_modifier(Modifier::BOLD),
    )));
    Popup {
        title: " Error ".to_string(),
        lines,
        cursor: None,
        border: theme.error,
    }
}

/// Visible tail of a text field and the cursor column within it
fn field_window(field: &TextField, width: usize) -> (String, u16) {
    let before = &field.text[..field.cursor];
    let mut start = 0;
    while display_width(&before[start..]) >= width {
        match before[start..].chars().next() {
            Some(c) => start += c.len_utf8(),
            None => break,
        }
    }
    let visible = truncate_to_width(&field.text[start..], width);
    (visible, display_width(&before[start..]) as u16)
}

fn name_popup<'a>(input: &NameInput, theme: &Theme, width: usize) -> Popup<'a> {
    let mut lines = text_lines(&input.text, Style::default().fg(theme.text), width);
    let (visible, col) = field_window(&input.field, width);
    let row = lines.len() as u16;
    lines.push(Line::from(Span::styled(
        format!("{visible:<width$}"),
        Style::default().fg(theme.text).add_modifier(Modifier::UNDERLINED),
    )));
    Popup {
        title: input.title.clone(),
        lines,
        cursor: Some((col, row)),
        border: theme.border_focused,
    }
}

fn form_popup<'a>(form: &TaskForm, theme: &Theme, width: usize) -> Popup<'a> {
    let value_w = width.saturating_sub(LABEL_W);
    let label = |name: &str, focused: bool| {
        let style = if focused {
            Style::default().fg(theme.key_hint).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.dim)
        };
        Span::styled(format!("{name:<LABEL_W$}"), style)
    };
    let value_style = |focused: bool| {
        if focused {
            Style::default().fg(theme.text).add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(theme.text)
        }
    };

    let mut lines = Vec::new();
    let mut cursor = None;
    let text_fields = [
        (FormField::Title, "Title", &form.title),
        (FormField::Secondary, "Details", &form.secondary),
        (FormField::Due, "Due", &form.due),
    ];
    for (field, name, text) in text_fields {
        let focused = form.focus == field;
        let (visible, col) = field_window(text, value_w);
        let value = if field == FormField::Due && visible.is_empty() && !focused {
            Span::styled(form.date_style.placeholder(), Style::default().fg(theme.dim))
        } else {
            Span::styled(format!("{visible:<value_w$}"), value_style(focused))
        };
        if focused {
            cursor = Some(((LABEL_W as u16) + col, lines.len() as u16));
        }
        lines.push(Line::from(vec![label(name, focused), value]));
    }

    let mark = priority_mark(form.priority);
    let priority = if mark.is_empty() {
        form.priority.to_string()
    } else {
        format!("{} {mark}", form.priority)
    };
    let focused = form.focus == FormField::Priority;
    lines.push(Line::from(vec![
        label("Priority", focused),
        Span::styled(format!("\u{25c2} {priority} \u{25b8}"), value_style(focused)),
    ]));

    let focused = form.focus == FormField::Color;
    let mut swatch = Style::default();
    if let Some(color) = color_token(&form.color) {
        swatch = swatch.fg(color);
    }
    lines.push(Line::from(vec![
        label("Color", focused),
        Span::styled("\u{25c2} ", value_style(focused)),
        Span::styled(color_label(&form.color).to_string(), swatch),
        Span::styled(" \u{25b8}", value_style(focused)),
    ]));

    if let Some(info) = &form.info {
        lines.push(Line::from(""));
        for l in wrap_text(info, width) {
            lines.push(Line::from(Span::styled(l, Style::default().fg(theme.dim))));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab next field, Enter save, Esc cancel",
        Style::default().fg(theme.dim),
    )));

    Popup {
        title: form.heading().to_string(),
        lines,
        cursor,
        border: theme.border_focused,
    }
}

fn add_binding<'a>(lines: &mut Vec<Line<'a>>, key: &'a str, desc: &'a str, theme: &Theme) {
    lines.push(Line::from(vec![
        Span::styled(
            format!("{key:<14}"),
            Style::default().fg(theme.key_hint).add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc, Style::default().fg(theme.text)),
    ]));
}

fn about_popup<'a>(theme: &Theme) -> Popup<'a> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("todo-lanes {}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Kanban board for the terminal",
            Style::default().fg(theme.dim),
        )),
        Line::from(""),
    ];
    add_binding(&mut lines, "F2 Ins +", "Add task", theme);
    add_binding(&mut lines, "F3 e", "Edit task", theme);
    add_binding(&mut lines, "F4 n", "Edit note in $EDITOR", theme);
    add_binding(&mut lines, "F5 a", "Archive task", theme);
    add_binding(&mut lines, "Del d", "Delete task", theme);
    add_binding(&mut lines, "F6 Enter", "Pick up / drop task", theme);
    add_binding(&mut lines, "F7", "Lane commands", theme);
    add_binding(&mut lines, "F8", "Sort lane", theme);
    add_binding(&mut lines, "m", "Switch mode", theme);
    add_binding(&mut lines, "Tab \u{2190}\u{2192}", "Change lane", theme);
    add_binding(&mut lines, "\u{2191}\u{2193} Home End", "Move cursor", theme);
    add_binding(&mut lines, "F10 q", "Exit", theme);
    Popup {
        title: " About ".to_string(),
        lines,
        cursor: None,
        border: theme.border_focused,
    }
}

/// Word-wrap `text` into lines of at most `max_width` cells.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let space = if current.is_empty() { 0 } else { 1 };
        if display_width(&current) + space + display_width(word) > max_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
