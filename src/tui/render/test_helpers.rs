use std::sync::Arc;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use tempfile::TempDir;

use crate::io::paths::BoardPaths;
use crate::io::store::ContentStore;
use crate::model::{AppConfig, TaskFields};
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return it with styles.
pub fn render_to_buffer<F>(w: u16, h: u16, f: F) -> Buffer
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();
    terminal.backend().buffer().clone()
}

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let buf = render_to_buffer(w, h, f);
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// An App on a fresh "main" board whose first lane holds `titles`, in order.
/// Keep the TempDir alive for as long as the App is used.
pub fn app_with_tasks(titles: &[&str]) -> (TempDir, App) {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(ContentStore::open(BoardPaths::for_mode(tmp.path(), "main")).unwrap());
    for (i, title) in titles.iter().enumerate() {
        store.add_task(
            0,
            i,
            TaskFields {
                title: title.to_string(),
                ..Default::default()
            },
        );
    }
    let app = App::new(store, tmp.path().to_path_buf(), &AppConfig::default());
    (tmp, app)
}
