use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::App;

/// Keys on the lanes, with no dialog open.
///
/// Up/Down/Left/Right move the picked-up task in move mode and navigate
/// otherwise; everything else behaves the same in both.
pub(super) fn handle_board_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            app.open_quit();
        }
        return;
    }

    match key.code {
        // Move axis
        KeyCode::F(6) | KeyCode::Enter | KeyCode::Char(' ') => app.toggle_select(),
        KeyCode::Esc => app.leave_select(),
        KeyCode::Up | KeyCode::Char('k') if app.in_select => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') if app.in_select => app.move_down(),
        KeyCode::Left if app.in_select => app.move_left(),
        KeyCode::Right if app.in_select => app.move_right(),

        // Focus axis
        KeyCode::Up | KeyCode::Char('k') => app.cursor_up(),
        KeyCode::Down | KeyCode::Char('j') => app.cursor_down(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Left | KeyCode::BackTab => app.focus_prev(),
        KeyCode::Right | KeyCode::Tab => app.focus_next(),

        // Commands; each puts a picked-up task down first
        code => {
            let Some(command) = command_for(code) else {
                return;
            };
            app.leave_select();
            if app.dialog.is_some() {
                // the save failed and its error is showing
                return;
            }
            command(app);
        }
    }
}

fn command_for(code: KeyCode) -> Option<fn(&mut App)> {
    let command: fn(&mut App) = match code {
        KeyCode::F(1) | KeyCode::Char('h') | KeyCode::Char('?') => App::open_about,
        KeyCode::F(2) | KeyCode::Insert | KeyCode::Char('+') => App::open_add,
        KeyCode::F(3) | KeyCode::Char('e') => App::open_edit,
        KeyCode::F(4) | KeyCode::Char('n') => App::request_note,
        KeyCode::F(5) | KeyCode::Char('a') => App::open_archive,
        KeyCode::F(7) => App::open_lane_menu,
        KeyCode::F(8) => |app: &mut App| app.open_sort(app.active),
        KeyCode::F(10) | KeyCode::Char('q') => App::open_quit,
        KeyCode::Delete | KeyCode::Char('d') => App::open_delete,
        KeyCode::Char('m') => App::open_mode_picker,
        _ => return None,
    };
    Some(command)
}
