mod board;
mod dialogs;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::App;

use board::handle_board_key;
use dialogs::handle_dialog_key;

/// Handle a key event: the open dialog gets it first, then the board
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    app.status_message = None;

    let key = normalize_key(key);
    if app.dialog.is_some() {
        handle_dialog_key(app, key);
    } else {
        handle_board_key(app, key);
    }
}

/// Some terminals report `Shift+Tab` as `Tab` with the SHIFT modifier
fn normalize_key(mut key: KeyEvent) -> KeyEvent {
    if key.code == KeyCode::Tab && key.modifiers.contains(KeyModifiers::SHIFT) {
        key.code = KeyCode::BackTab;
        key.modifiers.remove(KeyModifiers::SHIFT);
    }
    key
}
