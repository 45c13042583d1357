use crossterm::event::KeyEvent;
use tracing::debug;

use crate::tui::app::App;
use crate::tui::dialog::{
    ConfirmAction, Dialog, DialogOutcome, FormTarget, ModeChoice, NamePurpose, TaskForm,
};

/// Route a key to the open dialog and act on its outcome
pub(super) fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    let Some(mut dialog) = app.dialog.take() else {
        return;
    };
    match dialog.handle_key(key) {
        DialogOutcome::Pending => app.dialog = Some(dialog),
        DialogOutcome::Cancel => app.close_dialog(),
        DialogOutcome::Submit => submit(app, dialog),
    }
}

fn submit(app: &mut App, dialog: Dialog) {
    match dialog {
        Dialog::Confirm(confirm) => {
            app.close_dialog();
            match confirm.action {
                ConfirmAction::Delete { lane, task_id } => app.delete_task(lane, &task_id),
                ConfirmAction::Archive { lane, task_id } => app.archive_task(lane, &task_id),
                ConfirmAction::Quit => app.quit(),
            }
        }
        Dialog::TaskForm(form) => submit_task_form(app, form),
        Dialog::LaneMenu { lane, picker } => match picker.chosen() {
            Some(command) => app.choose_lane_command(lane, *command),
            None => app.close_dialog(),
        },
        Dialog::Name(input) => {
            app.close_dialog();
            match input.purpose {
                NamePurpose::RenameLane { lane } => app.rename_lane(lane, input.value()),
                NamePurpose::InsertLane { left_of, reference } => {
                    app.insert_lane(left_of, reference, input.value())
                }
                NamePurpose::NewMode => app.switch_mode(input.value()),
            }
        }
        Dialog::Color { lane, picker } => {
            app.close_dialog();
            if let Some(color) = picker.chosen() {
                app.set_lane_color(lane, color);
            }
        }
        Dialog::Sort { lane, picker } => {
            app.close_dialog();
            if let Some(mode) = picker.chosen() {
                app.set_lane_sort(lane, *mode);
            }
        }
        Dialog::RemoveLane { lane, picker } => {
            app.close_dialog();
            if let Some(choice) = picker.chosen() {
                app.remove_lane(lane, *choice);
            }
        }
        Dialog::Mode(picker) => match picker.chosen() {
            Some(ModeChoice::Open(mode)) => {
                app.close_dialog();
                app.switch_mode(mode);
            }
            Some(ModeChoice::New) => app.open_new_mode(),
            Some(ModeChoice::Cancel) | None => app.close_dialog(),
        },
        Dialog::Error { resume, .. } => match resume {
            Some(next) => app.dialog = Some(*next),
            None => app.close_dialog(),
        },
        Dialog::About => app.close_dialog(),
    }
}

/// An unparseable due date keeps the form: the error is shown on top of it
/// and the form comes back, values intact, when the error is dismissed.
fn submit_task_form(app: &mut App, form: TaskForm) {
    let fields = match form.fields() {
        Ok(fields) => fields,
        Err(e) => {
            debug!(due = %form.due.text, error = %e, "task form rejected");
            app.show_error(e.to_string(), Some(Dialog::TaskForm(form)));
            return;
        }
    };
    app.close_dialog();
    match form.target {
        FormTarget::Add { lane, index } => app.add_task(lane, index, fields),
        FormTarget::Edit { lane, task_id } => app.edit_task(lane, &task_id, fields),
    }
}
