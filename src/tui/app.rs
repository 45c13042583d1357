use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, error, info, warn};

use crate::io::editor::{ExternalEditor, NoteEditor};
use crate::io::paths::{BoardPaths, list_modes, mode_file_name};
use crate::io::settings::{Settings, SettingsError, read_settings, write_settings};
use crate::io::store::{ContentStore, StoreError};
use crate::io::watcher::{BoardWatcher, WatchEvent};
use crate::model::{AppConfig, Board, SortMode, Stamp, Task, TaskFields};
use crate::ops::{lane_ops, task_ops};
use crate::util::datefmt::{DateStyle, DueMarker, due_marker};
use crate::util::position::{norm_pos, step};

use super::dialog::{
    Confirm, ConfirmAction, Dialog, LaneCommand, ModeChoice, NameInput, NamePurpose, Picker,
    RemoveChoice, TaskForm,
};
use super::input;
use super::render;
use super::theme::Theme;

/// How long drawing stays paused after the board file disappeared
pub const SUSPEND_TIMEOUT: Duration = Duration::from_secs(5);

const SUSPEND_TICK: Duration = Duration::from_millis(50);

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("cannot watch the board directory: {0}")]
    Watch(#[from] notify::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("terminal: {0}")]
    Terminal(#[from] io::Error),
    /// Unrecoverable failure detected while the UI was running
    #[error("{0}")]
    Fatal(String),
}

/// One task as shown in a lane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneRow {
    pub id: String,
    pub title: String,
    pub color: String,
    pub marker: Option<DueMarker>,
    /// Secondary text followed by the priority glyph
    pub secondary: String,
}

impl LaneRow {
    fn new(task: &Task, today: NaiveDate) -> Self {
        let mark = task.priority_mark();
        let secondary = match (task.secondary.is_empty(), mark.is_empty()) {
            (_, true) => task.secondary.clone(),
            (true, false) => mark.to_string(),
            (false, false) => format!("{} {mark}", task.secondary),
        };
        LaneRow {
            id: task.id.clone(),
            title: task.title.clone(),
            color: task.color.clone(),
            marker: due_marker(&task.due, today),
            secondary,
        }
    }

    /// Title with the due marker appended
    pub fn display_title(&self) -> String {
        match self.marker {
            Some(marker) => format!("{} {}", self.title, marker.label()),
            None => self.title.clone(),
        }
    }
}

/// Row cache and cursor for one lane
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneView {
    pub title: String,
    pub color: String,
    pub sort: SortMode,
    pub rows: Vec<LaneRow>,
    pub cursor: usize,
}

impl LaneView {
    /// Rows of an already sorted lane. The cursor lands on `anchor` when that
    /// task is present, else on `fallback` wrapped into range.
    fn build(board: &Board, lane: usize, today: NaiveDate, fallback: usize, anchor: Option<&str>) -> Self {
        let rows: Vec<LaneRow> = board
            .tasks(lane)
            .iter()
            .map(|task| LaneRow::new(task, today))
            .collect();
        let cursor = anchor
            .and_then(|id| rows.iter().position(|row| row.id == id))
            .unwrap_or_else(|| norm_pos(fallback as isize, rows.len()));
        LaneView {
            title: board.lane_title(lane).to_string(),
            color: board.lane_color(lane).to_string(),
            sort: board.lane_sort(lane),
            rows,
            cursor,
        }
    }

    pub fn header(&self) -> String {
        format!(" {} ({}) ", self.title, self.rows.len())
    }

    pub fn current(&self) -> Option<&LaneRow> {
        self.rows.get(self.cursor)
    }
}

/// Focus remembered while a dialog is open
#[derive(Debug, Clone, PartialEq, Eq)]
struct SavedFocus {
    lane: usize,
    task_id: Option<String>,
}

/// Main application state
pub struct App {
    pub store: Arc<ContentStore>,
    /// Storage root, for the mode list
    pub root: PathBuf,
    pub lanes: Vec<LaneView>,
    pub active: usize,
    /// A task is picked up and the arrow keys move it
    pub in_select: bool,
    saved_focus: Option<SavedFocus>,
    pub dialog: Option<Dialog>,
    pub status_message: Option<String>,
    pub theme: Theme,
    pub date_style: DateStyle,
    pub show_key_hints: bool,
    pub should_quit: bool,
    /// Mode to open after this board closes
    pub next_mode: Option<String>,
    /// Note edit waiting for the event loop to hand over the terminal
    pub pending_note: Option<(usize, String)>,
    pub suspended_since: Option<Instant>,
    /// Set when the terminal must be cleared before the next draw
    pub needs_clear: bool,
    pub fatal: Option<String>,
}

impl App {
    pub fn new(store: Arc<ContentStore>, root: PathBuf, config: &AppConfig) -> Self {
        let mut app = App {
            store,
            root,
            lanes: Vec::new(),
            active: 0,
            in_select: false,
            saved_focus: None,
            dialog: None,
            status_message: None,
            theme: Theme::from_config(&config.ui),
            date_style: DateStyle::resolve(config.ui.date_format),
            show_key_hints: config.ui.show_key_hints,
            should_quit: false,
            next_mode: None,
            pending_note: None,
            suspended_since: None,
            needs_clear: false,
            fatal: None,
        };
        app.redraw_all();
        app
    }

    pub fn mode(&self) -> &str {
        &self.store.paths().mode
    }

    pub fn focused_lane(&self) -> Option<&LaneView> {
        self.lanes.get(self.active)
    }

    pub fn cursor(&self) -> usize {
        self.focused_lane().map_or(0, |lane| lane.cursor)
    }

    pub fn current_row(&self) -> Option<&LaneRow> {
        self.focused_lane().and_then(LaneView::current)
    }

    /// The focused task as (lane, index in the store, id)
    fn focused_task(&self) -> Option<(usize, usize, String)> {
        let id = self.current_row()?.id.clone();
        let index = self.task_index(self.active, &id)?;
        Some((self.active, index, id))
    }

    fn task_index(&self, lane: usize, id: &str) -> Option<usize> {
        self.store.read(|board| board.position_in_lane(lane, id))
    }

    // -----------------------------------------------------------------------
    // Redraw
    // -----------------------------------------------------------------------

    /// Re-sort and rebuild one lane. The focused lane keeps its cursor on the
    /// same task; other lanes use `fallback`.
    pub fn redraw_lane(&mut self, lane: usize, fallback: usize) {
        let anchor = if lane == self.active {
            self.current_row().map(|row| row.id.clone())
        } else {
            None
        };
        self.redraw_lane_at(lane, fallback, anchor.as_deref());
    }

    fn redraw_lane_at(&mut self, lane: usize, fallback: usize, anchor: Option<&str>) {
        let today = Local::now().date_naive();
        let view = self.store.sorted_lane(lane, |board| {
            (lane < board.lane_count()).then(|| LaneView::build(board, lane, today, fallback, anchor))
        });
        if let Some(view) = view
            && let Some(slot) = self.lanes.get_mut(lane)
        {
            *slot = view;
        }
    }

    /// Rebuild every lane, e.g. after the lane set changed or a reload
    pub fn redraw_all(&mut self) {
        let count = self.store.lane_count();
        self.lanes.resize_with(count, LaneView::default);
        self.active = norm_pos(self.active as isize, count);
        for lane in 0..count {
            let cursor = self.lanes[lane].cursor;
            self.redraw_lane(lane, cursor);
        }
        if self.current_row().is_none() {
            self.in_select = false;
        }
    }

    // -----------------------------------------------------------------------
    // Focus and selection
    // -----------------------------------------------------------------------

    pub fn focus_lane(&mut self, lane: usize) {
        self.active = norm_pos(lane as isize, self.lanes.len());
    }

    pub fn focus_next(&mut self) {
        self.leave_select();
        self.active = step(self.active, 1, self.lanes.len());
    }

    pub fn focus_prev(&mut self) {
        self.leave_select();
        self.active = step(self.active, -1, self.lanes.len());
    }

    pub fn cursor_up(&mut self) {
        self.shift_cursor(-1);
    }

    pub fn cursor_down(&mut self) {
        self.shift_cursor(1);
    }

    fn shift_cursor(&mut self, delta: isize) {
        if let Some(lane) = self.lanes.get_mut(self.active) {
            lane.cursor = step(lane.cursor, delta, lane.rows.len());
        }
    }

    pub fn cursor_home(&mut self) {
        if let Some(lane) = self.lanes.get_mut(self.active) {
            lane.cursor = 0;
        }
    }

    pub fn cursor_end(&mut self) {
        if let Some(lane) = self.lanes.get_mut(self.active) {
            lane.cursor = lane.rows.len().saturating_sub(1);
        }
    }

    /// Pick up the focused task, or put it down and save
    pub fn toggle_select(&mut self) {
        if self.in_select {
            self.leave_select();
        } else {
            self.in_select = self.current_row().is_some();
        }
    }

    pub fn leave_select(&mut self) {
        if self.in_select {
            self.in_select = false;
            self.persist();
        }
    }

    pub fn move_up(&mut self) {
        self.move_within(-1);
    }

    pub fn move_down(&mut self) {
        self.move_within(1);
    }

    pub fn move_left(&mut self) {
        self.move_across(-1);
    }

    pub fn move_right(&mut self) {
        self.move_across(1);
    }

    fn move_within(&mut self, delta: isize) {
        let Some((lane, index, id)) = self.focused_task() else {
            return;
        };
        let len = self.store.read(|board| board.lane_len(lane));
        let target = step(index, delta, len);
        self.commit(|board| task_ops::move_task(board, lane, index, lane, target));
        self.redraw_lane_at(lane, target, Some(&id));
    }

    fn move_across(&mut self, delta: isize) {
        let lanes = self.lanes.len();
        if lanes < 2 {
            return;
        }
        let Some((from, index, id)) = self.focused_task() else {
            return;
        };
        let to = step(from, delta, lanes);
        let dest = self.lanes[to].cursor;
        self.commit(|board| task_ops::move_task(board, from, index, to, dest));
        self.redraw_lane_at(from, index, None);
        self.active = to;
        self.redraw_lane_at(to, dest, Some(&id));
        debug!(from, to, %id, "task moved across lanes");
    }

    /// Change the board and save it under one store lock.
    /// A failed save is shown and gives None.
    fn commit<R>(&mut self, f: impl FnOnce(&mut Board) -> R) -> Option<R> {
        match self.store.commit(f) {
            Ok(result) => Some(result),
            Err(e) => {
                self.report_save_error(&e);
                None
            }
        }
    }

    /// Save the board; a failure is shown, not fatal
    pub fn persist(&mut self) {
        if let Err(e) = self.store.save() {
            self.report_save_error(&e);
        }
    }

    fn report_save_error(&mut self, e: &StoreError) {
        error!(error = %e, "save failed");
        self.show_error(format!("Could not save the board: {e}"), None);
    }

    // -----------------------------------------------------------------------
    // Dialog round-trips
    // -----------------------------------------------------------------------

    fn save_focus(&mut self) {
        self.saved_focus = Some(SavedFocus {
            lane: self.active,
            task_id: self.current_row().map(|row| row.id.clone()),
        });
    }

    fn restore_focus(&mut self) {
        let Some(saved) = self.saved_focus.take() else {
            return;
        };
        self.focus_lane(saved.lane);
        if let Some(id) = saved.task_id
            && let Some(lane) = self.lanes.get_mut(self.active)
            && let Some(pos) = lane.rows.iter().position(|row| row.id == id)
        {
            lane.cursor = pos;
        }
    }

    /// Show a dialog. Focus is saved by the first dialog of a chain and
    /// restored when the chain closes.
    pub fn open_dialog(&mut self, dialog: Dialog) {
        if self.saved_focus.is_none() {
            self.save_focus();
        }
        self.dialog = Some(dialog);
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
        self.restore_focus();
    }

    pub fn show_error(&mut self, message: impl Into<String>, resume: Option<Dialog>) {
        let message = message.into();
        warn!(%message, "error dialog");
        self.open_dialog(Dialog::error(message, resume));
    }

    pub fn open_about(&mut self) {
        self.open_dialog(Dialog::About);
    }

    pub fn open_quit(&mut self) {
        self.open_dialog(Dialog::Confirm(Confirm::new(ConfirmAction::Quit)));
    }

    pub fn quit(&mut self) {
        self.leave_select();
        self.should_quit = true;
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub fn open_add(&mut self) {
        if self.lanes.is_empty() {
            return;
        }
        let today = Local::now().date_naive().format(self.date_style.layout()).to_string();
        let form = TaskForm::for_add(self.active, self.cursor(), self.date_style, &today);
        self.open_dialog(Dialog::TaskForm(form));
    }

    pub fn open_edit(&mut self) {
        let Some((lane, index, id)) = self.focused_task() else {
            return;
        };
        let style = self.date_style;
        let Some((fields, info)) = self.store.read(|board| {
            board
                .task(lane, index)
                .map(|task| (task.fields(), stamp_info(task, style)))
        }) else {
            return;
        };
        let form = TaskForm::for_edit(lane, &id, &fields, style, Some(info));
        self.open_dialog(Dialog::TaskForm(form));
    }

    pub fn open_delete(&mut self) {
        if let Some((lane, _, task_id)) = self.focused_task() {
            self.open_dialog(Dialog::Confirm(Confirm::new(ConfirmAction::Delete { lane, task_id })));
        }
    }

    pub fn open_archive(&mut self) {
        if let Some((lane, _, task_id)) = self.focused_task() {
            self.open_dialog(Dialog::Confirm(Confirm::new(ConfirmAction::Archive { lane, task_id })));
        }
    }

    /// Insert a task and focus it
    pub fn add_task(&mut self, lane: usize, index: usize, fields: TaskFields) {
        let added = self.commit(|board| task_ops::add_task(board, lane, index, fields, &Stamp::now()));
        let id = added.flatten();
        if let Some(id) = &id {
            info!(lane, %id, "task added");
        }
        self.focus_lane(lane);
        self.redraw_lane_at(lane, index, id.as_deref());
    }

    pub fn edit_task(&mut self, lane: usize, id: &str, fields: TaskFields) {
        let edited = self.commit(|board| {
            let index = board.position_in_lane(lane, id)?;
            task_ops::edit_task(board, lane, index, fields, &Stamp::now()).then_some(index)
        });
        match edited {
            Some(Some(index)) => self.redraw_lane(lane, index),
            Some(None) => self.status_message = Some("The task no longer exists".to_string()),
            None => self.redraw_lane(lane, self.cursor()),
        }
    }

    pub fn delete_task(&mut self, lane: usize, id: &str) {
        let Some(index) = self.task_index(lane, id) else {
            return;
        };
        let deleted = self.commit(|board| {
            let index = board.position_in_lane(lane, id)?;
            task_ops::delete_task(board, lane, index)
        });
        if let Some(Some(task)) = &deleted {
            info!(lane, id = %task.id, "task deleted");
        }
        self.redraw_lane_at(lane, index, None);
    }

    /// Archive writes the copy, removes the task and saves under one lock
    pub fn archive_task(&mut self, lane: usize, id: &str) {
        let Some(index) = self.task_index(lane, id) else {
            return;
        };
        match self.store.archive_task(lane, index) {
            Ok(true) => {
                info!(lane, %id, "task archived");
                self.redraw_lane_at(lane, index, None);
            }
            Ok(false) => {}
            Err(e) => {
                self.redraw_lane(lane, index);
                self.show_error(format!("Could not archive the task: {e}"), None);
            }
        }
    }

    /// Remember the focused task for a note edit once the terminal is free
    pub fn request_note(&mut self) {
        if let Some((lane, _, id)) = self.focused_task() {
            self.pending_note = Some((lane, id));
        }
    }

    /// Run the pending note edit through `editor`
    pub fn edit_note_with(&mut self, editor: &dyn NoteEditor) {
        let Some((lane, id)) = self.pending_note.take() else {
            return;
        };
        let Some(note) = self.store.read(|board| {
            let index = board.position_in_lane(lane, &id)?;
            board.task(lane, index).map(|task| task.note.clone())
        }) else {
            return;
        };

        match editor.edit(&note) {
            Ok(Some(text)) => {
                // the board may have been reloaded while the editor was open
                let updated = self.commit(|board| {
                    let index = board.position_in_lane(lane, &id)?;
                    Some((index, task_ops::set_note(board, lane, index, &text, &Stamp::now())))
                });
                match updated {
                    Some(Some((index, changed))) => {
                        if changed {
                            debug!(lane, %id, "note updated");
                        }
                        self.redraw_lane(lane, index);
                    }
                    Some(None) => {
                        self.status_message = Some("The task disappeared while editing its note".to_string());
                    }
                    None => {}
                }
            }
            Ok(None) => {}
            Err(e) => self.show_error(format!("Could not edit the note: {e}"), None),
        }
    }

    // -----------------------------------------------------------------------
    // Lanes
    // -----------------------------------------------------------------------

    pub fn open_lane_menu(&mut self) {
        if !self.lanes.is_empty() {
            self.open_dialog(Dialog::lane_menu(self.active));
        }
    }

    pub fn open_sort(&mut self, lane: usize) {
        if let Some(view) = self.lanes.get(lane) {
            let dialog = Dialog::sort_picker(lane, &view.title, view.sort);
            self.open_dialog(dialog);
        }
    }

    pub fn choose_lane_command(&mut self, lane: usize, command: LaneCommand) {
        let Some(title) = self.lanes.get(lane).map(|view| view.title.clone()) else {
            self.close_dialog();
            return;
        };
        match command {
            LaneCommand::Sort => self.open_sort(lane),
            LaneCommand::Color => {
                let color = self.lanes[lane].color.clone();
                self.open_dialog(Dialog::color_picker(lane, &color));
            }
            LaneCommand::Rename => self.open_dialog(Dialog::Name(NameInput::new(
                NamePurpose::RenameLane { lane },
                " Rename Lane ",
                "",
                &title,
            ))),
            LaneCommand::AddLeft | LaneCommand::AddRight => {
                let left_of = command == LaneCommand::AddLeft;
                let side = if left_of { "left" } else { "right" };
                self.open_dialog(Dialog::Name(NameInput::new(
                    NamePurpose::InsertLane {
                        left_of,
                        reference: lane,
                    },
                    " Add Lane ",
                    format!("New lane will be created {side} of lane '{title}'."),
                    "",
                )));
            }
            LaneCommand::Remove => self.open_remove_lane(lane),
            LaneCommand::Cancel => self.close_dialog(),
        }
    }

    pub fn set_lane_sort(&mut self, lane: usize, mode: SortMode) {
        self.update_lane(lane, |board| lane_ops::set_lane_sort(board, lane, mode));
    }

    pub fn set_lane_color(&mut self, lane: usize, color: &str) {
        self.update_lane(lane, |board| lane_ops::set_lane_color(board, lane, color));
    }

    /// Blank names are ignored
    pub fn rename_lane(&mut self, lane: usize, title: &str) {
        let title = title.trim();
        if !title.is_empty() {
            self.update_lane(lane, |board| lane_ops::set_lane_title(board, lane, title));
        }
    }

    fn update_lane(&mut self, lane: usize, f: impl FnOnce(&mut Board) -> bool) {
        if self.commit(f).is_some_and(|changed| !changed) {
            return;
        }
        let cursor = self.lanes.get(lane).map_or(0, |view| view.cursor);
        self.redraw_lane(lane, cursor);
    }

    /// Add an empty lane next to `reference` and focus it. Blank names are ignored.
    pub fn insert_lane(&mut self, left_of: bool, reference: usize, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        let Some(index) = self.commit(|board| lane_ops::insert_lane(board, left_of, title, reference)) else {
            self.redraw_all();
            return;
        };
        info!(%title, index, "lane added");
        self.lanes.insert(index.min(self.lanes.len()), LaneView::default());
        self.active = index;
        self.redraw_all();
    }

    fn open_remove_lane(&mut self, lane: usize) {
        if self.lanes.len() < 2 {
            self.show_error("A board needs at least one lane.", None);
            return;
        }
        let title = self.lanes[lane].title.clone();
        let count = self.lanes[lane].rows.len();
        let mut options: Vec<(String, RemoveChoice)> = self
            .lanes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != lane)
            .map(|(i, view)| (view.title.clone(), RemoveChoice::MergeInto(i)))
            .collect();
        options.push(("Archive".to_string(), RemoveChoice::ArchiveAll));
        options.push(("Cancel".to_string(), RemoveChoice::Cancel));
        let cancel = options.len() - 1;

        let (plural, pronoun) = if count == 1 { ("", "it") } else { ("s", "them") };
        let text = format!(
            "CAUTION: About to delete lane '{title}'.\n\nSelect a target lane, where the {count} task{plural} of the current lane will be moved to, or select 'Archive' to remove {pronoun}."
        );
        self.open_dialog(Dialog::RemoveLane {
            lane,
            picker: Picker::new(" Remove Lane ", text, options).with_selected(cancel),
        });
    }

    /// Merge the lane into another one or archive its tasks, then drop it.
    /// Either way the board is saved under the same lock. A failed bulk
    /// archive is fatal.
    pub fn remove_lane(&mut self, lane: usize, choice: RemoveChoice) {
        let focus = match choice {
            RemoveChoice::Cancel => return,
            RemoveChoice::MergeInto(into) => {
                let Some(moved) = self.commit(|board| lane_ops::merge_lane(board, lane, into)).flatten() else {
                    self.redraw_all();
                    return;
                };
                info!(lane, into, moved, "lane merged");
                if into > lane { into - 1 } else { into }
            }
            RemoveChoice::ArchiveAll => match self.store.archive_lane(lane) {
                Ok(archived) => {
                    info!(lane, archived, "lane archived and removed");
                    lane
                }
                Err(e) => {
                    error!(error = %e, lane, "bulk archive failed");
                    self.fatal = Some(format!("could not archive the lane: {e}"));
                    return;
                }
            },
        };
        if lane < self.lanes.len() {
            self.lanes.remove(lane);
        }
        self.active = focus;
        self.redraw_all();
    }

    // -----------------------------------------------------------------------
    // Modes
    // -----------------------------------------------------------------------

    pub fn open_mode_picker(&mut self) {
        let modes = list_modes(&self.root);
        let selected = modes.iter().position(|m| m == self.mode()).unwrap_or(0);
        let mut options: Vec<(String, ModeChoice)> = modes
            .into_iter()
            .map(|m| (m.clone(), ModeChoice::Open(m)))
            .collect();
        options.push(("New mode\u{2026}".to_string(), ModeChoice::New));
        options.push(("Cancel".to_string(), ModeChoice::Cancel));
        self.open_dialog(Dialog::Mode(
            Picker::new(
                " Mode Selection ",
                "Modes allow separation of ToDo lists into categories. Select an existing mode from the list:",
                options,
            )
            .with_selected(selected),
        ));
    }

    pub fn open_new_mode(&mut self) {
        self.open_dialog(Dialog::Name(NameInput::new(
            NamePurpose::NewMode,
            " Add Mode ",
            "Name of the new mode:",
            "",
        )));
    }

    /// Close this board and reopen on `mode`
    pub fn switch_mode(&mut self, mode: &str) {
        if mode.trim().is_empty() {
            return;
        }
        let mode = mode_file_name(mode);
        if mode == self.mode() {
            return;
        }
        info!(from = %self.mode(), to = %mode, "switching mode");
        self.next_mode = Some(mode);
        self.quit();
    }

    // -----------------------------------------------------------------------
    // Watcher
    // -----------------------------------------------------------------------

    pub fn handle_watch_event(&mut self, event: WatchEvent, now: Instant) {
        match event {
            WatchEvent::Suspend => {
                if self.suspended_since.is_none() {
                    debug!("board file gone, pausing");
                    self.suspended_since = Some(now);
                }
            }
            WatchEvent::Reloaded => {
                self.suspended_since = None;
                self.redraw_all();
                self.needs_clear = true;
                self.status_message = Some("Board reloaded after an external change".to_string());
            }
            WatchEvent::ReloadFailed(message) => {
                self.fatal = Some(format!("could not reload the board: {message}"));
            }
        }
    }

    /// Resume drawing when the board file stayed away too long
    pub fn check_suspend(&mut self, now: Instant) {
        if let Some(since) = self.suspended_since
            && now.duration_since(since) >= SUSPEND_TIMEOUT
        {
            warn!("board file still missing, resuming");
            self.suspended_since = None;
            self.status_message =
                Some("Board file is missing; it will be written again on the next change".to_string());
        }
    }
}

fn stamp_info(task: &Task, style: DateStyle) -> String {
    let mut info = format!(
        "created by {} {}",
        task.user_name,
        style.timestamp_to_local(&task.created)
    );
    if task.last_update != task.created {
        info.push_str(&format!(
            ", updated by {} {}",
            task.updated_by_name,
            style.timestamp_to_local(&task.last_update)
        ));
    }
    info
}

fn open_board(root: &Path, mode: &str) -> Result<Arc<ContentStore>, StoreError> {
    Ok(Arc::new(ContentStore::open(BoardPaths::for_mode(root, mode))?))
}

/// Run the TUI on `mode` (or the last used one) under `root`
pub fn run(root: &Path, mode: Option<&str>, config: &AppConfig) -> Result<(), AppError> {
    let mut settings = read_settings(root).unwrap_or_default();
    let mode = mode.map(mode_file_name).unwrap_or_else(|| settings.mode.clone());

    // a board that cannot be opened is reported before the terminal is taken over
    let store = open_board(root, &mode)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_boards(&mut terminal, root, config, &mut settings, store);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// One iteration per mode: the UI is rebuilt whenever the user switches boards
fn run_boards(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    root: &Path,
    config: &AppConfig,
    settings: &mut Settings,
    mut store: Arc<ContentStore>,
) -> Result<(), AppError> {
    let editor = ExternalEditor::from_env(config.ui.editor.as_deref());
    loop {
        let mode = store.paths().mode.clone();
        let watcher = BoardWatcher::start(Arc::clone(&store))?;
        let mut app = App::new(Arc::clone(&store), root.to_path_buf(), config);
        app.focus_lane(settings.focus.get(&mode).copied().unwrap_or(0));

        run_event_loop(terminal, &mut app, &watcher, &editor)?;

        settings.focus.insert(mode.clone(), app.active);
        settings.mode = app.next_mode.clone().unwrap_or(mode);
        write_settings(root, settings)?;

        let Some(next) = app.next_mode.take() else {
            return Ok(());
        };
        drop(watcher);
        store = open_board(root, &next)?;
        terminal.clear()?;
    }
}

fn take_fatal(app: &mut App) -> Result<(), AppError> {
    match app.fatal.take() {
        Some(message) => Err(AppError::Fatal(message)),
        None => Ok(()),
    }
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    watcher: &BoardWatcher,
    editor: &dyn NoteEditor,
) -> Result<(), AppError> {
    loop {
        let now = Instant::now();
        for event in watcher.poll() {
            app.handle_watch_event(event, now);
        }
        take_fatal(app)?;

        if app.suspended_since.is_some() {
            app.check_suspend(now);
            if app.suspended_since.is_some() {
                std::thread::sleep(SUSPEND_TICK);
                continue;
            }
        }

        if app.needs_clear {
            terminal.clear()?;
            app.needs_clear = false;
        }
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if app.pending_note.is_some() {
            with_terminal_suspended(terminal, || app.edit_note_with(editor))?;
        }

        take_fatal(app)?;
        if app.should_quit {
            return Ok(());
        }
    }
}

/// Hand the terminal to a child process (the note editor) for the duration of `f`
fn with_terminal_suspended(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    f: impl FnOnce(),
) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    f();

    execute!(io::stdout(), EnterAlternateScreen)?;
    enable_raw_mode()?;
    terminal.clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::editor::EditorError;
    use crate::io::store::load;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn fields(title: &str) -> TaskFields {
        TaskFields {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Board with lanes To Do: [a, b, c], Doing: [d], Done: []
    fn setup() -> (TempDir, App) {
        let tmp = TempDir::new().unwrap();
        let store = open_board(tmp.path(), "main").unwrap();
        for (i, title) in ["a", "b", "c"].into_iter().enumerate() {
            store.add_task(0, i, fields(title));
        }
        store.add_task(1, 0, fields("d"));
        let app = App::new(store, tmp.path().to_path_buf(), &AppConfig::default());
        (tmp, app)
    }

    fn titles(app: &App, lane: usize) -> Vec<String> {
        app.lanes[lane].rows.iter().map(|r| r.title.clone()).collect()
    }

    fn disk_titles(app: &App, lane: usize) -> Vec<String> {
        let board = load(&app.store.paths().file).unwrap();
        board.tasks(lane).iter().map(|t| t.title.clone()).collect()
    }

    struct FakeEditor(Result<Option<String>, ()>);

    impl NoteEditor for FakeEditor {
        fn edit(&self, _text: &str) -> Result<Option<String>, EditorError> {
            self.0.clone().map_err(|()| EditorError::NoCommand)
        }
    }

    #[test]
    fn test_lane_header_and_rows() {
        let (_tmp, app) = setup();
        assert_eq!(app.lanes.len(), 3);
        assert_eq!(app.lanes[0].header(), " To Do (3) ");
        assert_eq!(titles(&app, 0), vec!["a", "b", "c"]);
        assert_eq!(app.lanes[2].header(), " Done (0) ");
    }

    #[test]
    fn test_secondary_carries_priority_glyph() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let task = Task {
            secondary: "details".into(),
            priority: 1,
            due: "2025-06-10".into(),
            title: "t".into(),
            ..Default::default()
        };
        let row = LaneRow::new(&task, today);
        assert_eq!(row.secondary, "details \u{2191}");
        assert_eq!(row.display_title(), "t [due!]");
        let plain = LaneRow::new(&Task { priority: 2, ..task }, today);
        assert_eq!(plain.secondary, "details");
    }

    #[test]
    fn test_focus_wraps() {
        let (_tmp, mut app) = setup();
        app.focus_prev();
        assert_eq!(app.active, 2);
        app.focus_next();
        app.focus_next();
        assert_eq!(app.active, 1);
    }

    #[test]
    fn test_select_on_empty_lane_is_noop() {
        let (_tmp, mut app) = setup();
        app.focus_lane(2);
        app.toggle_select();
        assert!(!app.in_select);
        app.move_right();
        assert_eq!(app.active, 2);
    }

    #[test]
    fn test_move_down_wraps_and_cursor_follows() {
        let (_tmp, mut app) = setup();
        app.toggle_select();
        app.move_down();
        assert_eq!(titles(&app, 0), vec!["b", "a", "c"]);
        assert_eq!(app.cursor(), 1);
        app.move_up();
        app.move_up();
        assert_eq!(titles(&app, 0), vec!["b", "c", "a"]);
        assert_eq!(app.cursor(), 2);
        assert_eq!(disk_titles(&app, 0), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_move_right_follows_task_into_next_lane() {
        let (_tmp, mut app) = setup();
        app.cursor_down();
        app.toggle_select();
        app.move_right();
        assert_eq!(app.active, 1);
        assert_eq!(titles(&app, 0), vec!["a", "c"]);
        assert_eq!(titles(&app, 1), vec!["b", "d"]);
        assert_eq!(app.current_row().unwrap().title, "b");
        assert!(app.in_select);
        assert_eq!(app.store.read(|b| b.total_tasks()), 4);

        app.move_left();
        app.move_left();
        assert_eq!(app.active, 2);
        assert_eq!(titles(&app, 2), vec!["b"]);

        app.toggle_select();
        assert!(!app.in_select);
        assert_eq!(disk_titles(&app, 2), vec!["b"]);
    }

    #[test]
    fn test_focus_change_ends_move_mode() {
        let (_tmp, mut app) = setup();
        app.toggle_select();
        app.focus_next();
        assert!(!app.in_select);
        assert_eq!(app.active, 1);
    }

    #[test]
    fn test_sorted_lane_keeps_cursor_on_task() {
        let (_tmp, mut app) = setup();
        app.cursor_end();
        app.store.edit_task(0, 2, TaskFields {
            title: "c".into(),
            priority: 1,
            ..Default::default()
        });
        app.set_lane_sort(0, SortMode::ByPriority);
        assert_eq!(titles(&app, 0), vec!["c", "a", "b"]);
        assert_eq!(app.current_row().unwrap().title, "c");
        assert_eq!(app.lanes[0].sort, SortMode::ByPriority);
    }

    #[test]
    fn test_dialog_round_trip_reanchors_focus() {
        let (_tmp, mut app) = setup();
        app.cursor_down();
        app.open_about();
        // another task lands above the focused one while the dialog is open
        app.store.add_task(0, 0, fields("new"));
        app.redraw_all();
        app.focus_lane(2);
        app.close_dialog();
        assert_eq!(app.active, 0);
        assert_eq!(app.current_row().unwrap().title, "b");
    }

    #[test]
    fn test_add_focuses_new_task() {
        let (_tmp, mut app) = setup();
        app.cursor_down();
        app.add_task(0, app.cursor(), fields("new"));
        assert_eq!(titles(&app, 0), vec!["a", "new", "b", "c"]);
        assert_eq!(app.current_row().unwrap().title, "new");
        assert_eq!(disk_titles(&app, 0).len(), 4);
    }

    #[test]
    fn test_edit_and_delete_by_id() {
        let (_tmp, mut app) = setup();
        let id = app.lanes[0].rows[1].id.clone();
        app.edit_task(0, &id, fields("B"));
        assert_eq!(titles(&app, 0), vec!["a", "B", "c"]);
        app.delete_task(0, &id);
        assert_eq!(titles(&app, 0), vec!["a", "c"]);
        app.edit_task(0, &id, fields("gone"));
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_archive_failure_shows_error_and_keeps_task() {
        let (_tmp, mut app) = setup();
        let archive_dir = app.store.paths().archive_dir.clone();
        fs::remove_dir_all(&archive_dir).unwrap();
        fs::write(&archive_dir, "").unwrap();

        let id = app.lanes[0].rows[0].id.clone();
        app.archive_task(0, &id);
        assert!(matches!(app.dialog, Some(Dialog::Error { .. })));
        assert_eq!(titles(&app, 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_archive_removes_task() {
        let (_tmp, mut app) = setup();
        let id = app.lanes[0].rows[2].id.clone();
        app.focus_lane(0);
        app.cursor_end();
        app.archive_task(0, &id);
        assert_eq!(titles(&app, 0), vec!["a", "b"]);
        assert_eq!(app.cursor(), 0);
        assert_eq!(fs::read_dir(&app.store.paths().archive_dir).unwrap().count(), 1);
    }

    #[test]
    fn test_note_edit() {
        let (_tmp, mut app) = setup();
        app.request_note();
        app.edit_note_with(&FakeEditor(Ok(Some("remember".into()))));
        assert_eq!(app.store.read(|b| b.tasks(0)[0].note.clone()), "remember");
        assert!(app.pending_note.is_none());

        app.request_note();
        app.edit_note_with(&FakeEditor(Ok(None)));
        assert_eq!(app.store.read(|b| b.tasks(0)[0].note.clone()), "remember");

        app.request_note();
        app.edit_note_with(&FakeEditor(Err(())));
        assert!(matches!(app.dialog, Some(Dialog::Error { .. })));
    }

    #[test]
    fn test_insert_lane_right_focuses_it() {
        let (_tmp, mut app) = setup();
        app.insert_lane(false, 0, "Review");
        assert_eq!(app.lanes.len(), 4);
        assert_eq!(app.active, 1);
        assert_eq!(app.lanes[1].title, "Review");
        assert_eq!(titles(&app, 2), vec!["d"]);
        app.insert_lane(true, 0, "   ");
        assert_eq!(app.lanes.len(), 4);
    }

    #[test]
    fn test_merge_lane_moves_tasks_to_top_of_target() {
        let (_tmp, mut app) = setup();
        app.remove_lane(0, RemoveChoice::MergeInto(1));
        assert_eq!(app.lanes.len(), 2);
        assert_eq!(app.active, 0);
        assert_eq!(app.lanes[0].title, "Doing");
        assert_eq!(titles(&app, 0), vec!["a", "b", "c", "d"]);
        assert!(app.store.read(|b| b.is_consistent()));
    }

    #[test]
    fn test_changes_are_saved_before_the_lock_is_released() {
        let (_tmp, mut app) = setup();
        let on_disk = |app: &App| load(&app.store.paths().file).unwrap();
        let id = app.lanes[0].rows[1].id.clone();

        app.add_task(1, 0, fields("e"));
        assert_eq!(on_disk(&app), app.store.snapshot());
        app.edit_task(0, &id, fields("B"));
        assert_eq!(on_disk(&app), app.store.snapshot());
        app.request_note();
        app.edit_note_with(&FakeEditor(Ok(Some("n".into()))));
        assert_eq!(on_disk(&app), app.store.snapshot());
        app.rename_lane(2, "Shipped");
        app.set_lane_color(2, "green");
        app.set_lane_sort(2, SortMode::ByDue);
        assert_eq!(on_disk(&app), app.store.snapshot());
        app.insert_lane(false, 2, "Later");
        app.remove_lane(0, RemoveChoice::MergeInto(1));
        app.delete_task(0, &id);
        assert_eq!(on_disk(&app), app.store.snapshot());
        assert_eq!(
            app.store.reload().unwrap(),
            crate::io::store::ReloadOutcome::Unchanged
        );
    }

    #[test]
    fn test_archived_task_is_not_restored_by_a_reload() {
        let (_tmp, mut app) = setup();
        let id = app.lanes[0].rows[0].id.clone();
        app.archive_task(0, &id);

        let mut board = load(&app.store.paths().file).unwrap();
        board.titles[1] = "Busy".into();
        fs::write(&app.store.paths().file, serde_json::to_string(&board).unwrap()).unwrap();
        app.store.reload().unwrap();
        app.handle_watch_event(WatchEvent::Reloaded, Instant::now());

        assert_eq!(titles(&app, 0), vec!["b", "c"]);
        assert_eq!(disk_titles(&app, 0), vec!["b", "c"]);
        assert_eq!(app.lanes[1].title, "Busy");
    }

    #[test]
    fn test_board_without_lanes_opens_with_default_lanes() {
        let tmp = TempDir::new().unwrap();
        let paths = crate::io::paths::BoardPaths::for_mode(tmp.path(), "main");
        paths.ensure_dirs().unwrap();
        fs::write(&paths.file, "{}").unwrap();
        let store = open_board(tmp.path(), "main").unwrap();
        let mut app = App::new(store, tmp.path().to_path_buf(), &AppConfig::default());
        assert_eq!(app.lanes.len(), 3);

        app.open_lane_menu();
        assert!(matches!(app.dialog, Some(Dialog::LaneMenu { .. })));
        app.close_dialog();
        app.insert_lane(false, 2, "Review");
        assert_eq!(app.lanes.len(), 4);
    }

    #[test]
    fn test_archive_all_failure_is_fatal() {
        let (_tmp, mut app) = setup();
        let archive_dir = app.store.paths().archive_dir.clone();
        fs::remove_dir_all(&archive_dir).unwrap();
        fs::write(&archive_dir, "").unwrap();
        app.remove_lane(0, RemoveChoice::ArchiveAll);
        assert!(app.fatal.is_some());
        assert_eq!(app.store.lane_count(), 3);
    }

    #[test]
    fn test_last_lane_cannot_be_removed() {
        let (_tmp, mut app) = setup();
        app.remove_lane(2, RemoveChoice::ArchiveAll);
        app.remove_lane(1, RemoveChoice::MergeInto(0));
        assert_eq!(app.lanes.len(), 1);
        app.choose_lane_command(0, LaneCommand::Remove);
        assert!(matches!(app.dialog, Some(Dialog::Error { .. })));
    }

    #[test]
    fn test_reload_event_redraws() {
        let (_tmp, mut app) = setup();
        let now = Instant::now();
        app.handle_watch_event(WatchEvent::Suspend, now);
        assert!(app.suspended_since.is_some());

        let mut board = app.store.snapshot();
        board.titles[0] = "Backlog".into();
        fs::write(&app.store.paths().file, serde_json::to_string(&board).unwrap()).unwrap();
        app.store.reload().unwrap();
        app.handle_watch_event(WatchEvent::Reloaded, now);
        assert!(app.suspended_since.is_none());
        assert!(app.needs_clear);
        assert_eq!(app.lanes[0].title, "Backlog");

        app.handle_watch_event(WatchEvent::ReloadFailed("bad".into()), now);
        assert!(app.fatal.as_deref().unwrap().contains("bad"));
    }

    #[test]
    fn test_suspend_times_out() {
        let (_tmp, mut app) = setup();
        let start = Instant::now();
        app.handle_watch_event(WatchEvent::Suspend, start);
        app.check_suspend(start + Duration::from_secs(1));
        assert!(app.suspended_since.is_some());
        app.check_suspend(start + SUSPEND_TIMEOUT);
        assert!(app.suspended_since.is_none());
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_switch_mode() {
        let (_tmp, mut app) = setup();
        app.switch_mode("main");
        assert!(!app.should_quit);
        app.switch_mode("work/home");
        assert_eq!(app.next_mode.as_deref(), Some("work_home"));
        assert!(app.should_quit);
    }
}
