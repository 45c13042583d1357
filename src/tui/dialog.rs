use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

use crate::model::{DEFAULT_PRIORITY, SortMode, TaskFields};
use crate::ops::normalize::split_color_prefix;
use crate::util::datefmt::DateStyle;
use crate::util::unicode::{next_grapheme_boundary, prev_grapheme_boundary};

/// Color tokens offered for lanes and tasks; the empty token means "default"
pub const COLOR_CHOICES: [&str; 9] = [
    "",
    "blue",
    "green",
    "red",
    "yellow",
    "white",
    "darkcyan",
    "black",
    "darkmagenta",
];

pub fn color_label(token: &str) -> &str {
    if token.is_empty() { "default" } else { token }
}

/// What a dialog asks the controller to do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    /// Still open
    Pending,
    Cancel,
    Submit,
}

/// Single-line text input with a grapheme-aware cursor (byte offset)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    pub text: String,
    pub cursor: usize,
}

impl TextField {
    pub fn new(text: &str) -> Self {
        TextField {
            text: text.to_string(),
            cursor: text.len(),
        }
    }

    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = prev_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = next_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(self.cursor..next, "");
        }
    }

    /// Editing keys; returns false for keys the field does not handle
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => {
                if let Some(prev) = prev_grapheme_boundary(&self.text, self.cursor) {
                    self.cursor = prev;
                }
            }
            KeyCode::Right => {
                if let Some(next) = next_grapheme_boundary(&self.text, self.cursor) {
                    self.cursor = next;
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.len(),
            _ => return false,
        }
        true
    }
}

/// Vertical list of labelled choices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picker<T> {
    pub title: String,
    pub text: String,
    pub options: Vec<(String, T)>,
    pub selected: usize,
}

impl<T> Picker<T> {
    pub fn new(title: &str, text: impl Into<String>, options: Vec<(String, T)>) -> Self {
        Picker {
            title: title.to_string(),
            text: text.into(),
            options,
            selected: 0,
        }
    }

    pub fn with_selected(mut self, index: usize) -> Self {
        self.selected = index.min(self.options.len().saturating_sub(1));
        self
    }

    pub fn chosen(&self) -> Option<&T> {
        self.options.get(self.selected).map(|(_, value)| value)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DialogOutcome {
        let n = self.options.len();
        match key.code {
            KeyCode::Esc => return DialogOutcome::Cancel,
            KeyCode::Enter | KeyCode::Char(' ') if n > 0 => return DialogOutcome::Submit,
            KeyCode::Up | KeyCode::Left | KeyCode::BackTab | KeyCode::Char('k') if n > 0 => {
                self.selected = (self.selected + n - 1) % n;
            }
            KeyCode::Down | KeyCode::Right | KeyCode::Tab | KeyCode::Char('j') if n > 0 => {
                self.selected = (self.selected + 1) % n;
            }
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = n.saturating_sub(1),
            _ => {}
        }
        DialogOutcome::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    Delete { lane: usize, task_id: String },
    Archive { lane: usize, task_id: String },
    Quit,
}

/// Yes/no question; `yes` is the highlighted button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirm {
    pub action: ConfirmAction,
    pub title: String,
    pub text: String,
    pub yes: bool,
}

impl Confirm {
    pub fn new(action: ConfirmAction) -> Self {
        let (title, text) = match &action {
            ConfirmAction::Delete { .. } => (" Delete Task ", "About to delete selected task. Continue?"),
            ConfirmAction::Archive { .. } => (" Archive Task ", "About to archive selected task. Continue?"),
            ConfirmAction::Quit => (" Exit ", "Do you want to quit the application?"),
        };
        Confirm {
            action,
            title: title.to_string(),
            text: text.to_string(),
            yes: true,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DialogOutcome {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => DialogOutcome::Submit,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => DialogOutcome::Cancel,
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.yes = !self.yes;
                DialogOutcome::Pending
            }
            KeyCode::Enter if self.yes => DialogOutcome::Submit,
            KeyCode::Enter => DialogOutcome::Cancel,
            _ => DialogOutcome::Pending,
        }
    }
}

/// Which task a form writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormTarget {
    Add { lane: usize, index: usize },
    Edit { lane: usize, task_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Secondary,
    Due,
    Priority,
    Color,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Title,
        FormField::Secondary,
        FormField::Due,
        FormField::Priority,
        FormField::Color,
    ];

    fn shift(self, delta: isize) -> FormField {
        let n = Self::ORDER.len() as isize;
        let pos = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ORDER[(pos + delta).rem_euclid(n) as usize]
    }
}

/// Add/edit task form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub target: FormTarget,
    pub title: TextField,
    pub secondary: TextField,
    /// Due date in the active date style
    pub due: TextField,
    pub priority: i32,
    pub color: String,
    pub focus: FormField,
    pub date_style: DateStyle,
    /// Created/updated line shown when editing
    pub info: Option<String>,
    /// A stored due value that is not an ISO date. It is shown as is and
    /// saved back untouched unless the due field is edited.
    pub kept_due: Option<String>,
}

/// Why a task form cannot be submitted yet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Invalid due date, expected {0}")]
    Due(&'static str),
    /// Without a color, a `[token]` title prefix is read back as the color
    #[error("A title starting with [{0}] needs a color. Pick one or reword the title.")]
    ColorPrefix(String),
}

impl TaskForm {
    /// Empty form; details are prefilled with the creation date
    pub fn for_add(lane: usize, index: usize, date_style: DateStyle, today: &str) -> Self {
        TaskForm {
            target: FormTarget::Add { lane, index },
            title: TextField::default(),
            secondary: TextField::new(&format!("created: {today}")),
            due: TextField::default(),
            priority: DEFAULT_PRIORITY,
            color: String::new(),
            focus: FormField::Title,
            date_style,
            info: None,
            kept_due: None,
        }
    }

    pub fn for_edit(
        lane: usize,
        task_id: &str,
        fields: &TaskFields,
        date_style: DateStyle,
        info: Option<String>,
    ) -> Self {
        let local_due = date_style.iso_to_local(&fields.due);
        let kept_due = (local_due.is_empty() && !fields.due.trim().is_empty()).then(|| fields.due.clone());
        TaskForm {
            target: FormTarget::Edit {
                lane,
                task_id: task_id.to_string(),
            },
            title: TextField::new(&fields.title),
            secondary: TextField::new(&fields.secondary),
            due: TextField::new(kept_due.as_deref().unwrap_or(&local_due)),
            priority: fields.priority,
            color: fields.color.clone(),
            focus: FormField::Title,
            date_style,
            info,
            kept_due,
        }
    }

    pub fn heading(&self) -> &'static str {
        match self.target {
            FormTarget::Add { .. } => " Add Task ",
            FormTarget::Edit { .. } => " Edit Task ",
        }
    }

    /// The entered values, with the due date converted to ISO.
    /// Fails when the due field does not parse in the active date style, or
    /// when a title would lose a `[token]` prefix to the color on reload.
    pub fn fields(&self) -> Result<TaskFields, FormError> {
        let due = match &self.kept_due {
            Some(raw) if self.due_is_kept() => raw.clone(),
            _ => self
                .date_style
                .local_to_iso(&self.due.text)
                .map_err(|_| FormError::Due(self.date_style.placeholder()))?,
        };
        if self.color.is_empty()
            && let Some((token, _)) = split_color_prefix(&self.title.text)
        {
            return Err(FormError::ColorPrefix(token));
        }
        let title = if self.title.text.is_empty() {
            "(empty)".to_string()
        } else {
            self.title.text.clone()
        };
        Ok(TaskFields {
            title,
            secondary: self.secondary.text.clone(),
            priority: self.priority,
            due,
            color: self.color.clone(),
        })
    }

    fn due_is_kept(&self) -> bool {
        self.kept_due.as_deref() == Some(self.due.text.as_str())
    }

    fn cycle_priority(&mut self, delta: i32) {
        self.priority = (self.priority - 1 + delta).rem_euclid(4) + 1;
    }

    fn cycle_color(&mut self, delta: isize) {
        let n = COLOR_CHOICES.len() as isize;
        let pos = COLOR_CHOICES
            .iter()
            .position(|c| *c == self.color)
            .map(|p| p as isize)
            .unwrap_or(-1);
        let next = if pos < 0 && delta < 0 { n - 1 } else { (pos + delta).rem_euclid(n) };
        self.color = COLOR_CHOICES[next as usize].to_string();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DialogOutcome {
        match key.code {
            KeyCode::Esc => return DialogOutcome::Cancel,
            KeyCode::Enter => return DialogOutcome::Submit,
            KeyCode::Tab | KeyCode::Down => {
                self.focus = self.focus.shift(1);
                return DialogOutcome::Pending;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = self.focus.shift(-1);
                return DialogOutcome::Pending;
            }
            _ => {}
        }

        match self.focus {
            FormField::Title => {
                self.title.handle_key(key);
            }
            FormField::Secondary => {
                self.secondary.handle_key(key);
            }
            // any edit replaces a kept non-date value
            FormField::Due => match key.code {
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    let typed = if self.due_is_kept() { String::new() } else { self.due.text.clone() };
                    self.due = TextField::new(&self.date_style.format_due_input(&format!("{typed}{c}")));
                }
                KeyCode::Backspace if self.due_is_kept() => self.due = TextField::default(),
                KeyCode::Backspace => {
                    self.due = TextField::new(&self.date_style.remove_last_due_digit(&self.due.text));
                }
                KeyCode::Delete => self.due = TextField::default(),
                _ => {}
            },
            FormField::Priority => match key.code {
                KeyCode::Left | KeyCode::Char('-') => self.cycle_priority(-1),
                KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('+') => self.cycle_priority(1),
                KeyCode::Char(c @ '1'..='4') => self.priority = c as i32 - '0' as i32,
                _ => {}
            },
            FormField::Color => match key.code {
                KeyCode::Left => self.cycle_color(-1),
                KeyCode::Right | KeyCode::Char(' ') => self.cycle_color(1),
                _ => {}
            },
        }
        DialogOutcome::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneCommand {
    Sort,
    Color,
    Rename,
    AddLeft,
    AddRight,
    Remove,
    Cancel,
}

impl LaneCommand {
    pub const ALL: [LaneCommand; 7] = [
        LaneCommand::Sort,
        LaneCommand::Color,
        LaneCommand::Rename,
        LaneCommand::AddLeft,
        LaneCommand::AddRight,
        LaneCommand::Remove,
        LaneCommand::Cancel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LaneCommand::Sort => "Sort Tasks",
            LaneCommand::Color => "Color",
            LaneCommand::Rename => "Rename",
            LaneCommand::AddLeft => "Add to left",
            LaneCommand::AddRight => "Add to right",
            LaneCommand::Remove => "Merge/Remove",
            LaneCommand::Cancel => "Cancel",
        }
    }
}

/// What the name entered in a [`NameInput`] is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePurpose {
    RenameLane { lane: usize },
    InsertLane { left_of: bool, reference: usize },
    NewMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameInput {
    pub purpose: NamePurpose,
    pub title: String,
    pub text: String,
    pub field: TextField,
}

impl NameInput {
    pub fn new(purpose: NamePurpose, title: &str, text: impl Into<String>, initial: &str) -> Self {
        NameInput {
            purpose,
            title: title.to_string(),
            text: text.into(),
            field: TextField::new(initial),
        }
    }

    pub fn value(&self) -> &str {
        self.field.text.trim()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DialogOutcome {
        match key.code {
            KeyCode::Esc => DialogOutcome::Cancel,
            KeyCode::Enter => DialogOutcome::Submit,
            _ => {
                self.field.handle_key(key);
                DialogOutcome::Pending
            }
        }
    }
}

/// Where the tasks of a removed lane go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveChoice {
    MergeInto(usize),
    ArchiveAll,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeChoice {
    Open(String),
    New,
    Cancel,
}

/// The open popup. Only one is shown at a time; the error dialog may carry
/// the dialog to return to once it is dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Confirm(Confirm),
    TaskForm(TaskForm),
    LaneMenu { lane: usize, picker: Picker<LaneCommand> },
    Name(NameInput),
    Color { lane: usize, picker: Picker<String> },
    Sort { lane: usize, picker: Picker<SortMode> },
    RemoveLane { lane: usize, picker: Picker<RemoveChoice> },
    Mode(Picker<ModeChoice>),
    Error { message: String, resume: Option<Box<Dialog>> },
    About,
}

impl Dialog {
    pub fn handle_key(&mut self, key: KeyEvent) -> DialogOutcome {
        match self {
            Dialog::Confirm(confirm) => confirm.handle_key(key),
            Dialog::TaskForm(form) => form.handle_key(key),
            Dialog::LaneMenu { picker, .. } => picker.handle_key(key),
            Dialog::Name(input) => input.handle_key(key),
            Dialog::Color { picker, .. } => picker.handle_key(key),
            Dialog::Sort { picker, .. } => picker.handle_key(key),
            Dialog::RemoveLane { picker, .. } => picker.handle_key(key),
            Dialog::Mode(picker) => picker.handle_key(key),
            Dialog::Error { .. } => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => DialogOutcome::Submit,
                _ => DialogOutcome::Pending,
            },
            Dialog::About => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') | KeyCode::Char('q') => {
                    DialogOutcome::Cancel
                }
                _ => DialogOutcome::Pending,
            },
        }
    }

    pub fn lane_menu(lane: usize) -> Dialog {
        let options = LaneCommand::ALL
            .iter()
            .map(|c| (c.label().to_string(), *c))
            .collect();
        Dialog::LaneMenu {
            lane,
            picker: Picker::new(" Lane Commands ", "", options),
        }
    }

    pub fn color_picker(lane: usize, current: &str) -> Dialog {
        let options: Vec<(String, String)> = COLOR_CHOICES
            .iter()
            .map(|c| (color_label(c).to_string(), c.to_string()))
            .collect();
        let selected = COLOR_CHOICES.iter().position(|c| *c == current).unwrap_or(0);
        Dialog::Color {
            lane,
            picker: Picker::new(" Lane Color ", "", options).with_selected(selected),
        }
    }

    pub fn sort_picker(lane: usize, lane_title: &str, current: SortMode) -> Dialog {
        let options = SortMode::ALL
            .iter()
            .map(|m| (m.label().to_string(), *m))
            .collect();
        let selected = SortMode::ALL.iter().position(|m| *m == current).unwrap_or(0);
        Dialog::Sort {
            lane,
            picker: Picker::new(" Sort Tasks ", format!("Order of lane '{lane_title}':"), options)
                .with_selected(selected),
        }
    }

    pub fn error(message: impl Into<String>, resume: Option<Dialog>) -> Dialog {
        Dialog::Error {
            message: message.into(),
            resume: resume.map(Box::new),
        }
    }
}
