use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::util::user::current_user;

/// Priority assigned to new tasks and to tasks with an out-of-range value
pub const DEFAULT_PRIORITY: i32 = 2;

/// Valid priorities, 1 = high ... 4 = idle
pub const PRIORITY_RANGE: std::ops::RangeInclusive<i32> = 1..=4;

/// A single card on the board.
///
/// Field names follow the persisted document (`Title`, `Guid`, `LastUpdate`, ...),
/// so boards written by older versions load without a migration step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Task {
    pub title: String,
    pub secondary: String,
    pub note: String,
    /// Stable identity, assigned once and never changed
    #[serde(rename = "Guid")]
    pub id: String,
    pub priority: i32,
    pub is_archived: bool,
    /// RFC3339 creation time
    pub created: String,
    /// RFC3339 time of the last edit
    pub last_update: String,
    /// `YYYY-MM-DD`, or empty
    pub due: String,
    /// Color token (`red`, `darkcyan`, `#aabbcc`), or empty
    pub color: String,
    /// Creator
    pub user_name: String,
    /// Last editor
    pub updated_by_name: String,
    /// Legacy per-task field, carried through untouched
    pub mode: String,
}

/// Who made a change, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub at: DateTime<Utc>,
    pub user: String,
}

impl Stamp {
    pub fn new(at: DateTime<Utc>, user: impl Into<String>) -> Self {
        Stamp {
            at,
            user: user.into(),
        }
    }

    /// The current time and the current OS user
    pub fn now() -> Self {
        Stamp::new(Utc::now(), current_user())
    }

    pub fn rfc3339(&self) -> String {
        self.at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Editable fields of a task, as collected by the task form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFields {
    pub title: String,
    pub secondary: String,
    pub priority: i32,
    /// ISO date or empty
    pub due: String,
    pub color: String,
}

impl Default for TaskFields {
    fn default() -> Self {
        TaskFields {
            title: String::new(),
            secondary: String::new(),
            priority: DEFAULT_PRIORITY,
            due: String::new(),
            color: String::new(),
        }
    }
}

impl Task {
    /// Build a fresh task with a new id, stamped as created and modified by `stamp`.
    pub fn new(fields: TaskFields, stamp: &Stamp) -> Self {
        let mut task = Task {
            id: new_task_id(),
            created: stamp.rfc3339(),
            last_update: stamp.rfc3339(),
            user_name: stamp.user.clone(),
            updated_by_name: stamp.user.clone(),
            ..Default::default()
        };
        task.apply(fields);
        task
    }

    /// Overwrite the editable fields. Does not stamp.
    pub fn apply(&mut self, fields: TaskFields) {
        self.title = fields.title;
        self.secondary = fields.secondary;
        self.priority = if PRIORITY_RANGE.contains(&fields.priority) {
            fields.priority
        } else {
            DEFAULT_PRIORITY
        };
        self.due = fields.due;
        self.color = fields.color;
    }

    /// Snapshot of the editable fields
    pub fn fields(&self) -> TaskFields {
        TaskFields {
            title: self.title.clone(),
            secondary: self.secondary.clone(),
            priority: self.priority,
            due: self.due.clone(),
            color: self.color.clone(),
        }
    }

    /// Record a modification
    pub fn touch(&mut self, stamp: &Stamp) {
        self.last_update = stamp.rfc3339();
        self.updated_by_name = stamp.user.clone();
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created)
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.last_update)
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.due, "%Y-%m-%d").ok()
    }

    /// Glyph shown in front of the secondary line
    pub fn priority_mark(&self) -> &'static str {
        priority_mark(self.priority)
    }
}

pub fn priority_mark(priority: i32) -> &'static str {
    match priority {
        1 => "\u{2191}",
        3 => "\u{2193}",
        4 => "\u{231b}",
        _ => "",
    }
}

pub fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn stamp() -> Stamp {
        Stamp::new(Utc.with_ymd_and_hms(2025, 6, 10, 9, 30, 0).unwrap(), "alice")
    }

    #[test]
    fn new_task_is_stamped() {
        let task = Task::new(
            TaskFields {
                title: "Write report".into(),
                ..Default::default()
            },
            &stamp(),
        );
        assert_eq!(task.created, "2025-06-10T09:30:00Z");
        assert_eq!(task.last_update, task.created);
        assert_eq!(task.user_name, "alice");
        assert_eq!(task.updated_by_name, "alice");
        assert_eq!(task.priority, DEFAULT_PRIORITY);
        assert_eq!(task.id.len(), 36);
    }

    #[test]
    fn apply_clamps_priority() {
        let mut task = Task::new(TaskFields::default(), &stamp());
        task.apply(TaskFields {
            priority: 9,
            ..Default::default()
        });
        assert_eq!(task.priority, DEFAULT_PRIORITY);
        task.apply(TaskFields {
            priority: 4,
            ..Default::default()
        });
        assert_eq!(task.priority, 4);
    }

    #[test]
    fn serializes_with_document_field_names() {
        let task = Task {
            title: "t".into(),
            id: "abc".into(),
            priority: 1,
            is_archived: true,
            last_update: "x".into(),
            updated_by_name: "bob".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["Title"], "t");
        assert_eq!(json["Guid"], "abc");
        assert_eq!(json["Priority"], 1);
        assert_eq!(json["IsArchived"], true);
        assert_eq!(json["LastUpdate"], "x");
        assert_eq!(json["UpdatedByName"], "bob");
        assert_eq!(json["Mode"], "");
    }

    #[test]
    fn missing_fields_decode_as_empty() {
        let task: Task = serde_json::from_str(r#"{"Title":"only a title"}"#).unwrap();
        assert_eq!(task.title, "only a title");
        assert_eq!(task.id, "");
        assert_eq!(task.priority, 0);
        assert!(task.due_date().is_none());
    }

    #[test]
    fn priority_marks() {
        assert_eq!(priority_mark(1), "\u{2191}");
        assert_eq!(priority_mark(2), "");
        assert_eq!(priority_mark(3), "\u{2193}");
        assert_eq!(priority_mark(4), "\u{231b}");
        assert_eq!(priority_mark(0), "");
    }

    #[test]
    fn timestamps_parse_with_offsets() {
        let task = Task {
            created: "2025-06-10T11:30:00+02:00".into(),
            last_update: "garbage".into(),
            ..Default::default()
        };
        assert_eq!(task.created_at(), Some(stamp().at));
        assert_eq!(task.modified_at(), None);
    }
}
