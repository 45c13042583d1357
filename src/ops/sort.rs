use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{SortMode, Task};

/// Due date assumed for tasks without a parseable one, so they sort last
fn far_future() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 1, 1).unwrap_or(NaiveDate::MAX)
}

/// Reorder `tasks` in place by `mode`. The sort is stable, and `SortMode::None`
/// leaves the manual order untouched.
pub fn sort_tasks(tasks: &mut [Task], mode: SortMode) {
    match mode {
        SortMode::None => {}
        SortMode::ByColor => tasks.sort_by(|a, b| a.color.cmp(&b.color)),
        SortMode::ByDue => tasks.sort_by_key(due_key),
        SortMode::ByCreated => tasks.sort_by_key(created_key),
        SortMode::ByModified => tasks.sort_by_key(modified_key),
        SortMode::ByPriority => tasks.sort_by_key(|t| t.priority),
    }
}

fn due_key(task: &Task) -> NaiveDate {
    task.due_date().unwrap_or_else(far_future)
}

/// Unparseable creation times compare as the earliest possible time
fn created_key(task: &Task) -> Option<DateTime<Utc>> {
    task.created_at()
}

fn modified_key(task: &Task) -> Option<DateTime<Utc>> {
    task.modified_at().or_else(|| task.created_at())
}
