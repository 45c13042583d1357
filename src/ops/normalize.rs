use crate::model::{Board, DEFAULT_LANES, DEFAULT_PRIORITY, PRIORITY_RANGE, SortMode, Stamp, Task, new_task_id};

/// Repair a decoded board in place so the rest of the program can rely on its
/// invariants. Running it again on its own output changes nothing.
///
/// - a board without lanes gets the default lanes
/// - lane arrays are padded or cut to the number of titles (stray task
///   columns get a `Lane N` title instead of being dropped)
/// - tasks get an id, creation/modification stamps and authors
/// - a legacy `[color]Title` prefix moves into the color field
/// - out-of-range priorities reset to the default
pub fn normalize(board: &mut Board, stamp: &Stamp) {
    if board.titles.is_empty() && board.items.is_empty() {
        board.titles = DEFAULT_LANES.iter().map(|t| t.to_string()).collect();
    }
    while board.titles.len() < board.items.len() {
        let n = board.titles.len() + 1;
        board.titles.push(format!("Lane {n}"));
    }
    let lanes = board.titles.len();
    board.items.resize_with(lanes, Vec::new);
    board.sort_modes.resize(lanes, SortMode::None);
    board.lane_colors.resize(lanes, String::new());

    for task in board.items.iter_mut().flatten() {
        normalize_task(task, stamp);
    }
}

pub fn normalize_task(task: &mut Task, stamp: &Stamp) {
    if task.id.is_empty() {
        task.id = new_task_id();
    }

    if task.created.is_empty() {
        task.created = stamp.rfc3339();
    }
    if task.last_update.is_empty() {
        task.last_update = task.created.clone();
    } else if let (Some(created), Some(modified)) = (task.created_at(), task.modified_at()) {
        if modified < created {
            task.last_update = task.created.clone();
        }
    }

    if task.user_name.is_empty() {
        task.user_name = stamp.user.clone();
    }
    if task.updated_by_name.is_empty() {
        task.updated_by_name = task.user_name.clone();
    }

    if task.color.is_empty() {
        if let Some((color, rest)) = split_color_prefix(&task.title) {
            task.color = color;
            task.title = rest.to_string();
        }
    }

    if !PRIORITY_RANGE.contains(&task.priority) {
        task.priority = DEFAULT_PRIORITY;
    }
}

/// `"[Red]Buy milk"` → `("red", "Buy milk")`. An empty token (`"[]x"`) is not a prefix.
pub fn split_color_prefix(title: &str) -> Option<(String, &str)> {
    let inner = title.strip_prefix('[')?;
    let end = inner.find(']')?;
    if end == 0 {
        return None;
    }
    Some((inner[..end].to_lowercase(), &inner[end + 1..]))
}
