use crate::model::{Board, Stamp, Task, TaskFields};

/// Insert a new task into `lane` at `index` (clamped to the lane length).
/// Returns the new task's id, or None when the lane does not exist.
pub fn add_task(
    board: &mut Board,
    lane: usize,
    index: usize,
    fields: TaskFields,
    stamp: &Stamp,
) -> Option<String> {
    let tasks = board.items.get_mut(lane)?;
    let task = Task::new(fields, stamp);
    let id = task.id.clone();
    tasks.insert(index.min(tasks.len()), task);
    Some(id)
}

/// Replace the editable fields of a task and stamp the change
pub fn edit_task(
    board: &mut Board,
    lane: usize,
    index: usize,
    fields: TaskFields,
    stamp: &Stamp,
) -> bool {
    match board.task_mut(lane, index) {
        Some(task) => {
            task.apply(fields);
            task.touch(stamp);
            true
        }
        None => false,
    }
}

/// Replace a task's note. An unchanged note is not stamped.
pub fn set_note(board: &mut Board, lane: usize, index: usize, note: &str, stamp: &Stamp) -> bool {
    match board.task_mut(lane, index) {
        Some(task) if task.note != note => {
            task.note = note.to_string();
            task.touch(stamp);
            true
        }
        _ => false,
    }
}

pub fn delete_task(board: &mut Board, lane: usize, index: usize) -> Option<Task> {
    let tasks = board.items.get_mut(lane)?;
    if index < tasks.len() {
        Some(tasks.remove(index))
    } else {
        None
    }
}

/// Relocate a task: remove it at the source and insert the same value at the
/// destination (clamped). Same-lane moves reorder. Returns false when the
/// source or destination lane is invalid, leaving the board untouched.
pub fn move_task(
    board: &mut Board,
    from_lane: usize,
    from_index: usize,
    to_lane: usize,
    to_index: usize,
) -> bool {
    if to_lane >= board.items.len() || board.task(from_lane, from_index).is_none() {
        return false;
    }
    let task = board.items[from_lane].remove(from_index);
    let dest = &mut board.items[to_lane];
    dest.insert(to_index.min(dest.len()), task);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn stamp() -> Stamp {
        Stamp::new(Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap(), "frank")
    }

    fn fields(title: &str) -> TaskFields {
        TaskFields {
            title: title.into(),
            ..Default::default()
        }
    }

    fn board_with(lanes: &[&[&str]]) -> Board {
        let mut board = Board::default();
        for (i, titles) in lanes.iter().enumerate() {
            board.titles.push(format!("L{i}"));
            board.items.push(Vec::new());
            board.sort_modes.push(Default::default());
            board.lane_colors.push(String::new());
            for title in titles.iter() {
                add_task(&mut board, i, usize::MAX, fields(title), &stamp());
            }
        }
        board
    }

    fn titles(board: &Board, lane: usize) -> Vec<&str> {
        board.tasks(lane).iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_add_clamps_index() {
        let mut board = board_with(&[&["a", "b"]]);
        add_task(&mut board, 0, 99, fields("end"), &stamp()).unwrap();
        add_task(&mut board, 0, 0, fields("front"), &stamp()).unwrap();
        assert_eq!(titles(&board, 0), vec!["front", "a", "b", "end"]);
        assert!(add_task(&mut board, 5, 0, fields("nowhere"), &stamp()).is_none());
    }

    #[test]
    fn test_edit_stamps_modification() {
        let mut board = board_with(&[&["a"]]);
        let later = Stamp::new(Utc.with_ymd_and_hms(2025, 6, 11, 8, 0, 0).unwrap(), "gina");
        assert!(edit_task(
            &mut board,
            0,
            0,
            TaskFields {
                title: "renamed".into(),
                priority: 1,
                due: "2025-07-01".into(),
                ..Default::default()
            },
            &later
        ));
        let task = board.task(0, 0).unwrap();
        assert_eq!(task.title, "renamed");
        assert_eq!(task.priority, 1);
        assert_eq!(task.due, "2025-07-01");
        assert_eq!(task.last_update, "2025-06-11T08:00:00Z");
        assert_eq!(task.updated_by_name, "gina");
        assert_eq!(task.user_name, "frank");
        assert!(!edit_task(&mut board, 0, 3, fields("x"), &later));
    }

    #[test]
    fn test_set_note_only_stamps_changes() {
        let mut board = board_with(&[&["a"]]);
        let later = Stamp::new(Utc.with_ymd_and_hms(2025, 6, 12, 8, 0, 0).unwrap(), "gina");
        assert!(!set_note(&mut board, 0, 0, "", &later));
        assert_eq!(board.task(0, 0).unwrap().updated_by_name, "frank");
        assert!(set_note(&mut board, 0, 0, "details", &later));
        assert_eq!(board.task(0, 0).unwrap().note, "details");
        assert_eq!(board.task(0, 0).unwrap().updated_by_name, "gina");
    }

    #[test]
    fn test_delete() {
        let mut board = board_with(&[&["a", "b"]]);
        assert_eq!(delete_task(&mut board, 0, 0).unwrap().title, "a");
        assert!(delete_task(&mut board, 0, 5).is_none());
        assert_eq!(titles(&board, 0), vec!["b"]);
    }

    #[test]
    fn test_move_within_lane() {
        let mut board = board_with(&[&["a", "b", "c"]]);
        assert!(move_task(&mut board, 0, 0, 0, 2));
        assert_eq!(titles(&board, 0), vec!["b", "c", "a"]);
        assert!(move_task(&mut board, 0, 2, 0, 0));
        assert_eq!(titles(&board, 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_move_across_lanes_keeps_identity() {
        let mut board = board_with(&[&["a", "b"], &["x"]]);
        let id = board.task(0, 1).unwrap().id.clone();
        assert!(move_task(&mut board, 0, 1, 1, 0));
        assert_eq!(board.task(1, 0).unwrap().id, id);
        assert_eq!(titles(&board, 0), vec!["a"]);
        assert_eq!(titles(&board, 1), vec!["b", "x"]);
    }

    #[test]
    fn test_move_preserves_total_count() {
        let mut board = board_with(&[&["a", "b", "c"], &["d"], &[]]);
        let total = board.total_tasks();
        let moves = [(0, 0, 2, 0), (0, 1, 1, 9), (2, 0, 0, 0), (1, 2, 1, 0), (1, 0, 2, 0)];
        for (fl, fi, tl, ti) in moves {
            move_task(&mut board, fl, fi, tl, ti);
            assert_eq!(board.total_tasks(), total);
        }
    }

    #[test]
    fn test_move_invalid_is_noop() {
        let mut board = board_with(&[&["a"], &[]]);
        let before = board.clone();
        assert!(!move_task(&mut board, 0, 3, 1, 0));
        assert!(!move_task(&mut board, 0, 0, 4, 0));
        assert!(!move_task(&mut board, 1, 0, 0, 0));
        assert_eq!(board, before);
    }
}
