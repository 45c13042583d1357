use crate::model::{Board, SortMode};
use crate::ops::sort::sort_tasks;

/// Insert an empty lane left or right of `reference` and return its index.
/// A reference past the end appends.
pub fn insert_lane(board: &mut Board, left_of: bool, title: &str, reference: usize) -> usize {
    let at = if left_of { reference } else { reference + 1 };
    let at = at.min(board.titles.len());
    board.titles.insert(at, title.to_string());
    board.items.insert(at, Vec::new());
    board.sort_modes.insert(at, SortMode::None);
    board.lane_colors.insert(at, String::new());
    at
}

/// Remove a lane and its tasks, title, sort mode and color together.
/// Callers move or archive the tasks first.
pub fn remove_lane(board: &mut Board, lane: usize) -> bool {
    if lane >= board.titles.len() {
        return false;
    }
    board.titles.remove(lane);
    board.items.remove(lane);
    board.sort_modes.remove(lane);
    board.lane_colors.remove(lane);
    true
}

/// Move every task of `from` to the top of `into`, keeping their order, then
/// remove `from`. Returns the number of tasks moved, or None when the lanes are
/// invalid or equal.
pub fn merge_lane(board: &mut Board, from: usize, into: usize) -> Option<usize> {
    if from == into || from >= board.items.len() || into >= board.items.len() {
        return None;
    }
    let moved = std::mem::take(&mut board.items[from]);
    let count = moved.len();
    board.items[into].splice(0..0, moved);
    remove_lane(board, from);
    Some(count)
}

pub fn set_lane_title(board: &mut Board, lane: usize, title: &str) -> bool {
    match board.titles.get_mut(lane) {
        Some(t) => {
            *t = title.to_string();
            true
        }
        None => false,
    }
}

pub fn set_lane_color(board: &mut Board, lane: usize, color: &str) -> bool {
    match board.lane_colors.get_mut(lane) {
        Some(c) => {
            *c = color.to_string();
            true
        }
        None => false,
    }
}

pub fn set_lane_sort(board: &mut Board, lane: usize, mode: SortMode) -> bool {
    match board.sort_modes.get_mut(lane) {
        Some(m) => {
            *m = mode;
            true
        }
        None => false,
    }
}

/// Apply the lane's stored sort mode to its tasks
pub fn sort_lane(board: &mut Board, lane: usize) {
    let mode = board.lane_sort(lane);
    if let Some(tasks) = board.items.get_mut(lane) {
        sort_tasks(tasks, mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Stamp, TaskFields};
    use crate::ops::task_ops::add_task;
    use pretty_assertions::assert_eq;

    fn board() -> Board {
        let mut board = Board::with_default_lanes();
        let stamp = Stamp::new(chrono::Utc::now(), "hal");
        for (lane, title) in [(0, "a"), (0, "b"), (1, "c"), (2, "d")] {
            let fields = TaskFields {
                title: title.into(),
                ..Default::default()
            };
            add_task(&mut board, lane, usize::MAX, fields, &stamp);
        }
        board
    }

    fn titles(board: &Board, lane: usize) -> Vec<&str> {
        board.tasks(lane).iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_insert_left_and_right() {
        let mut board = board();
        assert_eq!(insert_lane(&mut board, true, "Left", 1), 1);
        assert_eq!(board.titles, vec!["To Do", "Left", "Doing", "Done"]);
        assert_eq!(insert_lane(&mut board, false, "Right", 3), 4);
        assert_eq!(board.titles, vec!["To Do", "Left", "Doing", "Done", "Right"]);
        assert!(board.is_consistent());
        assert!(board.tasks(1).is_empty());
    }

    #[test]
    fn test_insert_into_empty_board() {
        let mut board = Board::default();
        assert_eq!(insert_lane(&mut board, false, "Only", 0), 0);
        assert_eq!(board.titles, vec!["Only"]);
        assert!(board.is_consistent());
    }

    #[test]
    fn test_remove_keeps_arrays_parallel() {
        let mut board = board();
        board.sort_modes[2] = SortMode::ByDue;
        board.lane_colors[2] = "red".into();
        assert!(remove_lane(&mut board, 1));
        assert!(board.is_consistent());
        assert_eq!(board.titles, vec!["To Do", "Done"]);
        assert_eq!(board.sort_modes, vec![SortMode::None, SortMode::ByDue]);
        assert_eq!(board.lane_colors, vec!["", "red"]);
        assert_eq!(titles(&board, 1), vec!["d"]);
        assert!(!remove_lane(&mut board, 7));
        assert!(board.is_consistent());
    }

    #[test]
    fn test_merge_moves_tasks_to_top_in_order() {
        let mut board = board();
        assert_eq!(merge_lane(&mut board, 0, 2), Some(2));
        assert_eq!(board.titles, vec!["Doing", "Done"]);
        assert_eq!(titles(&board, 1), vec!["a", "b", "d"]);
        assert!(board.is_consistent());
        assert_eq!(merge_lane(&mut board, 0, 0), None);
        assert_eq!(merge_lane(&mut board, 0, 5), None);
    }

    #[test]
    fn test_setters_ignore_out_of_range() {
        let mut board = board();
        let before = board.clone();
        assert!(!set_lane_title(&mut board, 3, "x"));
        assert!(!set_lane_color(&mut board, 3, "red"));
        assert!(!set_lane_sort(&mut board, 3, SortMode::ByDue));
        assert_eq!(board, before);

        assert!(set_lane_title(&mut board, 0, "Backlog"));
        assert!(set_lane_color(&mut board, 0, "darkcyan"));
        assert!(set_lane_sort(&mut board, 0, SortMode::ByPriority));
        assert_eq!(board.lane_title(0), "Backlog");
        assert_eq!(board.lane_color(0), "darkcyan");
        assert_eq!(board.lane_sort(0), SortMode::ByPriority);
    }

    #[test]
    fn test_sort_lane_uses_stored_mode() {
        let mut board = board();
        board.items[0][0].priority = 4;
        board.items[0][1].priority = 1;
        sort_lane(&mut board, 0);
        assert_eq!(titles(&board, 0), vec!["a", "b"]);
        set_lane_sort(&mut board, 0, SortMode::ByPriority);
        sort_lane(&mut board, 0);
        assert_eq!(titles(&board, 0), vec!["b", "a"]);
        sort_lane(&mut board, 9);
    }
}
