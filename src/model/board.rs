use serde::{Deserialize, Deserializer, Serialize};

use crate::model::task::Task;

/// Lanes a new board starts with
pub const DEFAULT_LANES: [&str; 3] = ["To Do", "Doing", "Done"];

/// Per-lane ordering policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortMode {
    /// Manual order, kept exactly as stored
    #[default]
    None,
    ByColor,
    ByDue,
    ByCreated,
    ByModified,
    ByPriority,
}

impl SortMode {
    pub const ALL: [SortMode; 6] = [
        SortMode::None,
        SortMode::ByColor,
        SortMode::ByDue,
        SortMode::ByCreated,
        SortMode::ByModified,
        SortMode::ByPriority,
    ];

    /// Token stored in `SortModes`
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::None => "",
            SortMode::ByColor => "color",
            SortMode::ByDue => "due",
            SortMode::ByCreated => "created",
            SortMode::ByModified => "modified",
            SortMode::ByPriority => "priority",
        }
    }

    /// Unknown tokens fall back to manual order
    pub fn parse(s: &str) -> SortMode {
        SortMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .unwrap_or_default()
    }

    /// Label shown in the sort picker
    pub fn label(self) -> &'static str {
        match self {
            SortMode::None => "manual",
            other => other.as_str(),
        }
    }
}

impl From<String> for SortMode {
    fn from(s: String) -> Self {
        SortMode::parse(&s)
    }
}

impl From<SortMode> for String {
    fn from(mode: SortMode) -> Self {
        mode.as_str().to_string()
    }
}

/// The whole board as persisted in `todo.json`.
///
/// Lanes are stored column-wise: `titles`, `items`, `sort_modes` and
/// `lane_colors` are positionally parallel and always mutated together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Board {
    #[serde(default, deserialize_with = "null_as_default")]
    pub titles: Vec<String>,
    #[serde(default, deserialize_with = "lanes_of_tasks")]
    pub items: Vec<Vec<Task>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort_modes: Vec<SortMode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lane_colors: Vec<String>,
}

impl Board {
    /// A board with the three default lanes and no tasks
    pub fn with_default_lanes() -> Self {
        let mut board = Board::default();
        for title in DEFAULT_LANES {
            board.titles.push(title.to_string());
            board.items.push(Vec::new());
            board.sort_modes.push(SortMode::None);
            board.lane_colors.push(String::new());
        }
        board
    }

    pub fn lane_count(&self) -> usize {
        self.titles.len()
    }

    /// True when all four lane arrays have the same length
    pub fn is_consistent(&self) -> bool {
        let n = self.titles.len();
        self.items.len() == n && self.sort_modes.len() == n && self.lane_colors.len() == n
    }

    /// Tasks of a lane; empty for an unknown lane
    pub fn tasks(&self, lane: usize) -> &[Task] {
        self.items.get(lane).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn task(&self, lane: usize, index: usize) -> Option<&Task> {
        self.items.get(lane)?.get(index)
    }

    pub fn task_mut(&mut self, lane: usize, index: usize) -> Option<&mut Task> {
        self.items.get_mut(lane)?.get_mut(index)
    }

    pub fn lane_len(&self, lane: usize) -> usize {
        self.tasks(lane).len()
    }

    pub fn lane_title(&self, lane: usize) -> &str {
        self.titles.get(lane).map(String::as_str).unwrap_or("")
    }

    pub fn lane_color(&self, lane: usize) -> &str {
        self.lane_colors.get(lane).map(String::as_str).unwrap_or("")
    }

    pub fn lane_sort(&self, lane: usize) -> SortMode {
        self.sort_modes.get(lane).copied().unwrap_or_default()
    }

    /// Position of a task within a lane, by id
    pub fn position_in_lane(&self, lane: usize, id: &str) -> Option<usize> {
        self.tasks(lane).iter().position(|t| t.id == id)
    }

    /// Lane and index of a task anywhere on the board
    pub fn find_task(&self, id: &str) -> Option<(usize, usize)> {
        self.items
            .iter()
            .enumerate()
            .find_map(|(lane, tasks)| tasks.iter().position(|t| t.id == id).map(|i| (lane, i)))
    }

    pub fn total_tasks(&self) -> usize {
        self.items.iter().map(Vec::len).sum()
    }
}

/// Older writers emit `null` for empty arrays
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lanes_of_tasks<'de, D>(deserializer: D) -> Result<Vec<Vec<Task>>, D::Error>
where
    D: Deserializer<'de>,
{
    let lanes: Option<Vec<Option<Vec<Task>>>> = Option::deserialize(deserializer)?;
    Ok(lanes
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}
