use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, NaiveDate};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::io::lock::{BoardLock, LockError};
use crate::io::paths::BoardPaths;
use crate::model::{Board, SortMode, Stamp, Task, TaskFields};
use crate::ops::normalize::normalize;
use crate::ops::{lane_ops, task_ops};
use crate::util::fs_name::sanitize_file_name;

/// Error type for board persistence
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not encode board: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Lock(#[from] LockError),
}

impl StoreError {
    /// The file being read does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Result of [`ContentStore::reload`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The file holds what this store last read or wrote
    Unchanged,
    /// An external change was loaded
    Reloaded,
}

struct StoreState {
    board: Board,
    /// Exact text last read from or written to the board file
    on_disk: Option<String>,
}

/// Owner of the board and its files.
///
/// Every read and mutation takes the same mutex, which is also what the file
/// watcher's reload goes through, so a save never interleaves with a reload.
pub struct ContentStore {
    paths: BoardPaths,
    state: Mutex<StoreState>,
}

/// Read and normalize a board file
pub fn load(path: &Path) -> Result<Board, StoreError> {
    let text = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode(path, &text)
}

fn decode(path: &Path, text: &str) -> Result<Board, StoreError> {
    let mut board: Board = serde_json::from_str(text).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    normalize(&mut board, &Stamp::now());
    Ok(board)
}

/// Write via a temp file in the same directory, then rename over the target.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl ContentStore {
    /// Open the board for `paths`, creating directories and a default board on
    /// first use. The (normalized) board is written back immediately.
    pub fn open(paths: BoardPaths) -> Result<Self, StoreError> {
        paths.ensure_dirs().map_err(|source| StoreError::Write {
            path: paths.dir.clone(),
            source,
        })?;

        let (board, on_disk) = match fs::read_to_string(&paths.file) {
            Ok(text) => (decode(&paths.file, &text)?, Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %paths.file.display(), "no board yet, starting with default lanes");
                (Board::with_default_lanes(), None)
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: paths.file.clone(),
                    source,
                });
            }
        };

        let store = ContentStore {
            paths,
            state: Mutex::new(StoreState { board, on_disk }),
        };
        store.save()?;
        info!(mode = %store.paths.mode, "board opened");
        Ok(store)
    }

    pub fn paths(&self) -> &BoardPaths {
        &self.paths
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the board under the lock
    pub fn read<R>(&self, f: impl FnOnce(&Board) -> R) -> R {
        f(&self.lock().board)
    }

    pub fn snapshot(&self) -> Board {
        self.lock().board.clone()
    }

    pub fn lane_count(&self) -> usize {
        self.read(Board::lane_count)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn save(&self) -> Result<(), StoreError> {
        self.save_at(Local::now())
    }

    /// Save, writing `backup/<day>.json` first when that day has no backup yet.
    pub fn save_at(&self, now: DateTime<Local>) -> Result<(), StoreError> {
        let mut state = self.lock();
        self.write_locked(&mut state, now)
    }

    /// Mutate the board and save it without releasing the lock in between.
    pub fn commit<R>(&self, f: impl FnOnce(&mut Board) -> R) -> Result<R, StoreError> {
        let mut state = self.lock();
        let result = f(&mut state.board);
        self.write_locked(&mut state, Local::now())?;
        Ok(result)
    }

    fn write_locked(&self, state: &mut StoreState, now: DateTime<Local>) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(&state.board)?;
        let _dir_lock = BoardLock::acquire_default(&self.paths.dir)?;

        let backup = self.backup_path(now.date_naive());
        if !backup.exists() {
            fs::write(&backup, &text).map_err(|source| StoreError::Write {
                path: backup.clone(),
                source,
            })?;
            info!(path = %backup.display(), "wrote daily backup");
        }

        atomic_write(&self.paths.file, text.as_bytes()).map_err(|source| StoreError::Write {
            path: self.paths.file.clone(),
            source,
        })?;
        state.on_disk = Some(text);
        debug!(path = %self.paths.file.display(), "board saved");
        Ok(())
    }

    pub fn backup_path(&self, day: NaiveDate) -> PathBuf {
        self.paths
            .backup_dir
            .join(format!("{}.json", day.format("%Y-%m-%d")))
    }

    /// Re-read the board file after an external change.
    pub fn reload(&self) -> Result<ReloadOutcome, StoreError> {
        let mut state = self.lock();
        let text = fs::read_to_string(&self.paths.file).map_err(|source| StoreError::Read {
            path: self.paths.file.clone(),
            source,
        })?;
        if state.on_disk.as_deref() == Some(text.as_str()) {
            return Ok(ReloadOutcome::Unchanged);
        }
        state.board = decode(&self.paths.file, &text)?;
        state.on_disk = Some(text);
        info!(path = %self.paths.file.display(), "board reloaded after external change");
        Ok(ReloadOutcome::Reloaded)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub fn add_task(&self, lane: usize, index: usize, fields: TaskFields) -> Option<String> {
        task_ops::add_task(&mut self.lock().board, lane, index, fields, &Stamp::now())
    }

    pub fn edit_task(&self, lane: usize, index: usize, fields: TaskFields) -> bool {
        task_ops::edit_task(&mut self.lock().board, lane, index, fields, &Stamp::now())
    }

    pub fn archive_task(&self, lane: usize, index: usize) -> Result<bool, StoreError> {
        self.archive_task_at(lane, index, &Stamp::now())
    }

    /// Write an archived copy of the task, remove it from the lane and save
    /// the board, all under one lock. Returns false when there is no such
    /// task. When the archive copy cannot be written the lane is left as it was.
    pub fn archive_task_at(&self, lane: usize, index: usize, stamp: &Stamp) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let Some(task) = state.board.task(lane, index) else {
            return Ok(false);
        };
        let title = state.board.lane_title(lane).to_string();
        self.write_archive(&title, task, stamp)?;
        state.board.items[lane].remove(index);
        // saved under the same lock as the removal
        self.write_locked(&mut state, Local::now())?;
        Ok(true)
    }

    pub fn archive_lane(&self, lane: usize) -> Result<usize, StoreError> {
        self.archive_lane_at(lane, &Stamp::now())
    }

    /// Archive every task of a lane, remove the lane and save the board. All
    /// archive files are written before anything is removed; if one write
    /// fails, the board is unchanged and the error is returned.
    pub fn archive_lane_at(&self, lane: usize, stamp: &Stamp) -> Result<usize, StoreError> {
        let mut state = self.lock();
        if lane >= state.board.lane_count() {
            return Ok(0);
        }
        let title = state.board.lane_title(lane).to_string();
        for task in state.board.tasks(lane) {
            self.write_archive(&title, task, stamp)?;
        }
        let count = state.board.lane_len(lane);
        lane_ops::remove_lane(&mut state.board, lane);
        self.write_locked(&mut state, Local::now())?;
        info!(lane = %title, count, "archived lane");
        Ok(count)
    }

    fn write_archive(&self, lane_title: &str, task: &Task, stamp: &Stamp) -> Result<PathBuf, StoreError> {
        let mut archived = task.clone();
        archived.is_archived = true;
        archived.touch(stamp);
        let text = serde_json::to_string_pretty(&archived)?;

        let local = stamp.at.with_timezone(&Local);
        let base = format!(
            "{}.{}",
            local.format("%Y-%m-%d %H_%M_%S%.3f"),
            sanitize_file_name(lane_title, "_")
        );
        let mut path = self.paths.archive_dir.join(format!("{base}.json"));
        let mut n = 1;
        while path.exists() {
            path = self.paths.archive_dir.join(format!("{base}-{n}.json"));
            n += 1;
        }

        fs::write(&path, text).map_err(|source| {
            warn!(path = %path.display(), error = %source, "archive write failed");
            StoreError::Write {
                path: path.clone(),
                source,
            }
        })?;
        debug!(path = %path.display(), "task archived");
        Ok(path)
    }

    // -----------------------------------------------------------------------
    // Lanes
    // -----------------------------------------------------------------------

    pub fn insert_lane(&self, left_of: bool, title: &str, reference: usize) -> usize {
        lane_ops::insert_lane(&mut self.lock().board, left_of, title, reference)
    }

    pub fn remove_lane(&self, lane: usize) -> bool {
        lane_ops::remove_lane(&mut self.lock().board, lane)
    }

    pub fn merge_lane(&self, from: usize, into: usize) -> Option<usize> {
        lane_ops::merge_lane(&mut self.lock().board, from, into)
    }

    pub fn set_lane_title(&self, lane: usize, title: &str) -> bool {
        lane_ops::set_lane_title(&mut self.lock().board, lane, title)
    }

    pub fn set_lane_color(&self, lane: usize, color: &str) -> bool {
        lane_ops::set_lane_color(&mut self.lock().board, lane, color)
    }

    pub fn set_lane_sort(&self, lane: usize, mode: SortMode) -> bool {
        lane_ops::set_lane_sort(&mut self.lock().board, lane, mode)
    }

    pub fn sort_lane(&self, lane: usize) {
        lane_ops::sort_lane(&mut self.lock().board, lane)
    }

    /// Sort the lane by its stored mode and run `f` on the result, under one lock.
    pub fn sorted_lane<R>(&self, lane: usize, f: impl FnOnce(&Board) -> R) -> R {
        let mut state = self.lock();
        lane_ops::sort_lane(&mut state.board, lane);
        f(&state.board)
    }
}
