use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::util::fs_name::sanitize_file_name;

/// Name of the board every installation starts with
pub const MAIN_MODE: &str = "main";

pub const BOARD_FILE: &str = "todo.json";

/// Default storage root, `~/.todo`
pub fn default_root() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".todo"))
}

/// Where one board (mode) keeps its files.
///
/// The main mode lives directly in the root; other modes live in
/// `mode/<name>/` with the same layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardPaths {
    pub mode: String,
    pub dir: PathBuf,
    pub file: PathBuf,
    pub archive_dir: PathBuf,
    pub backup_dir: PathBuf,
}

impl BoardPaths {
    pub fn for_mode(root: &Path, mode: &str) -> Self {
        let mode = mode_file_name(mode);
        let dir = if mode == MAIN_MODE {
            root.to_path_buf()
        } else {
            root.join("mode").join(&mode)
        };
        BoardPaths {
            mode,
            file: dir.join(BOARD_FILE),
            archive_dir: dir.join("archive"),
            backup_dir: dir.join("backup"),
            dir,
        }
    }

    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.archive_dir)?;
        fs::create_dir_all(&self.backup_dir)
    }
}

/// Mode names double as directory names
pub fn mode_file_name(mode: &str) -> String {
    let name = sanitize_file_name(mode.trim(), "_");
    if name.is_empty() {
        MAIN_MODE.to_string()
    } else {
        name
    }
}

/// All modes with a board file: `main` first, then the rest by name.
pub fn list_modes(root: &Path) -> Vec<String> {
    let mut modes: Vec<String> = fs::read_dir(root.join("mode"))
        .into_iter()
        .flatten()
        .flatten()
        .filter(|entry| entry.path().join(BOARD_FILE).is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.') && name != MAIN_MODE)
        .collect();
    modes.sort();
    modes.insert(0, MAIN_MODE.to_string());
    modes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_main_mode_uses_root() {
        let paths = BoardPaths::for_mode(Path::new("/data"), "main");
        assert_eq!(paths.dir, PathBuf::from("/data"));
        assert_eq!(paths.file, PathBuf::from("/data/todo.json"));
        assert_eq!(paths.archive_dir, PathBuf::from("/data/archive"));
        assert_eq!(paths.backup_dir, PathBuf::from("/data/backup"));
    }

    #[test]
    fn test_other_modes_are_sanitized_subdirs() {
        let paths = BoardPaths::for_mode(Path::new("/data"), "work/home");
        assert_eq!(paths.mode, "work_home");
        assert_eq!(paths.dir, PathBuf::from("/data/mode/work_home"));
        assert_eq!(BoardPaths::for_mode(Path::new("/data"), "  ").mode, "main");
    }

    #[test]
    fn test_list_modes() {
        let tmp = TempDir::new().unwrap();
        for mode in ["work", "home", "empty", ".hidden"] {
            let dir = tmp.path().join("mode").join(mode);
            fs::create_dir_all(&dir).unwrap();
            if mode != "empty" {
                fs::write(dir.join(BOARD_FILE), "{}").unwrap();
            }
        }
        assert_eq!(list_modes(tmp.path()), vec!["main", "home", "work"]);
    }

    #[test]
    fn test_list_modes_without_mode_dir() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(list_modes(tmp.path()), vec!["main"]);
    }
}
