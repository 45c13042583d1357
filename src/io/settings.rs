use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::io::paths::MAIN_MODE;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted between runs (written to settings.json in the storage root)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Mode opened when no mode is given on the command line
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Focused lane per mode
    #[serde(default)]
    pub focus: HashMap<String, usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            mode: default_mode(),
            focus: HashMap::new(),
        }
    }
}

fn default_mode() -> String {
    MAIN_MODE.to_string()
}

/// Read settings.json; a missing or unreadable file yields None
pub fn read_settings(root: &Path) -> Option<Settings> {
    let content = fs::read_to_string(root.join(SETTINGS_FILE)).ok()?;
    let mut settings: Settings = serde_json::from_str(&content).ok()?;
    if settings.mode.trim().is_empty() {
        settings.mode = default_mode();
    }
    Some(settings)
}

pub fn write_settings(root: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let content = serde_json::to_string_pretty(settings)?;
    let path = root.join(SETTINGS_FILE);
    fs::create_dir_all(root)
        .and_then(|()| fs::write(&path, content))
        .map_err(|source| SettingsError::Write { path, source })
}
