use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from config.toml. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Which date layout the due field uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// Derived from the locale environment
    #[default]
    Auto,
    Us,
    European,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub date_format: DateFormat,
    /// Overrides $VISUAL / $EDITOR for note editing
    #[serde(default)]
    pub editor: Option<String>,
    #[serde(default = "default_true")]
    pub show_key_hints: bool,
    /// Theme overrides, `name = "#rrggbb"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            date_format: DateFormat::Auto,
            editor: None,
            show_key_hints: true,
            colors: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. "debug" or "todo_lanes=trace"
    #[serde(default)]
    pub level: Option<String>,
}

fn default_true() -> bool {
    true
}
