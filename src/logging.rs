use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_FILE: &str = "todo.log";

/// Pick the filter directive: `RUST_LOG` first, then the configured level.
/// Oversized or blank values are ignored.
pub fn filter_directive(env_value: Option<&str>, configured: Option<&str>) -> Option<String> {
    [env_value, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|raw| !raw.is_empty() && raw.len() <= 4096)
        .map(str::to_string)
}

/// Install the global subscriber, appending to `todo.log` under `root`.
///
/// Logging is opt-in: with no directive nothing is installed and the file is
/// never created. The terminal belongs to the TUI, so output never goes to
/// stderr.
pub fn init(root: &Path, directive: Option<&str>) -> std::io::Result<bool> {
    let Some(filter) = directive.and_then(|d| EnvFilter::try_new(d).ok()) else {
        return Ok(false);
    };

    std::fs::create_dir_all(root)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(root.join(LOG_FILE))?;

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .try_init()
        .is_ok();
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_beats_config() {
        assert_eq!(
            filter_directive(Some("trace"), Some("info")).as_deref(),
            Some("trace")
        );
        assert_eq!(filter_directive(Some("  "), Some("info")).as_deref(), Some("info"));
        assert_eq!(filter_directive(None, None), None);
        let huge = "x".repeat(5000);
        assert_eq!(filter_directive(Some(&huge), None), None);
    }

    #[test]
    fn test_no_directive_creates_no_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(!init(tmp.path(), None).unwrap());
        assert!(!tmp.path().join(LOG_FILE).exists());
    }
}
