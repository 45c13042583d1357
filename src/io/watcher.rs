use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, warn};

use crate::io::paths::BOARD_FILE;
use crate::io::store::{ContentStore, ReloadOutcome};

/// Events sent from the watcher thread to the TUI event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The board file went away, most likely the first half of an atomic
    /// rewrite. Drawing pauses until it comes back.
    Suspend,
    /// The store now holds an externally changed board
    Reloaded,
    /// The changed file could not be loaded
    ReloadFailed(String),
}

/// What a raw notify event means for the board file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Suspend,
    Reload,
}

/// Watches a board directory and reloads the store when `todo.json` changes.
///
/// The reload runs on notify's thread but goes through the store's mutex;
/// the outcome is passed to the UI loop, which polls each tick.
pub struct BoardWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<WatchEvent>,
}

impl BoardWatcher {
    pub fn start(store: Arc<ContentStore>) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let dir = store.paths().dir.clone();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(e) => {
                        warn!(error = %e, "watch error");
                        return;
                    }
                };
                let Some(action) = classify(&event) else {
                    return;
                };
                debug!(kind = ?event.kind, ?action, "board file event");
                let message = match action {
                    Action::Suspend => Some(WatchEvent::Suspend),
                    Action::Reload => match store.reload() {
                        Ok(ReloadOutcome::Reloaded) => Some(WatchEvent::Reloaded),
                        Ok(ReloadOutcome::Unchanged) => None,
                        // gone again before we could read it; a remove event follows
                        Err(e) if e.is_not_found() => Some(WatchEvent::Suspend),
                        Err(e) => {
                            error!(error = %e, "reload failed");
                            Some(WatchEvent::ReloadFailed(e.to_string()))
                        }
                    },
                };
                if let Some(message) = message {
                    let _ = tx.send(message);
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(BoardWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking: all events queued since the last poll
    pub fn poll(&self) -> Vec<WatchEvent> {
        self.rx.try_iter().collect()
    }
}

fn is_board_file(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()) == Some(BOARD_FILE)
}

fn classify(event: &Event) -> Option<Action> {
    let first = event.paths.first().map(|p| is_board_file(p)).unwrap_or(false);
    match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let second = event.paths.get(1).map(|p| is_board_file(p)).unwrap_or(false);
            if second {
                Some(Action::Reload)
            } else if first {
                Some(Action::Suspend)
            } else {
                None
            }
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) if first => {
            Some(Action::Suspend)
        }
        EventKind::Create(_) | EventKind::Modify(_) if first => Some(Action::Reload),
        _ => None,
    }
}
