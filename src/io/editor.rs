use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::Command;

use tracing::{info, warn};

const FALLBACK_EDITOR: &str = if cfg!(windows) { "notepad" } else { "vi" };

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("no editor configured (set $VISUAL or $EDITOR)")]
    NoCommand,
    #[error("cannot parse editor command: {0}")]
    Parse(#[from] shell_words::ParseError),
    #[error("could not start editor {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("note temp file: {0}")]
    Io(#[from] io::Error),
}

/// Something that lets the user edit a block of text.
///
/// Returns the new text, or None when the user made no change or the editor
/// reported failure.
pub trait NoteEditor {
    fn edit(&self, text: &str) -> Result<Option<String>, EditorError>;
}

/// Runs an external program on a temp file and blocks until it exits.
///
/// The command line is split shell-style when the editor is launched, so
/// quoted paths like `"/opt/My Editor/ed" -w` work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    pub fn new(command: &str) -> Self {
        ExternalEditor {
            command: command.to_string(),
        }
    }

    /// Configured editor, else `$VISUAL`, else `$EDITOR`, else a platform default
    pub fn from_env(configured: Option<&str>) -> Self {
        let command = configured
            .map(str::to_string)
            .into_iter()
            .chain(["VISUAL", "EDITOR"].iter().filter_map(|key| env::var(key).ok()))
            .find(|c| !c.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_EDITOR.to_string());
        ExternalEditor::new(&command)
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl NoteEditor for ExternalEditor {
    fn edit(&self, text: &str) -> Result<Option<String>, EditorError> {
        let words = shell_words::split(&self.command)?;
        let (program, args) = words.split_first().ok_or(EditorError::NoCommand)?;

        let mut file = tempfile::Builder::new()
            .prefix("todo-note-")
            .suffix(".md")
            .tempfile()?;
        file.write_all(text.as_bytes())?;
        file.flush()?;

        info!(%program, path = %file.path().display(), "launching note editor");
        let status = Command::new(program)
            .args(args)
            .arg(file.path())
            .status()
            .map_err(|source| EditorError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !status.success() {
            warn!(%status, "editor exited unsuccessfully, note unchanged");
            return Ok(None);
        }

        // read by path: some editors replace the file instead of writing in place
        let edited = fs::read_to_string(file.path())?;
        let edited = edited.trim_end_matches(['\n', '\r']);
        if edited == text.trim_end_matches(['\n', '\r']) {
            return Ok(None);
        }
        Ok(Some(edited.to_string()))
    }
}
