use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "todo", about = concat!("todo-lanes v", env!("CARGO_PKG_VERSION"), " - a kanban board in your terminal"), version)]
pub struct Cli {
    /// Board to open; created on first use (default: the last one used)
    pub mode: Option<String>,

    /// Storage directory (default: ~/.todo)
    #[arg(short = 'd', long = "dir")]
    pub dir: Option<PathBuf>,

    /// Log filter written to todo.log, e.g. "debug" (overrides config, not RUST_LOG)
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Explicit `--dir`, else the home default
    pub fn root(&self) -> Option<PathBuf> {
        self.dir.clone().or_else(crate::io::paths::default_root)
    }
}
