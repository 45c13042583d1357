pub mod config_io;
pub mod editor;
pub mod lock;
pub mod paths;
pub mod settings;
pub mod store;
pub mod watcher;
