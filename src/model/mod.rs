pub mod board;
pub mod config;
pub mod task;

pub use board::*;
pub use config::*;
pub use task::*;
