pub mod datefmt;
pub mod fs_name;
pub mod position;
pub mod unicode;
pub mod user;
