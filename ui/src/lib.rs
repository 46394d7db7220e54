pub mod command;
pub mod render;
pub mod selector;

pub use command::Command;
pub use selector::{SelectError, select_connection};
