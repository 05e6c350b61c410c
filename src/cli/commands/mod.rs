//! CLI command implementations (facade).
//!
//! This module re-exports the command surface used by `run.rs`.
//! Implementations live in `commands/*`.

mod add;
mod build;
mod common;
mod dump;
mod init;
mod list;

// Re-export command handlers
pub use add::execute_add_command;
pub use build::{BuildOptions, execute_build_command};
pub use dump::{DumpOptions, execute_dump_command};
pub use init::execute_init_command;
pub use list::execute_list_command;
