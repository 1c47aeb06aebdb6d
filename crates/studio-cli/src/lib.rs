// Library interface for studio-cli
// This allows integration tests to access internal modules

// NOTE: commands.rs and app.rs are also declared in main.rs, so they are
// pulled in by path to avoid "file loaded multiple times" errors.

#[path = "commands.rs"]
pub mod commands;

#[path = "app.rs"]
pub mod app;

pub use app::{apply_command, send_message, Flow};
pub use commands::{handle_command, CommandResult};
