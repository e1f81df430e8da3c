// User Interface module
// Handles the terminal user interface

pub mod commands;
pub mod tui;
pub mod widgets;

// Re-export important types
pub use commands::Command;
pub use tui::{poll_command, AppLayout, Tui};
