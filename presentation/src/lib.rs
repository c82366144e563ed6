//! Presentation layer for Murlix
//!
//! This crate contains CLI definitions, terminal panels and markdown
//! rendering, the thinking spinner, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod config;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::ChatRepl;
pub use chat::session_picker::{PickerChoice, no_sessions_panel, pick_session};
pub use cli::commands::{Cli, Command, Mode};
pub use config::ReplConfig;
pub use output::banner;
pub use output::console::ConsoleFormatter;
pub use output::panel::{BorderStyle, Panel};
pub use progress::spinner::ThinkingSpinner;
