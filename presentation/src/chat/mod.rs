//! Interactive chat module
//!
//! Reedline-based chat loop with slash commands, completion and the
//! session picker used by `load-chat`.

pub mod commands;
pub mod completer;
pub mod prompt;
mod repl;
pub mod session_picker;

pub use repl::ChatRepl;
