//! Presentation-level configuration
//!
//! Configuration for REPL behavior and terminal output.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// REPL configuration for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Show the "Thinking..." spinner
    pub show_progress: bool,
    /// Path to history file (no history is kept when unset)
    pub history_file: Option<PathBuf>,
    /// Maximum number of history entries
    pub history_size: usize,
    /// Show the welcome screen and wait for Enter
    pub show_welcome: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
            history_size: 1000,
            show_welcome: true,
        }
    }
}
