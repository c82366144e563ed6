//! REPL configuration from TOML (`[repl]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_HISTORY_SIZE: usize = 1000;

/// Raw REPL configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Show the "Thinking..." spinner
    pub show_progress: bool,
    /// Path to history file
    pub history_file: Option<String>,
    /// Maximum entries kept in the history file
    pub history_size: usize,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl FileReplConfig {
    /// Configured history file, else `{data_dir}/murlix/history.txt`.
    pub fn history_path(&self) -> Option<PathBuf> {
        match self.history_file.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(path) => Some(super::expand_home(path)),
            None => dirs::data_dir().map(|d| d.join("murlix").join("history.txt")),
        }
    }
}
