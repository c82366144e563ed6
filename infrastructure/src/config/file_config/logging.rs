//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
///
/// ```toml
/// [logging]
/// file = "~/.local/state/murlix/murlix.log"
/// conversation_log = "~/.local/state/murlix/conversation.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Write tracing output here instead of stderr
    pub file: Option<String>,
    /// JSONL transcript of turns, model replies and tool calls
    pub conversation_log: Option<String>,
}

impl FileLoggingConfig {
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(super::expand_home)
    }

    pub fn conversation_log_path(&self) -> Option<PathBuf> {
        self.conversation_log
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(super::expand_home)
    }
}
