//! Session storage configuration from TOML (`[session]` section)

use crate::session_store::JsonlSessionRepository;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw session configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Session directory (default: `{data_dir}/murlix/sessions`)
    pub dir: Option<String>,
    /// App name scoping the sessions (default: working directory name)
    pub app_name: Option<String>,
    /// User id (default: `$USER_ID` or `default_user`)
    pub user_id: Option<String>,
}

impl FileSessionConfig {
    pub fn session_dir(&self) -> PathBuf {
        self.dir
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(super::expand_home)
            .unwrap_or_else(JsonlSessionRepository::default_root)
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|s| !s.trim().is_empty())
    }
}
