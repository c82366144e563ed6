//! Gemini API configuration from TOML (`[gemini]` section)

use crate::gemini::error::Result;
use crate::gemini::gateway::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, GeminiConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw Gemini configuration from TOML
///
/// Prefer `api_key_env` over putting the key itself in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGeminiConfig {
    /// API key (discouraged; use the environment)
    pub api_key: Option<String>,
    /// Name of an extra environment variable holding the key
    pub api_key_env: Option<String>,
    pub base_url: String,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FileGeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl FileGeminiConfig {
    /// Resolve the key and build the gateway configuration.
    pub fn to_gemini_config(&self) -> Result<GeminiConfig> {
        Ok(
            GeminiConfig::from_env(self.api_key.as_deref(), self.api_key_env.as_deref())?
                .with_base_url(self.base_url.clone())
                .with_timeout(Duration::from_secs(self.timeout_secs.max(1))),
        )
    }
}
