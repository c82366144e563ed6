//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every section defaults independently, so a file only needs the keys it
//! changes.

mod agent;
mod gemini;
mod logging;
mod models;
mod output;
mod repl;
mod session;
mod tools;

pub use agent::FileAgentConfig;
pub use gemini::FileGeminiConfig;
pub use logging::FileLoggingConfig;
pub use models::{FileModelConfig, model_catalog};
pub use output::FileOutputConfig;
pub use repl::{DEFAULT_HISTORY_SIZE, FileReplConfig};
pub use session::FileSessionConfig;
pub use tools::{FileMcpToolsConfig, FileToolsConfig};

use murlix_application::RunnerConfig;
use murlix_domain::{AgentDefinition, ModelCatalog};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Assistant settings
    pub agent: FileAgentConfig,
    /// Selectable models (`[[models]]`)
    pub models: Vec<FileModelConfig>,
    /// Gemini API settings
    pub gemini: FileGeminiConfig,
    /// Session storage
    pub session: FileSessionConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
    /// Tool servers
    pub tools: FileToolsConfig,
}

/// How serious a configuration problem is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A problem found by [`FileConfig::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted key the issue refers to (e.g. `agent.max_llm_calls`)
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl FileConfig {
    /// Model catalog with `[agent] model` (if any) selected.
    pub fn model_catalog(&self) -> ModelCatalog {
        let mut catalog = model_catalog(&self.models);
        if let Some(model) = self.agent.model.as_deref().filter(|m| !m.trim().is_empty()) {
            catalog.select_or_insert(model.trim());
        }
        catalog
    }

    pub fn agent_definition(&self) -> AgentDefinition {
        self.agent.to_definition()
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::default().with_max_llm_calls(self.agent.max_llm_calls.max(1))
    }

    /// Check the whole configuration, returning every issue found.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.agent.max_llm_calls == 0 {
            issues.push(ConfigIssue::warning(
                "agent.max_llm_calls",
                "agent.max_llm_calls is 0, using 1",
            ));
        }
        if self.agent.name.trim().is_empty() {
            issues.push(ConfigIssue::error("agent.name", "agent.name cannot be empty"));
        }

        let mut seen = HashSet::new();
        for (i, model) in self.models.iter().enumerate() {
            let name = model.name.trim();
            if name.is_empty() {
                issues.push(ConfigIssue::error(
                    "models.name",
                    format!("models[{}]: model name cannot be empty", i),
                ));
            } else if !seen.insert(name) {
                issues.push(ConfigIssue::warning(
                    "models.name",
                    format!("models[{}]: duplicate model '{}'", i, name),
                ));
            }
        }
        if self.models.iter().filter(|m| m.default).count() > 1 {
            issues.push(ConfigIssue::warning(
                "models.default",
                "more than one model is marked default, using the first",
            ));
        }

        if self.gemini.api_key.is_some() {
            issues.push(ConfigIssue::warning(
                "gemini.api_key",
                "gemini.api_key is stored in a config file; prefer GOOGLE_API_KEY",
            ));
        }
        if self.gemini.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                "gemini.timeout_secs",
                "gemini.timeout_secs is 0, using 1",
            ));
        }

        let mut names = HashSet::new();
        for server in &self.tools.mcp.servers {
            if server.command.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    "tools.mcp.servers.command",
                    format!("MCP server '{}' has no command", server.name),
                ));
            }
            if !names.insert(server.name.as_str()) {
                issues.push(ConfigIssue::warning(
                    "tools.mcp.servers.name",
                    format!("duplicate MCP server name '{}'", server.name),
                ));
            }
        }

        issues
    }
}

/// Expand a leading `~` to the home directory.
pub(crate) fn expand_home(path: &str) -> PathBuf {
    let path = path.trim();
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
