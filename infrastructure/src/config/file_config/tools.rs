//! Tools configuration from TOML (`[tools]` section)
//!
//! Tools come from MCP servers launched as child processes:
//!
//! ```toml
//! [tools.mcp]
//! enabled = true
//! request_timeout_secs = 60
//!
//! [[tools.mcp.servers]]
//! name = "filesystem"
//! command = "npx"
//! args = ["-y", "@modelcontextprotocol/server-filesystem", "."]
//! ```

use crate::mcp::{DEFAULT_REQUEST_TIMEOUT, McpServerConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw tools configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    pub mcp: FileMcpToolsConfig,
}

/// MCP tool servers (`[tools.mcp]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMcpToolsConfig {
    pub enabled: bool,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    pub servers: Vec<McpServerConfig>,
}

impl Default for FileMcpToolsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            servers: Vec::new(),
        }
    }
}

impl FileMcpToolsConfig {
    /// Servers to launch; empty when MCP is disabled.
    pub fn active_servers(&self) -> &[McpServerConfig] {
        if self.enabled { &self.servers } else { &[] }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
