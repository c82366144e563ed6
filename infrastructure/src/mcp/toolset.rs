//! MCP server as a [`Toolset`].

use super::client::McpClient;
use super::error::{McpError, Result};
use super::protocol::{CallToolResult, InitializeResult, ListToolsResult, ServerInfo, initialize_params};
use async_trait::async_trait;
use murlix_application::ports::toolset::{Toolset, ToolsetError};
use murlix_domain::{ToolDefinition, ToolOutput};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Guards against servers that keep handing out cursors.
const MAX_LIST_PAGES: usize = 100;

/// How to launch one MCP server (`[[tools.mcp.servers]]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl McpServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Tool server reached over MCP stdio
pub struct McpToolset {
    client: McpClient,
    server_info: Option<ServerInfo>,
}

impl McpToolset {
    /// Spawn the server and complete the `initialize` handshake.
    pub async fn connect(config: &McpServerConfig, timeout: Duration) -> Result<Self> {
        let client =
            McpClient::spawn(&config.name, &config.command, &config.args, &config.env, timeout)
                .await?;

        let result = client.request("initialize", Some(initialize_params())).await?;
        let init: InitializeResult = serde_json::from_value(result)
            .map_err(|e| McpError::UnexpectedResponse(format!("initialize: {}", e)))?;
        client.notify("notifications/initialized", None).await?;

        match &init.server_info {
            Some(info) => info!(
                "Connected to MCP server '{}' ({} {}, protocol {})",
                config.name,
                info.name,
                info.version.as_deref().unwrap_or("?"),
                init.protocol_version.as_deref().unwrap_or("?")
            ),
            None => info!("Connected to MCP server '{}'", config.name),
        }

        Ok(Self {
            client,
            server_info: init.server_info,
        })
    }

    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    async fn list_all_tools(&self) -> Result<Vec<ToolDefinition>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let result = self.client.request("tools/list", params).await?;
            let page: ListToolsResult = serde_json::from_value(result)
                .map_err(|e| McpError::UnexpectedResponse(format!("tools/list: {}", e)))?;
            tools.extend(page.tools.into_iter().map(|t| t.into_definition()));

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        debug!("MCP '{}': {} tools", self.client.name(), tools.len());
        Ok(tools)
    }

    async fn call(&self, name: &str, args: Value) -> Result<ToolOutput> {
        let arguments = if args.is_null() { json!({}) } else { args };
        let result = self
            .client
            .request("tools/call", Some(json!({ "name": name, "arguments": arguments })))
            .await?;
        let parsed: CallToolResult = serde_json::from_value(result)
            .map_err(|e| McpError::UnexpectedResponse(format!("tools/call: {}", e)))?;
        Ok(parsed.into_output())
    }
}

#[async_trait]
impl Toolset for McpToolset {
    fn name(&self) -> &str {
        self.client.name()
    }

    async fn list_tools(&self) -> std::result::Result<Vec<ToolDefinition>, ToolsetError> {
        Ok(self.list_all_tools().await?)
    }

    async fn call_tool(
        &self,
        name: &str,
        args: Value,
    ) -> std::result::Result<ToolOutput, ToolsetError> {
        Ok(self.call(name, args).await?)
    }

    async fn close(&self) -> std::result::Result<(), ToolsetError> {
        Ok(self.client.close().await?)
    }
}
