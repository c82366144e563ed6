//! Toolset port
//!
//! A toolset is one tool server: it advertises tools and executes them.

use async_trait::async_trait;
use murlix_domain::{ToolDefinition, ToolOutput};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to a tool server.
///
/// A tool that runs and fails is not an error here; it comes back as a
/// [`ToolOutput`] with `is_error` set.
#[derive(Error, Debug)]
pub enum ToolsetError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Toolset closed")]
    Closed,
}

#[async_trait]
pub trait Toolset: Send + Sync {
    /// Name used in logs and warnings.
    fn name(&self) -> &str;

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ToolsetError>;

    async fn call_tool(&self, name: &str, args: Value) -> Result<ToolOutput, ToolsetError>;

    /// Release the server. Calling it twice is harmless.
    async fn close(&self) -> Result<(), ToolsetError>;
}
