//! Error types for the MCP adapter

use murlix_application::ports::toolset::ToolsetError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors that can occur when talking to an MCP server
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to spawn MCP server: {0}")]
    SpawnError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("JSON-RPC error (code {code}): {message}")]
    RpcError { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Server connection closed")]
    Closed,
}

impl From<McpError> for ToolsetError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::Timeout(d) => ToolsetError::Timeout(d),
            McpError::Closed => ToolsetError::Closed,
            McpError::CommandNotFound(_) | McpError::SpawnError(_) => {
                ToolsetError::Transport(err.to_string())
            }
            McpError::SerializationError(_)
            | McpError::RpcError { .. }
            | McpError::UnexpectedResponse(_) => ToolsetError::Protocol(err.to_string()),
        }
    }
}
