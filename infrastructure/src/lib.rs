//! Infrastructure layer for Murlix
//!
//! This crate contains adapters that implement the ports defined in the
//! domain and application layers: the Gemini gateway, the JSONL session
//! store, MCP tool servers, the conversation logger and configuration file
//! loading.

pub mod config;
pub mod gemini;
pub mod logging;
pub mod mcp;
pub mod session_store;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigLoader, FileConfig, Severity};
pub use gemini::{
    error::GeminiError,
    gateway::{GeminiConfig, GeminiGateway},
};
pub use logging::JsonlConversationLogger;
pub use mcp::{McpError, McpServerConfig, McpToolset};
pub use session_store::JsonlSessionRepository;
