//! MCP (Model Context Protocol) tool servers over stdio.
//!
//! Each configured server is spawned as a child process and driven with
//! newline-delimited JSON-RPC. [`McpToolset`] adapts one server to the
//! application's `Toolset` port.

pub mod client;
pub mod error;
pub mod protocol;
pub mod toolset;
pub mod transport;

pub use client::McpClient;
pub use error::McpError;
pub use toolset::{DEFAULT_REQUEST_TIMEOUT, McpServerConfig, McpToolset};
