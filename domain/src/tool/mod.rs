//! Tool domain module
//!
//! Tools are provided by external tool servers. The domain only knows their
//! advertised [`ToolDefinition`] and the [`ToolOutput`] of an invocation;
//! the application layer's `Toolset` port does the actual calling.

pub mod entities;

pub use entities::{ToolDefinition, ToolOutput};
