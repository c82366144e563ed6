//! Application layer for Murlix
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::RunnerConfig;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, LlmGateway},
    toolset::{Toolset, ToolsetError},
};
pub use use_cases::runner::{EventStream, RunInput, Runner, RunnerError};
pub use use_cases::session_manager::SessionManager;
