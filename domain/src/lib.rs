//! Domain layer for Murlix
//!
//! This crate contains the core entities and value objects of the chat
//! client. It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Model catalog**: the models a user can switch between at runtime
//! - **Content / events**: what the user, the model and the tools say to each
//!   other, recorded as [`AgentEvent`]s
//! - **Session**: a persisted conversation, scoped by app and user

pub mod agent;
pub mod core;
pub mod session;
pub mod tool;

// Re-export commonly used types
pub use agent::{
    entities::{AgentDefinition, DEFAULT_INSTRUCTION},
    model_config::{ModelCatalog, ModelConfig},
};
pub use core::{
    model::Model,
    string::{prefix_chars, truncate},
};
pub use session::{
    content::{Content, Part, Role},
    entities::{SUMMARY_KEY, Session, SessionInfo},
    event::{AgentEvent, USER_AUTHOR},
    repository::{RepositoryError, SessionRepository},
    response::{FinishReason, LlmRequest, LlmResponse},
};
pub use tool::{ToolDefinition, ToolOutput};
