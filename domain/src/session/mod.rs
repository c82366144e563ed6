//! Session domain.
//!
//! - [`content`]: roles, parts and contents exchanged with the model
//! - [`event::AgentEvent`]: one step of a conversation
//! - [`entities::Session`]: a persisted conversation
//! - [`repository::SessionRepository`]: trait for session persistence
//! - [`response`]: model request/response types

pub mod content;
pub mod entities;
pub mod event;
pub mod repository;
pub mod response;
