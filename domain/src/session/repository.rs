//! Session repository trait

use super::entities::{Session, SessionInfo};
use super::event::AgentEvent;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from session persistence
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session data: {0}")]
    Corrupt(String),
}

/// Repository trait for conversation sessions
///
/// This is a domain-level abstraction; implementations live in the
/// infrastructure layer. Sessions are scoped by `(app_name, user_id)`.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a session. A fresh id is generated when `session_id` is `None`.
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
        state: Map<String, Value>,
    ) -> Result<Session, RepositoryError>;

    /// Load a session with its full event history, `None` when absent.
    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, RepositoryError>;

    /// List every session of the pair, in no particular order.
    async fn list_sessions(
        &self,
        app_name: &str,
        user_id: &str,
    ) -> Result<Vec<SessionInfo>, RepositoryError>;

    async fn delete_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), RepositoryError>;

    /// Persist `event` and push it onto `session.events`.
    async fn append_event(
        &self,
        session: &mut Session,
        event: AgentEvent,
    ) -> Result<(), RepositoryError>;

    /// Persist a state upsert and apply it to `session.state`.
    async fn update_state(
        &self,
        session: &mut Session,
        key: &str,
        value: Value,
    ) -> Result<(), RepositoryError>;
}
