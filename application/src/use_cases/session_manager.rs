//! Session management use case.
//!
//! Thin layer over [`SessionRepository`] that fixes the `(app_name, user_id)`
//! scope and adds the orderings the picker and `continue-chat` rely on.

use murlix_domain::{RepositoryError, Session, SessionInfo, SessionRepository};
use serde_json::Map;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable overriding the user id.
pub const USER_ID_ENV: &str = "USER_ID";
pub const DEFAULT_USER_ID: &str = "default_user";
const FALLBACK_APP_NAME: &str = "murlix";

pub struct SessionManager {
    repository: Arc<dyn SessionRepository>,
    app_name: String,
    user_id: String,
}

impl SessionManager {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        app_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            app_name: app_name.into(),
            user_id: user_id.into(),
        }
    }

    /// App name derived from the working directory, user id from `USER_ID`.
    pub fn with_defaults(repository: Arc<dyn SessionRepository>) -> Self {
        Self::new(repository, default_app_name(), default_user_id())
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Sessions of this app and user, most recently updated first.
    pub async fn list_sessions(&self) -> Result<Vec<SessionInfo>, RepositoryError> {
        let mut sessions = self
            .repository
            .list_sessions(&self.app_name, &self.user_id)
            .await?;
        sessions.sort_by(|a, b| b.last_update_time.cmp(&a.last_update_time));
        debug!("Found {} sessions for {}/{}", sessions.len(), self.app_name, self.user_id);
        Ok(sessions)
    }

    pub async fn create_session(&self) -> Result<Session, RepositoryError> {
        let session = self
            .repository
            .create_session(&self.app_name, &self.user_id, None, Map::new())
            .await?;
        info!("Created session {}", session.id);
        Ok(session)
    }

    /// Load an existing session; `NotFound` when it does not exist.
    pub async fn resume_session(&self, session_id: &str) -> Result<Session, RepositoryError> {
        let session = self
            .repository
            .get_session(&self.app_name, &self.user_id, session_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(session_id.to_string()))?;
        info!("Resumed session {} ({} events)", session.id, session.events.len());
        Ok(session)
    }

    pub async fn most_recent_session(&self) -> Result<Option<SessionInfo>, RepositoryError> {
        Ok(self.list_sessions().await?.into_iter().next())
    }

    /// Wipe the history of a session, keeping its id.
    pub async fn clear_session(&self, session_id: &str) -> Result<Session, RepositoryError> {
        self.repository
            .delete_session(&self.app_name, &self.user_id, session_id)
            .await?;
        let session = self
            .repository
            .create_session(&self.app_name, &self.user_id, Some(session_id), Map::new())
            .await?;
        info!("Cleared session {}", session_id);
        Ok(session)
    }
}

/// Final component of the working directory.
pub fn default_app_name() -> String {
    std::env::current_dir()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_APP_NAME.to_string())
}

pub fn default_user_id() -> String {
    user_id_from(std::env::var(USER_ID_ENV).ok())
}

fn user_id_from(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string())
}
