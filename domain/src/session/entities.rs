//! Session domain entities

use super::event::AgentEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State key holding the one-line session summary shown in the picker.
pub const SUMMARY_KEY: &str = "session_summary";

/// A persisted conversation (Entity)
///
/// Owned by one `(app_name, user_id)` pair. `events` is the full history in
/// append order; `state` is a free-form key/value map.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub state: Map<String, Value>,
    pub events: Vec<AgentEvent>,
    pub last_update_time: DateTime<Utc>,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        app_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            app_name: app_name.into(),
            user_id: user_id.into(),
            state: Map::new(),
            events: Vec::new(),
            last_update_time: Utc::now(),
        }
    }

    pub fn summary(&self) -> Option<&str> {
        self.state.get(SUMMARY_KEY).and_then(Value::as_str)
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            last_update_time: self.last_update_time,
            summary: self.summary().map(str::to_string),
        }
    }
}

/// Listing projection of a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub last_update_time: DateTime<Utc>,
    pub summary: Option<String>,
}

impl SessionInfo {
    /// Summary text for display, empty when none was recorded.
    pub fn summary_or_default(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }
}
