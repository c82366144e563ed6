//! Agent events: the unit of conversation history and of runner output.

use super::content::{Content, Part, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author name used for events produced from user input.
pub const USER_AUTHOR: &str = "user";

/// One step of a conversation: a user message, a model reply, or a batch of
/// tool results.
///
/// Events are appended to the session in order and are also what the
/// [`Runner`](../../murlix_application/use_cases/runner/index.html) streams
/// back to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvent {
    pub id: String,
    /// Groups the events produced for one user message.
    pub invocation_id: String,
    /// `user` or the agent name.
    pub author: String,
    pub content: Content,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub partial: bool,
}

impl AgentEvent {
    pub fn new(invocation_id: impl Into<String>, author: impl Into<String>, content: Content) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            invocation_id: invocation_id.into(),
            author: author.into(),
            content,
            timestamp: Utc::now(),
            partial: false,
        }
    }

    /// Event carrying the user's message.
    pub fn user_message(invocation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(invocation_id, USER_AUTHOR, Content::user_text(text))
    }

    pub fn role(&self) -> Role {
        self.content.role
    }

    /// `(id, name, args)` of every function call part.
    pub fn function_calls(&self) -> Vec<(&str, &str, &Value)> {
        self.content
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::FunctionCall { id, name, args } => Some((id.as_str(), name.as_str(), args)),
                _ => None,
            })
            .collect()
    }

    /// `(name, response, is_error)` of every function response part.
    pub fn function_responses(&self) -> Vec<(&str, &Value, bool)> {
        self.content
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::FunctionResponse {
                    name,
                    response,
                    is_error,
                    ..
                } => Some((name.as_str(), response, *is_error)),
                _ => None,
            })
            .collect()
    }

    pub fn text(&self) -> String {
        self.content.text()
    }

    /// Whether this event is the agent's final answer for the turn.
    ///
    /// Tool calls and tool results are intermediate; streaming fragments
    /// (`partial`) are never final.
    pub fn is_final_response(&self) -> bool {
        !self.partial
            && !self
                .content
                .parts
                .iter()
                .any(|p| p.is_function_call() || p.is_function_response())
    }
}
