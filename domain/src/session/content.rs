//! Conversation content: roles, parts and contents exchanged with the model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// A single part of a [`Content`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text.
    Text { text: String },
    /// The model asks for a tool to be invoked.
    FunctionCall {
        id: String,
        name: String,
        #[serde(default)]
        args: Value,
    },
    /// Result of a tool invocation, sent back to the model.
    FunctionResponse {
        id: String,
        name: String,
        response: Value,
        #[serde(default)]
        is_error: bool,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn function_call(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Part::FunctionCall {
            id: id.into(),
            name: name.into(),
            args,
        }
    }

    pub fn function_response(
        id: impl Into<String>,
        name: impl Into<String>,
        response: Value,
        is_error: bool,
    ) -> Self {
        Part::FunctionResponse {
            id: id.into(),
            name: name.into(),
            response,
            is_error,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_function_call(&self) -> bool {
        matches!(self, Part::FunctionCall { .. })
    }

    pub fn is_function_response(&self) -> bool {
        matches!(self, Part::FunctionResponse { .. })
    }
}

/// A message in the conversation: a role plus an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::text(text)])
    }

    /// Concatenation of every text part.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_joins_text_parts_only() {
        let content = Content::new(
            Role::Model,
            vec![
                Part::text("Reading "),
                Part::function_call("c1", "read_file", json!({"path": "a.rs"})),
                Part::text("now."),
            ],
        );
        assert_eq!(content.text(), "Reading now.");
    }

    #[test]
    fn test_part_serializes_with_type_tag() {
        let part = Part::function_call("c1", "list_dir", json!({"path": "."}));
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["type"], "function_call");
        assert_eq!(value["name"], "list_dir");

        let back: Part = serde_json::from_value(value).unwrap();
        assert_eq!(back, part);
    }

    #[test]
    fn test_function_response_defaults_is_error_false() {
        let part: Part = serde_json::from_value(json!({
            "type": "function_response",
            "id": "c1",
            "name": "list_dir",
            "response": {"result": "ok"}
        }))
        .unwrap();
        assert!(matches!(part, Part::FunctionResponse { is_error: false, .. }));
    }

    #[test]
    fn test_role_strings() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Model.as_str(), "model");
    }
}
