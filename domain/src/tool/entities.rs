//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Definition of a tool advertised by a tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "read_file")
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// JSON schema of the arguments object
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: empty_object_schema(),
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Outcome of a tool invocation.
///
/// Tool failures reported by the server are not Rust errors: they come back
/// as `is_error = true` so the model can see them and react.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }

    /// JSON payload sent back to the model as a function response.
    pub fn to_response_value(&self) -> Value {
        if self.is_error {
            json!({ "error": self.content })
        } else {
            json!({ "result": self.content })
        }
    }
}
