//! Model request/response types.
//!
//! The runner builds an [`LlmRequest`] from the session history and the tool
//! catalog; the gateway answers with an [`LlmResponse`] whose content may mix
//! text and function calls.

use super::content::Content;
use crate::tool::entities::ToolDefinition;
use serde::{Deserialize, Serialize};

/// One call to the model API.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub contents: Vec<Content>,
    pub tools: Vec<ToolDefinition>,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            contents,
            tools: Vec::new(),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Other(String),
}

impl FinishReason {
    /// Parse the model API's finish reason string.
    pub fn from_api(s: &str) -> Self {
        match s {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" => FinishReason::Safety,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// The model's answer to an [`LlmRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub content: Content,
    pub finish_reason: Option<FinishReason>,
    pub model_version: Option<String>,
}

impl LlmResponse {
    pub fn new(content: Content) -> Self {
        Self {
            content,
            finish_reason: None,
            model_version: None,
        }
    }

    pub fn has_function_calls(&self) -> bool {
        self.content.parts.iter().any(|p| p.is_function_call())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::content::{Part, Role};
    use serde_json::json;

    #[test]
    fn test_finish_reason_parsing() {
        assert_eq!(FinishReason::from_api("STOP"), FinishReason::Stop);
        assert_eq!(FinishReason::from_api("MAX_TOKENS"), FinishReason::MaxTokens);
        assert_eq!(
            FinishReason::from_api("RECITATION"),
            FinishReason::Other("RECITATION".into())
        );
    }

    #[test]
    fn test_detects_function_calls() {
        let text = LlmResponse::new(Content::model_text("hi"));
        assert!(!text.has_function_calls());

        let call = LlmResponse::new(Content::new(
            Role::Model,
            vec![Part::function_call("c1", "list_dir", json!({}))],
        ));
        assert!(call.has_function_calls());
    }
}
