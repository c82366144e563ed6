//! Wire types for the Gemini `generateContent` REST endpoint.
//!
//! Only the fields Murlix reads or writes are modelled; unknown response
//! fields are ignored.

use murlix_domain::{Content, FinishReason, LlmRequest, LlmResponse, Part, Role, ToolDefinition};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON-schema keywords the function declaration schema does not accept.
const UNSUPPORTED_SCHEMA_KEYS: &[&str] = &[
    "$schema",
    "$id",
    "$ref",
    "$defs",
    "definitions",
    "additionalProperties",
    "default",
    "examples",
    "title",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<GeminiTool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<GeminiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<GeminiFunctionResponse>,
    /// Set on reasoning parts, which are not part of the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiFunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiTool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    pub model_version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

// ==================== Domain -> wire ====================

impl GenerateContentRequest {
    pub fn from_domain(request: &LlmRequest) -> Self {
        let system_instruction = request
            .system_instruction
            .as_ref()
            .filter(|s| !s.trim().is_empty())
            .map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: Some(text.clone()),
                    ..GeminiPart::default()
                }],
            });

        let contents = request
            .contents
            .iter()
            .filter(|c| !c.parts.is_empty())
            .map(GeminiContent::from_domain)
            .collect();

        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTool {
                function_declarations: request
                    .tools
                    .iter()
                    .map(FunctionDeclaration::from_domain)
                    .collect(),
            }]
        };

        Self {
            system_instruction,
            contents,
            tools,
        }
    }
}

impl GeminiContent {
    fn from_domain(content: &Content) -> Self {
        Self {
            role: Some(content.role.as_str().to_string()),
            parts: content.parts.iter().map(GeminiPart::from_domain).collect(),
        }
    }
}

impl GeminiPart {
    fn from_domain(part: &Part) -> Self {
        match part {
            Part::Text { text } => Self {
                text: Some(text.clone()),
                ..Self::default()
            },
            Part::FunctionCall { name, args, .. } => Self {
                function_call: Some(GeminiFunctionCall {
                    id: None,
                    name: name.clone(),
                    args: args.clone(),
                }),
                ..Self::default()
            },
            Part::FunctionResponse { name, response, .. } => Self {
                function_response: Some(GeminiFunctionResponse {
                    name: name.clone(),
                    response: response.clone(),
                }),
                ..Self::default()
            },
        }
    }
}

impl FunctionDeclaration {
    fn from_domain(tool: &ToolDefinition) -> Self {
        Self {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: declaration_parameters(&tool.input_schema),
        }
    }
}

/// Schema for a function declaration, `None` for tools without arguments.
fn declaration_parameters(schema: &Value) -> Option<Value> {
    let has_properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|p| !p.is_empty());
    if !has_properties {
        return None;
    }
    Some(sanitize_schema(schema))
}

/// Drop JSON-schema keywords the API rejects, recursively.
pub fn sanitize_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut clean = Map::new();
            for (key, value) in map {
                if UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str()) {
                    continue;
                }
                // Property names are user data, not keywords.
                if key == "properties"
                    && let Value::Object(props) = value
                {
                    let props = props
                        .iter()
                        .map(|(name, prop)| (name.clone(), sanitize_schema(prop)))
                        .collect();
                    clean.insert(key.clone(), Value::Object(props));
                    continue;
                }
                clean.insert(key.clone(), sanitize_schema(value));
            }
            Value::Object(clean)
        }
        Value::Array(items) => Value::Array(items.iter().map(sanitize_schema).collect()),
        other => other.clone(),
    }
}

// ==================== Wire -> domain ====================

impl GenerateContentResponse {
    /// Convert the first candidate into a domain response.
    ///
    /// Function calls without an id get a synthetic one so tool results can
    /// be correlated.
    pub fn into_domain(self) -> LlmResponse {
        let candidate = self.candidates.into_iter().next().unwrap_or_default();
        let mut parts = Vec::new();

        if let Some(content) = candidate.content {
            for part in content.parts {
                if part.thought == Some(true) {
                    continue;
                }
                if let Some(call) = part.function_call {
                    let id = call
                        .id
                        .filter(|id| !id.is_empty())
                        .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
                    parts.push(Part::function_call(id, call.name, call.args));
                } else if let Some(text) = part.text
                    && !text.is_empty()
                {
                    parts.push(Part::text(text));
                }
            }
        }

        LlmResponse {
            content: Content::new(Role::Model, parts),
            finish_reason: candidate.finish_reason.as_deref().map(FinishReason::from_api),
            model_version: self.model_version,
        }
    }

    /// Block reason when the prompt was rejected before generation.
    pub fn block_reason(&self) -> Option<&str> {
        if !self.candidates.is_empty() {
            return None;
        }
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_with_history() -> LlmRequest {
        LlmRequest::new(
            "gemini-2.0-flash",
            vec![
                Content::user_text("list files"),
                Content::new(
                    Role::Model,
                    vec![Part::function_call("c1", "list_dir", json!({"path": "."}))],
                ),
                Content::new(
                    Role::User,
                    vec![Part::function_response(
                        "c1",
                        "list_dir",
                        json!({"result": "a.rs"}),
                        false,
                    )],
                ),
            ],
        )
        .with_system_instruction("Be brief.")
    }

    #[test]
    fn test_request_serializes_contents_in_api_shape() {
        let body = serde_json::to_value(GenerateContentRequest::from_domain(&request_with_history()))
            .unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "list files");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["functionCall"]["name"], "list_dir");
        assert!(body["contents"][1]["parts"][0]["functionCall"].get("id").is_none());
        assert_eq!(
            body["contents"][2]["parts"][0]["functionResponse"]["response"]["result"],
            "a.rs"
        );
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_tools_become_function_declarations() {
        let request = LlmRequest::new("m", vec![Content::user_text("hi")]).with_tools(vec![
            ToolDefinition::new("read_file", "Read a file").with_schema(json!({
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "object",
                "properties": {"path": {"type": "string", "default": "."}},
                "required": ["path"],
                "additionalProperties": false
            })),
            ToolDefinition::new("pwd", "Print working directory"),
        ]);
        let body = serde_json::to_value(GenerateContentRequest::from_domain(&request)).unwrap();
        let decls = &body["tools"][0]["functionDeclarations"];

        assert_eq!(decls[0]["name"], "read_file");
        let params = &decls[0]["parameters"];
        assert!(params.get("$schema").is_none());
        assert!(params.get("additionalProperties").is_none());
        assert!(params["properties"]["path"].get("default").is_none());
        assert_eq!(params["required"][0], "path");
        assert!(decls[1].get("parameters").is_none());
    }

    #[test]
    fn test_sanitize_keeps_property_named_like_keyword() {
        let schema = json!({
            "type": "object",
            "properties": {"title": {"type": "string", "title": "Title"}}
        });
        let clean = sanitize_schema(&schema);
        assert_eq!(clean["properties"]["title"], json!({"type": "string"}));
    }

    #[test]
    fn test_response_converts_text_and_calls() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking", "thought": true},
                    {"text": "Let me look."},
                    {"functionCall": {"name": "list_dir", "args": {"path": "src"}}}
                ]},
                "finishReason": "STOP"
            }],
            "modelVersion": "gemini-2.0-flash-001"
        }))
        .unwrap();

        let domain = response.into_domain();
        assert_eq!(domain.content.role, Role::Model);
        assert_eq!(domain.content.parts.len(), 2);
        assert_eq!(domain.content.text(), "Let me look.");
        match &domain.content.parts[1] {
            Part::FunctionCall { id, name, args } => {
                assert!(id.starts_with("call_"));
                assert_eq!(name, "list_dir");
                assert_eq!(args["path"], "src");
            }
            other => panic!("expected function call, got {other:?}"),
        }
        assert_eq!(domain.finish_reason, Some(FinishReason::Stop));
        assert_eq!(domain.model_version.as_deref(), Some("gemini-2.0-flash-001"));
    }

    #[test]
    fn test_response_without_candidates_reports_block_reason() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert_eq!(response.block_reason(), Some("SAFETY"));
        assert!(response.into_domain().content.parts.is_empty());
    }
}
