//! Gemini LLM Gateway implementation
//!
//! Implements the LlmGateway port over the Generative Language REST API.

use super::error::{GeminiError, Result, classify_reqwest_error};
use super::protocol::{GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use murlix_application::ports::llm_gateway::{GatewayError, LlmGateway};
use murlix_domain::{LlmRequest, LlmResponse};
use std::time::Duration;
use tracing::{debug, trace, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variables searched for an API key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Maximum response body kept in an HTTP error.
const ERROR_BODY_LIMIT: usize = 2000;

/// Gemini API configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the API key from the environment.
    ///
    /// Resolution order:
    /// 1. `config_api_key` (from the config file)
    /// 2. the variable named by `api_key_env`, if any
    /// 3. `GOOGLE_API_KEY`, then `GEMINI_API_KEY`
    pub fn from_env(config_api_key: Option<&str>, api_key_env: Option<&str>) -> Result<Self> {
        resolve_api_key(config_api_key, api_key_env, |name| std::env::var(name).ok())
            .map(Self::new)
    }
}

pub(crate) fn resolve_api_key(
    config_api_key: Option<&str>,
    api_key_env: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    if let Some(key) = config_api_key.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    let names: Vec<&str> = api_key_env
        .into_iter()
        .chain(API_KEY_ENV_VARS.iter().copied())
        .collect();
    names
        .iter()
        .find_map(|name| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
        .ok_or_else(|| GeminiError::MissingApiKey(names.join(" or ")))
}

/// LLM Gateway backed by the Gemini REST API
pub struct GeminiGateway {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiGateway {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeminiError::Client(e.to_string()))?;
        Ok(Self { config, http })
    }

    async fn generate_content(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, request.model
        );
        let body = GenerateContentRequest::from_domain(request);
        debug!(
            "Gemini request: model={}, contents={}, tools={}",
            request.model,
            body.contents.len(),
            request.tools.len()
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}", status);
            return Err(GeminiError::Http {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        trace!("Gemini response: {}", text);
        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| GeminiError::Decode(e.to_string()))?;

        if let Some(reason) = parsed.block_reason() {
            return Err(GeminiError::Blocked(reason.to_string()));
        }
        Ok(parsed.into_domain())
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let mut end = ERROR_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[async_trait]
impl LlmGateway for GeminiGateway {
    async fn generate(&self, request: &LlmRequest) -> std::result::Result<LlmResponse, GatewayError> {
        self.generate_content(request).await.map_err(GatewayError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murlix_domain::{Content, FinishReason, Part, ToolDefinition};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> GeminiGateway {
        GeminiGateway::new(GeminiConfig::new("test-key").with_base_url(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_generate_text_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "systemInstruction": {"parts": [{"text": "Be nice."}]},
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Hi!"}]},
                    "finishReason": "STOP"
                }],
                "modelVersion": "gemini-2.0-flash"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = LlmRequest::new("gemini-2.0-flash", vec![Content::user_text("hello")])
            .with_system_instruction("Be nice.");
        let response = gateway(&server).generate(&request).await.unwrap();

        assert_eq!(response.content.text(), "Hi!");
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
    }

    #[tokio::test]
    async fn test_generate_function_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-pro:generateContent"))
            .and(body_partial_json(json!({
                "tools": [{"functionDeclarations": [{"name": "list_dir"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [
                        {"functionCall": {"name": "list_dir", "args": {"path": "/tmp"}}}
                    ]},
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let request = LlmRequest::new("gemini-2.0-pro", vec![Content::user_text("ls /tmp")])
            .with_tools(vec![ToolDefinition::new("list_dir", "List a directory")]);
        let response = gateway(&server).generate(&request).await.unwrap();

        assert!(response.has_function_calls());
        assert!(matches!(
            &response.content.parts[0],
            Part::FunctionCall { name, args, .. } if name == "list_dir" && args["path"] == "/tmp"
        ));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let request = LlmRequest::new("gemini-2.0-flash", vec![Content::user_text("x")]);
        let err = gateway(&server).generate(&request).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Http { status: 400, ref body } if body == "API key not valid"
        ));
    }

    #[tokio::test]
    async fn test_blocked_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let request = LlmRequest::new("gemini-2.0-flash", vec![Content::user_text("x")]);
        let err = gateway(&server).generate(&request).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(msg) if msg.contains("SAFETY")));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let request = LlmRequest::new("gemini-2.0-flash", vec![Content::user_text("x")]);
        let err = gateway(&server).generate(&request).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport() {
        let config = GeminiConfig::new("k").with_base_url("http://127.0.0.1:1");
        let request = LlmRequest::new("gemini-2.0-flash", vec![Content::user_text("x")]);
        let err = GeminiGateway::new(config)
            .unwrap()
            .generate(&request)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[test]
    fn test_resolve_api_key_order() {
        let env = |name: &str| match name {
            "GOOGLE_API_KEY" => Some("google".to_string()),
            "GEMINI_API_KEY" => Some("gemini".to_string()),
            "MY_KEY" => Some("mine".to_string()),
            _ => None,
        };
        assert_eq!(resolve_api_key(Some("cfg"), None, env).unwrap(), "cfg");
        assert_eq!(resolve_api_key(None, Some("MY_KEY"), env).unwrap(), "mine");
        assert_eq!(resolve_api_key(None, None, env).unwrap(), "google");
        assert_eq!(resolve_api_key(Some("  "), Some("UNSET"), env).unwrap(), "google");
    }

    #[test]
    fn test_resolve_api_key_gemini_fallback_and_missing() {
        let only_gemini = |name: &str| (name == "GEMINI_API_KEY").then(|| "g".to_string());
        assert_eq!(resolve_api_key(None, None, only_gemini).unwrap(), "g");

        let err = resolve_api_key(None, None, |_| None).unwrap_err();
        assert!(matches!(err, GeminiError::MissingApiKey(vars) if vars == "GOOGLE_API_KEY or GEMINI_API_KEY"));
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short"), "short");
        let long = "é".repeat(ERROR_BODY_LIMIT);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= ERROR_BODY_LIMIT + 3);
    }
}
