//! Error types for the Gemini adapter

use murlix_application::ports::llm_gateway::GatewayError;
use thiserror::Error;

/// Result type alias for Gemini operations
pub type Result<T> = std::result::Result<T, GeminiError>;

/// Errors that can occur when calling the Gemini API
#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("No API key found; set {0}")]
    MissingApiKey(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Prompt blocked: {0}")]
    Blocked(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Classifies a reqwest error into a [`GeminiError`].
pub fn classify_reqwest_error(e: &reqwest::Error) -> GeminiError {
    if e.is_timeout() {
        GeminiError::Timeout(e.to_string())
    } else if e.is_decode() {
        GeminiError::Decode(e.to_string())
    } else if e.is_connect() {
        GeminiError::Network(format!("Connection failed: {e}"))
    } else {
        GeminiError::Network(e.to_string())
    }
}

impl From<GeminiError> for GatewayError {
    fn from(e: GeminiError) -> Self {
        match e {
            GeminiError::MissingApiKey(var) => GatewayError::MissingApiKey(var),
            GeminiError::Http { status, body } => GatewayError::Http { status, body },
            GeminiError::Timeout(_) => GatewayError::Timeout,
            GeminiError::Network(msg) | GeminiError::Client(msg) => GatewayError::Transport(msg),
            GeminiError::Decode(msg) => GatewayError::InvalidResponse(msg),
            GeminiError::Blocked(reason) => {
                GatewayError::InvalidResponse(format!("prompt blocked ({reason})"))
            }
        }
    }
}
