//! LLM Gateway port
//!
//! Defines the interface for communicating with the hosted model API.

use async_trait::async_trait;
use murlix_domain::{LlmRequest, LlmResponse};
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Model API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key: set {0}")]
    MissingApiKey(String),

    #[error("Timeout")]
    Timeout,
}

/// Gateway for LLM communication
///
/// One call per model turn: the whole conversation goes in, one content
/// (text and/or function calls) comes out. Implementations (adapters) live in
/// the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, GatewayError>;
}
