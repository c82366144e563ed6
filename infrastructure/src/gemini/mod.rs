//! Gemini adapter
//!
//! Implements LlmGateway for the Gemini `generateContent` REST API.

pub mod error;
pub mod gateway;
pub mod protocol;
