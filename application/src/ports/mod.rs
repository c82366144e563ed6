//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.
//! The session repository port lives in the domain crate.

pub mod conversation_logger;
pub mod llm_gateway;
pub mod toolset;
