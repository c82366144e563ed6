//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: model identifiers accepted by the model API
//! - [`string`]: display helpers (truncation)

pub mod model;
pub mod string;
