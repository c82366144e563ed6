//! Agent domain: what the assistant is and which models it can run on.

pub mod entities;
pub mod model_config;
