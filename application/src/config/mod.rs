//! Application-level configuration.
//!
//! - [`RunnerConfig`]: limits applied to each agent turn

pub mod runner_config;

pub use runner_config::{DEFAULT_MAX_LLM_CALLS, RunnerConfig};
