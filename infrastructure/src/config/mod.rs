//! Configuration file loading for Murlix
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `MURLIX_*` environment variables (`__` separates nesting)
//! 2. `--config <path>` specified file
//! 3. Project root: `./murlix.toml` or `./.murlix.toml`
//! 4. Global: `{config_dir}/murlix/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, DEFAULT_HISTORY_SIZE, FileAgentConfig, FileConfig, FileGeminiConfig,
    FileLoggingConfig, FileMcpToolsConfig, FileModelConfig, FileOutputConfig, FileReplConfig,
    FileSessionConfig, FileToolsConfig, Severity, model_catalog,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
