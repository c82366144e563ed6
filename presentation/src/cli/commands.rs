//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for murlix
#[derive(Parser, Debug)]
#[command(name = "murlix")]
#[command(author, version, about = "Murlix - AI-powered chat assistant for your terminal")]
#[command(long_about = r#"
Murlix is an interactive chat assistant backed by Gemini models. It keeps
every conversation in a session you can come back to, and can call tools
served by MCP servers.

Configuration files are loaded from (in priority order):
1. MURLIX_* environment variables
2. --config <path>     Explicit config file
3. ./murlix.toml       Project-level config
4. ~/.config/murlix/config.toml   Global config

Example:
  murlix
  murlix -q "Explain the difference between Rc and Arc"
  murlix continue-chat
  murlix load-chat -m gemini-2.0-pro
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Run a single query in a new session and exit
    #[arg(short, long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Model to use (overrides the configured default)
    #[arg(short, long, value_name = "MODEL", global = true)]
    pub model: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long, global = true)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resume the most recent session (a new one if none exists)
    ContinueChat,
    /// Pick a previous session to resume
    LoadChat,
}

/// What the binary should do after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    SingleQuery(String),
    ContinueChat,
    LoadChat,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        match (&self.command, &self.query) {
            (Some(Command::ContinueChat), _) => Mode::ContinueChat,
            (Some(Command::LoadChat), _) => Mode::LoadChat,
            (None, Some(query)) if !query.trim().is_empty() => Mode::SingleQuery(query.clone()),
            (None, _) => Mode::Interactive,
        }
    }
}
