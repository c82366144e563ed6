//! CLI entrypoint for Murlix
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use murlix_application::use_cases::session_manager::{default_app_name, default_user_id};
use murlix_application::{Runner, RunnerError, SessionManager, Toolset};
use murlix_infrastructure::config::FileMcpToolsConfig;
use murlix_infrastructure::{
    ConfigLoader, FileConfig, GeminiGateway, JsonlConversationLogger, JsonlSessionRepository,
    McpToolset, Severity,
};
use murlix_presentation::output::set_color_enabled;
use murlix_presentation::{
    ChatRepl, Cli, Mode, PickerChoice, ReplConfig, banner, no_sessions_panel, pick_session,
};
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let _log_guard = init_logging(cli.verbose, config.logging.file_path().as_deref());
    info!("Starting Murlix");

    check_config(&config)?;
    set_color_enabled(config.output.color);

    let mode = cli.mode();
    let interactive = !matches!(mode, Mode::SingleQuery(_));
    let repl_config = ReplConfig {
        show_progress: config.repl.show_progress,
        history_file: config.repl.history_path(),
        history_size: config.repl.history_size,
        show_welcome: interactive && std::io::stdin().is_terminal(),
    };

    // === Dependency Injection ===
    let mut catalog = config.model_catalog();
    if let Some(model) = cli.model.as_deref().filter(|m| !m.trim().is_empty()) {
        catalog.select_or_insert(model.trim());
    }
    let agent = config.agent_definition();
    info!("Model: {}", catalog.current_model().model());

    let gemini_config = config
        .gemini
        .to_gemini_config()
        .context("Gemini API is not configured")?;
    let gateway = Arc::new(GeminiGateway::new(gemini_config)?);

    let session_dir = config.session.session_dir();
    info!("Sessions stored in {}", session_dir.display());
    let repository = Arc::new(JsonlSessionRepository::new(session_dir));
    let sessions = SessionManager::new(
        repository.clone(),
        config
            .session
            .app_name()
            .map(str::to_string)
            .unwrap_or_else(default_app_name),
        config
            .session
            .user_id()
            .map(str::to_string)
            .unwrap_or_else(default_user_id),
    );

    if repl_config.show_welcome {
        banner::show_welcome();
    }

    let toolsets = connect_toolsets(&config.tools.mcp).await;

    let mut runner = Runner::new(
        sessions.app_name(),
        agent,
        gateway,
        repository,
        toolsets,
        config.runner_config(),
    );
    if let Some(path) = config.logging.conversation_log_path() {
        match JsonlConversationLogger::new(&path) {
            Some(logger) => runner = runner.with_conversation_logger(Arc::new(logger)),
            None => warn!("Conversation log disabled: cannot open {}", path.display()),
        }
    }

    let Some(session_id) = select_session(&mode, &sessions).await? else {
        runner.close().await;
        return Ok(ExitCode::SUCCESS);
    };

    let mut repl = ChatRepl::new(runner, sessions, catalog, session_id).with_config(repl_config);
    match mode {
        Mode::SingleQuery(query) => Ok(query_exit_code(repl.ask(&query).await)),
        Mode::Interactive | Mode::ContinueChat | Mode::LoadChat => {
            repl.run().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// A failed `-q` turn was already shown as an error panel; only the exit
/// status reports it.
fn query_exit_code(result: Result<(), RunnerError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            info!("Query failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Pick the session for `mode`. `None` means the user cancelled.
async fn select_session(mode: &Mode, sessions: &SessionManager) -> Result<Option<String>> {
    let id = match mode {
        Mode::Interactive | Mode::SingleQuery(_) => new_session(sessions).await?,
        Mode::ContinueChat => match sessions.most_recent_session().await? {
            Some(info) => resume_session(sessions, &info.id).await?,
            None => {
                println!("{}", banner::no_sessions_notice());
                new_session(sessions).await?
            }
        },
        Mode::LoadChat => {
            let list = sessions.list_sessions().await?;
            if list.is_empty() {
                println!("{}", no_sessions_panel());
                new_session(sessions).await?
            } else {
                match pick_session(&list)? {
                    PickerChoice::Resume(id) => resume_session(sessions, &id).await?,
                    PickerChoice::New => new_session(sessions).await?,
                    PickerChoice::Cancel => return Ok(None),
                }
            }
        }
    };
    Ok(Some(id))
}

async fn new_session(sessions: &SessionManager) -> Result<String> {
    let session = sessions.create_session().await?;
    info!("Created session {}", session.id);
    println!("{}", banner::new_session_panel(&session.id));
    Ok(session.id)
}

async fn resume_session(sessions: &SessionManager, id: &str) -> Result<String> {
    let session = sessions
        .resume_session(id)
        .await
        .with_context(|| format!("Cannot resume session {}", id))?;
    info!("Resumed session {} ({} events)", session.id, session.events.len());
    println!("{}", banner::resumed_session_panel(&session.id));
    Ok(session.id)
}

/// Spawn every configured MCP server. Servers that fail are skipped.
async fn connect_toolsets(config: &FileMcpToolsConfig) -> Vec<Arc<dyn Toolset>> {
    let mut toolsets: Vec<Arc<dyn Toolset>> = Vec::new();
    for server in config.active_servers() {
        match McpToolset::connect(server, config.request_timeout()).await {
            Ok(toolset) => toolsets.push(Arc::new(toolset)),
            Err(e) => warn!("MCP server '{}' unavailable: {}", server.name, e),
        }
    }
    toolsets
}

/// Log every configuration issue; fail when any is an error.
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Warning => warn!("Config: {}", issue.message),
            Severity::Error => error!("Config: {}", issue.message),
        }
    }

    let errors: Vec<&str> = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .map(|i| i.message.as_str())
        .collect();
    if !errors.is_empty() {
        bail!("Invalid configuration: {}", errors.join("; "));
    }
    Ok(())
}

/// Initialize logging based on verbosity level.
///
/// Logs go to stderr, or to `[logging] file` through a non-blocking writer
/// whose guard must live until exit.
fn init_logging(verbose: u8, file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let appender = file.and_then(|path| {
        let name = path.file_name()?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(name.to_string_lossy().into_owned())
            .build(dir)
            .map_err(|e| eprintln!("Cannot open log file {}: {}", path.display(), e))
            .ok()
    });

    match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}
