//! REPL (Read-Eval-Print Loop) for interactive chat

use super::commands::{
    SlashCommand, UserInput, help_table, history_cleared, run_model_action, unknown_command,
};
use super::completer::SlashCompleter;
use super::prompt::{MurlixPrompt, confirmation_line};
use crate::config::ReplConfig;
use crate::output::banner::{farewell_panel, help_hint, ready_panel};
use crate::output::console::ConsoleFormatter;
use crate::progress::spinner::ThinkingSpinner;
use colored::Colorize;
use murlix_application::{RunInput, Runner, RunnerError, SessionManager};
use murlix_domain::ModelCatalog;
use reedline::{
    ColumnarMenu, Emacs, FileBackedHistory, KeyCode, KeyModifiers, MenuBuilder, Reedline,
    ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};
use std::io;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPLETION_MENU: &str = "completion_menu";

/// Interactive chat REPL
pub struct ChatRepl {
    runner: Runner,
    sessions: SessionManager,
    catalog: ModelCatalog,
    session_id: String,
    config: ReplConfig,
}

impl ChatRepl {
    /// Create a REPL bound to one session
    pub fn new(
        runner: Runner,
        sessions: SessionManager,
        catalog: ModelCatalog,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            sessions,
            catalog,
            session_id: session_id.into(),
            config: ReplConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    fn line_editor(&self) -> Reedline {
        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );

        let menu = ColumnarMenu::default().with_name(COMPLETION_MENU);
        let mut editor = Reedline::create()
            .with_completer(Box::new(SlashCompleter::new()))
            .with_menu(ReedlineMenu::EngineCompleter(Box::new(menu)))
            .with_edit_mode(Box::new(Emacs::new(keybindings)))
            .with_quick_completions(true)
            .with_partial_completions(true);

        if let Some(path) = &self.config.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match FileBackedHistory::with_file(self.config.history_size, path.clone()) {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(e) => warn!("History disabled ({}): {}", path.display(), e),
            }
        }

        editor
    }

    /// Run the interactive REPL until the user quits.
    ///
    /// Toolsets are closed on the way out, whatever ended the loop.
    pub async fn run(&mut self) -> io::Result<()> {
        let mut editor = self.line_editor();
        let prompt = MurlixPrompt::default();

        println!("{}", ready_panel());
        println!("{}", help_hint());

        let result = loop {
            println!();
            let line = match editor.read_line(&prompt) {
                Ok(Signal::Success(line)) => line,
                Ok(_) => {
                    println!("{}", "Goodbye! 👋".yellow());
                    break Ok(());
                }
                Err(e) => break Err(e),
            };

            let input = UserInput::parse(&line);
            if input != UserInput::Empty {
                println!("{}", confirmation_line(&line));
            }

            match input {
                UserInput::Empty => continue,
                UserInput::Exit => break Ok(()),
                UserInput::Command(command) => {
                    if self.handle_command(command).await {
                        break Ok(());
                    }
                }
                UserInput::Message(text) => {
                    println!();
                    // Already rendered; the loop goes on.
                    let _ = self.process_message(&text).await;
                }
            }
        };

        println!("{}", farewell_panel());
        self.runner.close().await;
        result
    }

    /// Handle a slash command. Returns true if the loop should exit.
    async fn handle_command(&mut self, command: SlashCommand) -> bool {
        match command {
            SlashCommand::Help => println!("{}", help_table()),
            SlashCommand::Model(action) => {
                println!("{}", run_model_action(&mut self.catalog, &action));
                debug!("Current model: {}", self.catalog.current_model().name);
            }
            SlashCommand::Clear => match self.sessions.clear_session(&self.session_id).await {
                Ok(_) => {
                    info!("Cleared session {}", self.session_id);
                    println!("{}", history_cleared());
                }
                Err(e) => println!("{}", ConsoleFormatter::error(&e)),
            },
            SlashCommand::Quit => return true,
            SlashCommand::Unknown(name) => println!("{}", unknown_command(&name)),
        }
        false
    }

    /// Run one turn, rendering events as they arrive.
    ///
    /// Ctrl-C while the turn runs cancels it; errors are rendered here and
    /// also returned.
    pub async fn process_message(&self, text: &str) -> Result<(), RunnerError> {
        let token = CancellationToken::new();
        let input = RunInput::new(
            self.sessions.user_id(),
            &self.session_id,
            text,
            self.catalog.current_model().name.clone(),
        )
        .with_cancellation(token.clone());

        let spinner = ThinkingSpinner::start(self.config.show_progress);
        let mut stream = self.runner.run_async(input);

        let result = loop {
            tokio::select! {
                item = stream.next_event() => match item {
                    Some(Ok(event)) => {
                        for panel in ConsoleFormatter::format_event(&event) {
                            spinner.suspend(|| println!("{}\n", panel));
                        }
                    }
                    Some(Err(RunnerError::Cancelled)) => {
                        spinner.suspend(|| println!("{}", "Request cancelled.".yellow()));
                        break Err(RunnerError::Cancelled);
                    }
                    Some(Err(e)) => {
                        spinner.suspend(|| println!("{}", ConsoleFormatter::error(&e)));
                        break Err(e);
                    }
                    None => break Ok(()),
                },
                _ = tokio::signal::ctrl_c(), if !token.is_cancelled() => {
                    debug!("Ctrl-C: cancelling turn");
                    token.cancel();
                }
            }
        };

        spinner.finish();
        result
    }

    /// Run a single message and close the toolsets.
    pub async fn ask(&self, query: &str) -> Result<(), RunnerError> {
        let result = self.process_message(query).await;
        self.runner.close().await;
        result
    }
}
