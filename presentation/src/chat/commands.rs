//! Slash commands and input classification

use crate::output::markdown::render_markdown;
use crate::output::panel::{Panel, visible_width};
use colored::{Color, Colorize};
use murlix_domain::ModelCatalog;

/// Registered slash command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Name without the leading `/`
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
}

impl CommandSpec {
    pub fn slash_name(&self) -> String {
        format!("/{}", self.name)
    }
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "help",
        description: "Show list of available commands",
        usage: "/help",
    },
    CommandSpec {
        name: "model",
        description: "Show/select AI model",
        usage: "/model list|set <model_name>",
    },
    CommandSpec {
        name: "clear",
        description: "Clear current conversation history",
        usage: "/clear",
    },
    CommandSpec {
        name: "quit",
        description: "Exit the interactive mode",
        usage: "/quit",
    },
];

/// Plain words that leave the chat, matched case-insensitively.
const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];

/// `/model` sub-action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelAction {
    Show,
    List,
    Set(String),
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Model(ModelAction),
    Clear,
    Quit,
    Unknown(String),
}

impl SlashCommand {
    /// Parse a line starting with `/`. The command name is case-insensitive.
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or("/").to_lowercase();
        let args: Vec<&str> = words.collect();

        match name.as_str() {
            "/help" => SlashCommand::Help,
            "/clear" => SlashCommand::Clear,
            "/quit" => SlashCommand::Quit,
            "/model" => SlashCommand::Model(match args.as_slice() {
                [] => ModelAction::Show,
                ["list", ..] => ModelAction::List,
                ["set", model, ..] => ModelAction::Set(model.to_string()),
                _ => ModelAction::Invalid,
            }),
            _ => SlashCommand::Unknown(name),
        }
    }
}

/// What the user typed, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Empty,
    Exit,
    Command(SlashCommand),
    Message(String),
}

impl UserInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return UserInput::Empty;
        }
        if EXIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w)) {
            return UserInput::Exit;
        }
        if line.starts_with('/') {
            return UserInput::Command(SlashCommand::parse(line));
        }
        UserInput::Message(line.to_string())
    }
}

/// `/help` table: command, description, usage.
pub fn help_table() -> String {
    let headers = ("Command", "Description", "Usage");
    let rows: Vec<(String, &str, &str)> = COMMANDS
        .iter()
        .map(|c| (c.slash_name(), c.description, c.usage))
        .collect();

    let w0 = rows.iter().map(|r| visible_width(&r.0)).chain([headers.0.len()]).max().unwrap_or(0);
    let w1 = rows.iter().map(|r| visible_width(r.1)).chain([headers.1.len()]).max().unwrap_or(0);

    let mut lines = vec![
        format!(
            "{}  {}  {}",
            format!("{:<w0$}", headers.0).bold(),
            format!("{:<w1$}", headers.1).bold(),
            headers.2.bold(),
        ),
        "─".repeat(w0 + w1 + 4 + rows.iter().map(|r| r.2.len()).max().unwrap_or(0)),
    ];
    for (name, description, usage) in rows {
        // Pad before coloring so escapes do not count toward the width.
        lines.push(format!(
            "{}  {}  {}",
            format!("{:<w0$}", name).cyan().bold(),
            format!("{:<w1$}", description),
            usage.dimmed()
        ));
    }

    Panel::new(lines.join("\n"))
        .title("Murlix Help")
        .border_color(Color::Cyan)
        .render()
}

/// Run a `/model` action against the catalog and return what to print.
pub fn run_model_action(catalog: &mut ModelCatalog, action: &ModelAction) -> String {
    match action {
        ModelAction::Show => {
            let model = catalog.current_model();
            Panel::new(format!(
                "Current model: {}\n{}",
                model.display_name.cyan(),
                model.description.dimmed()
            ))
            .title("Model Info")
            .border_color(Color::Cyan)
            .render()
        }
        ModelAction::List => {
            let mut text = String::from("# Available Models\n\n");
            for model in catalog.available_models() {
                text.push_str(&format!("## {}\n{}\n", model.display_name, model.description));
                if model.is_default {
                    text.push_str("\n*Default model*\n");
                }
                text.push('\n');
            }
            Panel::new(render_markdown(&text))
                .title("Available Models")
                .border_color(Color::Cyan)
                .render()
        }
        ModelAction::Set(name) => match catalog.set_model(name) {
            Some(model) => format!("{} {}", "Switched to model:".green(), model.display_name),
            None => format!("Unknown model: {}", name).red().to_string(),
        },
        ModelAction::Invalid => "Invalid usage. Try /help for usage info."
            .yellow()
            .to_string(),
    }
}

pub fn unknown_command(name: &str) -> String {
    format!("Unknown command: {}", name).red().to_string()
}

pub fn history_cleared() -> String {
    "Conversation history cleared.".green().to_string()
}
