//! Tab completion for slash commands

use super::commands::{COMMANDS, CommandSpec};
use reedline::{Completer, Span, Suggestion};

/// Completes `/command` names from a fixed command list.
///
/// Active only while the text before the cursor is empty or a single word
/// starting with `/`; matching is a case-insensitive prefix match.
pub struct SlashCompleter {
    commands: &'static [CommandSpec],
}

impl SlashCompleter {
    pub fn new() -> Self {
        Self { commands: COMMANDS }
    }

    /// Commands matching the text before the cursor.
    pub fn matches(&self, typed: &str) -> Vec<&'static CommandSpec> {
        if typed.chars().any(char::is_whitespace) {
            return Vec::new();
        }
        let prefix = match typed {
            "" => "",
            t => match t.strip_prefix('/') {
                Some(rest) => rest,
                None => return Vec::new(),
            },
        }
        .to_lowercase();

        self.commands
            .iter()
            .filter(|c| c.name.starts_with(&prefix))
            .collect()
    }
}

impl Default for SlashCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for SlashCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let typed = line.get(..pos).unwrap_or(line);
        self.matches(typed)
            .into_iter()
            .map(|c| Suggestion {
                value: c.slash_name(),
                description: Some(c.description.to_string()),
                span: Span::new(0, pos),
                append_whitespace: c.usage != c.slash_name(),
                ..Default::default()
            })
            .collect()
    }
}
