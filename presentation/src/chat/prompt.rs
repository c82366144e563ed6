//! Prompt and input echo

use colored::Colorize;
use murlix_domain::truncate;
use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};
use std::borrow::Cow;

/// Longest message preview echoed after input.
const ECHO_CHARS: usize = 100;

/// Two-line prompt: `┌─ Murlix ─┐` over `└─➤ `
pub struct MurlixPrompt {
    label: String,
}

impl MurlixPrompt {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Default for MurlixPrompt {
    fn default() -> Self {
        Self::new("Murlix")
    }
}

impl Prompt for MurlixPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(format!(
            "{}{}{}\n{}",
            "┌─ ".cyan(),
            self.label.bright_cyan().bold(),
            " ─┐".cyan(),
            "└─➤".cyan()
        ))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed(" ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("   ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}search: {}) ", prefix, history_search.term))
    }
}

/// One-line echo of what was submitted.
pub fn confirmation_line(input: &str) -> String {
    let input = input.trim();
    if input.starts_with('/') {
        format!("⚡ {} {}", "Command:".yellow(), input.bold())
    } else {
        format!("💬 {} {}", "Message:".cyan(), truncate(input, ECHO_CHARS))
    }
}
