//! Console output for agent events

use super::markdown::render_markdown;
use super::panel::Panel;
use colored::{Color, Colorize};
use murlix_domain::AgentEvent;
use serde_json::Value;
use std::fmt::Display;

/// Formats runner events as terminal panels
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Panels for one event, in part order. Final replies come last.
    pub fn format_event(event: &AgentEvent) -> Vec<String> {
        let mut panels = Vec::new();

        for (_, name, args) in event.function_calls() {
            panels.push(Self::tool_call(name, args));
        }
        for (_, _, is_error) in event.function_responses() {
            panels.push(Self::tool_result(is_error));
        }

        if event.is_final_response() {
            let text = event.text();
            if !text.trim().is_empty() {
                panels.push(Self::reply(&text));
            }
        }

        panels
    }

    pub fn tool_call(name: &str, args: &Value) -> String {
        let body = format!("{}({})", name.cyan(), Self::format_args(args).dimmed());
        Panel::new(body)
            .title("Tool Call")
            .border_color(Color::Yellow)
            .render()
    }

    pub fn tool_result(is_error: bool) -> String {
        if is_error {
            Panel::new(format!("❌ {}", "Error in tool call".red()))
                .border_color(Color::Red)
                .render()
        } else {
            Panel::new(" Tool Called Successfully ".cyan().to_string())
                .border_color(Color::Green)
                .render()
        }
    }

    /// The assistant's final answer, markdown rendered.
    pub fn reply(text: &str) -> String {
        Panel::new(render_markdown(text.trim()))
            .title("Murlix")
            .border_color(Color::BrightGreen)
            .render()
    }

    pub fn error(error: &dyn Display) -> String {
        Panel::new(format!("❌ {} {}", "Error processing request:".red(), error))
            .border_color(Color::Red)
            .render()
    }

    /// `{"path": "a"}` → `path="a"`; non-object args are shown as JSON.
    fn format_args(args: &Value) -> String {
        match args {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", "),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}
