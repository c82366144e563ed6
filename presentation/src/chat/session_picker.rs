//! Numbered session picker for `load-chat`

use chrono::{DateTime, Local, TimeZone};
use colored::{Color, Colorize};
use murlix_domain::{SessionInfo, prefix_chars};
use std::fmt::Display;
use std::io::{self, BufRead, Write};

use crate::output::panel::Panel;

const ID_CHARS: usize = 7;
const SUMMARY_CHARS: usize = 50;

/// What the user picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerChoice {
    Resume(String),
    New,
    Cancel,
}

/// `Session ID: abcdefg • Last Updated: 01-02-2025 10:00:00  💬 summary...`
pub fn session_line<Tz: TimeZone>(id: &str, updated: &DateTime<Tz>, summary: &str) -> String
where
    Tz::Offset: Display,
{
    let timestamp = updated.format("%d-%m-%Y %H:%M:%S");
    let summary = summary.trim();
    if summary.is_empty() {
        format!("Session ID: {} • Last Updated: {}", prefix_chars(id, ID_CHARS), timestamp)
    } else {
        format!(
            "Session ID: {} • Last Updated: {}  💬 {}...",
            prefix_chars(id, ID_CHARS),
            timestamp,
            prefix_chars(summary, SUMMARY_CHARS)
        )
    }
}

/// Map the typed number to a choice. Sessions are numbered from 1, the
/// "new session" entry comes last; anything else cancels.
pub fn parse_selection(input: &str, sessions: &[SessionInfo]) -> PickerChoice {
    let Ok(n) = input.trim().parse::<usize>() else {
        return PickerChoice::Cancel;
    };
    match n {
        0 => PickerChoice::Cancel,
        n if n <= sessions.len() => PickerChoice::Resume(sessions[n - 1].id.clone()),
        n if n == sessions.len() + 1 => PickerChoice::New,
        _ => PickerChoice::Cancel,
    }
}

pub fn no_sessions_panel() -> String {
    Panel::new(format!("✨ {}", "No existing sessions found.".yellow()))
        .border_color(Color::Yellow)
        .render()
}

/// Print the list and read one line from stdin.
///
/// Callers handle the empty list themselves (see [`no_sessions_panel`]).
pub fn pick_session(sessions: &[SessionInfo]) -> io::Result<PickerChoice> {
    println!("🔍 {}", "Select a session to resume".cyan().bold());
    for (i, info) in sessions.iter().enumerate() {
        let updated = info.last_update_time.with_timezone(&Local);
        println!(
            "  {} {}",
            format!("{:>2}.", i + 1).cyan(),
            session_line(&info.id, &updated, info.summary_or_default())
        );
    }
    println!("  {} ✨ Start new session", format!("{:>2}.", sessions.len() + 1).cyan());
    print!("{} ", "Enter a number (empty to cancel):".dimmed());
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(PickerChoice::Cancel);
    }
    Ok(parse_selection(&line, sessions))
}
