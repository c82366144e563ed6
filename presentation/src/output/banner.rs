//! Welcome screen and the fixed status panels.

use super::panel::Panel;
use colored::{Color, Colorize};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::io::{self, BufRead, Write};

const LOGO: &str = r#"┌────────┬───────────────────┬───┐
│        │  ●   ●   ●   ●   ● │   │  ♪♫♪ ♪♫♪
└────────┴───────────────────┴───┘

███╗   ███╗██╗   ██╗██████╗ ██╗     ██╗██╗  ██╗
████╗ ████║██║   ██║██╔══██╗██║     ██║╚██╗██╔╝
██╔████╔██║██║   ██║██████╔╝██║     ██║ ╚███╔╝
██║╚██╔╝██║██║   ██║██╔══██╗██║     ██║ ██╔██╗
██║ ╚═╝ ██║╚██████╔╝██║  ██║███████╗██║██╔╝ ██╗
╚═╝     ╚═╝ ╚═════╝ ╚═╝  ╚═╝╚══════╝╚═╝╚═╝  ╚═╝"#;

const GRADIENT: [Color; 4] = [Color::BrightCyan, Color::Cyan, Color::Blue, Color::BrightBlue];

/// The logo with one gradient color per line.
pub fn logo() -> String {
    LOGO.lines()
        .enumerate()
        .map(|(i, line)| line.color(GRADIENT[i % GRADIENT.len()]).bold().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn welcome_panel() -> String {
    Panel::new("✨ Welcome to Murlix".bold().to_string())
        .border_color(Color::BrightCyan)
        .render()
}

fn clear_screen() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0));
}

/// Clear the screen, show the logo and wait for Enter.
pub fn show_welcome() {
    clear_screen();
    println!("{}", welcome_panel());
    println!();
    println!("{}", logo());
    println!();
    print!("{}", "Press Enter to continue...".dimmed());
    let _ = io::stdout().flush();

    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
    clear_screen();
}

pub fn ready_panel() -> String {
    Panel::new(format!(
        "🚀 {}\n{}",
        "Murlix is ready to chat!".bold(),
        "Enhanced input with auto-completion enabled".dimmed()
    ))
    .border_color(Color::Green)
    .render()
}

pub fn help_hint() -> String {
    format!(
        "💡 {} Type {} to see available commands with auto-completion",
        "Tip:".yellow().bold(),
        "/".cyan()
    )
}

pub fn farewell_panel() -> String {
    Panel::new(format!(
        "👋 {}\n{}",
        "Thanks for using Murlix!".yellow(),
        "Session saved automatically".dimmed()
    ))
    .minimal()
    .padding(1)
    .render()
}

/// `continue-chat` with nothing to continue.
pub fn no_sessions_notice() -> String {
    "No existing sessions found. Starting new session...".yellow().to_string()
}

pub fn new_session_panel(session_id: &str) -> String {
    Panel::new(format!("✨ New session started: {}", session_id.bold()))
        .border_color(Color::Cyan)
        .render()
}

pub fn resumed_session_panel(session_id: &str) -> String {
    Panel::new(format!("🔄 Resumed session: {}", session_id.bold()))
        .border_color(Color::Green)
        .render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::panel::strip_ansi;

    #[test]
    fn test_logo_keeps_every_line() {
        let plain = strip_ansi(&logo());
        assert_eq!(plain, LOGO);
        assert_eq!(plain.lines().count(), 10);
    }

    #[test]
    fn test_panels_contain_messages() {
        assert!(strip_ansi(&welcome_panel()).contains("✨ Welcome to Murlix"));
        assert!(strip_ansi(&ready_panel()).contains("Murlix is ready to chat!"));
        assert!(strip_ansi(&help_hint()).contains("Type / to see available commands"));
        assert!(strip_ansi(&new_session_panel("abc")).contains("New session started: abc"));
        assert!(strip_ansi(&resumed_session_panel("abc")).contains("Resumed session: abc"));
        assert!(strip_ansi(&no_sessions_notice()).starts_with("No existing sessions found."));
    }

    #[test]
    fn test_farewell_is_borderless() {
        let plain = strip_ansi(&farewell_panel());
        assert!(plain.contains("Thanks for using Murlix!"));
        assert!(plain.contains("Session saved automatically"));
        assert!(!plain.contains('╭'));
    }
}
