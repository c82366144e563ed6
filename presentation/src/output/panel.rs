//! Boxed text panels.
//!
//! Widths are measured on visible characters: ANSI escapes are stripped and
//! wide glyphs count double, so colored content lines up with the border.

use colored::{Color, Colorize};
use unicode_width::UnicodeWidthStr;

/// Fallback when the terminal size cannot be read (e.g. output is piped).
const FALLBACK_TERMINAL_WIDTH: usize = 100;

/// Border drawn around a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    /// `╭─╮ │ ╰─╯`
    Rounded,
    /// No border, only padding
    Minimal,
}

/// A block of text drawn inside a border
#[derive(Debug, Clone)]
pub struct Panel {
    body: String,
    title: Option<String>,
    border: BorderStyle,
    color: Option<Color>,
    padding: usize,
    max_width: Option<usize>,
}

impl Panel {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            title: None,
            border: BorderStyle::Rounded,
            color: None,
            padding: 2,
            max_width: None,
        }
    }

    /// Left-aligned title in the top border.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn border(mut self, border: BorderStyle) -> Self {
        self.border = border;
        self
    }

    pub fn minimal(self) -> Self {
        self.border(BorderStyle::Minimal)
    }

    pub fn border_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Horizontal padding on each side of the body.
    pub fn padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Total width limit including the border; defaults to the terminal width.
    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    fn paint(&self, s: &str) -> String {
        match self.color {
            Some(color) => s.color(color).to_string(),
            None => s.to_string(),
        }
    }

    pub fn render(&self) -> String {
        let frame = match self.border {
            BorderStyle::Rounded => 2,
            BorderStyle::Minimal => 0,
        };
        let max_total = self.max_width.unwrap_or_else(terminal_width);
        let max_text = max_total
            .saturating_sub(frame + 2 * self.padding)
            .max(10);

        let lines: Vec<String> = self
            .body
            .lines()
            .flat_map(|line| wrap_line(line, max_text))
            .collect();
        let text_width = lines.iter().map(|l| visible_width(l)).max().unwrap_or(0);
        let title_width = self.title.as_deref().map(visible_width).unwrap_or(0);

        let mut inner = text_width + 2 * self.padding;
        if self.title.is_some() {
            // "─ title " plus at least one trailing rule
            inner = inner.max(title_width + 4);
        }

        let pad = " ".repeat(self.padding);
        let mut out = String::new();

        match self.border {
            BorderStyle::Rounded => {
                let top = match &self.title {
                    Some(title) => format!(
                        "{}{}{}",
                        self.paint("╭─ "),
                        title.bold(),
                        self.paint(&format!(" {}╮", "─".repeat(inner - title_width - 3)))
                    ),
                    None => self.paint(&format!("╭{}╮", "─".repeat(inner))),
                };
                out.push_str(&top);
                out.push('\n');
                for line in &lines {
                    let fill = " ".repeat(inner - 2 * self.padding - visible_width(line));
                    out.push_str(&format!(
                        "{}{}{}{}{}{}\n",
                        self.paint("│"),
                        pad,
                        line,
                        fill,
                        pad,
                        self.paint("│")
                    ));
                }
                out.push_str(&self.paint(&format!("╰{}╯", "─".repeat(inner))));
            }
            BorderStyle::Minimal => {
                if let Some(title) = &self.title {
                    out.push_str(&format!("{}{}\n", pad, title.bold()));
                }
                let body: Vec<String> = lines.iter().map(|line| format!("{}{}", pad, line)).collect();
                out.push_str(&body.join("\n"));
            }
        }

        out
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(FALLBACK_TERMINAL_WIDTH)
}

/// Remove ANSI escape sequences (CSI `ESC [ ... final`).
pub fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if ('\x40'..='\x7e').contains(&c) {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Display width of `s` ignoring ANSI escapes.
pub fn visible_width(s: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(s).as_str())
}

/// Break a line into pieces no wider than `width`, at spaces when possible.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if visible_width(line) <= width {
        return vec![line.to_string()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in line.split(' ') {
        let word_width = visible_width(word);
        let sep = usize::from(!current.is_empty());

        if current_width + sep + word_width <= width {
            if sep == 1 {
                current.push(' ');
            }
            current.push_str(word);
            current_width += sep + word_width;
            continue;
        }

        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
            current_width = 0;
        }

        if word_width <= width {
            current.push_str(word);
            current_width = word_width;
        } else {
            for piece in hard_split(word, width) {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                current_width = visible_width(&piece);
                current = piece;
            }
        }
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

/// Split a single word by display width, keeping escape sequences intact.
fn hard_split(word: &str, width: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    let mut chars = word.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            current.push(c);
            for c in chars.by_ref() {
                current.push(c);
                if ('\x40'..='\x7e').contains(&c) && c != '[' {
                    break;
                }
            }
            continue;
        }
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if current_width + w > width && current_width > 0 {
            pieces.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(c);
        current_width += w;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
