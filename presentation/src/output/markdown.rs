//! Markdown to ANSI terminal text.
//!
//! Model replies are CommonMark. Block structure is kept (headings, lists,
//! quotes, code blocks) and inline markup becomes terminal styling.

use colored::Colorize;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

const RULE_WIDTH: usize = 40;

/// Render CommonMark as styled terminal text.
pub fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut renderer = Renderer::default();
    for event in Parser::new_ext(markdown, options) {
        renderer.event(event);
    }
    renderer.finish()
}

struct Link {
    url: String,
    /// Output length when the link opened, to detect autolinks.
    start: usize,
}

#[derive(Default)]
struct Renderer {
    out: String,
    at_line_start: bool,
    bold: usize,
    italic: usize,
    strike: usize,
    heading: Option<HeadingLevel>,
    links: Vec<Link>,
    /// Next number per open list, `None` for bullets.
    lists: Vec<Option<u64>>,
    /// Set right after a list marker until the item's first text.
    item_open: bool,
    quote_depth: usize,
    code_block: Option<String>,
}

impl Renderer {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match self.code_block.as_mut() {
                Some(buffer) => buffer.push_str(&text),
                None => {
                    let styled = self.style(&text);
                    self.write(&styled);
                }
            },
            Event::Code(code) => {
                let styled = code.yellow().to_string();
                self.write(&styled);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.write(&html),
            Event::SoftBreak => self.write(" "),
            Event::HardBreak => self.newline(),
            Event::Rule => {
                self.blank_line();
                let rule = "─".repeat(RULE_WIDTH).dimmed().to_string();
                self.write(&rule);
                self.newline();
            }
            Event::TaskListMarker(checked) => {
                self.write(if checked { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.blank_line();
                } else if !self.item_open {
                    self.newline();
                }
            }
            Tag::Heading { level, .. } => {
                self.blank_line();
                self.heading = Some(level);
            }
            Tag::BlockQuote(_) => {
                self.blank_line();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.blank_line();
                if let CodeBlockKind::Fenced(lang) = kind
                    && !lang.is_empty()
                {
                    let label = lang.dimmed().to_string();
                    self.write(&label);
                    self.newline();
                }
                self.code_block = Some(String::new());
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.blank_line();
                } else {
                    self.newline();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.newline();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => format!("{} ", "•".cyan()),
                };
                let quote = self.quote_prefix();
                self.out.push_str(&quote);
                self.out.push_str(&"  ".repeat(depth));
                self.out.push_str(&marker);
                self.at_line_start = false;
                self.item_open = true;
            }
            Tag::Emphasis => self.italic += 1,
            Tag::Strong => self.bold += 1,
            Tag::Strikethrough => self.strike += 1,
            Tag::Link { dest_url, .. } => self.links.push(Link {
                url: dest_url.to_string(),
                start: self.out.len(),
            }),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.newline(),
            TagEnd::Heading(_) => {
                self.heading = None;
                self.newline();
            }
            TagEnd::BlockQuote { .. } => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.newline();
            }
            TagEnd::CodeBlock => {
                let code = self.code_block.take().unwrap_or_default();
                for line in code.lines() {
                    let styled = format!("  {}", line.green());
                    self.write(&styled);
                    self.newline();
                }
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.newline();
            }
            TagEnd::Item => {
                self.item_open = false;
                self.newline();
            }
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Strikethrough => self.strike = self.strike.saturating_sub(1),
            TagEnd::Link => {
                if let Some(link) = self.links.pop() {
                    let shown = super::panel::strip_ansi(&self.out[link.start..]);
                    if !link.url.is_empty() && shown != link.url {
                        let url = format!(" ({})", link.url).dimmed().to_string();
                        self.write(&url);
                    }
                }
            }
            _ => {}
        }
    }

    fn style(&self, text: &str) -> String {
        let mut styled = text.normal();
        match self.heading {
            Some(HeadingLevel::H1) => styled = styled.bold().underline().cyan(),
            Some(_) => styled = styled.bold().cyan(),
            None => {}
        }
        if self.bold > 0 {
            styled = styled.bold();
        }
        if self.italic > 0 {
            styled = styled.italic();
        }
        if self.strike > 0 {
            styled = styled.strikethrough();
        }
        if !self.links.is_empty() {
            styled = styled.blue().underline();
        }
        styled.to_string()
    }

    fn quote_prefix(&self) -> String {
        "│ ".dimmed().to_string().repeat(self.quote_depth)
    }

    fn write(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.at_line_start {
            let quote = self.quote_prefix();
            self.out.push_str(&quote);
            self.out.push_str(&"  ".repeat(self.lists.len()));
            self.at_line_start = false;
        }
        self.item_open = false;
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.at_line_start = true;
    }

    fn blank_line(&mut self) {
        self.newline();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn finish(self) -> String {
        self.out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::panel::strip_ansi;

    fn plain(md: &str) -> String {
        strip_ansi(&render_markdown(md))
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(plain(""), "");
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain("hello world"), "hello world");
    }

    #[test]
    fn test_heading_and_paragraph() {
        assert_eq!(plain("# Title\n\nHello **world**"), "Title\n\nHello world");
    }

    #[test]
    fn test_soft_break_joins_lines() {
        assert_eq!(plain("one\ntwo"), "one two");
    }

    #[test]
    fn test_bullet_list() {
        assert_eq!(plain("- a\n- b"), "• a\n• b");
    }

    #[test]
    fn test_ordered_list_keeps_start() {
        assert_eq!(plain("3. x\n4. y"), "3. x\n4. y");
    }

    #[test]
    fn test_nested_list() {
        assert_eq!(plain("- a\n  - b\n- c"), "• a\n  • b\n• c");
    }

    #[test]
    fn test_paragraph_then_list() {
        assert_eq!(plain("Intro\n\n- a"), "Intro\n\n• a");
    }

    #[test]
    fn test_loose_list() {
        assert_eq!(plain("- a\n\n- b"), "• a\n• b");
    }

    #[test]
    fn test_code_block() {
        let out = plain("Run:\n\n```rust\nfn main() {}\n```");
        assert!(out.starts_with("Run:\n\nrust\n"));
        assert!(out.contains("  fn main() {}"));
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(plain("use `cargo`"), "use cargo");
    }

    #[test]
    fn test_link_shows_url() {
        assert_eq!(plain("[docs](https://x.dev)"), "docs (https://x.dev)");
        assert_eq!(plain("<https://x.dev>"), "https://x.dev");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(plain("> quoted"), "│ quoted");
    }

    #[test]
    fn test_rule() {
        let expected = format!("a\n\n{}\n\nb", "─".repeat(RULE_WIDTH));
        assert_eq!(plain("a\n\n---\n\nb"), expected);
    }

    #[test]
    fn test_task_list() {
        assert_eq!(plain("- [x] done\n- [ ] todo"), "• [x] done\n• [ ] todo");
    }
}
