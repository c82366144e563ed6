//! Terminal output: panels, markdown and event formatting

pub mod banner;
pub mod console;
pub mod markdown;
pub mod panel;

/// Turn ANSI styling off for the whole process (`[output] color = false`).
///
/// `NO_COLOR` and `CLICOLOR` are honoured by `colored` on their own.
pub fn set_color_enabled(enabled: bool) {
    if !enabled {
        colored::control::set_override(false);
    }
}
