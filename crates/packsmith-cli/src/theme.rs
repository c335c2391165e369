//! CLI theme and styling.
//!
//! Progress lines keep their exact text; styling only wraps them, and
//! `colored` drops the escapes when output is not a terminal.

use colored::Colorize;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a phase boundary line.
    pub(crate) fn phase(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a line describing something that was added.
    pub(crate) fn success(text: &str) -> String {
        format!("{}", text.green())
    }

    /// Format a line describing something that was deleted.
    pub(crate) fn removal(text: &str) -> String {
        format!("{}", text.yellow())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{}", text.yellow().bold())
    }

    /// Format the `Error:` label.
    pub(crate) fn error_label() -> String {
        format!("{}", "Error:".red().bold())
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }
}

/// Indentation for per-plugin lines under a phase.
pub(crate) const ITEM_INDENT: &str = "        ";
