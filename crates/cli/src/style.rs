//! Terminal styling for commitwall output.

use console::{style, Style};

/// Outcome marker shown in front of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Ok,
    Skipped,
    Failed,
}

impl Mark {
    fn glyph(self) -> String {
        match self {
            Mark::Ok => style("✓").green().to_string(),
            Mark::Skipped => style("⚠").yellow().to_string(),
            Mark::Failed => style("✗").red().to_string(),
        }
    }
}

/// `msg` prefixed with its outcome marker.
pub fn marked(mark: Mark, msg: &str) -> String {
    format!("{} {}", mark.glyph(), msg)
}

pub fn title(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

pub fn muted(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

/// A left-aligned summary row, `  label : value`.
pub fn row(label: &str, value: impl std::fmt::Display) -> String {
    format!("  {:<13}: {}", label, value)
}
