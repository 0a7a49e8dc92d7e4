//! Output formatting utilities with TTY auto-detection and semantic styling.

use std::io::IsTerminal;

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use unicode_width::UnicodeWidthChar;

use crate::config::{Config, is_quiet};
use crate::engine::TaskKind;

/// Output format for report commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-optimized: colors, aligned columns
    #[default]
    Pretty,
    /// Script-optimized: no colors, pipe-delimited
    Plain,
    /// Machine-readable JSON
    Json,
    /// Machine-readable YAML
    Yaml,
}

impl OutputFormat {
    /// Resolve the output format, applying TTY auto-detection.
    ///
    /// If format is Pretty but stdout is not a TTY, returns Plain.
    pub fn resolve(self) -> Self {
        match self {
            OutputFormat::Pretty if !std::io::stdout().is_terminal() => OutputFormat::Plain,
            other => other,
        }
    }
}

/// Get terminal width, defaulting to 80 if unavailable.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Truncate to at most `max_width` display columns, ending with "…" when cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return s.to_string();
    }
    if max_width <= 1 {
        return "…".to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

// ============================================================================
// Semantic Styling - Centralized color/style decisions
// ============================================================================

/// Task kind colors.
/// - Yellow: still open
/// - Green: completed
/// - Dimmed: canceled
/// - Magenta: marker not recognized under current settings
pub fn style_kind(kind: TaskKind) -> ColoredString {
    let name = kind.to_string();
    match kind {
        TaskKind::Incomplete => name.yellow(),
        TaskKind::Completed => name.green(),
        TaskKind::Canceled => name.dimmed(),
        TaskKind::Other => name.magenta(),
    }
}

/// Style for line numbers - always dimmed.
pub fn style_line_number(line: usize) -> ColoredString {
    format!("{:>4}", line).dimmed()
}

/// Style for paths.
pub fn style_path(path: &str) -> ColoredString {
    path.bold()
}

// ============================================================================
// Messages
// ============================================================================

/// Print a one-line summary of what a command did.
///
/// Goes to stderr when stdout carries the document itself.
pub fn print_summary(config: &Config, to_stderr: bool, message: &str) {
    if is_quiet(config) {
        return;
    }
    if to_stderr {
        eprintln!("{}", message);
    } else {
        println!("{}", message);
    }
}

/// Print a dimmed hint. Suppressed in quiet mode.
pub fn print_hint(config: &Config, message: &str) {
    if !is_quiet(config) {
        eprintln!("{}", format!("Hint: {}", message).dimmed());
    }
}

/// Print a configuration warning. Never suppressed.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

/// Pluralize a count for summaries: `2 task(s)` style.
pub fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count() {
        let cases = vec![(0, "task", "0 tasks"), (1, "task", "1 task"), (3, "line", "3 lines")];
        for (n, noun, want) in cases {
            assert_eq!(count(n, noun), want, "count({}, {:?})", n, noun);
        }
    }

    #[test]
    fn test_truncate_to_width() {
        let cases = vec![
            ("short", 10, "short"),
            ("exactly10!", 10, "exactly10!"),
            ("a longer task text", 8, "a longe…"),
            ("日本語のタスク", 7, "日本語…"),
            ("anything", 1, "…"),
        ];
        for (input, width, want) in cases {
            assert_eq!(
                truncate_to_width(input, width),
                want,
                "truncate_to_width({:?}, {})",
                input,
                width
            );
        }
    }

    #[test]
    fn test_style_kind_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(style_kind(TaskKind::Completed).to_string(), "completed");
        assert_eq!(style_kind(TaskKind::Other).to_string(), "other");
        assert_eq!(style_line_number(7).to_string(), "   7");
        colored::control::unset_override();
    }

    #[test]
    fn test_resolve_non_pretty_unchanged() {
        assert_eq!(OutputFormat::Json.resolve(), OutputFormat::Json);
        assert_eq!(OutputFormat::Plain.resolve(), OutputFormat::Plain);
    }
}
