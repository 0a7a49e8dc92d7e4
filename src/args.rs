//! Shared CLI argument structs for consistent flag definitions across commands.
//!
//! These structs centralize the document, settings override, and format flags.
//! Use `#[command(flatten)]` to include them in command-specific Args structs.

use std::path::Path;

use clap::Args;

use crate::config::{Config, ConfigSource};
use crate::document::MarkdownFile;
use crate::input::read_stdin_document;
use crate::output::OutputFormat;

// ============================================================================
// FormatArgs - Output format flags
// ============================================================================

/// Common output format flags.
///
/// Provides consistent --format/-f and --json flags across commands.
/// Use `resolve()` to get the effective format with TTY auto-detection.
#[derive(Args, Clone, Debug, Default)]
pub struct FormatArgs {
    /// Output format (auto-detects TTY for pretty vs plain)
    #[arg(short = 'f', long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Output as JSON (shorthand for --format=json)
    #[arg(long, conflicts_with = "format")]
    pub json: bool,
}

impl FormatArgs {
    /// Resolve the effective output format.
    ///
    /// Handles --json shorthand and applies TTY auto-detection for pretty mode.
    pub fn resolve(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format.resolve()
        }
    }
}

// ============================================================================
// DocumentArgs - Which document to edit
// ============================================================================

/// The markdown document a command edits.
#[derive(Args, Clone, Debug, Default)]
pub struct DocumentArgs {
    /// Markdown file ("-" reads stdin and writes the result to stdout)
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Print the rewritten document instead of saving it
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

impl DocumentArgs {
    /// Load the document from disk or stdin.
    pub fn open(&self) -> Result<MarkdownFile, String> {
        open_document(&self.file)
    }

    pub fn is_stdin(&self) -> bool {
        self.file == "-"
    }

    /// Whether stdout carries document contents, so messages must use stderr.
    pub fn stdout_is_document(&self) -> bool {
        self.dry_run || self.is_stdin()
    }
}

/// Load a markdown file, or read the document from stdin when `file` is "-".
pub fn open_document(file: &str) -> Result<MarkdownFile, String> {
    if file == "-" {
        Ok(MarkdownFile::from_stdin(read_stdin_document()?))
    } else {
        MarkdownFile::open(Path::new(file))
    }
}

// ============================================================================
// SettingsArgs - Per-invocation overrides of task settings
// ============================================================================

/// Flags that override task settings for one invocation.
///
/// Applied on top of the loaded configuration (files and environment).
#[derive(Args, Clone, Debug, Default)]
pub struct SettingsArgs {
    /// Log section header (default "## Log")
    #[arg(long, value_name = "TEXT")]
    pub header: Option<String>,

    /// Regex deleted from a task when it is marked
    #[arg(long, value_name = "REGEX")]
    pub remove: Option<String>,

    /// Date appended when marking, e.g. "YYYY-MM-DD" (empty disables)
    #[arg(long, value_name = "FORMAT")]
    pub append_date: Option<String>,

    /// Characters accepted inside an incomplete checkbox, e.g. " >"
    #[arg(long, value_name = "CHARS")]
    pub incomplete_values: Option<String>,

    /// Treat [-] as canceled and move it with completed tasks
    #[arg(long, overrides_with = "no_canceled")]
    pub canceled: bool,

    /// Do not treat [-] as finished
    #[arg(long, overrides_with = "canceled")]
    pub no_canceled: bool,

    /// Suppress summaries and hints
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl SettingsArgs {
    /// Return a copy of `base` with these flags applied.
    pub fn apply(&self, base: &Config) -> Config {
        let mut config = base.clone();
        self.apply_to(&mut config);
        config
    }

    /// Apply the flags in place, returning a source entry if anything changed.
    pub fn apply_to(&self, config: &mut Config) -> Option<ConfigSource> {
        let mut touched = false;
        let tasks = &mut config.tasks;

        if let Some(header) = &self.header {
            tasks.completed_area_header = header.clone();
            touched = true;
        }
        if let Some(remove) = &self.remove {
            tasks.remove_expression = remove.clone();
            touched = true;
        }
        if let Some(format) = &self.append_date {
            tasks.append_date_format = format.clone();
            touched = true;
        }
        if let Some(values) = &self.incomplete_values {
            tasks.incomplete_task_values = values.clone();
            touched = true;
        }
        if self.canceled {
            tasks.support_canceled_tasks = true;
            touched = true;
        } else if self.no_canceled {
            tasks.support_canceled_tasks = false;
            touched = true;
        }
        if self.quiet {
            config.behavior.quiet = true;
            touched = true;
        }

        touched.then_some(ConfigSource::CliFlag)
    }
}
