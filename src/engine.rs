//! Line classification and whole-document task operations.
//!
//! Every operation reads the full text once and produces a full replacement.
//! Lines are classified on demand with the matchers held by a `Collector`; no
//! parsed structure is kept between operations.

use std::sync::LazyLock;

use log::debug;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::clock::Clock;
use crate::collector::Collector;
use crate::config::TaskSettings;
use crate::document::Document;
use crate::rules::{CHECKBOX_RE, COMPLETED_OR_CANCELED_RE, CompiledMatchers};

/// Indentation that keeps a line attached to the task above it.
static CONTINUATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^( {2,}|\t)").unwrap());

/// Marker written by the complete commands.
pub const COMPLETE_MARKER: char = 'x';

/// Marker written by the cancel command.
pub const CANCEL_MARKER: char = '-';

/// Finished state of a task line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Completed,
    Canceled,
}

/// Classification of a checkbox line for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Incomplete,
    Completed,
    Canceled,
    /// Checkbox whose marker is neither open nor finished under current settings
    Other,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskKind::Incomplete => "incomplete",
            TaskKind::Completed => "completed",
            TaskKind::Canceled => "canceled",
            TaskKind::Other => "other",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Log section state machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogState {
    OutsideLog,
    InsideLog,
}

/// What a line means to a top-to-bottom scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    /// The log header itself; the scan is now inside the log
    Header,
    /// Heading or `---` that closed the log section
    Boundary,
    /// Any line inside the log section
    LogBody,
    /// Any line outside the log section
    Body,
}

/// Two-state scanner tracking whether the current line is inside the log section.
///
/// Enters on a line whose trimmed text equals the header, leaves on the next
/// heading or `---`. The state at the end of the document is whatever it was last.
#[derive(Debug)]
pub struct LogTracker<'h> {
    header: &'h str,
    state: LogState,
}

impl<'h> LogTracker<'h> {
    pub fn new(header: &'h str) -> Self {
        Self {
            header,
            state: LogState::OutsideLog,
        }
    }

    /// Classify `line` and advance the state.
    pub fn step(&mut self, line: &str) -> LineRole {
        match self.state {
            LogState::InsideLog => {
                if is_section_boundary(line) {
                    self.state = LogState::OutsideLog;
                    LineRole::Boundary
                } else {
                    LineRole::LogBody
                }
            }
            LogState::OutsideLog => {
                if is_log_header(line, self.header) {
                    self.state = LogState::InsideLog;
                    LineRole::Header
                } else {
                    LineRole::Body
                }
            }
        }
    }
}

/// A heading (`#...`) or a `---` separator.
pub fn is_section_boundary(line: &str) -> bool {
    line.starts_with('#') || line.trim() == "---"
}

/// Whether `line` is the log header: its trimmed text equals `header` exactly.
pub fn is_log_header(line: &str, header: &str) -> bool {
    line.trim() == header
}

/// Split a CRLF line ending off so `$` anchors see the visible text.
fn split_carriage_return(line: &str) -> (&str, &str) {
    match line.strip_suffix('\r') {
        Some(body) => (body, "\r"),
        None => (line, ""),
    }
}

// ============================================================================
// Operation results
// ============================================================================

/// Result of an in-place rewrite (mark all, reset all).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// Lines whose text changed
    pub changed: usize,
}

/// Result of relocating completed tasks into the log section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub text: String,
    /// Top-level completed tasks moved
    pub moved_tasks: usize,
    /// Lines moved, continuation lines included
    pub moved_lines: usize,
    /// Whether the log header had to be appended
    pub header_created: bool,
}

/// One checkbox line found by `survey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskEntry {
    /// 1-based line number
    pub line: usize,
    pub kind: TaskKind,
    pub in_log: bool,
    pub text: String,
}

// ============================================================================
// Engine
// ============================================================================

/// Applies one settings generation to lines and documents.
pub struct LineEngine<'a> {
    collector: &'a Collector,
    clock: &'a dyn Clock,
}

impl<'a> LineEngine<'a> {
    pub fn new(collector: &'a Collector, clock: &'a dyn Clock) -> Self {
        Self { collector, clock }
    }

    fn settings(&self) -> &TaskSettings {
        self.collector.settings()
    }

    fn matchers(&self) -> &CompiledMatchers {
        self.collector.matchers()
    }

    fn finished_state(&self, marker: char) -> Option<TaskState> {
        match marker {
            'x' | 'X' => Some(TaskState::Completed),
            '-' if self.settings().support_canceled_tasks => Some(TaskState::Canceled),
            _ => None,
        }
    }

    /// Completed or canceled state of a line, honoring `support_canceled_tasks`.
    pub fn classify_task(&self, line: &str) -> Option<TaskState> {
        let caps = COMPLETED_OR_CANCELED_RE.captures(line)?;
        let marker_at = caps.get(1)?.end();
        let marker = line[marker_at..].chars().next()?;
        self.finished_state(marker)
    }

    /// Whether a checkbox line (any marker, any text after it) is finished.
    ///
    /// Looser than `classify_task`: no text is required after the bracket.
    pub fn is_completed_task(&self, line: &str) -> bool {
        CHECKBOX_RE
            .captures(line)
            .and_then(|caps| caps[2].chars().next())
            .and_then(|marker| self.finished_state(marker))
            .is_some()
    }

    pub fn is_incomplete_task(&self, line: &str) -> bool {
        self.matchers().incomplete.is_match(line)
    }

    /// Set the checkbox marker, strip removal matches, then append the date.
    ///
    /// A trailing `\r` is kept at the end of the rewritten line.
    pub fn update_task_line(&self, line: &str, marker: char) -> String {
        let (line, cr) = split_carriage_return(line);
        let matchers = self.matchers();
        let mut marked = matchers
            .incomplete
            .replace(line, |caps: &Captures| {
                format!("{}{}{}", &caps[1], marker, &caps[2])
            })
            .into_owned();

        if let Some(remove) = &matchers.remove {
            marked = remove.replace_all(&marked, "").into_owned();
        }

        let format = &self.settings().append_date_format;
        if !format.is_empty() {
            if !marked.ends_with(' ') {
                marked.push(' ');
            }
            marked.push_str(&self.clock.format_now(format));
        }

        marked.push_str(cr);
        marked
    }

    /// Reopen a completed or canceled task and strip the appended date.
    ///
    /// `x`, `X` and `-` are all reopened, whatever `support_canceled_tasks` says.
    pub fn reset_line(&self, line: &str) -> String {
        let (line, cr) = split_carriage_return(line);
        let opened = COMPLETED_OR_CANCELED_RE.replace(line, |caps: &Captures| {
            format!("{} {}", &caps[1], &caps[2])
        });
        let mut reset = match &self.matchers().reset {
            Some(reset) => reset.replace(&opened, "").into_owned(),
            None => opened.into_owned(),
        };
        reset.push_str(cr);
        reset
    }

    // ------------------------------------------------------------------------
    // Whole-text operations
    // ------------------------------------------------------------------------

    /// Mark every incomplete task, log section included.
    pub fn mark_all(&self, text: &str, marker: char) -> Rewrite {
        let mut changed = 0;
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| {
                if !self.is_incomplete_task(line) {
                    return line.to_string();
                }
                let updated = self.update_task_line(line, marker);
                if updated != line {
                    changed += 1;
                }
                updated
            })
            .collect();

        debug!("mark_all({:?}): {} line(s) changed", marker, changed);
        Rewrite {
            text: lines.join("\n"),
            changed,
        }
    }

    /// Reopen finished tasks outside the log section.
    pub fn reset_all(&self, text: &str) -> Rewrite {
        let mut tracker = LogTracker::new(self.settings().log_header());
        let mut changed = 0;
        let mut lines = Vec::new();

        for line in text.split('\n') {
            match tracker.step(line) {
                LineRole::Body if COMPLETED_OR_CANCELED_RE.is_match(line) => {
                    let reset = self.reset_line(line);
                    if reset != line {
                        changed += 1;
                    }
                    lines.push(reset);
                }
                _ => lines.push(line.to_string()),
            }
        }

        debug!("reset_all: {} line(s) changed", changed);
        Rewrite {
            text: lines.join("\n"),
            changed,
        }
    }

    /// Move finished tasks, with their indented continuation lines, to the top
    /// of the log section, creating the section if the document has none.
    ///
    /// Only the first log section is collected; a later header keeps its body
    /// where it is.
    pub fn collect_completed(&self, text: &str) -> Relocation {
        let header = self.settings().log_header();
        let mut lines: Vec<&str> = text.split('\n').collect();

        let header_created = !lines.iter().any(|line| is_log_header(line, header));
        if header_created {
            if lines.last().is_some_and(|line| !line.trim().is_empty()) {
                lines.push("");
            }
            lines.push(header);
        }

        let mut tracker = LogTracker::new(header);
        let mut remaining: Vec<&str> = Vec::with_capacity(lines.len());
        let mut new_tasks: Vec<&str> = Vec::new();
        let mut completed_section: Vec<&str> = Vec::new();
        let mut insertion: Option<usize> = None;
        let mut log_sections = 0;
        let mut in_task = false;
        let mut moved_tasks = 0;

        for line in lines {
            match tracker.step(line) {
                LineRole::Header => {
                    in_task = false;
                    log_sections += 1;
                    remaining.push(line);
                    if insertion.is_none() {
                        insertion = Some(remaining.len());
                    }
                }
                LineRole::LogBody if log_sections == 1 => completed_section.push(line),
                LineRole::LogBody => remaining.push(line),
                LineRole::Boundary => {
                    in_task = false;
                    remaining.push(line);
                }
                LineRole::Body => {
                    let is_checkbox = CHECKBOX_RE.is_match(line);
                    if is_checkbox && self.is_completed_task(line) {
                        in_task = true;
                        moved_tasks += 1;
                        new_tasks.push(line);
                    } else if in_task && !is_checkbox && CONTINUATION_RE.is_match(line) {
                        new_tasks.push(line);
                    } else {
                        in_task = false;
                        remaining.push(line);
                    }
                }
            }
        }

        let at = insertion.unwrap_or(remaining.len());
        let moved_lines = new_tasks.len();

        let mut result: Vec<&str> =
            Vec::with_capacity(remaining.len() + new_tasks.len() + completed_section.len());
        result.extend_from_slice(&remaining[..at]);
        result.extend(new_tasks);
        result.extend(completed_section);
        result.extend_from_slice(&remaining[at..]);

        debug!(
            "collect_completed: {} task(s), {} line(s), header_created={}",
            moved_tasks, moved_lines, header_created
        );
        Relocation {
            text: result.join("\n"),
            moved_tasks,
            moved_lines,
            header_created,
        }
    }

    /// List every checkbox line with its classification and log membership.
    pub fn survey(&self, text: &str) -> Vec<TaskEntry> {
        let mut tracker = LogTracker::new(self.settings().log_header());
        let mut entries = Vec::new();

        for (index, line) in text.split('\n').enumerate() {
            let in_log = tracker.step(line) == LineRole::LogBody;
            if !CHECKBOX_RE.is_match(line) {
                continue;
            }

            let kind = if self.is_incomplete_task(line) {
                TaskKind::Incomplete
            } else {
                match self.classify_task(line) {
                    Some(TaskState::Completed) => TaskKind::Completed,
                    Some(TaskState::Canceled) => TaskKind::Canceled,
                    None => TaskKind::Other,
                }
            };

            entries.push(TaskEntry {
                line: index + 1,
                kind,
                in_log,
                text: line.to_string(),
            });
        }

        entries
    }

    // ------------------------------------------------------------------------
    // Document operations
    // ------------------------------------------------------------------------

    /// Mark the task on the cursor line if it is incomplete.
    ///
    /// Returns whether the line was rewritten. Finished tasks are never re-marked.
    pub fn mark_one_line(&self, doc: &mut impl Document, marker: char) -> bool {
        let index = doc.cursor_line();
        let Some(line) = doc.line(index) else {
            return false;
        };
        if !self.is_incomplete_task(&line) {
            debug!("line {} is not an incomplete task", index + 1);
            return false;
        }
        doc.set_line(index, self.update_task_line(&line, marker));
        true
    }

    /// Mark every incomplete task in the document.
    pub fn mark_all_lines(&self, doc: &mut impl Document, marker: char) -> usize {
        let rewrite = self.mark_all(&doc.text(), marker);
        if rewrite.changed > 0 {
            doc.set_text(rewrite.text);
        }
        rewrite.changed
    }

    /// Reopen every finished task outside the log section.
    pub fn reset_all_lines(&self, doc: &mut impl Document) -> usize {
        let rewrite = self.reset_all(&doc.text());
        if rewrite.changed > 0 {
            doc.set_text(rewrite.text);
        }
        rewrite.changed
    }

    /// Move finished tasks into the log section.
    pub fn move_completed_tasks(&self, doc: &mut impl Document) -> Relocation {
        let text = doc.text();
        let relocation = self.collect_completed(&text);
        if relocation.text != text {
            doc.set_text(relocation.text.clone());
        }
        relocation
    }
}
