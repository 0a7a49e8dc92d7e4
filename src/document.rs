//! Host documents the engine reads from and writes back to.
//!
//! A document is plain text split on `\n` plus a cursor line. `MarkdownFile`
//! backs it with a file (or stdin) and keeps track of the final newline so a
//! rewrite does not strip it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;

/// Editor-like view of a document.
pub trait Document {
    /// Full text, lines joined with `\n`.
    fn text(&self) -> String;

    /// 0-based line the cursor is on.
    fn cursor_line(&self) -> usize;

    /// Replace the whole text.
    fn set_text(&mut self, text: String);

    /// Replace one line. Out-of-range indexes are ignored.
    fn set_line(&mut self, index: usize, line: String);

    /// Read a single line.
    fn line(&self, index: usize) -> Option<String> {
        self.text().split('\n').nth(index).map(str::to_string)
    }
}

/// In-memory document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    lines: Vec<String>,
    cursor: usize,
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
            cursor: 0,
        }
    }

    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl Document for TextBuffer {
    fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn cursor_line(&self) -> usize {
        self.cursor
    }

    fn set_text(&mut self, text: String) {
        self.lines = text.split('\n').map(str::to_string).collect();
    }

    fn set_line(&mut self, index: usize, line: String) {
        match self.lines.get_mut(index) {
            Some(slot) => *slot = line,
            None => debug!("set_line({}) past end of document", index),
        }
    }

    fn line(&self, index: usize) -> Option<String> {
        self.lines.get(index).cloned()
    }
}

/// A markdown document loaded from a file, or from stdin when `path` is `None`.
#[derive(Debug, Clone)]
pub struct MarkdownFile {
    path: Option<PathBuf>,
    buffer: TextBuffer,
    trailing_newline: bool,
    original: String,
}

impl MarkdownFile {
    /// Load a file from disk.
    pub fn open(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("reading {}: {}", path.display(), e))?;
        Ok(Self::from_content(Some(path.to_path_buf()), content))
    }

    /// Wrap text read from stdin; saving prints to stdout.
    pub fn from_stdin(content: String) -> Self {
        Self::from_content(None, content)
    }

    fn from_content(path: Option<PathBuf>, content: String) -> Self {
        let trailing_newline = content.ends_with('\n');
        let body = content.strip_suffix('\n').unwrap_or(&content);
        Self {
            path,
            buffer: TextBuffer::new(body),
            trailing_newline,
            original: body.to_string(),
        }
    }

    /// Place the cursor on a 0-based line.
    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.buffer = self.buffer.with_cursor(cursor);
        self
    }

    pub fn line_count(&self) -> usize {
        self.buffer.line_count()
    }

    /// Name for messages: the path, or `<stdin>`.
    pub fn display_name(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stdin>".to_string())
    }

    /// Whether the text differs from what was loaded.
    pub fn is_changed(&self) -> bool {
        self.buffer.text() != self.original
    }

    /// Full contents as they would be written, final newline restored.
    pub fn contents(&self) -> String {
        let mut content = self.buffer.text();
        if self.trailing_newline {
            content.push('\n');
        }
        content
    }

    /// Write back to the file, or to stdout for stdin documents.
    pub fn save(&self) -> Result<(), String> {
        match &self.path {
            Some(path) => fs::write(path, self.contents())
                .map_err(|e| format!("writing {}: {}", path.display(), e)),
            None => print_contents(&self.contents()),
        }
    }

    /// Whether saving writes to stdout.
    pub fn is_stdin(&self) -> bool {
        self.path.is_none()
    }
}

impl Document for MarkdownFile {
    fn text(&self) -> String {
        self.buffer.text()
    }

    fn cursor_line(&self) -> usize {
        self.buffer.cursor_line()
    }

    fn set_text(&mut self, text: String) {
        self.buffer.set_text(text);
    }

    fn set_line(&mut self, index: usize, line: String) {
        self.buffer.set_line(index, line);
    }

    fn line(&self, index: usize) -> Option<String> {
        self.buffer.line(index)
    }
}

/// Print document contents to stdout without adding a newline.
pub fn print_contents(contents: &str) -> Result<(), String> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(contents.as_bytes())
        .and_then(|_| stdout.flush())
        .map_err(|e| format!("writing stdout: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_buffer_lines() {
        let mut buffer = TextBuffer::new("a\nb\n\nc").with_cursor(1);

        assert_eq!(buffer.line_count(), 4);
        assert_eq!(buffer.cursor_line(), 1);
        assert_eq!(buffer.line(1).as_deref(), Some("b"));
        assert_eq!(buffer.line(2).as_deref(), Some(""));
        assert_eq!(buffer.line(4), None);

        buffer.set_line(1, "B".to_string());
        buffer.set_line(9, "ignored".to_string());
        assert_eq!(buffer.text(), "a\nB\n\nc");

        buffer.set_text("x\ny".to_string());
        assert_eq!(buffer.line_count(), 2);
    }

    #[test]
    fn test_default_line_uses_text() {
        struct Fixed;
        impl Document for Fixed {
            fn text(&self) -> String {
                "one\ntwo".to_string()
            }
            fn cursor_line(&self) -> usize {
                0
            }
            fn set_text(&mut self, _text: String) {}
            fn set_line(&mut self, _index: usize, _line: String) {}
        }

        assert_eq!(Fixed.line(1).as_deref(), Some("two"));
        assert_eq!(Fixed.line(2), None);
    }

    #[test]
    fn test_markdown_file_preserves_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, "- [ ] a\n- [ ] b\n").unwrap();

        let mut file = MarkdownFile::open(&path).unwrap();
        assert_eq!(file.text(), "- [ ] a\n- [ ] b");
        assert_eq!(file.line_count(), 2);
        assert!(!file.is_changed());

        file.set_line(0, "- [x] a".to_string());
        assert!(file.is_changed());
        file.save().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "- [x] a\n- [ ] b\n");
    }

    #[test]
    fn test_markdown_file_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, "- [ ] a").unwrap();

        let mut file = MarkdownFile::open(&path).unwrap();
        file.set_text("- [x] a".to_string());
        file.save().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "- [x] a");
    }

    #[test]
    fn test_markdown_file_open_missing() {
        let err = MarkdownFile::open(Path::new("/nonexistent/notes.md")).unwrap_err();
        assert!(err.starts_with("reading /nonexistent/notes.md"));
    }

    #[test]
    fn test_stdin_document() {
        let file = MarkdownFile::from_stdin("x\n".to_string()).with_cursor(0);
        assert!(file.is_stdin());
        assert_eq!(file.display_name(), "<stdin>");
        assert_eq!(file.contents(), "x\n");
    }
}
