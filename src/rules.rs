//! Compilation of user-authored settings strings into line matchers.
//!
//! The line engine never looks at raw settings strings: it consults the
//! `CompiledMatchers` produced here. Three matchers are configurable (remove,
//! reset, incomplete); the completed-or-canceled matcher is fixed.
//!
//! Compilation never aborts. Invalid input is reported as a `RulesError` and the
//! affected matcher degrades: remove and reset stay absent, incomplete falls back
//! to the blank-space checkbox.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use thiserror::Error;

use crate::config::TaskSettings;

/// Completed (`x`, `X`) or canceled (`-`) task. Group 1 is everything up to and
/// including `[`, group 2 is `]` onward. A space must follow the bracket.
pub static COMPLETED_OR_CANCELED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*- \[)[-xX](\] .*)$").unwrap());

/// Any checkbox line. Group 1 is the indentation, group 2 the marker.
pub static CHECKBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)- \[(.)\]").unwrap());

/// Open task with a single blank inside the checkbox.
static BLANK_INCOMPLETE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*- \[) (\].*)$").unwrap());

/// Display-format tokens understood by the reset translator, longest first per letter.
///
/// Covers every token the clock renders, so any appended date can be stripped again.
const DATE_TOKENS: &[(&str, &str)] = &[
    ("YYYY", r"\d{4}"),
    ("YY", r"\d{2}"),
    ("MMMM", "[A-Za-z]+"),
    ("MMM", "[A-Za-z]{3}"),
    ("MM", r"\d{2}"),
    ("M", r"\d{1,2}"),
    ("DDDD", r"\d{3}"),
    ("DDD", r"\d{1,3}"),
    ("DD", r"\d{2}"),
    ("D", r"\d{1,2}"),
    ("dddd", "[A-Za-z]+"),
    ("ddd", "[A-Za-z]{3}"),
    ("HH", r"\d{2}"),
    ("H", r"\d{1,2}"),
    ("hh", r"\d{2}"),
    ("h", r"\d{1,2}"),
    ("mm", r"\d{2}"),
    ("m", r"\d{1,2}"),
    ("ss", r"\d{2}"),
    ("s", r"\d{1,2}"),
    ("A", "(?:AM|PM)"),
    ("a", "(?:am|pm)"),
    ("ZZ", r"[+-]\d{4}"),
    ("Z", r"[+-]\d{2}:\d{2}"),
];

/// Configuration errors raised while compiling settings.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("invalid remove expression '{expression}': {source}")]
    RemoveExpression {
        expression: String,
        source: regex::Error,
    },

    #[error("append date format '{format}' cannot be matched on reset: {source}")]
    ResetPattern {
        format: String,
        source: regex::Error,
    },

    #[error("invalid incomplete task values '{values}': {source}")]
    IncompleteValues { values: String, source: regex::Error },
}

/// Matchers derived from one settings generation.
#[derive(Debug, Clone)]
pub struct CompiledMatchers {
    /// Text deleted from a line when it is marked
    pub remove: Option<Regex>,
    /// Trailing appended date stripped on reset
    pub reset: Option<Regex>,
    /// Open task; groups are the text before and after the marker
    pub incomplete: Regex,
}

impl Default for CompiledMatchers {
    fn default() -> Self {
        Self {
            remove: None,
            reset: None,
            incomplete: BLANK_INCOMPLETE_RE.clone(),
        }
    }
}

impl CompiledMatchers {
    /// Compile every configurable matcher, collecting errors instead of failing.
    pub fn compile(settings: &TaskSettings) -> (Self, Vec<RulesError>) {
        let mut errors = Vec::new();

        let remove = compile_remove_matcher(&settings.remove_expression).unwrap_or_else(|e| {
            errors.push(e);
            None
        });
        let reset = compile_reset_matcher(&settings.append_date_format).unwrap_or_else(|e| {
            errors.push(e);
            None
        });
        let incomplete =
            compile_incomplete_matcher(&settings.incomplete_task_values).unwrap_or_else(|e| {
                errors.push(e);
                BLANK_INCOMPLETE_RE.clone()
            });

        debug!(
            "compiled matchers: remove={:?} reset={:?} incomplete={:?} ({} error(s))",
            remove.as_ref().map(Regex::as_str),
            reset.as_ref().map(Regex::as_str),
            incomplete.as_str(),
            errors.len()
        );

        (
            Self {
                remove,
                reset,
                incomplete,
            },
            errors,
        )
    }
}

/// Compile the removal expression. Empty means no removal.
///
/// Matches are deleted everywhere in the line (`replace_all`), so no global flag
/// is needed on the pattern itself.
pub fn compile_remove_matcher(expression: &str) -> Result<Option<Regex>, RulesError> {
    if expression.is_empty() {
        return Ok(None);
    }
    Regex::new(expression)
        .map(Some)
        .map_err(|source| RulesError::RemoveExpression {
            expression: expression.to_string(),
            source,
        })
}

/// Compile a matcher for a date appended in `display_format`, anchored to line end.
///
/// The single space placed before the date on append is consumed too, so a reset
/// restores the line without a dangling separator.
pub fn compile_reset_matcher(display_format: &str) -> Result<Option<Regex>, RulesError> {
    if display_format.is_empty() {
        return Ok(None);
    }
    let pattern = format!("[ ]?{}$", date_format_to_pattern(display_format));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|source| RulesError::ResetPattern {
            format: display_format.to_string(),
            source,
        })
}

/// Translate a display format (e.g. `YYYY-MM-DD`) into a regex body.
///
/// `[...]` spans are literal and lose their brackets, `\x` is a literal `x`, and
/// known tokens become digit or letter classes. Anything else, parentheses
/// included, is escaped so it matches itself.
pub fn date_format_to_pattern(display_format: &str) -> String {
    let mut pattern = String::new();
    let mut rest = display_format;

    while let Some(c) = rest.chars().next() {
        if c == '['
            && let Some(end) = rest.find(']')
        {
            pattern.push_str(&regex::escape(&rest[1..end]));
            rest = &rest[end + 1..];
            continue;
        }

        if c == '\\'
            && let Some(escaped) = rest[1..].chars().next()
        {
            let width = 1 + escaped.len_utf8();
            pattern.push_str(&regex::escape(&rest[1..width]));
            rest = &rest[width..];
            continue;
        }

        if let Some((token, replacement)) = DATE_TOKENS.iter().find(|(t, _)| rest.starts_with(t)) {
            pattern.push_str(replacement);
            rest = &rest[token.len()..];
            continue;
        }

        pattern.push_str(&regex::escape(&rest[..c.len_utf8()]));
        rest = &rest[c.len_utf8()..];
    }

    pattern
}

/// Compile the incomplete-task matcher for the allowed checkbox contents.
///
/// Empty means exactly one blank. Characters with meaning inside a character
/// class are escaped, so any set of characters is accepted literally.
pub fn compile_incomplete_matcher(marker_set: &str) -> Result<Regex, RulesError> {
    if marker_set.is_empty() {
        return Ok(BLANK_INCOMPLETE_RE.clone());
    }
    let class: String = marker_set.chars().map(escape_class_char).collect();
    Regex::new(&format!(r"^(\s*- \[)[{}](\].*)$", class)).map_err(|source| {
        RulesError::IncompleteValues {
            values: marker_set.to_string(),
            source,
        }
    })
}

fn escape_class_char(c: char) -> String {
    match c {
        '\\' | '[' | ']' | '^' | '-' | '&' | '~' => format!("\\{}", c),
        _ => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_format_to_pattern() {
        let cases = vec![
            ("YYYY-MM-DD", r"\d{4}\-\d{2}\-\d{2}"),
            ("D/M/YY", r"\d{1,2}/\d{1,2}/\d{2}"),
            ("MMM D, YYYY", r"[A-Za-z]{3} \d{1,2}, \d{4}"),
            ("[(]YYYY-MM-DD[)]", r"\(\d{4}\-\d{2}\-\d{2}\)"),
            ("(YYYY)", r"\(\d{4}\)"),
            ("[done] YYYY", r"done \d{4}"),
            ("DD.MM.YYYY", r"\d{2}\.\d{2}\.\d{4}"),
            ("HH:mm", r"\d{2}:\d{2}"),
            ("MMMM D", r"[A-Za-z]+ \d{1,2}"),
            ("dddd h:mm a", r"[A-Za-z]+ \d{1,2}:\d{2} (?:am|pm)"),
            ("DDDD/DDD", r"\d{3}/\d{1,3}"),
            ("YYYY ZZ", r"\d{4} [+-]\d{4}"),
            (r"\DD", r"D\d{1,2}"),
        ];

        for (format, want) in cases {
            let got = date_format_to_pattern(format);
            assert_eq!(
                got, want,
                "date_format_to_pattern({:?}) = {:?}, want {:?}",
                format, got, want
            );
        }
    }

    #[test]
    fn test_unclosed_literal_bracket_is_escaped() {
        let pattern = date_format_to_pattern("[YYYY");
        assert_eq!(pattern, r"\[\d{4}");
        assert!(Regex::new(&pattern).is_ok());
    }

    #[test]
    fn test_compile_remove_matcher() {
        assert!(compile_remove_matcher("").unwrap().is_none());

        let re = compile_remove_matcher(r"#todo\s*").unwrap().unwrap();
        assert_eq!(re.replace_all("- [x] a #todo b #todo", ""), "- [x] a b ");

        let err = compile_remove_matcher("(unclosed").unwrap_err();
        assert!(matches!(err, RulesError::RemoveExpression { .. }));
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_compile_reset_matcher() {
        assert!(compile_reset_matcher("").unwrap().is_none());

        let re = compile_reset_matcher("YYYY-MM-DD").unwrap().unwrap();
        let cases = vec![
            ("- [ ] buy milk 2024-01-05", "- [ ] buy milk"),
            ("- [ ] buy milk2024-01-05", "- [ ] buy milk"),
            ("- [ ] 2024-01-05 buy milk", "- [ ] 2024-01-05 buy milk"),
            ("- [ ] buy milk", "- [ ] buy milk"),
        ];
        for (line, want) in cases {
            let got = re.replace(line, "");
            assert_eq!(got, want, "reset strip of {:?}", line);
        }
    }

    #[test]
    fn test_compile_reset_matcher_literal_parens() {
        let re = compile_reset_matcher("[(]MMM D[)]").unwrap().unwrap();
        assert_eq!(re.replace("- [ ] task (Jan 5)", ""), "- [ ] task");
        assert_eq!(re.replace("- [ ] task Jan 5", ""), "- [ ] task Jan 5");
    }

    #[test]
    fn test_compile_incomplete_matcher_default() {
        let re = compile_incomplete_matcher("").unwrap();
        let cases = vec![
            ("- [ ] open", true),
            ("  - [ ] nested", true),
            ("- [ ]", true),
            ("- [x] done", false),
            ("- [>] deferred", false),
            ("* [ ] star bullet", false),
            ("- [  ] two blanks", false),
        ];
        for (line, want) in cases {
            assert_eq!(re.is_match(line), want, "incomplete({:?})", line);
        }
    }

    #[test]
    fn test_compile_incomplete_matcher_custom_set() {
        let re = compile_incomplete_matcher(" >").unwrap();
        assert!(re.is_match("- [ ] open"));
        assert!(re.is_match("- [>] deferred"));
        assert!(!re.is_match("- [x] done"));

        let caps = re.captures("  - [>] later").unwrap();
        assert_eq!(&caps[1], "  - [");
        assert_eq!(&caps[2], "] later");
    }

    #[test]
    fn test_compile_incomplete_matcher_escapes_class_chars() {
        let re = compile_incomplete_matcher("]^-\\").unwrap();
        for marker in [']', '^', '-', '\\'] {
            let line = format!("- [{}] task", marker);
            assert!(re.is_match(&line), "marker {:?} should be incomplete", marker);
        }
        assert!(!re.is_match("- [ ] task"));
        assert!(!re.is_match("- [a] task"));
    }

    #[test]
    fn test_completed_or_canceled() {
        let cases = vec![
            ("- [x] done", true),
            ("- [X] done", true),
            ("- [-] dropped", true),
            ("    - [x] nested", true),
            ("- [x]", false),
            ("- [ ] open", false),
            ("- [/] half", false),
        ];
        for (line, want) in cases {
            assert_eq!(
                COMPLETED_OR_CANCELED_RE.is_match(line),
                want,
                "completed_or_canceled({:?})",
                line
            );
        }
    }

    #[test]
    fn test_compile_collects_errors_and_degrades() {
        let settings = TaskSettings {
            remove_expression: "[".to_string(),
            append_date_format: "YYYY".to_string(),
            ..TaskSettings::default()
        };
        let (matchers, errors) = CompiledMatchers::compile(&settings);

        assert_eq!(errors.len(), 1);
        assert!(matchers.remove.is_none());
        assert!(matchers.reset.is_some());
        assert!(matchers.incomplete.is_match("- [ ] still works"));
    }
}
