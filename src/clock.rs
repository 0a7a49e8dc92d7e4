//! Current-time formatting for appended dates.
//!
//! Display formats use the token style found in note-taking apps (`YYYY-MM-DD`,
//! `MMM D, YYYY`, `[literal]` text) and are translated to chrono strftime.

use std::fmt::Write;

use chrono::{DateTime, Local, TimeZone};
use log::warn;

/// Source of the formatted "now" string appended to marked tasks.
pub trait Clock {
    fn format_now(&self, display_format: &str) -> String;
}

/// Wall clock in the local timezone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn format_now(&self, display_format: &str) -> String {
        render(&Local::now(), display_format)
    }
}

/// Display tokens and their strftime equivalents, longest first per letter.
const STRFTIME_TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("DDDD", "%j"),
    ("DDD", "%-j"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("A", "%p"),
    ("a", "%P"),
    ("ZZ", "%z"),
    ("Z", "%:z"),
];

/// Translate a display format into a chrono strftime string.
pub fn display_format_to_strftime(display_format: &str) -> String {
    let mut out = String::new();
    let mut rest = display_format;

    while let Some(c) = rest.chars().next() {
        if c == '['
            && let Some(end) = rest.find(']')
        {
            push_literal(&mut out, &rest[1..end]);
            rest = &rest[end + 1..];
            continue;
        }

        if c == '\\'
            && let Some(escaped) = rest[1..].chars().next()
        {
            let width = 1 + escaped.len_utf8();
            push_literal(&mut out, &rest[1..width]);
            rest = &rest[width..];
            continue;
        }

        if let Some((token, spec)) = STRFTIME_TOKENS.iter().find(|(t, _)| rest.starts_with(t)) {
            out.push_str(spec);
            rest = &rest[token.len()..];
            continue;
        }

        push_literal(&mut out, &rest[..c.len_utf8()]);
        rest = &rest[c.len_utf8()..];
    }

    out
}

fn push_literal(out: &mut String, text: &str) {
    out.push_str(&text.replace('%', "%%"));
}

/// Format `now` with a display format; an unrenderable format yields an empty string.
pub fn render<Tz: TimeZone>(now: &DateTime<Tz>, display_format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let pattern = display_format_to_strftime(display_format);
    let mut out = String::new();
    if write!(out, "{}", now.format(&pattern)).is_err() {
        warn!("cannot render date format '{}'", display_format);
        return String::new();
    }
    out
}

/// Clock pinned to one instant.
#[cfg(test)]
pub struct FixedClock(pub DateTime<chrono::FixedOffset>);

#[cfg(test)]
impl FixedClock {
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        let offset = chrono::FixedOffset::east_opt(0).unwrap();
        Self(
            offset
                .with_ymd_and_hms(year, month, day, hour, minute, 0)
                .single()
                .unwrap(),
        )
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn format_now(&self, display_format: &str) -> String {
        render(&self.0, display_format)
    }
}
