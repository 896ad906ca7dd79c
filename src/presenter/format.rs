//! Display helpers for memo lists.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};

use crate::constants::{DEFAULT_SNIPPET_CHARS, PREVIEW_CHARS};

const ELLIPSIS: char = '…';

/// Keeps the first `max_chars` characters of `body`, appending `…` if anything was cut.
pub fn make_snippet(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut snippet = String::with_capacity(cut + ELLIPSIS.len_utf8());
            snippet.push_str(&body[..cut]);
            snippet.push(ELLIPSIS);
            snippet
        }
        None => body.to_string(),
    }
}

/// [`make_snippet`] with the default limit.
#[inline]
pub fn snippet(body: &str) -> String {
    make_snippet(body, DEFAULT_SNIPPET_CHARS)
}

/// Result-list preview of a memo body.
#[inline]
pub fn preview(body: &str) -> String {
    make_snippet(body, PREVIEW_CHARS)
}

/// Renders `ts` with `yyyy`, `MM`, `dd`, `HH`, `mm` and `ss` tokens; other text is
/// copied as is.
pub fn format_timestamp<T: Datelike + Timelike>(ts: &T, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut rest = pattern;

    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("yyyy") {
            out.push_str(&format!("{:04}", ts.year()));
            rest = tail;
            continue;
        }

        let token = [
            ("MM", ts.month()),
            ("dd", ts.day()),
            ("HH", ts.hour()),
            ("mm", ts.minute()),
            ("ss", ts.second()),
        ]
        .into_iter()
        .find(|(token, _)| rest.starts_with(token));

        match token {
            Some((token, value)) => {
                out.push_str(&format!("{value:02}"));
                rest = &rest[token.len()..];
            }
            None => {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    out.push(c);
                }
                rest = chars.as_str();
            }
        }
    }

    out
}

/// Renders a stored UTC timestamp in the time zone `tz`.
pub fn format_in<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz, pattern: &str) -> String {
    format_timestamp(&ts.with_timezone(tz), pattern)
}

/// Renders a stored UTC timestamp in the local time zone.
#[inline]
pub fn format_local(ts: &DateTime<Utc>, pattern: &str) -> String {
    format_in(ts, &Local, pattern)
}
