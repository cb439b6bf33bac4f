//! `[[name key="value"]]` invocations.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Macro, MacroArgs};

/// Double-bracketed span; the body may cross lines but never contains `]`.
pub(crate) static MACRO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());

/// Collect unescaped macro invocations in document order.
///
/// An invocation immediately preceded by a backslash is escaped and skipped.
pub fn extract(source: &str) -> Vec<Macro> {
    MACRO_RE
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if is_escaped(source, whole.start()) {
                log::trace!("escaped macro at {}", whole.start());
                return None;
            }
            let (name, args) = parse_invocation(&caps[1]);
            Some(Macro {
                name,
                args,
                full_match: whole.as_str().to_string(),
            })
        })
        .collect()
}

/// Whether the byte before `at` is a backslash.
pub(crate) fn is_escaped(source: &str, at: usize) -> bool {
    at > 0 && source.as_bytes()[at - 1] == b'\\'
}

/// Split an invocation body into its name and parsed arguments.
pub(crate) fn parse_invocation(body: &str) -> (String, MacroArgs) {
    let body = body.trim();
    match body.find(char::is_whitespace) {
        Some(at) => {
            let name = body[..at].to_string();
            let args = parse_attributes(&normalize_whitespace(&body[at..]));
            (name, args)
        }
        None => (body.to_string(), MacroArgs::new()),
    }
}

/// Collapse tabs, newlines and runs of spaces to single spaces.
fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse HTML-attribute style `key="value"` pairs.
///
/// Accepts double-quoted, single-quoted, unquoted and bare (valueless)
/// attributes; the first occurrence of a key wins. Character references in
/// values are decoded.
pub(crate) fn parse_attributes(attrs: &str) -> MacroArgs {
    let mut args = MacroArgs::new();
    let mut remaining = attrs.trim_start();

    while !remaining.is_empty() {
        let key_end = remaining
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(remaining.len());
        if key_end == 0 {
            // Stray `=` with no name in front of it.
            remaining = remaining[1..].trim_start();
            continue;
        }
        let key = &remaining[..key_end];
        let after_key = remaining[key_end..].trim_start();

        let (value, rest) = match after_key.strip_prefix('=') {
            Some(after_eq) => split_value(after_eq.trim_start()),
            None => ("", after_key),
        };

        args.entry(key.to_string())
            .or_insert_with(|| html_escape::decode_html_entities(value).into_owned());
        remaining = rest.trim_start();
    }

    args
}

/// Split a value off the front of `s`, returning `(value, rest)`.
fn split_value(s: &str) -> (&str, &str) {
    for quote in ['"', '\''] {
        if let Some(stripped) = s.strip_prefix(quote) {
            return match stripped.find(quote) {
                Some(end) => (&stripped[..end], &stripped[end + 1..]),
                // Unterminated: the value runs to the end.
                None => (stripped, ""),
            };
        }
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    (&s[..end], &s[end..])
}
