//! `#tag` tokens.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::cursor::ExclusionZones;
use crate::types::Tag;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)(?:^|[ \t])(#[^\s#]+)").unwrap());

/// Collect tags that start a line or follow whitespace.
///
/// One trailing `:` or `.` is stripped. Purely numeric tags and tags inside
/// code or quotes are dropped.
pub fn extract(source: &str, zones: &ExclusionZones) -> Vec<Tag> {
    TAG_RE
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let token = caps.get(1)?;
            if zones.contains(token.start()) {
                return None;
            }

            let tag = token
                .as_str()
                .strip_suffix([':', '.'])
                .unwrap_or(token.as_str());
            let name = &tag[1..];
            if name.is_empty() || name.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }

            let length = token.start() - whole.start() + tag.len();
            Some(Tag {
                index: whole.start(),
                length,
                full_match: source[whole.start()..whole.start() + length].to_string(),
                tag: tag.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CodeSpan, CodeSpanKind, Span};

    fn tags(source: &str) -> Vec<String> {
        extract(source, &ExclusionZones::default())
            .into_iter()
            .map(|t| t.tag)
            .collect()
    }

    #[test]
    fn tag_after_whitespace_includes_it_in_match() {
        let found = extract("\nHello #tag", &ExclusionZones::default());
        assert_eq!(
            found,
            vec![Tag {
                index: 6,
                length: 5,
                full_match: " #tag".to_string(),
                tag: "#tag".to_string(),
            }]
        );
    }

    #[test]
    fn tag_at_start_of_string() {
        let found = extract("#what is this", &ExclusionZones::default());
        assert_eq!(found[0].index, 0);
        assert_eq!(found[0].full_match, "#what");
    }

    #[test]
    fn strips_one_trailing_colon_or_period() {
        assert_eq!(tags("end #done. and #todo: and #x.."), vec!["#done", "#todo", "#x."]);
    }

    #[test]
    fn numeric_tags_and_headings_are_ignored() {
        assert!(tags("issue #123 fixed").is_empty());
        assert!(tags("# Heading\n## Sub").is_empty());
        assert!(tags("see http://x.com/#anchor").is_empty());
    }

    #[test]
    fn tags_in_excluded_zones_are_dropped() {
        let source = "`a #code` #real";
        let code = vec![CodeSpan {
            span: Span::of(source, 0, 9),
            kind: CodeSpanKind::Inline,
        }];
        let found = extract(source, &ExclusionZones::code(&code));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tag, "#real");
    }
}
