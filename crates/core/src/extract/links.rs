//! Images and links, inline and reference style.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::cursor::ExclusionZones;
use crate::extract::macros::is_escaped;
use crate::types::{ParsedImage, ParsedLink, References};
use crate::MacroError;

/// Opening of an inline link or image, up to the `(` of its target. The
/// text may hold one level of inline image (`[![alt](src)](href)`).
static INLINE_OPEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(!?)\[((?:[^\[\]\n]|!\[[^\[\]\n]*\]\([^()\n]*\))*)\]\(").unwrap()
});

/// `[text][label]`, `[text][]` and their `!` image forms.
static EXPLICIT_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(!?)\[([^\[\]\n]*)\]\[([^\[\]\n]*)\]").unwrap());

/// `[text]` shorthand candidates; context is checked by hand.
static SHORTCUT_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(!?)\[([^\[\]\n]+)\]").unwrap());

/// Images and links found by one pass.
#[derive(Debug, Default)]
pub struct Found {
    /// Images, in document order.
    pub images: Vec<ParsedImage>,
    /// Links, in document order.
    pub links: Vec<ParsedLink>,
}

/// Location-free description shared by images and links.
struct Reference {
    is_image: bool,
    text: String,
    target: String,
    title: String,
    full_match: String,
    key: Option<String>,
}

impl Found {
    fn push(&mut self, found: Reference) {
        let is_reference_style = found.key.is_some();
        if found.is_image {
            self.images.push(ParsedImage {
                src: found.target,
                title: found.title,
                alt_text: found.text,
                full_match: found.full_match,
                is_reference_style,
                reference_key: found.key,
            });
        } else {
            self.links.push(ParsedLink {
                href: found.target,
                title: found.title,
                alt_text: found.text,
                full_match: found.full_match,
                is_reference_style,
                reference_key: found.key,
            });
        }
    }
}

/// Collect `[text](target "title")` links and `![alt](src "title")` images.
///
/// The target may be a macro invocation, optionally followed by a
/// `#fragment`. Matches starting inside code are ignored. A title that is
/// not wrapped in double quotes fails the whole parse.
pub fn extract_inline(source: &str, code: &ExclusionZones) -> Result<Found, MacroError> {
    let mut found = Found::default();
    let mut pos = 0;

    while let Some(caps) = INLINE_OPEN_RE.captures_at(source, pos) {
        let Some(open) = caps.get(0) else { break };
        pos = open.end();
        if code.contains(open.start()) {
            continue;
        }

        let text = &caps[2];
        // Rescan the text so a nested image is reported on its own.
        let rescan = caps
            .get(2)
            .filter(|_| text.contains("!["))
            .map(|inner| inner.start());
        let Some(target) = scan_target(source, open.end())? else {
            pos = rescan.unwrap_or(pos);
            continue;
        };
        pos = rescan.unwrap_or(target.end);
        found.push(Reference {
            is_image: !caps[1].is_empty(),
            text: text.to_string(),
            target: target.destination.to_string(),
            title: target.title.to_string(),
            full_match: source[open.start()..target.end].to_string(),
            key: None,
        });
    }

    Ok(found)
}

/// Parsed `(destination "title")` group.
#[derive(Debug, PartialEq, Eq)]
struct Target<'a> {
    destination: &'a str,
    title: &'a str,
    /// Offset just past the closing `)`.
    end: usize,
}

/// Scan a link target starting right after its `(`.
///
/// Returns `Ok(None)` when the text is not a link after all (no closing
/// parenthesis).
fn scan_target(source: &str, start: usize) -> Result<Option<Target<'_>>, MacroError> {
    let rest = &source[start..];

    let dest_len = if rest.starts_with("[[") {
        // A macro's arguments may hold spaces, so find its own terminator first.
        let Some(close) = rest.find("]]") else {
            return Ok(None);
        };
        let after_macro = close + 2;
        let fragment = if rest[after_macro..].starts_with('#') {
            rest[after_macro..]
                .find(|c: char| c.is_whitespace() || c == ')')
                .unwrap_or(rest.len() - after_macro)
        } else {
            0
        };
        after_macro + fragment
    } else {
        destination_len(rest)
    };
    let destination = &rest[..dest_len];

    let after_dest = &rest[dest_len..];
    let title_start = leading_gap(after_dest);
    let tail = &after_dest[title_start..];
    let title_offset = start + dest_len + title_start;

    if tail.starts_with(')') {
        return Ok(Some(Target {
            destination,
            title: "",
            end: title_offset + 1,
        }));
    }

    if let Some(quoted) = tail.strip_prefix('"') {
        let Some(close_quote) = quoted.find('"') else {
            return Err(unquoted_title(source, title_offset, tail));
        };
        let after_quote = &quoted[close_quote + 1..];
        let gap = leading_gap(after_quote);
        if after_quote[gap..].starts_with(')') {
            return Ok(Some(Target {
                destination,
                title: &quoted[..close_quote],
                end: title_offset + 1 + close_quote + 1 + gap + 1,
            }));
        }
        let line_end = tail.find('\n').unwrap_or(tail.len());
        return match tail[..line_end].find(')') {
            Some(close) => Err(unquoted_title(source, title_offset, &tail[..close])),
            None => Ok(None),
        };
    }

    // Something other than a quoted title before `)`.
    let line_end = tail.find('\n').unwrap_or(tail.len());
    match tail[..line_end].find(')') {
        Some(close) => Err(unquoted_title(source, title_offset, &tail[..close])),
        None => Ok(None),
    }
}

/// Length of a plain destination: up to whitespace or the `)` that closes
/// the target. Parentheses inside the destination must balance.
fn destination_len(rest: &str) -> usize {
    let mut depth = 0usize;
    for (at, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return at,
            ')' => depth -= 1,
            c if c.is_whitespace() => return at,
            _ => {}
        }
    }
    rest.len()
}

/// Width of the spaces, tabs and at most one line break at the start of `s`.
fn leading_gap(s: &str) -> usize {
    let blanks = |s: &str| s.len() - s.trim_start_matches([' ', '\t']).len();
    let before = blanks(s);
    let rest = &s[before..];
    let newline = if rest.starts_with("\r\n") {
        2
    } else if rest.starts_with('\n') {
        1
    } else {
        return before;
    };
    before + newline + blanks(&rest[newline..])
}

fn unquoted_title(source: &str, offset: usize, title: &str) -> MacroError {
    MacroError::malformed(
        format!("title `{}` must be wrapped in double quotes", title.trim()),
        source,
        offset,
    )
}

/// Collect reference-style images and links.
///
/// Explicit (`[text][label]`), collapsed (`[text][]`) and shorthand
/// (`[text]`) forms are recognised. A shorthand is only a link when its text
/// is a defined label; explicit labels that are not defined resolve to an
/// empty target. Matches inside code or quotes are ignored.
pub fn extract_reference_style(
    source: &str,
    references: &References,
    zones: &ExclusionZones,
) -> Found {
    let mut hits: Vec<(usize, Reference)> = Vec::new();

    for caps in EXPLICIT_REF_RE.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        if zones.contains(whole.start()) || is_escaped(source, whole.start()) {
            continue;
        }
        let text = &caps[2];
        let label = if caps[3].is_empty() { text } else { &caps[3] };
        hits.push((whole.start(), resolve(&caps[1], text, label, whole.as_str(), references)));
    }

    for caps in SHORTCUT_REF_RE.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        let (start, end) = (whole.start(), whole.end());
        let bytes = source.as_bytes();
        let before = start.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(end).copied();
        if matches!(before, Some(b'\\' | b'[' | b']'))
            || matches!(after, Some(b'(' | b'[' | b':'))
            || zones.contains(start)
        {
            continue;
        }
        let text = &caps[2];
        if !references.contains_key(text) {
            continue;
        }
        hits.push((start, resolve(&caps[1], text, text, whole.as_str(), references)));
    }

    hits.sort_by_key(|(start, _)| *start);
    let mut found = Found::default();
    for (_, hit) in hits {
        found.push(hit);
    }
    found
}

fn resolve(bang: &str, text: &str, label: &str, full_match: &str, references: &References) -> Reference {
    let definition = references.get(label);
    if definition.is_none() {
        log::debug!("reference `{label}` has no definition");
    }
    Reference {
        is_image: !bang.is_empty(),
        text: text.to_string(),
        target: definition.map(|d| d.value.clone()).unwrap_or_default(),
        title: definition.map(|d| d.title.clone()).unwrap_or_default(),
        full_match: full_match.to_string(),
        key: Some(label.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReferenceDefinition;

    fn inline(source: &str) -> Found {
        extract_inline(source, &ExclusionZones::default()).unwrap()
    }

    #[test]
    fn plain_link() {
        let found = inline("[Link](/home)");
        assert_eq!(
            found.links,
            vec![ParsedLink {
                href: "/home".to_string(),
                title: String::new(),
                alt_text: "Link".to_string(),
                full_match: "[Link](/home)".to_string(),
                is_reference_style: false,
                reference_key: None,
            }]
        );
        assert!(found.images.is_empty());
    }

    #[test]
    fn image_with_title() {
        let found = inline(r#"Image: ![alt text](www.example.com/example.png "Title Text")"#);
        assert_eq!(found.images.len(), 1);
        let image = &found.images[0];
        assert_eq!(image.src, "www.example.com/example.png");
        assert_eq!(image.title, "Title Text");
        assert_eq!(image.alt_text, "alt text");
        assert_eq!(image.full_match, r#"![alt text](www.example.com/example.png "Title Text")"#);
    }

    #[test]
    fn macro_target_with_fragment_and_title() {
        let source = r#"see [docs]([[link page="a b"]]#intro "Docs") now"#;
        let found = inline(source);
        assert_eq!(found.links.len(), 1);
        let link = &found.links[0];
        assert_eq!(link.href, r#"[[link page="a b"]]#intro"#);
        assert_eq!(link.title, "Docs");
        assert_eq!(link.full_match, r#"[docs]([[link page="a b"]]#intro "Docs")"#);
    }

    #[test]
    fn unquoted_title_is_an_error() {
        let err = extract_inline("[a](/b c)", &ExclusionZones::default()).unwrap_err();
        assert!(matches!(err, MacroError::MalformedMarkdown { .. }));
        assert!(err.to_string().contains("double quotes"));
    }

    #[test]
    fn single_quoted_title_is_an_error() {
        assert!(extract_inline("[a](/b 'c')", &ExclusionZones::default()).is_err());
    }

    #[test]
    fn title_never_spans_a_blank_line() {
        let found = inline("[a](/b\n\nnext paragraph (x)");
        assert!(found.links.is_empty());
    }

    #[test]
    fn title_may_sit_on_the_next_line() {
        let found = inline("[a](/b\n  \"T\")");
        assert_eq!(found.links[0].title, "T");
        assert_eq!(found.links[0].full_match, "[a](/b\n  \"T\")");
    }

    #[test]
    fn unclosed_target_is_not_a_link() {
        let found = inline("[a](/b and more text");
        assert!(found.links.is_empty());
    }

    #[test]
    fn image_inside_link_text_is_found() {
        let found = inline("[![logo](/logo.png)](/home) and [next](/n)");
        assert_eq!(found.images.len(), 1);
        assert_eq!(found.images[0].src, "/logo.png");
        assert_eq!(found.images[0].full_match, "![logo](/logo.png)");
        let links: Vec<_> = found
            .links
            .iter()
            .map(|l| (l.href.as_str(), l.alt_text.as_str()))
            .collect();
        assert_eq!(links, vec![("/home", "![logo](/logo.png)"), ("/n", "next")]);
    }

    #[test]
    fn balanced_parentheses_stay_in_destination() {
        let found = inline("[the docs](https://x.io/a_(b)) then (aside)");
        assert_eq!(found.links.len(), 1);
        assert_eq!(found.links[0].href, "https://x.io/a_(b)");
        assert_eq!(found.links[0].full_match, "[the docs](https://x.io/a_(b))");
    }

    #[test]
    fn unbalanced_destination_is_not_a_link() {
        assert!(inline("[a](/b(c and more").links.is_empty());
    }

    fn refs() -> References {
        let mut refs = References::new();
        refs.insert(
            "link1".to_string(),
            ReferenceDefinition {
                value: "https://www.example.com".to_string(),
                title: "Example".to_string(),
                full_match: "[link1]: https://www.example.com \"Example\"".to_string(),
            },
        );
        refs
    }

    #[test]
    fn explicit_reference_resolves() {
        let found = extract_reference_style(
            "[Reference style link][link1]\n\n[link1]: https://www.example.com",
            &refs(),
            &ExclusionZones::default(),
        );
        assert_eq!(found.links.len(), 1);
        let link = &found.links[0];
        assert_eq!(link.href, "https://www.example.com");
        assert_eq!(link.alt_text, "Reference style link");
        assert_eq!(link.title, "Example");
        assert!(link.is_reference_style);
        assert_eq!(link.reference_key.as_deref(), Some("link1"));
    }

    #[test]
    fn missing_label_resolves_to_empty() {
        let found = extract_reference_style("![pic][nope]", &refs(), &ExclusionZones::default());
        assert_eq!(found.images.len(), 1);
        assert_eq!(found.images[0].src, "");
        assert_eq!(found.images[0].reference_key.as_deref(), Some("nope"));
    }

    #[test]
    fn shorthand_and_collapsed_forms() {
        let found = extract_reference_style(
            "see [link1] and [link1][] but not [other] or [ ]",
            &refs(),
            &ExclusionZones::default(),
        );
        let matches: Vec<_> = found.links.iter().map(|l| l.full_match.as_str()).collect();
        assert_eq!(matches, vec!["[link1]", "[link1][]"]);
        assert!(found.links.iter().all(|l| l.href == "https://www.example.com"));
    }

    #[test]
    fn definitions_and_macros_are_not_shorthand() {
        let found = extract_reference_style(
            "[[link1]]\n[link1]: https://www.example.com",
            &refs(),
            &ExclusionZones::default(),
        );
        assert!(found.links.is_empty());
    }
}
