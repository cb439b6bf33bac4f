//! `[label]: value "title"` reference definitions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::MacroError;
use crate::cursor::ExclusionZones;
use crate::types::{ReferenceDefinition, References};

static DEFINITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ ]{0,3}(\[([^\]\n]+)\]:[ \t]*(\S+)(?:[ \t]+(\S[^\n]*?))?)[ \t]*\r?$").unwrap()
});

/// Collect reference definitions keyed by their literal label.
///
/// Footnote definitions (`[^id]: ...`) and lines inside code are skipped. A
/// repeated label or a title not wrapped in double quotes fails the parse.
pub fn extract(source: &str, code: &ExclusionZones) -> Result<References, MacroError> {
    let mut references = References::new();

    for caps in DEFINITION_RE.captures_iter(source) {
        let (Some(definition), Some(label)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if label.as_str().starts_with('^') || code.contains(definition.start()) {
            continue;
        }

        let title = match caps.get(4) {
            Some(raw) => unquote(raw.as_str()).ok_or_else(|| {
                MacroError::malformed(
                    format!(
                        "title `{}` of reference `{}` must be wrapped in double quotes",
                        raw.as_str(),
                        label.as_str()
                    ),
                    source,
                    raw.start(),
                )
            })?,
            None => "",
        };

        if references.contains_key(label.as_str()) {
            return Err(MacroError::malformed(
                format!("duplicate reference definition `{}`", label.as_str()),
                source,
                definition.start(),
            ));
        }

        references.insert(
            label.as_str().to_string(),
            ReferenceDefinition {
                value: caps[3].to_string(),
                title: title.to_string(),
                full_match: definition.as_str().to_string(),
            },
        );
    }

    Ok(references)
}

fn unquote(raw: &str) -> Option<&str> {
    raw.strip_prefix('"')?.strip_suffix('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<References, MacroError> {
        extract(source, &ExclusionZones::default())
    }

    #[test]
    fn definition_without_title() {
        let refs = parse("text\n\n[link1]: https://www.example.com\n    ").unwrap();
        assert_eq!(
            refs["link1"],
            ReferenceDefinition {
                value: "https://www.example.com".to_string(),
                title: String::new(),
                full_match: "[link1]: https://www.example.com".to_string(),
            }
        );
    }

    #[test]
    fn definition_with_title() {
        let refs = parse(r#"[home]: /index.html "Home Page""#).unwrap();
        assert_eq!(refs["home"].value, "/index.html");
        assert_eq!(refs["home"].title, "Home Page");
    }

    #[test]
    fn labels_are_case_sensitive() {
        let refs = parse("[A]: /a\n[a]: /b").unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs["A"].value, "/a");
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let err = parse("[a]: /one\n[a]: /two").unwrap_err();
        assert!(err.to_string().contains("duplicate reference definition `a`"));
    }

    #[test]
    fn unquoted_title_is_an_error() {
        let err = parse("[a]: /one Title").unwrap_err();
        assert!(matches!(err, MacroError::MalformedMarkdown { .. }));
    }

    #[test]
    fn footnotes_are_not_references() {
        let refs = parse("[^1]: A footnote with words").unwrap();
        assert!(refs.is_empty());
    }
}
