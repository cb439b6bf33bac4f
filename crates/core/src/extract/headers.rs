//! Headings, taken from the syntax tree.

use markdown::mdast::Node;

use crate::types::{Header, Span};

/// Collect every heading in document order.
pub fn extract(source: &str, root: &Node) -> Vec<Header> {
    let mut headers = Vec::new();
    collect(source, root, &mut headers);
    headers
}

fn collect(source: &str, node: &Node, headers: &mut Vec<Header>) {
    if let Node::Heading(heading) = node {
        let Some(position) = heading.position.as_ref() else {
            log::warn!("heading without position skipped");
            return;
        };
        let (start, end) = (position.start.offset, position.end.offset);
        headers.push(Header {
            span: Span::of(source, start, end - start),
            line: position.start.line.saturating_sub(1),
            text: node.to_string(),
            level: heading.depth,
        });
        return;
    }
    for child in node.children().into_iter().flatten() {
        collect(source, child, headers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{ParseOptions, parse_mdast};

    fn headers_of(source: &str) -> Vec<Header> {
        let root = parse_mdast(source, &ParseOptions::default()).unwrap();
        extract(source, &root)
    }

    #[test]
    fn atx_heading_fields() {
        let source = "intro\n\n# Todo List\n\ntext";
        let headers = headers_of(source);
        assert_eq!(headers.len(), 1);
        let header = &headers[0];
        assert_eq!(header.span.content, "# Todo List");
        assert_eq!(header.span.index, 7);
        assert_eq!(header.line, 2);
        assert_eq!(header.text, "Todo List");
        assert_eq!(header.level, 1);
    }

    #[test]
    fn heading_text_is_plain() {
        let headers = headers_of("### A *styled* `title`");
        assert_eq!(headers[0].text, "A styled title");
        assert_eq!(headers[0].level, 3);
    }

    #[test]
    fn headings_in_code_are_not_headers() {
        assert!(headers_of("```\n# not a heading\n```").is_empty());
    }
}
