//! Code span inventory built from the syntax tree.

use markdown::mdast::Node;

use crate::cursor::Cursor;
use crate::types::{CodeSpan, CodeSpanKind, Span};

/// Collect every inline code span and code block, in document order.
pub fn extract(source: &str, root: &Node) -> Vec<CodeSpan> {
    visit(Cursor::start(), root, source).1
}

fn visit(cursor: Cursor, node: &Node, source: &str) -> (Cursor, Vec<CodeSpan>) {
    match node {
        Node::InlineCode(code) => {
            let hint = code.position.as_ref().map(|p| p.start.offset..p.end.offset);
            let fallback = format!("`{}`", code.value);
            inline_spans(cursor, source, hint, &fallback)
        }
        Node::Code(code) => {
            let hint = code.position.as_ref().map(|p| p.start.offset..p.end.offset);
            let fallback = format!(
                "```{}\n{}\n```",
                code.lang.as_deref().unwrap_or_default(),
                code.value
            );
            block_span(cursor, source, hint, &fallback)
        }
        _ => {
            let mut cursor = cursor;
            let mut spans = Vec::new();
            for child in node.children().into_iter().flatten() {
                let (next, found) = visit(cursor, child, source);
                cursor = next;
                spans.extend(found);
            }
            (cursor, spans)
        }
    }
}

/// Raw source text for a node: the tree's own range when it is usable,
/// otherwise the reconstructed text.
fn raw_text<'a>(source: &'a str, hint: Option<&std::ops::Range<usize>>, fallback: &'a str) -> &'a str {
    hint.and_then(|r| source.get(r.clone()))
        .unwrap_or(fallback)
}

fn inline_spans(
    cursor: Cursor,
    source: &str,
    hint: Option<std::ops::Range<usize>>,
    fallback: &str,
) -> (Cursor, Vec<CodeSpan>) {
    let raw = raw_text(source, hint.as_ref(), fallback);
    let Some((cursor, index)) = cursor.sync(source, raw, hint.map(|r| r.start)) else {
        log::trace!("inline code `{raw}` not found after offset {}", cursor.offset());
        return (cursor, Vec::new());
    };

    let pieces = split_adjacent(raw);
    if pieces.len() > 1 {
        log::trace!("split merged inline code at {index} into {} spans", pieces.len());
    }
    let spans = pieces
        .into_iter()
        .map(|(at, len)| CodeSpan {
            span: Span::of(source, index + at, len),
            kind: CodeSpanKind::Inline,
        })
        .collect();
    (cursor.advance(raw.len()), spans)
}

fn block_span(
    cursor: Cursor,
    source: &str,
    hint: Option<std::ops::Range<usize>>,
    fallback: &str,
) -> (Cursor, Vec<CodeSpan>) {
    let raw = raw_text(source, hint.as_ref(), fallback);
    match cursor.sync(source, raw, hint.map(|r| r.start)) {
        Some((cursor, index)) => {
            let span = CodeSpan {
                span: Span::of(source, index, raw.len()),
                kind: CodeSpanKind::Block,
            };
            (cursor.advance(raw.len()), vec![span])
        }
        None => (cursor, Vec::new()),
    }
}

/// Split single-backtick code that swallowed an adjacent span.
///
/// `` `a``b` `` is one code node to a CommonMark parser (a single backtick
/// only closes on a run of exactly one); it is reported as `` `a` `` and
/// `` `b` ``. Returns `(offset, length)` pairs relative to `raw`.
fn split_adjacent(raw: &str) -> Vec<(usize, usize)> {
    let single_tick = |s: &str| s.starts_with('`') && !s.starts_with("``") && s.len() >= 2 && s.ends_with('`');

    let mut pieces = Vec::new();
    let mut start = 0;
    let mut rest = raw;
    while single_tick(rest) {
        let interior = &rest[1..rest.len() - 1];
        let Some(at) = interior.find("``") else {
            break;
        };
        let first_len = at + 2;
        let remainder = &rest[first_len..];
        if !single_tick(remainder) {
            break;
        }
        pieces.push((start, first_len));
        start += first_len;
        rest = remainder;
    }
    pieces.push((start, rest.len()));
    pieces
}
