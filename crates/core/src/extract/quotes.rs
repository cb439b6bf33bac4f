//! Block quotes, found by scanning lines rather than the syntax tree.

use crate::cursor::{ExclusionZones, lines};
use crate::types::{BlockQuote, CodeSpan, Span};

/// Group consecutive `>`-prefixed lines into block quotes.
///
/// Lines inside code blocks never start or extend a quote.
pub fn extract(source: &str, code: &[CodeSpan]) -> Vec<BlockQuote> {
    let blocks = ExclusionZones::code_blocks(code);
    let mut quotes = Vec::new();
    let mut run: Option<(usize, usize)> = None;

    for line in lines(source) {
        if is_quote_line(line.text) && !blocks.contains(line.offset) {
            let start = run.map_or(line.offset, |(start, _)| start);
            run = Some((start, line.end()));
        } else if let Some((start, end)) = run.take() {
            quotes.push(Span::of(source, start, end - start));
        }
    }
    if let Some((start, end)) = run {
        quotes.push(Span::of(source, start, end - start));
    }

    quotes
}

/// A quote line starts with `>` after at most three spaces.
fn is_quote_line(text: &str) -> bool {
    let trimmed = text.trim_start_matches(' ');
    text.len() - trimmed.len() <= 3 && trimmed.starts_with('>')
}
