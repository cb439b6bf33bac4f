//! Source-position helpers shared by the extraction passes.

use std::ops::Range;

use crate::types::{BlockQuote, CodeSpan, CodeSpanKind};

/// Monotonic search position into the source text.
///
/// Extraction steps take a cursor by value and hand back the advanced one, so
/// repeated identical text is located in traversal order and never matched
/// twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    offset: usize,
}

impl Cursor {
    /// Cursor at the start of the source.
    pub fn start() -> Self {
        Self::default()
    }

    /// Current byte offset.
    pub fn offset(self) -> usize {
        self.offset
    }

    /// Locate `needle` at or after the cursor.
    ///
    /// `hint` is an offset reported by the syntax tree; it is used when it lies
    /// at or after the cursor and the text there is `needle`. Otherwise the
    /// first occurrence after the cursor wins. The returned cursor sits at the
    /// start of the match.
    pub fn sync(self, source: &str, needle: &str, hint: Option<usize>) -> Option<(Self, usize)> {
        let found = hint
            .filter(|&at| at >= self.offset && source.get(at..).is_some_and(|s| s.starts_with(needle)))
            .or_else(|| {
                source
                    .get(self.offset..)
                    .and_then(|rest| rest.find(needle))
                    .map(|at| self.offset + at)
            })?;
        Some((Self { offset: found }, found))
    }

    /// Move the cursor forward by `len` bytes.
    pub fn advance(self, len: usize) -> Self {
        Self {
            offset: self.offset + len,
        }
    }
}

/// One line of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 0-based line number.
    pub number: usize,
    /// Byte offset of the first character.
    pub offset: usize,
    /// Line text without the `\n` / `\r\n` terminator.
    pub text: &'a str,
}

impl Line<'_> {
    /// Byte offset one past the last character of `text`.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Iterate the lines of `source` with their byte offsets.
pub fn lines(source: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    source
        .split_inclusive('\n')
        .enumerate()
        .map(move |(number, raw)| {
            let text = raw.strip_suffix('\n').unwrap_or(raw);
            let text = text.strip_suffix('\r').unwrap_or(text);
            let line = Line {
                number,
                offset,
                text,
            };
            offset += raw.len();
            line
        })
}

/// Byte ranges that later passes must ignore.
#[derive(Debug, Clone, Default)]
pub struct ExclusionZones {
    ranges: Vec<Range<usize>>,
}

impl ExclusionZones {
    /// Zones covering every code span.
    pub fn code(code: &[CodeSpan]) -> Self {
        Self {
            ranges: code.iter().map(|c| c.span.index..c.span.end()).collect(),
        }
    }

    /// Zones covering code blocks only (not inline code).
    pub fn code_blocks(code: &[CodeSpan]) -> Self {
        Self {
            ranges: code
                .iter()
                .filter(|c| c.kind == CodeSpanKind::Block)
                .map(|c| c.span.index..c.span.end())
                .collect(),
        }
    }

    /// Zones covering every code span and every block quote.
    pub fn code_and_quotes(code: &[CodeSpan], quotes: &[BlockQuote]) -> Self {
        let mut zones = Self::code(code);
        zones
            .ranges
            .extend(quotes.iter().map(|q| q.index..q.end()));
        zones
    }

    /// Whether `offset` lies inside any zone.
    pub fn contains(&self, offset: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(&offset))
    }
}
