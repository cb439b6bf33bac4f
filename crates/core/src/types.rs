//! Entities extracted from a markdown document.
//!
//! Every positioned entity records byte offsets into the original input, so
//! `&source[index..index + length]` always recovers the matched text.

use std::collections::BTreeMap;

use serde::Serialize;

/// Arguments of a macro invocation, keyed by attribute name.
pub type MacroArgs = BTreeMap<String, String>;

/// A run of source text located by byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    /// Byte offset of the first character.
    pub index: usize,
    /// Length in bytes.
    pub length: usize,
    /// The literal source text of the span.
    pub content: String,
}

impl Span {
    /// Build a span covering `source[index..index + length]`.
    pub(crate) fn of(source: &str, index: usize, length: usize) -> Self {
        Self {
            index,
            length,
            content: source[index..index + length].to_string(),
        }
    }

    /// Byte offset one past the last character.
    pub fn end(&self) -> usize {
        self.index + self.length
    }

    /// Whether `offset` falls inside the span.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.index && offset < self.end()
    }
}

/// A maximal run of consecutive `>`-prefixed lines.
pub type BlockQuote = Span;

/// One `[[name key="value"]]` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Macro {
    /// Macro name (text up to the first whitespace).
    pub name: String,
    /// Parsed attribute arguments; empty when the invocation has none.
    pub args: MacroArgs,
    /// The exact invocation text, brackets included.
    pub full_match: String,
}

/// An image, inline (`![alt](src "title")`) or reference style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedImage {
    /// Image source; for reference-style images, the resolved definition value.
    pub src: String,
    /// Title without its quotes, or empty.
    pub title: String,
    /// Bracketed alt text.
    pub alt_text: String,
    /// The exact matched text.
    pub full_match: String,
    /// Whether the target comes from a reference definition.
    pub is_reference_style: bool,
    /// Reference label, present only for reference-style images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_key: Option<String>,
}

/// A link, inline (`[text](href "title")`) or reference style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedLink {
    /// Link target; for reference-style links, the resolved definition value.
    pub href: String,
    /// Title without its quotes, or empty.
    pub title: String,
    /// Bracketed link text.
    pub alt_text: String,
    /// The exact matched text.
    pub full_match: String,
    /// Whether the target comes from a reference definition.
    pub is_reference_style: bool,
    /// Reference label, present only for reference-style links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_key: Option<String>,
}

/// A `[label]: value "title"` definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDefinition {
    /// The destination token.
    pub value: String,
    /// Title without its quotes, or empty.
    pub title: String,
    /// The definition text, from `[` to the end of the line.
    pub full_match: String,
}

/// Reference definitions keyed by their literal, case-sensitive label.
pub type References = BTreeMap<String, ReferenceDefinition>;

/// Whether a code span is inline or a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeSpanKind {
    /// Backtick-delimited code inside a paragraph.
    Inline,
    /// Fenced or indented code block.
    Block,
}

/// A code span or code block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeSpan {
    /// Location and text.
    #[serde(flatten)]
    pub span: Span,
    /// Inline or block.
    #[serde(rename = "type")]
    pub kind: CodeSpanKind,
}

/// A `#tag` outside code and quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Byte offset of the match, including the preceding whitespace if any.
    pub index: usize,
    /// Length of `full_match` in bytes.
    pub length: usize,
    /// Matched text (leading whitespace plus the tag).
    pub full_match: String,
    /// The tag itself, `#` included, trailing `:`/`.` stripped.
    pub tag: String,
}

/// A heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Location and source text of the heading.
    #[serde(flatten)]
    pub span: Span,
    /// 0-based line number.
    pub line: usize,
    /// Plain text of the heading.
    pub text: String,
    /// Heading level, 1 to 6.
    pub level: u8,
}

/// The entity a task hangs under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TaskParent {
    /// Nearest preceding heading.
    Header(Header),
    /// Nearest preceding task of lower indentation.
    Task(Task),
}

/// A checkbox list item (`- [ ] text`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// The task line, without its terminator.
    #[serde(flatten)]
    pub span: Span,
    /// 0-based line number.
    pub line: usize,
    /// Whether the box is ticked (`x` or `X`).
    pub completed: bool,
    /// Leading whitespace width (tabs count as two) divided by two.
    pub indent_level: usize,
    /// Owning task or heading, `None` at the top of the document.
    pub parent: Option<Box<TaskParent>>,
}

impl Task {
    /// Parent task, if the parent is a task.
    pub fn parent_task(&self) -> Option<&Task> {
        match self.parent.as_deref() {
            Some(TaskParent::Task(task)) => Some(task),
            _ => None,
        }
    }

    /// Parent heading, if the parent is a heading.
    pub fn parent_header(&self) -> Option<&Header> {
        match self.parent.as_deref() {
            Some(TaskParent::Header(header)) => Some(header),
            _ => None,
        }
    }
}

/// Everything extracted from one document. Containers are empty, never
/// absent, when nothing of their kind was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    /// Unescaped macro invocations, in document order.
    pub custom: Vec<Macro>,
    /// Inline images followed by reference-style images.
    pub img: Vec<ParsedImage>,
    /// Inline links followed by reference-style links.
    pub links: Vec<ParsedLink>,
    /// Reference definitions by label.
    pub references: References,
    /// Code spans and blocks, in document order.
    pub code_blocks: Vec<CodeSpan>,
    /// Block quotes, in document order.
    pub quotes: Vec<BlockQuote>,
    /// Tags, in document order.
    pub tags: Vec<Tag>,
    /// Headings, in document order.
    pub headers: Vec<Header>,
    /// Tasks, in document order.
    pub tasks: Vec<Task>,
}
