#![deny(missing_docs)]
//! Markdown entity extraction and `[[macro]]` substitution.
//!
//! [`parse`] pulls macro invocations, links, images, reference definitions,
//! code spans, block quotes, tags, headings and task list items out of a
//! markdown document with byte-exact positions. [`substitute`] replaces macro
//! invocations with the output of caller-supplied handlers.

/// Source-position helpers (cursor, lines, exclusion zones).
pub mod cursor;
/// Core error types.
pub mod error;
/// Extraction passes and the parse driver.
pub mod extract;
/// markdown-rs adapter and parse options.
pub mod parse;
/// Handler contract, registry and substitution engine.
pub mod substitute;
/// Extracted entity types.
pub mod types;

pub use error::{HandlerError, MacroError, SourceLocation};
pub use extract::{parse, parse_with_options};
pub use parse::ParseOptions;
pub use substitute::{
    HandlerFuture, MacroHandler, MacroRegistry, SyncHandler, substitute, sync_handler,
};
pub use types::{
    BlockQuote, CodeSpan, CodeSpanKind, Header, Macro, MacroArgs, ParsedDocument, ParsedImage,
    ParsedLink, ReferenceDefinition, References, Span, Tag, Task, TaskParent,
};
