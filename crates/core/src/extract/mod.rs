//! Entity extraction.
//!
//! Each pass is a stateless function of the source text and the results of
//! the passes before it. The driver runs them in a fixed order:
//!
//! 1. code spans (syntax tree walk)
//! 2. block quotes
//! 3. macro invocations
//! 4. inline images and links
//! 5. reference definitions
//! 6. reference-style and shorthand images and links
//! 7. tags
//! 8. headings (syntax tree)
//! 9. tasks
//!
//! Code spans and quotes found early serve as exclusion zones for the
//! later, regex-driven passes.

/// Code spans and blocks.
pub mod code;
/// Heading pass.
pub mod headers;
/// Image and link passes.
pub mod links;
/// Macro invocation pass.
pub mod macros;
/// Block quote pass.
pub mod quotes;
/// Reference definition pass.
pub mod references;
/// Tag pass.
pub mod tags;
/// Task pass.
pub mod tasks;

use crate::MacroError;
use crate::cursor::ExclusionZones;
use crate::parse::{ParseOptions, parse_mdast};
use crate::types::ParsedDocument;

/// Extract every entity from `markdown` with default options.
///
/// Fails only on a duplicate reference label or a link, image or reference
/// title that is not wrapped in double quotes; no partial result is returned.
///
/// # Examples
///
/// ```
/// use mdmacros_core::parse;
///
/// let doc = parse("Hello [[youtube url=\"u\"]] #tag").unwrap();
/// assert_eq!(doc.custom[0].name, "youtube");
/// assert_eq!(doc.custom[0].args["url"], "u");
/// assert_eq!(doc.tags[0].tag, "#tag");
/// ```
pub fn parse(markdown: &str) -> Result<ParsedDocument, MacroError> {
    parse_with_options(markdown, &ParseOptions::default())
}

/// Extract every entity from `markdown`.
pub fn parse_with_options(
    markdown: &str,
    options: &ParseOptions,
) -> Result<ParsedDocument, MacroError> {
    let root = parse_mdast(markdown, options)?;

    let code_blocks = code::extract(markdown, &root);
    let quotes = quotes::extract(markdown, &code_blocks);
    let custom = macros::extract(markdown);

    let code_zones = ExclusionZones::code(&code_blocks);
    let inline = links::extract_inline(markdown, &code_zones)?;
    let references = references::extract(markdown, &code_zones)?;

    let zones = ExclusionZones::code_and_quotes(&code_blocks, &quotes);
    let by_reference = links::extract_reference_style(markdown, &references, &zones);
    let tags = tags::extract(markdown, &zones);
    let headers = headers::extract(markdown, &root);
    let tasks = tasks::extract(markdown, &headers, &code_blocks);

    let mut img = inline.images;
    img.extend(by_reference.images);
    let mut links = inline.links;
    links.extend(by_reference.links);

    log::debug!(
        "parsed {} bytes: {} macros, {} images, {} links, {} references, {} code spans, \
         {} quotes, {} tags, {} headers, {} tasks",
        markdown.len(),
        custom.len(),
        img.len(),
        links.len(),
        references.len(),
        code_blocks.len(),
        quotes.len(),
        tags.len(),
        headers.len(),
        tasks.len(),
    );

    Ok(ParsedDocument {
        custom,
        img,
        links,
        references,
        code_blocks,
        quotes,
        tags,
        headers,
        tasks,
    })
}
