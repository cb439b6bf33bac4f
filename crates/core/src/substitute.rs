//! Macro substitution.
//!
//! Handlers are looked up by macro name, validated up front, then awaited one
//! at a time in document order. Each result replaces the invocation text in
//! the output.

use std::collections::HashMap;
use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use std::sync::Arc;

use glob::Pattern;

use crate::error::HandlerError;
use crate::extract::macros::is_escaped;
use crate::types::{Macro, MacroArgs};
use crate::{MacroError, parse};

/// Future returned by a [`MacroHandler`].
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<String, HandlerError>> + Send + 'a>>;

/// Asynchronous macro implementation.
///
/// Receives the invocation's arguments and the original, unmodified markdown.
pub trait MacroHandler: Send + Sync {
    /// Produce the replacement text for one invocation.
    fn call<'a>(&'a self, args: &'a MacroArgs, markdown: &'a str) -> HandlerFuture<'a>;
}

impl<F, Fut> MacroHandler for F
where
    F: Fn(MacroArgs, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, HandlerError>> + Send + 'static,
{
    fn call<'a>(&'a self, args: &'a MacroArgs, markdown: &'a str) -> HandlerFuture<'a> {
        Box::pin((self)(args.clone(), markdown.to_owned()))
    }
}

/// Adapter running a synchronous function as a [`MacroHandler`].
pub struct SyncHandler<F>(F);

/// Wrap a synchronous function so it can be registered as a handler.
///
/// # Examples
///
/// ```
/// use mdmacros_core::{MacroRegistry, sync_handler};
///
/// let registry = MacroRegistry::new()
///     .with("hello", sync_handler(|_args, _markdown| Ok("hello".to_string())));
/// assert!(registry.contains("hello"));
/// ```
pub fn sync_handler<F>(f: F) -> SyncHandler<F>
where
    F: Fn(&MacroArgs, &str) -> Result<String, HandlerError> + Send + Sync,
{
    SyncHandler(f)
}

impl<F> MacroHandler for SyncHandler<F>
where
    F: Fn(&MacroArgs, &str) -> Result<String, HandlerError> + Send + Sync,
{
    fn call<'a>(&'a self, args: &'a MacroArgs, markdown: &'a str) -> HandlerFuture<'a> {
        Box::pin(std::future::ready((self.0)(args, markdown)))
    }
}

#[derive(Clone)]
enum Entry {
    Handler(Arc<dyn MacroHandler>),
    Declared,
}

/// Handler table keyed by macro name.
#[derive(Clone, Default)]
pub struct MacroRegistry {
    entries: HashMap<String, Entry>,
}

impl MacroRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous entry.
    pub fn register<H>(&mut self, name: impl Into<String>, handler: H) -> &mut Self
    where
        H: MacroHandler + 'static,
    {
        self.entries
            .insert(name.into(), Entry::Handler(Arc::new(handler)));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<H>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: MacroHandler + 'static,
    {
        self.register(name, handler);
        self
    }

    /// Reserve `name` without a callable handler.
    ///
    /// Substituting a document that invokes it fails with
    /// [`MacroError::NotCallable`] unless the name is skipped.
    pub fn declare(&mut self, name: impl Into<String>) -> &mut Self {
        self.entries.insert(name.into(), Entry::Declared);
        self
    }

    /// Whether `name` has an entry, callable or not.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn resolve(&self, name: &str) -> Result<&Arc<dyn MacroHandler>, MacroError> {
        match self.entries.get(name) {
            Some(Entry::Handler(handler)) => Ok(handler),
            Some(Entry::Declared) => Err(MacroError::not_callable(name)),
            None => Err(MacroError::unknown_macro(name)),
        }
    }
}

impl std::fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Replace every macro invocation in `markdown` with its handler's output.
///
/// Invocations whose name matches a glob in `skip_patterns` are left as
/// written. Every other invocation must have a callable handler; this is
/// checked before any handler runs. Handlers are awaited one at a time in
/// document order, each receiving the original markdown, and each result
/// replaces the first remaining unescaped occurrence of the invocation text.
/// A failing handler aborts the whole substitution.
///
/// # Examples
///
/// ```
/// use mdmacros_core::{MacroRegistry, substitute, sync_handler};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let registry = MacroRegistry::new().with(
///     "youtube",
///     sync_handler(|args, _| Ok(format!("<iframe src=\"{}\"></iframe>", args["url"]))),
/// );
/// let out = substitute("Hello [[youtube url=\"u\"]]", &registry, &[] as &[&str])
///     .await
///     .unwrap();
/// assert_eq!(out, "Hello <iframe src=\"u\"></iframe>");
/// # });
/// ```
pub async fn substitute<S: AsRef<str>>(
    markdown: &str,
    registry: &MacroRegistry,
    skip_patterns: &[S],
) -> Result<String, MacroError> {
    let document = parse(markdown)?;
    let skip = compile_patterns(skip_patterns)?;

    let mut plan: Vec<(&Macro, &Arc<dyn MacroHandler>)> = Vec::new();
    for invocation in &document.custom {
        if skip.iter().any(|p| p.matches(&invocation.name)) {
            log::debug!("skipping macro `{}`", invocation.name);
            continue;
        }
        plan.push((invocation, registry.resolve(&invocation.name)?));
    }

    let mut output = Output::new(markdown);
    for (invocation, handler) in plan {
        log::debug!("running macro `{}`", invocation.name);
        let replacement = handler
            .call(&invocation.args, markdown)
            .await
            .map_err(|source| MacroError::Handler {
                name: invocation.name.clone(),
                source,
            })?;
        if !output.replace_first(&invocation.full_match, &replacement) {
            log::warn!("no remaining occurrence of macro `{}`", invocation.name);
        }
    }

    Ok(output.text)
}

fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Pattern>, MacroError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p.as_ref()).map_err(|err| MacroError::InvalidSkipPattern {
                pattern: p.as_ref().to_string(),
                message: err.to_string(),
            })
        })
        .collect()
}

/// Substitution output that remembers which bytes handlers produced.
///
/// Handler output never holds a remaining invocation and never escapes one.
struct Output {
    text: String,
    produced: Vec<Range<usize>>,
}

impl Output {
    fn new(source: &str) -> Self {
        Self {
            text: source.to_string(),
            produced: Vec::new(),
        }
    }

    fn overlaps_produced(&self, range: &Range<usize>) -> bool {
        self.produced
            .iter()
            .any(|r| r.start < range.end && range.start < r.end)
    }

    /// Whether a backslash from the source sits right before `at`.
    fn escaped_at(&self, at: usize) -> bool {
        is_escaped(&self.text, at) && !self.produced.iter().any(|r| r.contains(&(at - 1)))
    }

    /// Replace the first unescaped occurrence of `needle` in source text.
    fn replace_first(&mut self, needle: &str, replacement: &str) -> bool {
        let found = self
            .text
            .match_indices(needle)
            .map(|(at, _)| at)
            .find(|&at| !self.overlaps_produced(&(at..at + needle.len())) && !self.escaped_at(at));
        let Some(at) = found else {
            return false;
        };

        let end = at + needle.len();
        self.text.replace_range(at..end, replacement);
        for range in &mut self.produced {
            if range.start >= end {
                *range = range.start - needle.len() + replacement.len()
                    ..range.end - needle.len() + replacement.len();
            }
        }
        self.produced.push(at..at + replacement.len());
        true
    }
}
