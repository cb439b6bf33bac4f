use thiserror::Error;

/// Error type returned by a failing macro handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in characters)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Resolve a byte offset into `source` to a line/column pair.
    ///
    /// Offsets past the end of `source` resolve to the position just after the
    /// last character.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = source.get(..offset).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors that can occur while parsing markdown or substituting macros.
#[derive(Debug, Error)]
pub enum MacroError {
    /// The markdown contains a construct that cannot be interpreted
    /// (duplicate reference label, unquoted title).
    #[error("Malformed markdown at {location}: {message}")]
    MalformedMarkdown {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// markdown-rs parser error surfaced through the adapter.
    #[error("Parse error at {location}: {message}")]
    MarkdownAdapter {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// The document invokes a macro with no registered handler.
    #[error("markdown contains macro `{name}`, but no handler was registered for it")]
    UnknownMacro {
        /// Macro name
        name: String,
    },
    /// The macro name is registered but has no callable handler.
    #[error("macro `{name}` is declared but is not callable")]
    NotCallable {
        /// Macro name
        name: String,
    },
    /// A handler failed; the handler's own error is kept as the source.
    #[error("macro `{name}` failed: {source}")]
    Handler {
        /// Macro name
        name: String,
        /// Error returned by the handler
        #[source]
        source: HandlerError,
    },
    /// A skip pattern is not a valid glob.
    #[error("invalid skip pattern `{pattern}`: {message}")]
    InvalidSkipPattern {
        /// The offending pattern
        pattern: String,
        /// Glob compiler message
        message: String,
    },
}

impl MacroError {
    /// Create a malformed-markdown error located at `offset` in `source`.
    pub fn malformed(message: impl Into<String>, source: &str, offset: usize) -> Self {
        Self::MalformedMarkdown {
            message: message.into(),
            location: SourceLocation::from_offset(source, offset),
        }
    }

    /// Create an unknown macro error
    pub fn unknown_macro(name: impl Into<String>) -> Self {
        Self::UnknownMacro { name: name.into() }
    }

    /// Create a not-callable error
    pub fn not_callable(name: impl Into<String>) -> Self {
        Self::NotCallable { name: name.into() }
    }

    /// Name of the macro this error concerns, if any.
    pub fn macro_name(&self) -> Option<&str> {
        match self {
            Self::UnknownMacro { name }
            | Self::NotCallable { name }
            | Self::Handler { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_from_offset_counts_lines_and_columns() {
        let source = "first\nsecond line\nthird";
        assert_eq!(SourceLocation::from_offset(source, 0), SourceLocation::new(1, 1));
        assert_eq!(SourceLocation::from_offset(source, 6), SourceLocation::new(2, 1));
        assert_eq!(SourceLocation::from_offset(source, 13), SourceLocation::new(2, 8));
        assert_eq!(SourceLocation::from_offset(source, 999), SourceLocation::new(3, 6));
    }

    #[test]
    fn location_counts_characters_not_bytes() {
        let source = "héllo [x]";
        assert_eq!(SourceLocation::from_offset(source, 7), SourceLocation::new(1, 7));
    }

    #[test]
    fn unknown_macro_names_the_macro() {
        let err = MacroError::unknown_macro("sampleMacro");
        assert!(err.to_string().contains("sampleMacro"));
        assert_eq!(err.macro_name(), Some("sampleMacro"));
    }

    #[test]
    fn handler_error_keeps_source() {
        let err = MacroError::Handler {
            name: "youtube".to_string(),
            source: "missing url".into(),
        };
        assert_eq!(err.to_string(), "macro `youtube` failed: missing url");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("missing url"));
    }

    #[test]
    fn malformed_error_carries_location() {
        let err = MacroError::malformed("bad title", "a\nb", 2);
        match err {
            MacroError::MalformedMarkdown { location, .. } => {
                assert_eq!(location, SourceLocation::new(2, 1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
