use std::fmt;

use antlr4ls_common::span::Span;

/// A syntax error with location information.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Human-readable description, e.g. `mismatched input 'x' expecting ';'`.
    pub message: String,
    /// Span of the offending token.
    pub span: Span,
    /// Source text of the offending token, cut at the first line break.
    /// `<EOF>` at end of input.
    pub offending: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span, offending: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span,
            offending: offending.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}
