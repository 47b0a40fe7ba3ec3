use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// A lexer error with location information.
///
/// The lexer never aborts: it emits an `Error` token carrying the kind and
/// keeps going, and the parser turns those tokens into syntax errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    /// Create a new lexer error.
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The specific kind of lexer error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LexErrorKind {
    /// A character that cannot start any token.
    UnexpectedCharacter(char),
    /// A `'...'` literal was not closed before the end of the line.
    UnterminatedString,
    /// A `{...}` action was not closed before end of input.
    UnterminatedAction,
    /// A `[...]` block was not closed before the end of the line.
    UnterminatedBracket,
    /// A `/* ... */` comment was not closed before end of input.
    UnterminatedComment,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(c) => write!(f, "token recognition error at: '{c}'"),
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedAction => write!(f, "unterminated action"),
            Self::UnterminatedBracket => write!(f, "unterminated argument or character set"),
            Self::UnterminatedComment => write!(f, "unterminated comment"),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for LexError {}
