//! Shared types for the antlr4ls grammar toolchain.
//!
//! Spans, line indexing, the token vocabulary of `.g4` files and lexer
//! errors live here so the lexer, parser and tool crates agree on them.

pub mod error;
pub mod span;
pub mod token;
