//! Grammar tool: loads `.g4` files and reports what is wrong with them.
//!
//! [`Tool::parse_grammar`] reads and parses a file, reporting syntax errors.
//! [`Tool::process`] then runs semantic analysis on the tree. Both report
//! through a [`ToolListener`], in the order problems are found.

pub mod listener;
pub mod message;
mod nullable;
pub mod render;
mod semantics;
mod vocab;

use std::fs;
use std::path::{Path, PathBuf};

use antlr4ls_common::span::{LineIndex, Span};
use antlr4ls_parser::{GrammarTree, NodeId};
use thiserror::Error;

pub use listener::{MessageCollector, ToolListener};
pub use message::{ErrorType, Severity, ToolMessage};

use listener::emit;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("cannot read grammar file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a grammar file path: {0}")]
    InvalidPath(String),
}

/// A parsed grammar file.
#[derive(Debug, Clone)]
pub struct Grammar {
    /// File name without directories, used in messages.
    pub file_name: String,
    pub path: Option<PathBuf>,
    pub source: String,
    pub tree: GrammarTree,
    line_index: LineIndex,
    syntax_errors: usize,
}

impl Grammar {
    /// The declared grammar name, if the header parsed.
    pub fn name(&self) -> Option<&str> {
        self.tree.grammar_name()
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.syntax_errors > 0
    }

    /// Directory the grammar was loaded from.
    pub fn dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }

    /// One-based line and UTF-16 column of a byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        self.line_index.line_col(&self.source, offset)
    }

    /// A message positioned at a tree node. Nodes without a position land
    /// on the first line.
    pub(crate) fn message_at_node(
        &self,
        error_type: ErrorType,
        node: NodeId,
        args: Vec<String>,
    ) -> ToolMessage {
        let (line, column) = self.tree.position(node).unwrap_or((1, 0));
        let span = self.tree.anchor_span(node).unwrap_or_default();
        self.message(error_type, line, column, span, args)
    }

    /// A message positioned at a byte span.
    pub(crate) fn message_at_span(
        &self,
        error_type: ErrorType,
        span: Span,
        args: Vec<String>,
    ) -> ToolMessage {
        let (line, column) = self.line_col(span.start);
        self.message(error_type, line, column, span, args)
    }

    pub(crate) fn message(
        &self,
        error_type: ErrorType,
        line: u32,
        column: u32,
        span: Span,
        args: Vec<String>,
    ) -> ToolMessage {
        ToolMessage {
            error_type,
            file_name: self.file_name.clone(),
            line: line.max(1),
            column,
            span,
            args,
        }
    }
}

/// Entry point for grammar analysis.
///
/// The library directory is searched after the grammar's own directory
/// when resolving `import` and `tokenVocab`.
#[derive(Debug, Clone, Default)]
pub struct Tool {
    lib_dir: Option<PathBuf>,
}

impl Tool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lib_dir(mut self, lib_dir: impl Into<PathBuf>) -> Self {
        self.lib_dir = Some(lib_dir.into());
        self
    }

    pub fn lib_dir(&self) -> Option<&Path> {
        self.lib_dir.as_deref()
    }

    /// Read and parse a grammar file, reporting syntax errors.
    pub fn parse_grammar(
        &self,
        path: &Path,
        listener: &mut dyn ToolListener,
    ) -> Result<Grammar, ToolError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ToolError::InvalidPath(path.display().to_string()))?
            .to_string();
        let source = fs::read_to_string(path).map_err(|source| ToolError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut grammar = self.parse_grammar_source(&file_name, source, listener);
        grammar.path = Some(path.to_path_buf());
        Ok(grammar)
    }

    /// Parse grammar text that did not come from disk.
    ///
    /// Every syntax error becomes a `SYNTAX_ERROR` message with the
    /// offending token as argument 0 and the description as argument 1.
    pub fn parse_grammar_source(
        &self,
        file_name: &str,
        source: impl Into<String>,
        listener: &mut dyn ToolListener,
    ) -> Grammar {
        let source = source.into();
        let (tree, errors) = antlr4ls_parser::parse(&source).into_parts();
        let line_index = LineIndex::new(&source);
        let grammar = Grammar {
            file_name: file_name.to_string(),
            path: None,
            source,
            tree,
            line_index,
            syntax_errors: errors.len(),
        };
        for error in errors {
            let message = grammar.message_at_span(
                ErrorType::SyntaxError,
                error.span,
                vec![error.offending, error.message],
            );
            emit(listener, message);
        }
        grammar
    }

    /// Run semantic analysis on a parsed grammar. A grammar with syntax
    /// errors is not analyzed; its tree is incomplete.
    pub fn process(&self, grammar: &Grammar, listener: &mut dyn ToolListener) {
        if grammar.has_syntax_errors() {
            return;
        }
        semantics::check(self, grammar, listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_are_positioned_at_the_offending_token() {
        let mut collector = MessageCollector::new();
        let grammar = Tool::new().parse_grammar_source(
            "E.g4",
            "grammar E;\nd : ( e ;\n",
            &mut collector,
        );
        assert_eq!(grammar.name(), Some("E"));
        assert_eq!(collector.messages.len(), 1);
        let msg = &collector.messages[0];
        assert_eq!(msg.error_type, ErrorType::SyntaxError);
        assert_eq!((msg.line, msg.column), (2, 8));
        assert_eq!(msg.args[0], ";");
        assert_eq!(msg.render(), "syntax error: mismatched input ';' expecting ')'");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut collector = MessageCollector::new();
        let err = Tool::new()
            .parse_grammar(Path::new("/nonexistent/dir/G.g4"), &mut collector)
            .unwrap_err();
        assert!(matches!(err, ToolError::Io { .. }));
        assert!(err.to_string().starts_with("cannot read grammar file"));
        assert!(collector.messages.is_empty());
    }

    #[test]
    fn grammar_dir_comes_from_the_path() {
        let mut collector = MessageCollector::new();
        let mut grammar = Tool::new().parse_grammar_source("G.g4", "grammar G;\nr : A ;\n", &mut collector);
        assert_eq!(grammar.dir(), None);
        grammar.path = Some(PathBuf::from("/work/G.g4"));
        assert_eq!(grammar.dir(), Some(Path::new("/work")));
    }
}
