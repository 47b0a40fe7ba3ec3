//! Grammar parser for `.g4` files.
//!
//! [`parse`] turns grammar source into a [`GrammarTree`] shaped like the
//! tree ANTLR builds for its own grammars, plus the syntax errors found on
//! the way. Parsing never fails outright: malformed rules are reported and
//! skipped, and everything else still reaches the tree.

pub mod error;
pub mod node_kind;
mod parser;
pub mod tree;
pub mod visit;

pub use error::ParseError;
pub use node_kind::NodeKind;
pub use tree::{AltLabel, GrammarTree, GrammarType, Node, NodeId};
pub use visit::{walk, Visitor, WalkAction};

/// The result of parsing a grammar file.
#[derive(Debug, Clone)]
pub struct Parse {
    tree: GrammarTree,
    errors: Vec<ParseError>,
}

impl Parse {
    pub fn tree(&self) -> &GrammarTree {
        &self.tree
    }

    /// Syntax errors in source order.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_parts(self) -> (GrammarTree, Vec<ParseError>) {
        (self.tree, self.errors)
    }
}

/// Parse grammar source text.
pub fn parse(source: &str) -> Parse {
    let (tree, errors) = parser::Parser::new(source).parse_grammar();
    Parse { tree, errors }
}
