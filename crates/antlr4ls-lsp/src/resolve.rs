//! Hover, go-to-definition and find-references over one grammar tree.
//!
//! Matching is by node kind and text. Grammars have a single flat namespace
//! and rule names are case-split between parser and lexer rules, so this is
//! enough to tell symbols apart.

use antlr4ls_common::span::utf16_len;
use antlr4ls_parser::{GrammarTree, NodeId};
use tower_lsp::lsp_types::{Location, Position, Url};

use crate::locate::locate;
use crate::position::range_with_len;

/// S-expression of the node under `position`, or empty text.
pub fn hover(tree: &GrammarTree, position: Position) -> String {
    locate(tree, position)
        .map(|node| tree.to_string_tree(node))
        .unwrap_or_default()
}

/// Declaration sites of the symbol under `position`.
///
/// A candidate is any node of the same kind whose parent is a rule header
/// declaring the queried name. Ranges take the length of the queried text.
pub fn definition(tree: &GrammarTree, position: Position, uri: &Url) -> Vec<Location> {
    let Some(node) = locate(tree, position) else {
        return Vec::new();
    };
    let text = tree.text(node);
    let len = utf16_len(text);
    tree.nodes_of_kind(tree.kind(node))
        .into_iter()
        .filter(|&candidate| {
            tree.parent(candidate)
                .and_then(|parent| tree.rule_name(parent))
                .is_some_and(|name| name == text)
        })
        .map(|candidate| location(tree, candidate, len, uri))
        .collect()
}

/// Every occurrence of the symbol under `position`, in source order.
pub fn references(
    tree: &GrammarTree,
    position: Position,
    uri: &Url,
    include_declaration: bool,
) -> Vec<Location> {
    let node = match locate(tree, position) {
        Some(rule) if tree.is_rule_header(rule) => tree.first_child(rule),
        other => other,
    };
    let Some(node) = node else {
        return Vec::new();
    };
    let text = tree.text(node);
    let len = utf16_len(text);
    tree.nodes_of_kind(tree.kind(node))
        .into_iter()
        .filter(|&candidate| tree.text(candidate) == text)
        .filter(|&candidate| {
            include_declaration
                || !tree
                    .parent(candidate)
                    .is_some_and(|parent| tree.is_rule_header(parent))
        })
        .map(|candidate| location(tree, candidate, len, uri))
        .collect()
}

fn location(tree: &GrammarTree, node: NodeId, len: u32, uri: &Url) -> Location {
    Location::new(uri.clone(), range_with_len(tree, node, len))
}
