//! Finding the tree node under an editor position.

use std::cell::Cell;

use antlr4ls_common::span::utf16_len;
use antlr4ls_parser::{walk, GrammarTree, NodeId, Visitor, WalkAction};
use tower_lsp::lsp_types::Position;

/// Whether `position` falls on the node's text. The right edge counts, so
/// a cursor just after an identifier still selects it.
pub fn contains(tree: &GrammarTree, node: NodeId, position: Position) -> bool {
    let Some((line, column)) = tree.position(node) else {
        return false;
    };
    let len = utf16_len(tree.text(node));
    line.saturating_sub(1) == position.line
        && line > 0
        && column <= position.character
        && position.character <= column + len
}

/// The deepest, last node in source order that contains `position`.
///
/// On a parser rule name this is the `RULE` header itself; on a lexer rule
/// name it is the name leaf. Elsewhere it is the innermost element.
pub fn locate(tree: &GrammarTree, position: Position) -> Option<NodeId> {
    let found = Cell::new(None);
    let mut visitor = Visitor {
        parser_rule: Some(Box::new(|tree: &GrammarTree, rule| {
            match tree.first_child(rule) {
                Some(name) if contains(tree, name, position) => {
                    found.set(Some(rule));
                    WalkAction::SkipChildren
                }
                _ => WalkAction::Continue,
            }
        })),
        lexer_rule: Some(Box::new(|tree: &GrammarTree, rule| {
            match tree.first_child(rule) {
                Some(name) if contains(tree, name, position) => {
                    found.set(Some(name));
                    WalkAction::SkipChildren
                }
                _ => WalkAction::Continue,
            }
        })),
        element: Some(Box::new(|tree: &GrammarTree, id| {
            if contains(tree, id, position) {
                found.set(Some(id));
            }
            WalkAction::Continue
        })),
        ..Visitor::default()
    };
    walk(tree, tree.root(), &mut visitor);
    drop(visitor);
    found.get()
}

#[cfg(test)]
mod tests {
    use antlr4ls_parser::NodeKind;

    use super::*;

    const SOURCE: &str = "grammar T;\nr : a B ;\nB : 'b' ;\na : ;\n";

    fn locate_at(line: u32, character: u32) -> Option<(NodeKind, String)> {
        let parse = antlr4ls_parser::parse(SOURCE);
        let tree = parse.tree();
        locate(tree, Position::new(line, character))
            .map(|id| (tree.kind(id), tree.text(id).to_string()))
    }

    #[test]
    fn parser_rule_name_gives_the_header() {
        assert_eq!(locate_at(1, 0), Some((NodeKind::Rule, "RULE".to_string())));
        assert_eq!(locate_at(3, 1), Some((NodeKind::Rule, "RULE".to_string())));
    }

    #[test]
    fn lexer_rule_name_gives_the_name() {
        assert_eq!(locate_at(2, 0), Some((NodeKind::TokenRef, "B".to_string())));
    }

    #[test]
    fn references_are_right_inclusive() {
        assert_eq!(locate_at(1, 4), Some((NodeKind::RuleRef, "a".to_string())));
        assert_eq!(locate_at(1, 5), Some((NodeKind::RuleRef, "a".to_string())));
        assert_eq!(locate_at(1, 6), Some((NodeKind::TokenRef, "B".to_string())));
        assert_eq!(locate_at(2, 5), Some((NodeKind::StringLiteral, "'b'".to_string())));
    }

    #[test]
    fn nothing_outside_text() {
        assert_eq!(locate_at(1, 2), None);
        assert_eq!(locate_at(0, 3), None);
        assert_eq!(locate_at(9, 0), None);
    }
}
