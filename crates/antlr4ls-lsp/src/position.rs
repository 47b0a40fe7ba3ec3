//! Conversions between tool coordinates (one-based line, zero-based UTF-16
//! column) and editor coordinates (zero-based line and character).

use antlr4ls_common::span::utf16_len;
use antlr4ls_parser::{GrammarTree, NodeId};
use antlr4ls_tool::ToolMessage;
use tower_lsp::lsp_types::{Position, Range};

pub fn to_editor(line: u32, column: u32) -> Position {
    Position::new(line.saturating_sub(1), column)
}

/// Inverse of [`to_editor`]: `(line, column)` in tool coordinates.
pub fn to_tool(position: Position) -> (u32, u32) {
    (position.line + 1, position.character)
}

/// Range covering a node's text, starting at its position.
pub fn range_of(tree: &GrammarTree, node: NodeId) -> Range {
    range_with_len(tree, node, utf16_len(tree.text(node)))
}

/// Range starting at a node's position with an explicit length.
pub fn range_with_len(tree: &GrammarTree, node: NodeId, len: u32) -> Range {
    let start = to_editor(tree.line(node), tree.column(node));
    Range::new(start, Position::new(start.line, start.character + len))
}

/// Range of a message: the length of argument 0, or empty without args.
pub fn range_of_message(message: &ToolMessage) -> Range {
    let start = to_editor(message.line, message.column);
    let len = message.args.first().map_or(0, |arg| utf16_len(arg));
    Range::new(start, Position::new(start.line, start.character + len))
}

#[cfg(test)]
mod tests {
    use antlr4ls_common::span::Span;
    use antlr4ls_tool::ErrorType;

    use super::*;

    fn message(args: &[&str]) -> ToolMessage {
        ToolMessage {
            error_type: ErrorType::UndefinedRuleRef,
            file_name: "T.g4".to_string(),
            line: 4,
            column: 6,
            span: Span::new(40, 49),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn editor_round_trip() {
        for (line, character) in [(0, 0), (3, 7), (120, 0)] {
            let p = Position::new(line, character);
            let (l, c) = to_tool(p);
            assert_eq!(to_editor(l, c), p);
        }
    }

    #[test]
    fn message_range_uses_first_argument() {
        let range = range_of_message(&message(&["expresion", "ignored"]));
        assert_eq!(range, Range::new(Position::new(3, 6), Position::new(3, 15)));
    }

    #[test]
    fn message_without_args_is_empty() {
        let range = range_of_message(&message(&[]));
        assert_eq!(range.start, range.end);
        assert_eq!(range.start, Position::new(3, 6));
    }

    #[test]
    fn node_range_counts_utf16_units() {
        let parse = antlr4ls_parser::parse("grammar T;\nr : 'é😀' ;\n");
        let tree = parse.tree();
        let literal = tree.nodes_of_kind(antlr4ls_parser::NodeKind::StringLiteral)[0];
        // Quotes, one BMP char and one surrogate pair.
        assert_eq!(
            range_of(tree, literal),
            Range::new(Position::new(1, 4), Position::new(1, 9))
        );
    }
}
