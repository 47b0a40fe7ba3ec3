//! Category-based tree walking.
//!
//! [`walk`] visits a subtree in pre-order and hands each node to the hook
//! for its category. Hooks are optional; a missing hook means "keep going".

use crate::node_kind::NodeKind;
use crate::tree::{GrammarTree, NodeId};

/// What the walker does after a hook returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    Continue,
    SkipChildren,
}

type Hook<'a> = Box<dyn FnMut(&GrammarTree, NodeId) -> WalkAction + 'a>;

/// Per-category hooks for [`walk`].
#[derive(Default)]
pub struct Visitor<'a> {
    /// Header of a rule with a lowercase name.
    pub parser_rule: Option<Hook<'a>>,
    /// Header of a rule with an uppercase name.
    pub lexer_rule: Option<Hook<'a>>,
    /// Elements of an alternative: references, literals, sets, actions,
    /// labels, suffix operators and parenthesized subrules. Only nodes
    /// inside a rule body count; option values never do.
    pub element: Option<Hook<'a>>,
}

/// Walk the subtree rooted at `from`.
pub fn walk(tree: &GrammarTree, from: NodeId, visitor: &mut Visitor<'_>) {
    visit(tree, from, visitor, false);
}

fn visit(tree: &GrammarTree, id: NodeId, visitor: &mut Visitor<'_>, in_body: bool) {
    let kind = tree.kind(id);
    let hook = match kind {
        NodeKind::Rule if tree.is_lexer_rule(id) => visitor.lexer_rule.as_mut(),
        NodeKind::Rule => visitor.parser_rule.as_mut(),
        NodeKind::Block if in_body && is_bare_subrule(tree, id) => visitor.element.as_mut(),
        k if in_body && k.is_element() => visitor.element.as_mut(),
        _ => None,
    };
    if let Some(hook) = hook {
        if hook(tree, id) == WalkAction::SkipChildren {
            return;
        }
    }

    let in_body = match kind {
        NodeKind::Block => true,
        NodeKind::ElementOptions | NodeKind::Options | NodeKind::NamedAction => false,
        _ => in_body,
    };
    for &child in tree.children(id) {
        visit(tree, child, visitor, in_body);
    }
}

/// A parenthesized block used directly as an element, not wrapped in a suffix.
fn is_bare_subrule(tree: &GrammarTree, block: NodeId) -> bool {
    tree.parent(block)
        .is_some_and(|p| matches!(tree.kind(p), NodeKind::Alt | NodeKind::Assign | NodeKind::PlusAssign))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::parse;

    #[test]
    fn element_hook_sees_body_nodes_in_source_order() {
        let parse = parse("grammar T;\nr : a B? ;\nB : 'b' ;\n");
        let tree = parse.tree();
        let seen = RefCell::new(Vec::new());
        let mut visitor = Visitor {
            element: Some(Box::new(|tree: &GrammarTree, id| {
                seen.borrow_mut().push(tree.text(id).to_string());
                WalkAction::Continue
            })),
            ..Default::default()
        };
        walk(tree, tree.root(), &mut visitor);
        drop(visitor);
        assert_eq!(seen.into_inner(), vec!["a", "?", "B", "'b'"]);
    }

    #[test]
    fn skip_children_stops_descent() {
        let parse = parse("grammar T;\nr : a ;\nA : 'a' ;\n");
        let tree = parse.tree();
        let elements = RefCell::new(0);
        let rules = RefCell::new(Vec::new());
        let mut visitor = Visitor {
            parser_rule: Some(Box::new(|tree: &GrammarTree, id| {
                rules.borrow_mut().push(tree.rule_name(id).unwrap_or("").to_string());
                WalkAction::SkipChildren
            })),
            lexer_rule: Some(Box::new(|tree: &GrammarTree, id| {
                rules.borrow_mut().push(tree.rule_name(id).unwrap_or("").to_string());
                WalkAction::Continue
            })),
            element: Some(Box::new(|_: &GrammarTree, _| {
                *elements.borrow_mut() += 1;
                WalkAction::Continue
            })),
            ..Default::default()
        };
        walk(tree, tree.root(), &mut visitor);
        drop(visitor);
        assert_eq!(rules.into_inner(), vec!["r", "A"]);
        // Only the lexer rule's literal is visited.
        assert_eq!(elements.into_inner(), 1);
    }

    #[test]
    fn option_values_are_not_elements() {
        let parse = parse("grammar T;\noptions { superClass = 'X'; }\nr : A <assoc=right> ;\n");
        let tree = parse.tree();
        let seen = RefCell::new(Vec::new());
        let mut visitor = Visitor {
            element: Some(Box::new(|tree: &GrammarTree, id| {
                seen.borrow_mut().push(tree.kind(id));
                WalkAction::Continue
            })),
            ..Default::default()
        };
        walk(tree, tree.root(), &mut visitor);
        drop(visitor);
        assert_eq!(seen.into_inner(), vec![NodeKind::TokenRef]);
    }
}
