//! Arena-allocated grammar tree.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]; every
//! node knows its parent, so candidate filtering can ask "is my parent a
//! rule header" in constant time without reference cycles.

use std::fmt;

use antlr4ls_common::span::Span;

use crate::node_kind::NodeKind;

/// Index of a node in its [`GrammarTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The three flavours of grammar file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarType {
    Combined,
    Lexer,
    Parser,
}

impl GrammarType {
    /// Text of the root node.
    pub fn root_text(self) -> &'static str {
        match self {
            GrammarType::Combined => "COMBINED_GRAMMAR",
            GrammarType::Lexer => "LEXER_GRAMMAR",
            GrammarType::Parser => "PARSER_GRAMMAR",
        }
    }
}

impl fmt::Display for GrammarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GrammarType::Combined => "combined",
            GrammarType::Lexer => "lexer",
            GrammarType::Parser => "parser",
        })
    }
}

/// A single tree node.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub text: String,
    /// Source span of the token this node was built from. Imaginary
    /// nodes have none.
    pub span: Option<Span>,
    /// One-based line and zero-based UTF-16 column of `span`.
    position: Option<(u32, u32)>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// A `# label` attached to an alternative of a parser rule.
#[derive(Debug, Clone, PartialEq)]
pub struct AltLabel {
    pub label: String,
    pub rule: NodeId,
    pub alt: NodeId,
    pub span: Span,
}

/// A parsed grammar file.
#[derive(Debug, Clone)]
pub struct GrammarTree {
    nodes: Vec<Node>,
    root: NodeId,
    grammar_type: GrammarType,
    alt_labels: Vec<AltLabel>,
}

impl GrammarTree {
    /// A tree holding only its root.
    pub(crate) fn new(grammar_type: GrammarType) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            grammar_type,
            alt_labels: Vec::new(),
        };
        tree.root = tree.alloc(NodeKind::Grammar, grammar_type.root_text(), None, None);
        tree
    }

    pub(crate) fn alloc(
        &mut self,
        kind: NodeKind,
        text: impl Into<String>,
        span: Option<Span>,
        position: Option<(u32, u32)>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            text: text.into(),
            span,
            position,
            children: Vec::new(),
            parent: None,
        });
        id
    }

    pub(crate) fn push_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.index()].parent.is_none(), "node attached twice");
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Record the `grammar` keyword once the header has been read.
    pub(crate) fn set_header(&mut self, grammar_type: GrammarType, span: Span, position: (u32, u32)) {
        self.grammar_type = grammar_type;
        let root = &mut self.nodes[self.root.index()];
        root.text = grammar_type.root_text().to_string();
        root.span = Some(span);
        root.position = Some(position);
    }

    pub(crate) fn add_alt_label(&mut self, label: AltLabel) {
        self.alt_labels.push(label);
    }

    // ── Node access ──────────────────────────────────────────────────────

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.node(id).text
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn grammar_type(&self) -> GrammarType {
        self.grammar_type
    }

    /// The name after `grammar`, if the header parsed.
    pub fn grammar_name(&self) -> Option<&str> {
        self.children(self.root)
            .first()
            .filter(|&&id| self.kind(id) == NodeKind::Id)
            .map(|&id| self.text(id))
    }

    pub fn alt_labels(&self) -> &[AltLabel] {
        &self.alt_labels
    }

    // ── Positions ────────────────────────────────────────────────────────

    /// One-based line and zero-based column of a node.
    ///
    /// Nodes built without a token take the position of their first child,
    /// recursively. `None` means no node on that path carries a token.
    pub fn position(&self, id: NodeId) -> Option<(u32, u32)> {
        let mut current = id;
        loop {
            let node = self.node(current);
            if let Some(pos) = node.position {
                return Some(pos);
            }
            current = *node.children.first()?;
        }
    }

    /// One-based line, or 0 when the node has no position.
    pub fn line(&self, id: NodeId) -> u32 {
        self.position(id).map_or(0, |(line, _)| line)
    }

    /// Zero-based UTF-16 column, or 0 when the node has no position.
    pub fn column(&self, id: NodeId) -> u32 {
        self.position(id).map_or(0, |(_, column)| column)
    }

    /// Span of the node's token, falling back to the first child like
    /// [`GrammarTree::position`].
    pub fn anchor_span(&self, id: NodeId) -> Option<Span> {
        let mut current = id;
        loop {
            let node = self.node(current);
            if let Some(span) = node.span {
                return Some(span);
            }
            current = *node.children.first()?;
        }
    }

    // ── Rules ────────────────────────────────────────────────────────────

    /// Whether the node is a rule header (`RULE`).
    pub fn is_rule_header(&self, id: NodeId) -> bool {
        self.kind(id) == NodeKind::Rule
    }

    /// Declared name of a rule header.
    pub fn rule_name(&self, rule: NodeId) -> Option<&str> {
        if !self.is_rule_header(rule) {
            return None;
        }
        self.first_child(rule).map(|name| self.text(name))
    }

    /// Whether a rule header declares a lexer rule (uppercase name).
    pub fn is_lexer_rule(&self, rule: NodeId) -> bool {
        self.is_rule_header(rule)
            && self
                .first_child(rule)
                .is_some_and(|name| self.kind(name) == NodeKind::TokenRef)
    }

    /// Whether a rule header carries the `fragment` modifier.
    pub fn is_fragment(&self, rule: NodeId) -> bool {
        self.child_of_kind(rule, NodeKind::RuleModifiers)
            .is_some_and(|mods| {
                self.children(mods)
                    .iter()
                    .any(|&m| self.text(m) == "fragment")
            })
    }

    /// Every rule header, including rules inside lexer modes, in source order.
    pub fn rules(&self) -> Vec<NodeId> {
        self.nodes_of_kind(NodeKind::Rule)
    }

    /// The rule a node belongs to.
    pub fn enclosing_rule(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_rule_header(node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// First direct child with the given kind.
    pub fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id).iter().copied().find(|&c| self.kind(c) == kind)
    }

    // ── Traversal ────────────────────────────────────────────────────────

    /// All nodes below and including `from`, in pre-order.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// All nodes of a kind, in source order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.kind(id) == kind)
            .collect()
    }

    /// Render the subtree rooted at `id` as an s-expression.
    ///
    /// Leaves render as their text; other nodes as `(text child child ...)`.
    pub fn to_string_tree(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_tree(id, &mut out);
        out
    }

    fn write_tree(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        if node.children.is_empty() {
            out.push_str(&node.text);
            return;
        }
        out.push('(');
        out.push_str(&node.text);
        for &child in &node.children {
            out.push(' ');
            self.write_tree(child, out);
        }
        out.push(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// (RULE r (BLOCK (ALT A)))
    fn small_tree() -> (GrammarTree, NodeId, NodeId) {
        let mut tree = GrammarTree::new(GrammarType::Combined);
        let rule = tree.alloc(NodeKind::Rule, "RULE", None, None);
        let name = tree.alloc(NodeKind::RuleRef, "r", Some(Span::new(0, 1)), Some((3, 0)));
        let block = tree.alloc(NodeKind::Block, "BLOCK", Some(Span::new(2, 3)), Some((3, 2)));
        let alt = tree.alloc(NodeKind::Alt, "ALT", None, None);
        let a = tree.alloc(NodeKind::TokenRef, "A", Some(Span::new(4, 5)), Some((3, 4)));
        tree.push_child(alt, a);
        tree.push_child(block, alt);
        tree.push_child(rule, name);
        tree.push_child(rule, block);
        let root = tree.root();
        tree.push_child(root, rule);
        (tree, rule, alt)
    }

    #[test]
    fn string_tree_renders_nested_s_expression() {
        let (tree, rule, _) = small_tree();
        assert_eq!(tree.to_string_tree(rule), "(RULE r (BLOCK (ALT A)))");
    }

    #[test]
    fn imaginary_nodes_inherit_first_child_position() {
        let (tree, rule, alt) = small_tree();
        assert_eq!(tree.position(alt), Some((3, 4)));
        assert_eq!(tree.position(rule), Some((3, 0)));
        assert_eq!(tree.line(tree.root()), 3);
    }

    #[test]
    fn rule_header_queries() {
        let (tree, rule, alt) = small_tree();
        assert!(tree.is_rule_header(rule));
        assert_eq!(tree.rule_name(rule), Some("r"));
        assert!(!tree.is_lexer_rule(rule));
        assert_eq!(tree.enclosing_rule(alt), Some(rule));
        assert_eq!(tree.rules(), vec![rule]);
    }

    #[test]
    fn nodes_of_kind_is_pre_order() {
        let mut tree = GrammarTree::new(GrammarType::Combined);
        let root = tree.root();
        // Allocate in reverse so arena order differs from tree order.
        let second = tree.alloc(NodeKind::RuleRef, "b", None, None);
        let first = tree.alloc(NodeKind::RuleRef, "a", None, None);
        tree.push_child(root, first);
        tree.push_child(root, second);
        assert_eq!(tree.nodes_of_kind(NodeKind::RuleRef), vec![first, second]);
    }

    #[test]
    fn node_without_any_position() {
        let mut tree = GrammarTree::new(GrammarType::Lexer);
        let eps = tree.alloc(NodeKind::Epsilon, "EPSILON", None, None);
        assert_eq!(tree.position(eps), None);
        assert_eq!(tree.line(eps), 0);
        assert_eq!(tree.text(tree.root()), "LEXER_GRAMMAR");
    }
}
