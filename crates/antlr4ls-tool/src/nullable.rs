//! Which parts of a grammar can match the empty string.

use antlr4ls_parser::{GrammarTree, NodeId, NodeKind};
use rustc_hash::{FxHashMap, FxHashSet};

/// Memoized nullability over one tree.
///
/// A rule reached again while its own nullability is being computed counts
/// as not nullable, which terminates left recursion.
pub(crate) struct Nullability<'t> {
    tree: &'t GrammarTree,
    rules: &'t FxHashMap<String, NodeId>,
    memo: FxHashMap<NodeId, bool>,
    in_progress: FxHashSet<NodeId>,
}

impl<'t> Nullability<'t> {
    pub fn new(tree: &'t GrammarTree, rules: &'t FxHashMap<String, NodeId>) -> Self {
        Self {
            tree,
            rules,
            memo: FxHashMap::default(),
            in_progress: FxHashSet::default(),
        }
    }

    pub fn rule(&mut self, rule: NodeId) -> bool {
        if let Some(&known) = self.memo.get(&rule) {
            return known;
        }
        if !self.in_progress.insert(rule) {
            return false;
        }
        let nullable = match self.tree.child_of_kind(rule, NodeKind::Block) {
            Some(block) => self.node(block),
            None => false,
        };
        self.in_progress.remove(&rule);
        self.memo.insert(rule, nullable);
        nullable
    }

    pub fn node(&mut self, id: NodeId) -> bool {
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Block => {
                for &alt in tree.children(id) {
                    if matches!(tree.kind(alt), NodeKind::Alt | NodeKind::LexerAltAction)
                        && self.node(alt)
                    {
                        return true;
                    }
                }
                false
            }
            NodeKind::Alt => {
                for &element in tree.children(id) {
                    if tree.kind(element) == NodeKind::ElementOptions {
                        continue;
                    }
                    if !self.node(element) {
                        return false;
                    }
                }
                true
            }
            NodeKind::LexerAltAction => tree.first_child(id).is_some_and(|alt| self.node(alt)),
            NodeKind::Epsilon
            | NodeKind::Optional
            | NodeKind::Closure
            | NodeKind::Action
            | NodeKind::SemPred => true,
            NodeKind::PositiveClosure => tree.first_child(id).is_some_and(|b| self.node(b)),
            NodeKind::Assign | NodeKind::PlusAssign => {
                tree.children(id).get(1).is_some_and(|&target| self.node(target))
            }
            NodeKind::RuleRef | NodeKind::TokenRef => match self.rules.get(tree.text(id)) {
                Some(&rule) => self.rule(rule),
                None => false,
            },
            NodeKind::StringLiteral => tree.text(id) == "''",
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nullable_rules(source: &str) -> Vec<(String, bool)> {
        let parse = antlr4ls_parser::parse(source);
        let tree = parse.tree();
        let rules: FxHashMap<String, NodeId> = tree
            .rules()
            .into_iter()
            .filter_map(|r| Some((tree.rule_name(r)?.to_string(), r)))
            .collect();
        let mut nullability = Nullability::new(tree, &rules);
        tree.rules()
            .into_iter()
            .map(|r| (tree.rule_name(r).unwrap_or("").to_string(), nullability.rule(r)))
            .collect()
    }

    #[test]
    fn closures_and_references() {
        let result = nullable_rules(
            "grammar N;\na : b* ;\nb : B+ ;\nc : a B ;\nd : a | ;\ne : e X | ;\nB : 'b' ;\nX : 'x'? ;\n",
        );
        let result: Vec<_> = result.iter().map(|(n, v)| (n.as_str(), *v)).collect();
        assert_eq!(
            result,
            vec![
                ("a", true),
                ("b", false),
                ("c", false),
                ("d", true),
                ("e", true),
                ("B", false),
                ("X", true),
            ]
        );
    }

    #[test]
    fn labels_and_actions() {
        let result = nullable_rules("grammar N;\na : x=b {act();} ;\nb : ;\nc : y+=B ;\nB : 'b' ;\n");
        assert_eq!(result[0], ("a".to_string(), true));
        assert_eq!(result[2], ("c".to_string(), false));
    }
}
