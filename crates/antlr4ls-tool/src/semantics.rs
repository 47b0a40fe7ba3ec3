//! Semantic analysis of a parsed grammar.
//!
//! Checks run in a fixed order and each reports as soon as it finds
//! something, so listeners see messages grouped by check and in source
//! order within a check.

use std::path::Path;

use antlr4ls_common::span::{utf16_len, Span};
use antlr4ls_parser::{walk, GrammarTree, GrammarType, NodeId, NodeKind, Visitor, WalkAction};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::listener::{emit, ToolListener};
use crate::message::ErrorType;
use crate::nullable::Nullability;
use crate::vocab::{self, Vocabulary};
use crate::{Grammar, Tool};

const GRAMMAR_OPTIONS: &[&str] = &[
    "superClass",
    "contextSuperClass",
    "TokenLabelType",
    "tokenVocab",
    "language",
    "accessLevel",
    "exportMacro",
    "caseInsensitive",
];

const COMMANDS_WITHOUT_ARGUMENT: &[&str] = &["skip", "more", "popMode"];
const COMMANDS_WITH_ARGUMENT: &[&str] = &["type", "channel", "mode", "pushMode"];

pub(crate) fn check(tool: &Tool, grammar: &Grammar, listener: &mut dyn ToolListener) {
    let mut checker = Checker::new(tool, grammar, listener);
    checker.check_file_name();
    checker.check_prequels();
    checker.check_options();
    checker.load_token_vocab();
    checker.load_imports();
    checker.check_rule_declarations();
    checker.check_references();
    checker.check_alt_labels();
    checker.check_lexer_commands();
    checker.check_empty_matches();
}

struct Checker<'a> {
    tool: &'a Tool,
    grammar: &'a Grammar,
    tree: &'a GrammarTree,
    listener: &'a mut dyn ToolListener,
    /// First declaration of each rule name.
    rules: FxHashMap<String, NodeId>,
    /// Names brought in by `tokenVocab` and `import`.
    external: Vocabulary,
}

impl<'a> Checker<'a> {
    fn new(tool: &'a Tool, grammar: &'a Grammar, listener: &'a mut dyn ToolListener) -> Self {
        let tree = &grammar.tree;
        let mut rules = FxHashMap::default();
        for rule in tree.rules() {
            if let Some(name) = tree.rule_name(rule) {
                rules.entry(name.to_string()).or_insert(rule);
            }
        }
        Self {
            tool,
            grammar,
            tree,
            listener,
            rules,
            external: Vocabulary::default(),
        }
    }

    fn report(&mut self, error_type: ErrorType, node: NodeId, args: Vec<String>) {
        let message = self.grammar.message_at_node(error_type, node, args);
        emit(self.listener, message);
    }

    fn report_span(&mut self, error_type: ErrorType, span: Span, args: Vec<String>) {
        let message = self.grammar.message_at_span(error_type, span, args);
        emit(self.listener, message);
    }

    fn name_node(&self) -> Option<NodeId> {
        self.tree
            .first_child(self.tree.root())
            .filter(|&id| self.tree.kind(id) == NodeKind::Id)
    }

    fn file_stem(&self) -> &str {
        Path::new(&self.grammar.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }

    /// Prequel sections directly under the root.
    fn root_children_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.tree
            .children(self.tree.root())
            .iter()
            .copied()
            .filter(|&id| self.tree.kind(id) == kind)
            .collect()
    }

    /// `(= name value)` entries of the grammar-level `options { }`.
    fn grammar_options(&self) -> Vec<(NodeId, NodeId)> {
        self.root_children_of_kind(NodeKind::Options)
            .into_iter()
            .flat_map(|options| self.tree.children(options).to_vec())
            .filter(|&opt| self.tree.kind(opt) == NodeKind::Assign)
            .filter_map(|opt| match self.tree.children(opt) {
                [name, value] => Some((*name, *value)),
                _ => None,
            })
            .collect()
    }

    fn is_parser_rule_defined(&self, name: &str) -> bool {
        self.rules
            .get(name)
            .is_some_and(|&rule| !self.tree.is_lexer_rule(rule))
            || self.external.parser_rules.contains(name)
    }

    fn is_lexer_rule_defined(&self, name: &str) -> bool {
        self.rules
            .get(name)
            .is_some_and(|&rule| self.tree.is_lexer_rule(rule))
    }

    fn is_token_defined(&self, name: &str) -> bool {
        name == "EOF"
            || self.is_lexer_rule_defined(name)
            || self.external.tokens.contains(name)
            || self.root_children_of_kind(NodeKind::Tokens).into_iter().any(|tokens| {
                self.tree
                    .children(tokens)
                    .iter()
                    .any(|&id| self.tree.text(id) == name)
            })
    }

    // ── Grammar level ────────────────────────────────────────────────────

    fn check_file_name(&mut self) {
        let Some(name) = self.name_node() else {
            return;
        };
        let stem = self.file_stem();
        if self.tree.text(name) != stem {
            let args = vec![self.tree.text(name).to_string(), self.grammar.file_name.clone()];
            self.report(ErrorType::FileAndGrammarNameDiffer, name, args);
        }
    }

    fn check_prequels(&mut self) {
        let mut seen = FxHashSet::default();
        for &id in self.tree.children(self.tree.root()) {
            let kind = self.tree.kind(id);
            let is_prequel = matches!(
                kind,
                NodeKind::Options | NodeKind::Tokens | NodeKind::Channels | NodeKind::Import
            );
            if is_prequel && !seen.insert(kind) {
                self.report(ErrorType::RepeatedPrequel, id, Vec::new());
            }
        }
    }

    fn check_options(&mut self) {
        for (name, _) in self.grammar_options() {
            let text = self.tree.text(name);
            if !GRAMMAR_OPTIONS.contains(&text) {
                let args = vec![text.to_string()];
                self.report(ErrorType::IllegalOption, name, args);
            }
        }
    }

    fn load_token_vocab(&mut self) {
        let vocab_values: Vec<NodeId> = self
            .grammar_options()
            .into_iter()
            .filter(|&(name, _)| self.tree.text(name) == "tokenVocab")
            .map(|(_, value)| value)
            .collect();
        for value in vocab_values {
            let name = self.tree.text(value).to_string();
            match vocab::load_token_vocab(self.tool, self.grammar.dir(), &name) {
                Some((path, vocab)) => {
                    self.listener
                        .info(&format!("loaded token vocabulary {}", path.display()));
                    self.external.extend(vocab);
                }
                None => self.report(ErrorType::CannotFindTokensFile, value, vec![name]),
            }
        }
    }

    fn load_imports(&mut self) {
        let mut imported = Vec::new();
        for import in self.root_children_of_kind(NodeKind::Import) {
            for &child in self.tree.children(import) {
                let target = match self.tree.kind(child) {
                    NodeKind::Assign => self.tree.children(child).get(1).copied(),
                    _ => Some(child),
                };
                imported.extend(target);
            }
        }
        for node in imported {
            let name = self.tree.text(node).to_string();
            match vocab::load_import(self.tool, self.grammar.dir(), &name) {
                Some((path, vocab)) => {
                    self.listener
                        .info(&format!("loaded imported grammar {}", path.display()));
                    self.external.extend(vocab);
                }
                None => self.report(ErrorType::CannotFindImportedGrammar, node, vec![name]),
            }
        }
    }

    // ── Rules ────────────────────────────────────────────────────────────

    fn check_rule_declarations(&mut self) {
        let grammar_type = self.tree.grammar_type();
        if grammar_type != GrammarType::Lexer {
            for mode in self.root_children_of_kind(NodeKind::Mode) {
                let name = self.tree.first_child(mode).unwrap_or(mode);
                let args = vec![self.tree.text(name).to_string()];
                self.report(ErrorType::ModeNotInLexer, name, args);
            }
        }

        let rules = self.tree.rules();
        for &rule in &rules {
            let Some(name_node) = self.tree.first_child(rule) else {
                continue;
            };
            let name = self.tree.text(name_node).to_string();
            let lexer = self.tree.is_lexer_rule(rule);
            if grammar_type == GrammarType::Lexer && !lexer {
                self.report(ErrorType::ParserRulesNotAllowed, name_node, vec![name.clone()]);
            }
            if grammar_type == GrammarType::Parser && lexer {
                self.report(ErrorType::LexerRulesNotAllowed, name_node, vec![name.clone()]);
            }
            if let Some(&first) = self.rules.get(&name) {
                if first != rule {
                    let previous = self.tree.line(first).to_string();
                    self.report(ErrorType::RuleRedefinition, name_node, vec![name, previous]);
                }
            }
        }

        if rules.is_empty() {
            let (node, name) = match self.name_node() {
                Some(id) => (id, self.tree.text(id).to_string()),
                None => (self.tree.root(), self.file_stem().to_string()),
            };
            self.report(ErrorType::NoRules, node, vec![name]);
        }
    }

    fn check_references(&mut self) {
        let mut elements = Vec::new();
        {
            let mut visitor = Visitor {
                element: Some(Box::new(|_: &GrammarTree, id| {
                    elements.push(id);
                    WalkAction::Continue
                })),
                ..Visitor::default()
            };
            walk(self.tree, self.tree.root(), &mut visitor);
        }

        for id in elements {
            let Some(rule) = self.tree.enclosing_rule(id) else {
                continue;
            };
            let in_lexer_rule = self.tree.is_lexer_rule(rule);
            let text = self.tree.text(id).to_string();
            match self.tree.kind(id) {
                NodeKind::TokenRef if in_lexer_rule => {
                    if text != "EOF"
                        && !self.is_lexer_rule_defined(&text)
                        && !self.external.tokens.contains(&text)
                    {
                        self.report(ErrorType::UndefinedRuleRef, id, vec![text]);
                    }
                }
                NodeKind::TokenRef => {
                    if !self.is_token_defined(&text) {
                        self.report(ErrorType::ImplicitTokenDefinition, id, vec![text]);
                    }
                }
                NodeKind::RuleRef if in_lexer_rule => {
                    let rule_name = self.tree.rule_name(rule).unwrap_or("").to_string();
                    self.report(ErrorType::ParserRuleRefInLexerRule, id, vec![text, rule_name]);
                }
                NodeKind::RuleRef => {
                    if !self.is_parser_rule_defined(&text) {
                        self.report(ErrorType::UndefinedRuleRef, id, vec![text]);
                    }
                }
                NodeKind::StringLiteral => {
                    if text == "''" {
                        self.report(ErrorType::EmptyStringsAndSetsNotAllowed, id, vec![text]);
                        continue;
                    }
                    self.check_escapes(id, LITERAL_ESCAPES);
                    if !in_lexer_rule
                        && self.tree.grammar_type() == GrammarType::Parser
                        && !self.external.literals.contains(&text)
                    {
                        self.report(ErrorType::ImplicitStringDefinition, id, vec![text]);
                    }
                }
                NodeKind::LexerCharSet => {
                    if text == "[]" {
                        self.report(ErrorType::EmptyStringsAndSetsNotAllowed, id, vec![text]);
                        continue;
                    }
                    self.check_escapes(id, SET_ESCAPES);
                }
                _ => {}
            }
        }
    }

    /// Report every `\x` in a literal or set whose `x` is not in `valid`.
    fn check_escapes(&mut self, id: NodeId, valid: &[char]) {
        let Some(span) = self.tree.anchor_span(id) else {
            return;
        };
        let Some((line, column)) = self.tree.position(id) else {
            return;
        };
        let text = self.tree.text(id).to_string();
        let mut chars = text.char_indices();
        while let Some((offset, c)) = chars.next() {
            if c != '\\' {
                continue;
            }
            let Some((_, escaped)) = chars.next() else {
                break;
            };
            if valid.contains(&escaped) {
                continue;
            }
            let escape = format!("\\{escaped}");
            let start = span.start + offset as u32;
            let escape_span = Span::new(start, start + escape.len() as u32);
            let escape_column = column + utf16_len(&text[..offset]);
            let message = self.grammar.message(
                ErrorType::InvalidEscapeSequence,
                line,
                escape_column,
                escape_span,
                vec![escape],
            );
            emit(self.listener, message);
        }
    }

    // ── Alternatives ─────────────────────────────────────────────────────

    fn check_alt_labels(&mut self) {
        let labels = self.tree.alt_labels().to_vec();
        let mut first_rule_of_label: FxHashMap<String, NodeId> = FxHashMap::default();

        for rule in self.tree.rules() {
            if self.tree.is_lexer_rule(rule) {
                continue;
            }
            let rule_labels: Vec<_> = labels.iter().filter(|l| l.rule == rule).collect();
            if rule_labels.is_empty() {
                continue;
            }
            let rule_name = self.tree.rule_name(rule).unwrap_or("").to_string();
            let alt_count = self
                .tree
                .child_of_kind(rule, NodeKind::Block)
                .map_or(0, |block| self.tree.children(block).len());
            if rule_labels.len() < alt_count {
                let name_node = self.tree.first_child(rule).unwrap_or(rule);
                self.report(ErrorType::RuleWithTooFewAltLabels, name_node, vec![rule_name.clone()]);
            }

            for label in rule_labels {
                let as_rule = decapitalize(&label.label);
                if self.is_parser_rule_defined(&as_rule) {
                    self.report_span(
                        ErrorType::AltLabelConflictsWithRule,
                        label.span,
                        vec![label.label.clone(), as_rule],
                    );
                }
                match first_rule_of_label.get(&label.label) {
                    Some(&first) if first != rule => {
                        let original = self.tree.rule_name(first).unwrap_or("").to_string();
                        self.report_span(
                            ErrorType::AltLabelRedef,
                            label.span,
                            vec![label.label.clone(), rule_name.clone(), original],
                        );
                    }
                    Some(_) => {}
                    None => {
                        first_rule_of_label.insert(label.label.clone(), rule);
                    }
                }
            }
        }
    }

    fn check_lexer_commands(&mut self) {
        for with_commands in self.tree.nodes_of_kind(NodeKind::LexerAltAction) {
            let commands = self.tree.children(with_commands).get(1..).unwrap_or(&[]).to_vec();
            for command in commands {
                let (name_node, has_argument) = match self.tree.kind(command) {
                    NodeKind::LexerActionCall => match self.tree.first_child(command) {
                        Some(name) => (name, true),
                        None => continue,
                    },
                    _ => (command, false),
                };
                let name = self.tree.text(name_node).to_string();
                let takes_argument = COMMANDS_WITH_ARGUMENT.contains(&name.as_str());
                if !takes_argument && !COMMANDS_WITHOUT_ARGUMENT.contains(&name.as_str()) {
                    self.report(ErrorType::InvalidLexerCommand, name_node, vec![name]);
                } else if takes_argument && !has_argument {
                    self.report(ErrorType::MissingLexerCommandArgument, name_node, vec![name]);
                } else if !takes_argument && has_argument {
                    self.report(ErrorType::UnwantedLexerCommandArgument, name_node, vec![name]);
                }
            }
        }
    }

    // ── Emptiness ────────────────────────────────────────────────────────

    fn check_empty_matches(&mut self) {
        let tree = self.tree;
        let mut found = Vec::new();
        {
            let mut nullability = Nullability::new(tree, &self.rules);
            for rule in tree.rules() {
                let name = tree.rule_name(rule).unwrap_or("").to_string();
                if tree.is_lexer_rule(rule) && !tree.is_fragment(rule) && nullability.rule(rule) {
                    let name_node = tree.first_child(rule).unwrap_or(rule);
                    found.push((ErrorType::EpsilonToken, name_node, name.clone()));
                }
                for id in tree.descendants(rule) {
                    let kind = tree.kind(id);
                    if !kind.is_ebnf_suffix() {
                        continue;
                    }
                    let Some(block) = tree.first_child(id) else {
                        continue;
                    };
                    let has_nullable_alt = tree.children(block).iter().any(|&alt| {
                        matches!(tree.kind(alt), NodeKind::Alt | NodeKind::LexerAltAction)
                            && nullability.node(alt)
                    });
                    if has_nullable_alt {
                        let error_type = if kind == NodeKind::Optional {
                            ErrorType::EpsilonOptional
                        } else {
                            ErrorType::EpsilonClosure
                        };
                        found.push((error_type, block, name.clone()));
                    }
                }
            }
        }
        for (error_type, node, name) in found {
            self.report(error_type, node, vec![name]);
        }
    }
}

const LITERAL_ESCAPES: &[char] = &['n', 'r', 't', 'b', 'f', '\\', '\'', 'u'];
const SET_ESCAPES: &[char] = &['n', 'r', 't', 'b', 'f', '\\', ']', '-', 'u', 'p', 'P'];

/// `Expr` → `expr`, the context name a label would collide with.
fn decapitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decapitalize_label() {
        assert_eq!(decapitalize("Expr"), "expr");
        assert_eq!(decapitalize("x"), "x");
        assert_eq!(decapitalize(""), "");
    }
}
