//! Names a grammar can use without declaring them itself: token
//! vocabularies (`options { tokenVocab = V; }`) and imported grammars.

use std::fs;
use std::path::{Path, PathBuf};

use antlr4ls_parser::{GrammarTree, NodeId, NodeKind};
use rustc_hash::FxHashSet;

use crate::Tool;

#[derive(Debug, Default)]
pub(crate) struct Vocabulary {
    /// Token names.
    pub tokens: FxHashSet<String>,
    /// Quoted literals with a token type, e.g. `'+'`.
    pub literals: FxHashSet<String>,
    /// Parser rule names (imports only).
    pub parser_rules: FxHashSet<String>,
}

impl Vocabulary {
    pub fn extend(&mut self, other: Vocabulary) {
        self.tokens.extend(other.tokens);
        self.literals.extend(other.literals);
        self.parser_rules.extend(other.parser_rules);
    }
}

/// Parse a `.tokens` file: one `NAME=type` or `'literal'=type` per line.
pub(crate) fn parse_tokens_file(text: &str) -> Vocabulary {
    let mut vocab = Vocabulary::default();
    for line in text.lines() {
        let Some((name, ty)) = line.trim().rsplit_once('=') else {
            continue;
        };
        if name.is_empty() || ty.trim().parse::<i32>().is_err() {
            continue;
        }
        if name.starts_with('\'') {
            vocab.literals.insert(name.to_string());
        } else {
            vocab.tokens.insert(name.to_string());
        }
    }
    vocab
}

/// What another grammar contributes: its lexer rules and `tokens { }`
/// names as tokens, single-literal lexer rules as literals, and parser
/// rule names.
pub(crate) fn vocabulary_of(tree: &GrammarTree) -> Vocabulary {
    let mut vocab = Vocabulary::default();
    for rule in tree.rules() {
        let Some(name) = tree.rule_name(rule) else {
            continue;
        };
        if !tree.is_lexer_rule(rule) {
            vocab.parser_rules.insert(name.to_string());
            continue;
        }
        if tree.is_fragment(rule) {
            continue;
        }
        vocab.tokens.insert(name.to_string());
        if let Some(literal) = single_literal(tree, rule) {
            vocab.literals.insert(literal.to_string());
        }
    }
    for tokens in tree.nodes_of_kind(NodeKind::Tokens) {
        for &id in tree.children(tokens) {
            vocab.tokens.insert(tree.text(id).to_string());
        }
    }
    vocab
}

/// The literal of a rule shaped `X : 'lit' ;`.
fn single_literal(tree: &GrammarTree, rule: NodeId) -> Option<&str> {
    let block = tree.child_of_kind(rule, NodeKind::Block)?;
    let [alt] = tree.children(block) else {
        return None;
    };
    if tree.kind(*alt) != NodeKind::Alt {
        return None;
    }
    match tree.children(*alt) {
        [lit] if tree.kind(*lit) == NodeKind::StringLiteral => Some(tree.text(*lit)),
        _ => None,
    }
}

/// Look for `file_name` next to the grammar, then in the library directory.
pub(crate) fn find_file(tool: &Tool, dir: Option<&Path>, file_name: &str) -> Option<PathBuf> {
    [dir, tool.lib_dir()]
        .into_iter()
        .flatten()
        .map(|d| d.join(file_name))
        .find(|p| p.is_file())
}

/// Resolve `tokenVocab = name`: a `name.tokens` file, or else the
/// grammar `name.g4` itself.
pub(crate) fn load_token_vocab(
    tool: &Tool,
    dir: Option<&Path>,
    name: &str,
) -> Option<(PathBuf, Vocabulary)> {
    if let Some(path) = find_file(tool, dir, &format!("{name}.tokens")) {
        let text = fs::read_to_string(&path).ok()?;
        return Some((path, parse_tokens_file(&text)));
    }
    load_grammar_vocab(tool, dir, name)
}

/// Resolve `import name` to `name.g4`.
pub(crate) fn load_import(
    tool: &Tool,
    dir: Option<&Path>,
    name: &str,
) -> Option<(PathBuf, Vocabulary)> {
    load_grammar_vocab(tool, dir, name)
}

fn load_grammar_vocab(
    tool: &Tool,
    dir: Option<&Path>,
    name: &str,
) -> Option<(PathBuf, Vocabulary)> {
    let path = find_file(tool, dir, &format!("{name}.g4"))?;
    let text = fs::read_to_string(&path).ok()?;
    let parse = antlr4ls_parser::parse(&text);
    let vocab = vocabulary_of(parse.tree());
    Some((path, vocab))
}
