//! Node kinds of the grammar tree.
//!
//! The vocabulary mirrors the tree ANTLR builds for its own grammars, so a
//! rendered tree reads the way ANTLR users expect (`RULE`, `BLOCK`, `ALT`).

use std::fmt;

/// Category of a [`crate::tree::Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // ── Structure (imaginary nodes) ────────────────────────────────────
    /// Root. Text is `COMBINED_GRAMMAR`, `LEXER_GRAMMAR` or `PARSER_GRAMMAR`.
    Grammar,
    Rules,
    /// Rule header; the first child is the declared name.
    Rule,
    RuleModifiers,
    Block,
    Alt,
    LexerAltAction,
    LexerActionCall,
    Set,
    Epsilon,
    ElementOptions,

    // ── Prequels and rule prequels ─────────────────────────────────────
    Options,
    Tokens,
    Channels,
    Import,
    Mode,
    /// `@name {...}` or `@scope::name {...}`
    NamedAction,
    Returns,
    Locals,
    Throws,
    Catch,
    Finally,

    // ── Operators ──────────────────────────────────────────────────────
    /// `?` suffix
    Optional,
    /// `*` suffix
    Closure,
    /// `+` suffix
    PositiveClosure,
    /// `~`
    Not,
    /// `..`
    Range,
    /// `.`
    Wildcard,
    /// `=` (labels, options)
    Assign,
    /// `+=`
    PlusAssign,

    // ── Leaves ─────────────────────────────────────────────────────────
    /// A plain identifier: grammar name, option name, label, lexer command.
    Id,
    RuleModifier,
    TokenRef,
    RuleRef,
    StringLiteral,
    LexerCharSet,
    Action,
    SemPred,
    ArgAction,
    Int,
}

impl NodeKind {
    /// Text carried by imaginary nodes and operators.
    ///
    /// Leaves return `None`: their text is the lexeme.
    pub fn fixed_text(self) -> Option<&'static str> {
        let text = match self {
            NodeKind::Grammar => "GRAMMAR",
            NodeKind::Rules => "RULES",
            NodeKind::Rule => "RULE",
            NodeKind::RuleModifiers => "RULEMODIFIERS",
            NodeKind::Block => "BLOCK",
            NodeKind::Alt => "ALT",
            NodeKind::LexerAltAction => "LEXER_ALT_ACTION",
            NodeKind::LexerActionCall => "LEXER_ACTION_CALL",
            NodeKind::Set => "SET",
            NodeKind::Epsilon => "EPSILON",
            NodeKind::ElementOptions => "ELEMENT_OPTIONS",
            NodeKind::Options => "OPTIONS",
            NodeKind::Tokens => "TOKENS",
            NodeKind::Channels => "CHANNELS",
            NodeKind::Import => "import",
            NodeKind::Mode => "mode",
            NodeKind::NamedAction => "@",
            NodeKind::Returns => "returns",
            NodeKind::Locals => "locals",
            NodeKind::Throws => "throws",
            NodeKind::Catch => "catch",
            NodeKind::Finally => "finally",
            NodeKind::Optional => "?",
            NodeKind::Closure => "*",
            NodeKind::PositiveClosure => "+",
            NodeKind::Not => "~",
            NodeKind::Range => "..",
            NodeKind::Wildcard => ".",
            NodeKind::Assign => "=",
            NodeKind::PlusAssign => "+=",
            NodeKind::Id
            | NodeKind::RuleModifier
            | NodeKind::TokenRef
            | NodeKind::RuleRef
            | NodeKind::StringLiteral
            | NodeKind::LexerCharSet
            | NodeKind::Action
            | NodeKind::SemPred
            | NodeKind::ArgAction
            | NodeKind::Int => return None,
        };
        Some(text)
    }

    /// `?`, `*` and `+` wrappers.
    pub fn is_ebnf_suffix(self) -> bool {
        matches!(
            self,
            NodeKind::Optional | NodeKind::Closure | NodeKind::PositiveClosure
        )
    }

    /// Kinds that occur as elements of an alternative.
    pub fn is_element(self) -> bool {
        matches!(
            self,
            NodeKind::TokenRef
                | NodeKind::RuleRef
                | NodeKind::StringLiteral
                | NodeKind::LexerCharSet
                | NodeKind::Wildcard
                | NodeKind::Not
                | NodeKind::Range
                | NodeKind::Action
                | NodeKind::SemPred
                | NodeKind::Assign
                | NodeKind::PlusAssign
                | NodeKind::Optional
                | NodeKind::Closure
                | NodeKind::PositiveClosure
                | NodeKind::Epsilon
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fixed_text() {
            Some(text) => f.write_str(text),
            None => write!(f, "{self:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imaginary_nodes_have_fixed_text() {
        assert_eq!(NodeKind::Rule.fixed_text(), Some("RULE"));
        assert_eq!(NodeKind::Alt.to_string(), "ALT");
        assert_eq!(NodeKind::Closure.to_string(), "*");
        assert_eq!(NodeKind::RuleRef.fixed_text(), None);
        assert_eq!(NodeKind::RuleRef.to_string(), "RuleRef");
    }

    #[test]
    fn element_classification() {
        assert!(NodeKind::RuleRef.is_element());
        assert!(NodeKind::Closure.is_element());
        assert!(!NodeKind::Block.is_element());
        assert!(!NodeKind::Rule.is_element());
        assert!(!NodeKind::Id.is_element());
        assert!(NodeKind::Optional.is_ebnf_suffix());
    }
}
