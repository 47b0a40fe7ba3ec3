use serde::Serialize;

use crate::error::LexErrorKind;
use crate::span::Span;

/// A token produced by the grammar lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token from a kind and byte offsets.
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// Every kind of token that can appear in a `.g4` grammar file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // ── Keywords ───────────────────────────────────────────────────────
    Grammar,
    Lexer,
    Parser,
    Fragment,
    Import,
    Mode,
    Returns,
    Locals,
    Throws,
    Catch,
    Finally,
    Public,
    Private,
    Protected,

    // ── Prequel openers ────────────────────────────────────────────────
    /// `options {` (keyword and brace lexed together)
    OptionsOpen,
    /// `tokens {`
    TokensOpen,
    /// `channels {`
    ChannelsOpen,

    // ── Names and literals ─────────────────────────────────────────────
    /// Identifier starting with an uppercase letter.
    TokenRef,
    /// Any other identifier.
    RuleRef,
    /// `'...'`, quotes included.
    StringLiteral,
    /// Decimal integer (option values, lexer command arguments).
    Int,
    /// `{...}` with balanced braces.
    Action,
    /// `{...}?`
    SemPred,
    /// `[...]`: a character set in lexer rules, an argument action elsewhere.
    BracketBlock,

    // ── Punctuation ────────────────────────────────────────────────────
    /// `:`
    Colon,
    /// `::`
    ColonColon,
    /// `;`
    Semi,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `}` closing a prequel block
    RBrace,
    /// `|`
    Or,
    /// `->`
    RArrow,
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `?`
    Question,
    /// `*`
    Star,
    /// `+`
    Plus,
    /// `~`
    Tilde,
    /// `..`
    Range,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `@`
    At,
    /// `#`
    Pound,

    // ── Trivia ─────────────────────────────────────────────────────────
    LineComment,
    BlockComment,
    DocComment,

    // ── Special ────────────────────────────────────────────────────────
    /// Unrecognized or unterminated input.
    Error(LexErrorKind),
    Eof,
}

impl TokenKind {
    /// Comments are skipped by the parser's lookahead.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment
        )
    }

    /// Whether the token can serve as a plain identifier (`id` in the
    /// grammar-of-grammars): option names, labels, command names.
    pub fn is_identifier(&self) -> bool {
        matches!(self, TokenKind::TokenRef | TokenKind::RuleRef)
    }

    /// Human-readable form used in "expecting ..." messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Grammar => "'grammar'",
            TokenKind::Lexer => "'lexer'",
            TokenKind::Parser => "'parser'",
            TokenKind::Fragment => "'fragment'",
            TokenKind::Import => "'import'",
            TokenKind::Mode => "'mode'",
            TokenKind::Returns => "'returns'",
            TokenKind::Locals => "'locals'",
            TokenKind::Throws => "'throws'",
            TokenKind::Catch => "'catch'",
            TokenKind::Finally => "'finally'",
            TokenKind::Public => "'public'",
            TokenKind::Private => "'private'",
            TokenKind::Protected => "'protected'",
            TokenKind::OptionsOpen => "'options {'",
            TokenKind::TokensOpen => "'tokens {'",
            TokenKind::ChannelsOpen => "'channels {'",
            TokenKind::TokenRef => "TOKEN_REF",
            TokenKind::RuleRef => "RULE_REF",
            TokenKind::StringLiteral => "STRING_LITERAL",
            TokenKind::Int => "INT",
            TokenKind::Action => "ACTION",
            TokenKind::SemPred => "SEMPRED",
            TokenKind::BracketBlock => "'[...]'",
            TokenKind::Colon => "':'",
            TokenKind::ColonColon => "'::'",
            TokenKind::Semi => "';'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::RBrace => "'}'",
            TokenKind::Or => "'|'",
            TokenKind::RArrow => "'->'",
            TokenKind::Assign => "'='",
            TokenKind::PlusAssign => "'+='",
            TokenKind::Question => "'?'",
            TokenKind::Star => "'*'",
            TokenKind::Plus => "'+'",
            TokenKind::Tilde => "'~'",
            TokenKind::Range => "'..'",
            TokenKind::Dot => "'.'",
            TokenKind::Comma => "','",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::At => "'@'",
            TokenKind::Pound => "'#'",
            TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment => "comment",
            TokenKind::Error(_) => "<error>",
            TokenKind::Eof => "<EOF>",
        }
    }
}

/// Look up a keyword from its source text.
///
/// `options`, `tokens` and `channels` are not listed: they only act as
/// keywords when followed by `{` and the lexer handles that lookahead.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "grammar" => Some(TokenKind::Grammar),
        "lexer" => Some(TokenKind::Lexer),
        "parser" => Some(TokenKind::Parser),
        "fragment" => Some(TokenKind::Fragment),
        "import" => Some(TokenKind::Import),
        "mode" => Some(TokenKind::Mode),
        "returns" => Some(TokenKind::Returns),
        "locals" => Some(TokenKind::Locals),
        "throws" => Some(TokenKind::Throws),
        "catch" => Some(TokenKind::Catch),
        "finally" => Some(TokenKind::Finally),
        "public" => Some(TokenKind::Public),
        "private" => Some(TokenKind::Private),
        "protected" => Some(TokenKind::Protected),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_from_str_recognizes_keywords() {
        let keywords = [
            ("grammar", TokenKind::Grammar),
            ("lexer", TokenKind::Lexer),
            ("parser", TokenKind::Parser),
            ("fragment", TokenKind::Fragment),
            ("import", TokenKind::Import),
            ("mode", TokenKind::Mode),
            ("returns", TokenKind::Returns),
            ("locals", TokenKind::Locals),
            ("throws", TokenKind::Throws),
            ("catch", TokenKind::Catch),
            ("finally", TokenKind::Finally),
            ("public", TokenKind::Public),
            ("private", TokenKind::Private),
            ("protected", TokenKind::Protected),
        ];

        for (s, expected) in &keywords {
            assert_eq!(
                keyword_from_str(s),
                Some(expected.clone()),
                "keyword_from_str({s:?}) should return Some({expected:?})"
            );
        }
    }

    #[test]
    fn keyword_from_str_rejects_non_keywords() {
        assert_eq!(keyword_from_str("expression"), None);
        assert_eq!(keyword_from_str("options"), None);
        assert_eq!(keyword_from_str("Grammar"), None); // case-sensitive
        assert_eq!(keyword_from_str(""), None);
    }

    #[test]
    fn trivia_classification() {
        assert!(TokenKind::LineComment.is_trivia());
        assert!(TokenKind::DocComment.is_trivia());
        assert!(!TokenKind::RuleRef.is_trivia());
        assert!(TokenKind::TokenRef.is_identifier());
        assert!(!TokenKind::Mode.is_identifier());
    }
}
