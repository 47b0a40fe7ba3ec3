// Grammar lexer -- tokenizer for `.g4` grammar files.

mod cursor;

use antlr4ls_common::error::LexErrorKind;
use antlr4ls_common::token::{keyword_from_str, Token, TokenKind};
use cursor::Cursor;

/// The grammar lexer. Converts `.g4` source text into a stream of tokens.
///
/// Implements `Iterator<Item = Token>`; the final item is always `Eof`.
/// Malformed input never stops the lexer: it yields an `Error` token
/// describing the problem and resumes after it.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    /// Whether we have already emitted the `Eof` token.
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
        }
    }

    /// Convenience: tokenize the entire source into a `Vec<Token>`.
    ///
    /// The returned vector includes the final `Eof` token.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, start, start);
        };

        match c {
            ';' => self.single_char_token(TokenKind::Semi, start),
            '(' => self.single_char_token(TokenKind::LParen, start),
            ')' => self.single_char_token(TokenKind::RParen, start),
            '}' => self.single_char_token(TokenKind::RBrace, start),
            '|' => self.single_char_token(TokenKind::Or, start),
            '=' => self.single_char_token(TokenKind::Assign, start),
            '?' => self.single_char_token(TokenKind::Question, start),
            '*' => self.single_char_token(TokenKind::Star, start),
            '~' => self.single_char_token(TokenKind::Tilde, start),
            ',' => self.single_char_token(TokenKind::Comma, start),
            '<' => self.single_char_token(TokenKind::Lt, start),
            '>' => self.single_char_token(TokenKind::Gt, start),
            '@' => self.single_char_token(TokenKind::At, start),
            '#' => self.single_char_token(TokenKind::Pound, start),

            ':' => self.lex_colon(start),
            '+' => self.lex_plus(start),
            '.' => self.lex_dot(start),
            '-' => self.lex_arrow(start),
            '/' => self.lex_comment(start),

            '\'' => self.lex_string_literal(start),
            '{' => self.lex_action(start),
            '[' => self.lex_bracket_block(start),
            '0'..='9' => {
                self.cursor.eat_while(|c| c.is_ascii_digit());
                Token::new(TokenKind::Int, start, self.cursor.pos())
            }

            c if is_ident_start(c) => self.lex_ident(start),

            _ => {
                self.cursor.advance();
                Token::new(
                    TokenKind::Error(LexErrorKind::UnexpectedCharacter(c)),
                    start,
                    self.cursor.pos(),
                )
            }
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn skip_whitespace(&mut self) {
        self.cursor
            .eat_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{000C}'));
    }

    fn single_char_token(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    fn error_token(&self, kind: LexErrorKind, start: u32) -> Token {
        Token::new(TokenKind::Error(kind), start, self.cursor.pos())
    }

    // ── Punctuation ──────────────────────────────────────────────────────

    /// `:` -> `Colon`, `::` -> `ColonColon`
    fn lex_colon(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat(':') {
            TokenKind::ColonColon
        } else {
            TokenKind::Colon
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `+` -> `Plus`, `+=` -> `PlusAssign`
    fn lex_plus(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('=') {
            TokenKind::PlusAssign
        } else {
            TokenKind::Plus
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `.` -> `Dot`, `..` -> `Range`
    fn lex_dot(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('.') {
            TokenKind::Range
        } else {
            TokenKind::Dot
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `->` -> `RArrow`; a lone `-` is not a grammar token.
    fn lex_arrow(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.eat('>') {
            Token::new(TokenKind::RArrow, start, self.cursor.pos())
        } else {
            self.error_token(LexErrorKind::UnexpectedCharacter('-'), start)
        }
    }

    // ── Comments ─────────────────────────────────────────────────────────

    /// `//` line comments, `/* */` block comments and `/** */` doc comments.
    fn lex_comment(&mut self, start: u32) -> Token {
        self.cursor.advance(); // consume '/'
        match self.cursor.peek() {
            Some('/') => {
                self.cursor.eat_while(|c| c != '\n');
                Token::new(TokenKind::LineComment, start, self.cursor.pos())
            }
            Some('*') => {
                self.cursor.advance();
                let is_doc = self.cursor.peek() == Some('*') && self.cursor.peek_next() != Some('/');
                loop {
                    match self.cursor.advance() {
                        None => return self.error_token(LexErrorKind::UnterminatedComment, start),
                        Some('*') if self.cursor.peek() == Some('/') => {
                            self.cursor.advance();
                            break;
                        }
                        Some(_) => {}
                    }
                }
                let kind = if is_doc {
                    TokenKind::DocComment
                } else {
                    TokenKind::BlockComment
                };
                Token::new(kind, start, self.cursor.pos())
            }
            _ => self.error_token(LexErrorKind::UnexpectedCharacter('/'), start),
        }
    }

    // ── Literals and embedded code ───────────────────────────────────────

    /// `'...'` with backslash escapes. Literals may not span lines.
    fn lex_string_literal(&mut self, start: u32) -> Token {
        self.cursor.advance(); // consume opening quote
        loop {
            match self.cursor.peek() {
                None | Some('\n') | Some('\r') => {
                    return self.error_token(LexErrorKind::UnterminatedString, start);
                }
                Some('\'') => {
                    self.cursor.advance();
                    return Token::new(TokenKind::StringLiteral, start, self.cursor.pos());
                }
                Some('\\') => {
                    self.cursor.advance();
                    if !matches!(self.cursor.peek(), None | Some('\n') | Some('\r')) {
                        self.cursor.advance();
                    }
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// `{...}` with nested braces, or `{...}?` for a semantic predicate.
    ///
    /// Braces inside target-language strings, character literals and
    /// comments do not count towards nesting.
    fn lex_action(&mut self, start: u32) -> Token {
        self.cursor.advance(); // consume '{'
        let mut depth = 1u32;
        while depth > 0 {
            let Some(c) = self.cursor.advance() else {
                return self.error_token(LexErrorKind::UnterminatedAction, start);
            };
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                '\\' => {
                    self.cursor.advance();
                }
                '"' => self.skip_quoted('"'),
                '\'' => self.skip_char_literal(),
                '/' if self.cursor.peek() == Some('/') => self.cursor.eat_while(|c| c != '\n'),
                '/' if self.cursor.peek() == Some('*') => {
                    self.cursor.advance();
                    while let Some(c) = self.cursor.advance() {
                        if c == '*' && self.cursor.eat('/') {
                            break;
                        }
                    }
                }
                _ => {}
            }
        }
        if self.cursor.eat('?') {
            Token::new(TokenKind::SemPred, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::Action, start, self.cursor.pos())
        }
    }

    /// Skip a quoted string inside an action; the opening quote is consumed.
    fn skip_quoted(&mut self, quote: char) {
        while let Some(c) = self.cursor.advance() {
            match c {
                '\\' => {
                    self.cursor.advance();
                }
                '\n' => return,
                c if c == quote => return,
                _ => {}
            }
        }
    }

    /// Skip `'x'` or `'\x'` inside an action. A lone apostrophe is left alone.
    fn skip_char_literal(&mut self) {
        let rest = self.cursor.rest();
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some('\\'), _) => self.skip_quoted('\''),
            (Some(c), Some('\'')) if c != '\n' => {
                self.cursor.advance();
                self.cursor.advance();
            }
            _ => {}
        }
    }

    /// `[...]` up to the first unescaped `]` on the same line.
    fn lex_bracket_block(&mut self, start: u32) -> Token {
        self.cursor.advance(); // consume '['
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    return self.error_token(LexErrorKind::UnterminatedBracket, start);
                }
                Some(']') => {
                    self.cursor.advance();
                    return Token::new(TokenKind::BracketBlock, start, self.cursor.pos());
                }
                Some('\\') => {
                    self.cursor.advance();
                    if self.cursor.peek() != Some('\n') {
                        self.cursor.advance();
                    }
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    // ── Identifiers and keywords ─────────────────────────────────────────

    /// Identifiers, keywords and the `options {` / `tokens {` / `channels {`
    /// openers, which ANTLR lexes as single tokens.
    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.advance();
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());

        let opener = match text {
            "options" => Some(TokenKind::OptionsOpen),
            "tokens" => Some(TokenKind::TokensOpen),
            "channels" => Some(TokenKind::ChannelsOpen),
            _ => None,
        };
        if let Some(kind) = opener {
            if self
                .cursor
                .rest()
                .trim_start_matches([' ', '\t', '\r', '\n'])
                .starts_with('{')
            {
                self.skip_whitespace();
                self.cursor.advance(); // consume '{'
                return Token::new(kind, start, self.cursor.pos());
            }
        }

        let kind = keyword_from_str(text).unwrap_or_else(|| {
            if text.chars().next().is_some_and(char::is_uppercase) {
                TokenKind::TokenRef
            } else {
                TokenKind::RuleRef
            }
        });
        Token::new(kind, start, self.cursor.pos())
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

/// Whether a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Whether a character can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
