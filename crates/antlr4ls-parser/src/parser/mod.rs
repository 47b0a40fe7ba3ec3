//! Recursive-descent parser for `.g4` grammars.
//!
//! Parse functions build nodes directly into the [`GrammarTree`] arena and
//! return the id of the (still unattached) node they produced; the caller
//! attaches it. On a syntax error a function records a [`ParseError`] and
//! returns `Err(Recovery)`, which unwinds to the nearest rule or prequel
//! boundary. That boundary skips tokens up to its terminator and carries on.
//!
//! Lexer errors are reported up front and their tokens dropped, so the
//! grammar-level code never sees them.

pub(crate) mod elements;
pub(crate) mod rules;

use antlr4ls_common::span::{LineIndex, Span};
use antlr4ls_common::token::{Token, TokenKind};
use antlr4ls_lexer::Lexer;

use crate::error::ParseError;
use crate::node_kind::NodeKind;
use crate::tree::{AltLabel, GrammarTree, GrammarType, NodeId};

/// Marker returned after a syntax error has been recorded.
#[derive(Debug)]
pub(crate) struct Recovery;

pub(crate) type PResult<T> = Result<T, Recovery>;

pub(crate) struct Parser<'src> {
    /// Significant tokens only. Always ends with `Eof`.
    tokens: Vec<Token>,
    /// Current position in the token stream.
    pos: usize,
    source: &'src str,
    index: LineIndex,
    tree: GrammarTree,
    errors: Vec<ParseError>,
    /// Labels of the rule being parsed; kept only if the rule completes.
    pending_labels: Vec<AltLabel>,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        for token in Lexer::new(source) {
            if token.kind.is_trivia() {
                continue;
            }
            if let TokenKind::Error(kind) = &token.kind {
                let text = first_line(&source[token.span.as_range()]);
                errors.push(ParseError::new(kind.to_string(), token.span, text));
                continue;
            }
            tokens.push(token);
        }
        Self {
            tokens,
            pos: 0,
            source,
            index: LineIndex::new(source),
            tree: GrammarTree::new(GrammarType::Combined),
            errors,
            pending_labels: Vec::new(),
        }
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    pub(crate) fn current(&self) -> &TokenKind {
        self.nth(0)
    }

    /// Kind of the Nth token ahead; `Eof` past the end.
    pub(crate) fn nth(&self, n: usize) -> &TokenKind {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)].kind
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        *self.current() == kind
    }

    pub(crate) fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(self.current())
    }

    pub(crate) fn at_identifier(&self) -> bool {
        self.current().is_identifier()
    }

    fn current_token(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Source text of a token; `<EOF>` for the end marker.
    pub(crate) fn token_text(&self, token: &Token) -> &'src str {
        if token.kind == TokenKind::Eof {
            "<EOF>"
        } else {
            &self.source[token.span.as_range()]
        }
    }

    // ── Consumption ────────────────────────────────────────────────────

    /// Consume and return the current token. Stays put at `Eof`.
    pub(crate) fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        if self.at(kind.clone()) {
            Ok(self.bump())
        } else {
            Err(self.error_expecting(kind.describe()))
        }
    }

    /// `TOKEN_REF` or `RULE_REF` used as a plain name.
    pub(crate) fn identifier(&mut self) -> PResult<Token> {
        if self.at_identifier() {
            Ok(self.bump())
        } else {
            Err(self.error_expecting("an identifier"))
        }
    }

    /// Skip to the first token in `stops` and consume it. Stops at `Eof`.
    pub(crate) fn recover_to(&mut self, stops: &[TokenKind]) {
        while !self.at(TokenKind::Eof) && !self.at_any(stops) {
            self.bump();
        }
        if !self.at(TokenKind::Eof) {
            self.bump();
        }
    }

    // ── Errors ─────────────────────────────────────────────────────────

    pub(crate) fn error_expecting(&mut self, expected: &str) -> Recovery {
        let token = self.current_token();
        let text = first_line(self.token_text(token)).to_string();
        let span = token.span;
        self.errors.push(ParseError::new(
            format!("mismatched input '{text}' expecting {expected}"),
            span,
            text,
        ));
        Recovery
    }

    pub(crate) fn error_extraneous(&mut self, expected: &str) {
        let token = self.current_token();
        let text = first_line(self.token_text(token)).to_string();
        let span = token.span;
        self.errors.push(ParseError::new(
            format!("extraneous input '{text}' expecting {expected}"),
            span,
            text,
        ));
    }

    // ── Tree building ──────────────────────────────────────────────────

    fn position_of(&self, span: Span) -> (u32, u32) {
        self.index.line_col(self.source, span.start)
    }

    /// A leaf whose text is the token's lexeme.
    pub(crate) fn leaf(&mut self, kind: NodeKind, token: &Token) -> NodeId {
        let text = self.token_text(token);
        let position = self.position_of(token.span);
        self.tree.alloc(kind, text, Some(token.span), Some(position))
    }

    /// An imaginary or operator node. Without a span it takes its position
    /// from its first child.
    pub(crate) fn node_at(&mut self, kind: NodeKind, span: Option<Span>) -> NodeId {
        let position = span.map(|s| self.position_of(s));
        self.tree
            .alloc(kind, kind.fixed_text().unwrap_or_default(), span, position)
    }

    /// A node with explicit text, used for qualified option values.
    pub(crate) fn node_with_text(&mut self, kind: NodeKind, text: String, span: Span) -> NodeId {
        let position = self.position_of(span);
        self.tree.alloc(kind, text, Some(span), Some(position))
    }

    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.tree.push_child(parent, child);
    }

    pub(crate) fn anchor_span(&self, id: NodeId) -> Option<Span> {
        self.tree.anchor_span(id)
    }

    pub(crate) fn node_kind(&self, id: NodeId) -> NodeKind {
        self.tree.kind(id)
    }

    pub(crate) fn first_child_of(&self, id: NodeId) -> Option<NodeId> {
        self.tree.first_child(id)
    }

    pub(crate) fn push_label(&mut self, label: AltLabel) {
        self.pending_labels.push(label);
    }

    // ── Grammar ────────────────────────────────────────────────────────

    /// `grammarSpec: grammarDecl prequelConstruct* rules modeSpec* EOF`
    pub(crate) fn parse_grammar(mut self) -> (GrammarTree, Vec<ParseError>) {
        if self.grammar_header().is_err() {
            self.recover_to(&[TokenKind::Semi]);
        }
        self.prequels();

        let root = self.tree.root();
        let rules = self.node_at(NodeKind::Rules, None);
        self.attach(root, rules);
        loop {
            self.rule_list(rules);
            if self.at(TokenKind::Eof) {
                break;
            }
            match self.mode_spec() {
                Ok(mode) => self.attach(root, mode),
                Err(Recovery) => self.recover_to(&[TokenKind::Semi]),
            }
        }

        // Lexer errors were collected first; report everything in source order.
        self.errors.sort_by_key(|e| e.span.start);
        (self.tree, self.errors)
    }

    /// `(lexer | parser)? grammar identifier ;`
    fn grammar_header(&mut self) -> PResult<()> {
        let grammar_type = if self.eat(TokenKind::Lexer).is_some() {
            GrammarType::Lexer
        } else if self.eat(TokenKind::Parser).is_some() {
            GrammarType::Parser
        } else {
            GrammarType::Combined
        };
        let keyword = self.expect(TokenKind::Grammar)?;
        let position = self.position_of(keyword.span);
        self.tree.set_header(grammar_type, keyword.span, position);

        let name = self.identifier()?;
        let id = self.leaf(NodeKind::Id, &name);
        let root = self.tree.root();
        self.attach(root, id);
        self.expect(TokenKind::Semi)?;
        Ok(())
    }

    fn prequels(&mut self) {
        let root = self.tree.root();
        loop {
            let (result, stops): (PResult<NodeId>, &[TokenKind]) = match self.current().clone() {
                TokenKind::OptionsOpen => (self.options_spec(), &[TokenKind::RBrace]),
                TokenKind::TokensOpen => (self.id_list_spec(NodeKind::Tokens), &[TokenKind::RBrace]),
                TokenKind::ChannelsOpen => {
                    (self.id_list_spec(NodeKind::Channels), &[TokenKind::RBrace])
                }
                TokenKind::Import => (self.delegate_grammars(), &[TokenKind::Semi]),
                TokenKind::At => (self.named_action(), &[]),
                _ => break,
            };
            match result {
                Ok(node) => self.attach(root, node),
                Err(Recovery) if !stops.is_empty() => self.recover_to(stops),
                Err(Recovery) => {}
            }
        }
    }

    /// `options { (identifier = optionValue ;)* }`
    pub(crate) fn options_spec(&mut self) -> PResult<NodeId> {
        let open = self.bump();
        let options = self.node_at(NodeKind::Options, Some(open.span));
        while !self.at_any(&[TokenKind::RBrace, TokenKind::Eof]) {
            let name = self.identifier()?;
            let assign = self.expect(TokenKind::Assign)?;
            let value = self.option_value()?;
            self.expect(TokenKind::Semi)?;

            let eq = self.node_at(NodeKind::Assign, Some(assign.span));
            let name = self.leaf(NodeKind::Id, &name);
            self.attach(eq, name);
            self.attach(eq, value);
            self.attach(options, eq);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(options)
    }

    /// `identifier (. identifier)* | STRING_LITERAL | ACTION | INT`
    fn option_value(&mut self) -> PResult<NodeId> {
        match self.current().clone() {
            TokenKind::StringLiteral => {
                let token = self.bump();
                Ok(self.leaf(NodeKind::StringLiteral, &token))
            }
            TokenKind::Action => {
                let token = self.bump();
                Ok(self.leaf(NodeKind::Action, &token))
            }
            TokenKind::Int => {
                let token = self.bump();
                Ok(self.leaf(NodeKind::Int, &token))
            }
            kind if kind.is_identifier() => {
                let first = self.bump();
                let mut text = self.token_text(&first).to_string();
                let mut span = first.span;
                while self.at(TokenKind::Dot) {
                    self.bump();
                    let part = self.identifier()?;
                    text.push('.');
                    text.push_str(self.token_text(&part));
                    span = span.merge(part.span);
                }
                Ok(self.node_with_text(NodeKind::Id, text, span))
            }
            _ => Err(self.error_expecting("an option value")),
        }
    }

    /// `tokens { A, B }` and `channels { C }`
    fn id_list_spec(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let open = self.bump();
        let list = self.node_at(kind, Some(open.span));
        while self.at_identifier() {
            let token = self.bump();
            let id = self.leaf(NodeKind::Id, &token);
            self.attach(list, id);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(list)
    }

    /// `import A, B = C ;`
    fn delegate_grammars(&mut self) -> PResult<NodeId> {
        let keyword = self.bump();
        let import = self.node_at(NodeKind::Import, Some(keyword.span));
        loop {
            let name = self.identifier()?;
            let delegate = if let Some(assign) = self.eat(TokenKind::Assign) {
                let target = self.identifier()?;
                let eq = self.node_at(NodeKind::Assign, Some(assign.span));
                let alias = self.leaf(NodeKind::Id, &name);
                let target = self.leaf(NodeKind::Id, &target);
                self.attach(eq, alias);
                self.attach(eq, target);
                eq
            } else {
                self.leaf(NodeKind::Id, &name)
            };
            self.attach(import, delegate);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::Semi)?;
        Ok(import)
    }

    /// `@ (scope ::)? name ACTION`
    pub(crate) fn named_action(&mut self) -> PResult<NodeId> {
        let at = self.bump();
        let action = self.node_at(NodeKind::NamedAction, Some(at.span));
        let first = self.action_scope_name()?;
        let first = self.leaf(NodeKind::Id, &first);
        self.attach(action, first);
        if self.eat(TokenKind::ColonColon).is_some() {
            let name = self.identifier()?;
            let name = self.leaf(NodeKind::Id, &name);
            self.attach(action, name);
        }
        let body = self.expect(TokenKind::Action)?;
        let body = self.leaf(NodeKind::Action, &body);
        self.attach(action, body);
        Ok(action)
    }

    /// An identifier, or the `lexer` / `parser` keywords as action scopes.
    fn action_scope_name(&mut self) -> PResult<Token> {
        if self.at_any(&[TokenKind::Lexer, TokenKind::Parser]) {
            Ok(self.bump())
        } else {
            self.identifier()
        }
    }

    // ── Rules and modes ────────────────────────────────────────────────

    /// Rules until `mode` or end of input, attached to `parent`.
    fn rule_list(&mut self, parent: NodeId) {
        while !self.at_any(&[TokenKind::Eof, TokenKind::Mode]) {
            if !self.at_rule_start() {
                self.error_extraneous("a rule declaration");
                self.recover_to(&[TokenKind::Semi]);
                continue;
            }
            match self.rule() {
                Ok(rule) => {
                    self.attach(parent, rule);
                    for label in std::mem::take(&mut self.pending_labels) {
                        self.tree.add_alt_label(label);
                    }
                }
                Err(Recovery) => {
                    self.pending_labels.clear();
                    self.recover_to(&[TokenKind::Semi]);
                }
            }
        }
    }

    /// `mode identifier ; rule*`
    fn mode_spec(&mut self) -> PResult<NodeId> {
        let keyword = self.bump();
        let mode = self.node_at(NodeKind::Mode, Some(keyword.span));
        let name = self.identifier()?;
        let name = self.leaf(NodeKind::Id, &name);
        self.attach(mode, name);
        self.expect(TokenKind::Semi)?;
        self.rule_list(mode);
        Ok(mode)
    }
}

/// The text up to the first line break.
pub(crate) fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
