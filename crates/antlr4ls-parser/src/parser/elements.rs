//! Alternatives and their elements.
//!
//! Parser and lexer rules share this code; `lexer` switches on the lexer-only
//! pieces (character sets, `->` commands) and off the parser-only ones
//! (rule arguments, alternative-level element options).

use antlr4ls_common::span::Span;
use antlr4ls_common::token::TokenKind;

use super::{PResult, Parser};
use crate::node_kind::NodeKind;
use crate::tree::NodeId;

impl Parser<'_> {
    fn at_element_start(&self, lexer: bool) -> bool {
        match self.current() {
            TokenKind::TokenRef
            | TokenKind::RuleRef
            | TokenKind::StringLiteral
            | TokenKind::Dot
            | TokenKind::Tilde
            | TokenKind::LParen
            | TokenKind::Action
            | TokenKind::SemPred => true,
            TokenKind::BracketBlock => lexer,
            _ => false,
        }
    }

    /// `elementOptions? element*`, followed by `-> commands` in lexer rules.
    ///
    /// An alternative without elements holds a single `EPSILON`.
    pub(crate) fn alternative(&mut self, lexer: bool) -> PResult<NodeId> {
        let alt = self.node_at(NodeKind::Alt, None);
        if !lexer && self.at(TokenKind::Lt) {
            let options = self.element_options()?;
            self.attach(alt, options);
        }
        let mut has_elements = false;
        while self.at_element_start(lexer) {
            let element = self.element(lexer)?;
            self.attach(alt, element);
            has_elements = true;
        }
        if !has_elements {
            let epsilon = self.node_at(NodeKind::Epsilon, None);
            self.attach(alt, epsilon);
        }

        if lexer && self.at(TokenKind::RArrow) {
            let with_commands = self.node_at(NodeKind::LexerAltAction, None);
            self.attach(with_commands, alt);
            self.lexer_commands(with_commands)?;
            return Ok(with_commands);
        }
        Ok(alt)
    }

    fn element(&mut self, lexer: bool) -> PResult<NodeId> {
        let labeled = self.at_identifier()
            && matches!(self.nth(1), TokenKind::Assign | TokenKind::PlusAssign);
        let (node, bare_block) = if labeled {
            (self.labeled_element(lexer)?, false)
        } else if self.at(TokenKind::LParen) {
            (self.block(lexer)?, true)
        } else if self.at(TokenKind::SemPred) {
            let token = self.bump();
            return Ok(self.leaf(NodeKind::SemPred, &token));
        } else if self.at(TokenKind::Action) {
            let token = self.bump();
            return Ok(self.leaf(NodeKind::Action, &token));
        } else {
            (self.atom(lexer)?, false)
        };
        Ok(self.ebnf_suffix(node, bare_block))
    }

    /// Wrap `node` in `(? ...)`, `(* ...)` or `(+ ...)` if a suffix follows.
    ///
    /// A parenthesized block is wrapped as is. Anything else first becomes
    /// `(BLOCK (ALT node))`, the block positioned at the element.
    fn ebnf_suffix(&mut self, node: NodeId, bare_block: bool) -> NodeId {
        let kind = match self.current() {
            TokenKind::Question => NodeKind::Optional,
            TokenKind::Star => NodeKind::Closure,
            TokenKind::Plus => NodeKind::PositiveClosure,
            _ => return node,
        };
        let suffix = self.bump();
        // Non-greedy marker.
        self.eat(TokenKind::Question);

        let op = self.node_at(kind, Some(suffix.span));
        let block = if bare_block {
            node
        } else {
            let block = self.node_at(NodeKind::Block, self.element_start(node));
            let alt = self.node_at(NodeKind::Alt, None);
            self.attach(alt, node);
            self.attach(block, alt);
            block
        };
        self.attach(op, block);
        op
    }

    /// Where an element begins: the label for `x=a`, else the element itself.
    fn element_start(&self, node: NodeId) -> Option<Span> {
        match self.node_kind(node) {
            NodeKind::Assign | NodeKind::PlusAssign => self
                .first_child_of(node)
                .and_then(|label| self.anchor_span(label)),
            _ => self.anchor_span(node),
        }
    }

    /// `label = atom`, `label += atom`, or the same with a block.
    fn labeled_element(&mut self, lexer: bool) -> PResult<NodeId> {
        let label = self.bump();
        let op_token = self.bump();
        let kind = if op_token.kind == TokenKind::PlusAssign {
            NodeKind::PlusAssign
        } else {
            NodeKind::Assign
        };
        let op = self.node_at(kind, Some(op_token.span));
        let label = self.leaf(NodeKind::Id, &label);
        let target = if self.at(TokenKind::LParen) {
            self.block(lexer)?
        } else {
            self.atom(lexer)?
        };
        self.attach(op, label);
        self.attach(op, target);
        Ok(op)
    }

    fn atom(&mut self, lexer: bool) -> PResult<NodeId> {
        let node = match self.current().clone() {
            TokenKind::TokenRef => {
                let token = self.bump();
                self.leaf(NodeKind::TokenRef, &token)
            }
            TokenKind::RuleRef => {
                let token = self.bump();
                let rule_ref = self.leaf(NodeKind::RuleRef, &token);
                if !lexer && self.at(TokenKind::BracketBlock) {
                    let args = self.bump();
                    let args = self.leaf(NodeKind::ArgAction, &args);
                    self.attach(rule_ref, args);
                }
                rule_ref
            }
            TokenKind::StringLiteral if *self.nth(1) == TokenKind::Range => {
                return self.character_range();
            }
            TokenKind::StringLiteral => {
                let token = self.bump();
                self.leaf(NodeKind::StringLiteral, &token)
            }
            TokenKind::BracketBlock if lexer => {
                let token = self.bump();
                return Ok(self.leaf(NodeKind::LexerCharSet, &token));
            }
            TokenKind::Dot => {
                let token = self.bump();
                self.node_at(NodeKind::Wildcard, Some(token.span))
            }
            TokenKind::Tilde => return self.not_set(lexer),
            _ => return Err(self.error_expecting("an element")),
        };
        if self.at(TokenKind::Lt) {
            let options = self.element_options()?;
            self.attach(node, options);
        }
        Ok(node)
    }

    /// `'a'..'z'`
    fn character_range(&mut self) -> PResult<NodeId> {
        let from = self.bump();
        let range = self.bump();
        let to = self.expect(TokenKind::StringLiteral)?;
        let node = self.node_at(NodeKind::Range, Some(range.span));
        let from = self.leaf(NodeKind::StringLiteral, &from);
        let to = self.leaf(NodeKind::StringLiteral, &to);
        self.attach(node, from);
        self.attach(node, to);
        Ok(node)
    }

    /// `~x` or `~(x | y | ...)`, built as `(~ (SET x y ...))`.
    fn not_set(&mut self, lexer: bool) -> PResult<NodeId> {
        let tilde = self.bump();
        let not = self.node_at(NodeKind::Not, Some(tilde.span));
        let set = self.node_at(NodeKind::Set, None);
        if self.eat(TokenKind::LParen).is_some() {
            loop {
                let element = self.set_element(lexer)?;
                self.attach(set, element);
                if self.eat(TokenKind::Or).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        } else {
            let element = self.set_element(lexer)?;
            self.attach(set, element);
        }
        self.attach(not, set);
        Ok(not)
    }

    fn set_element(&mut self, lexer: bool) -> PResult<NodeId> {
        match self.current().clone() {
            TokenKind::TokenRef => {
                let token = self.bump();
                Ok(self.leaf(NodeKind::TokenRef, &token))
            }
            TokenKind::StringLiteral if *self.nth(1) == TokenKind::Range => self.character_range(),
            TokenKind::StringLiteral => {
                let token = self.bump();
                Ok(self.leaf(NodeKind::StringLiteral, &token))
            }
            TokenKind::BracketBlock if lexer => {
                let token = self.bump();
                Ok(self.leaf(NodeKind::LexerCharSet, &token))
            }
            _ => Err(self.error_expecting("a set element")),
        }
    }

    /// `( (options? @actions* :)? alt (| alt)* )`, positioned at `(`.
    fn block(&mut self, lexer: bool) -> PResult<NodeId> {
        let lparen = self.bump();
        let block = self.node_at(NodeKind::Block, Some(lparen.span));
        if self.at_any(&[TokenKind::OptionsOpen, TokenKind::At]) {
            while self.at_any(&[TokenKind::OptionsOpen, TokenKind::At]) {
                let prequel = if self.at(TokenKind::OptionsOpen) {
                    self.options_spec()?
                } else {
                    self.named_action()?
                };
                self.attach(block, prequel);
            }
            self.expect(TokenKind::Colon)?;
        }
        loop {
            let alt = self.alternative(lexer)?;
            self.attach(block, alt);
            if self.eat(TokenKind::Or).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(block)
    }

    /// `-> command (, command)*` where a command is `name` or `name(arg)`.
    fn lexer_commands(&mut self, parent: NodeId) -> PResult<()> {
        self.bump(); // ->
        loop {
            let command = self.lexer_command()?;
            self.attach(parent, command);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(())
    }

    fn lexer_command(&mut self) -> PResult<NodeId> {
        if !self.at_identifier() && !self.at(TokenKind::Mode) {
            return Err(self.error_expecting("a lexer command"));
        }
        let name = self.bump();
        let name = self.leaf(NodeKind::Id, &name);
        if self.eat(TokenKind::LParen).is_none() {
            return Ok(name);
        }
        let arg = match self.current().clone() {
            TokenKind::TokenRef | TokenKind::RuleRef => {
                let token = self.bump();
                self.leaf(NodeKind::Id, &token)
            }
            TokenKind::Int => {
                let token = self.bump();
                self.leaf(NodeKind::Int, &token)
            }
            _ => return Err(self.error_expecting("a command argument")),
        };
        self.expect(TokenKind::RParen)?;
        let call = self.node_at(NodeKind::LexerActionCall, None);
        self.attach(call, name);
        self.attach(call, arg);
        Ok(call)
    }

    /// `< option (, option)* >` where an option is `id` or `id = value`.
    pub(crate) fn element_options(&mut self) -> PResult<NodeId> {
        let lt = self.bump();
        let options = self.node_at(NodeKind::ElementOptions, Some(lt.span));
        loop {
            let name = self.identifier()?;
            let option = if let Some(assign) = self.eat(TokenKind::Assign) {
                let value = match self.current().clone() {
                    TokenKind::TokenRef | TokenKind::RuleRef => {
                        let token = self.bump();
                        self.leaf(NodeKind::Id, &token)
                    }
                    TokenKind::StringLiteral => {
                        let token = self.bump();
                        self.leaf(NodeKind::StringLiteral, &token)
                    }
                    TokenKind::Int => {
                        let token = self.bump();
                        self.leaf(NodeKind::Int, &token)
                    }
                    _ => return Err(self.error_expecting("an option value")),
                };
                let eq = self.node_at(NodeKind::Assign, Some(assign.span));
                let name = self.leaf(NodeKind::Id, &name);
                self.attach(eq, name);
                self.attach(eq, value);
                eq
            } else {
                self.leaf(NodeKind::Id, &name)
            };
            self.attach(options, option);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::Gt)?;
        Ok(options)
    }
}
