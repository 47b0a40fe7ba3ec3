//! Rule declarations: headers, rule prequels, alternative lists and
//! exception handlers.

use antlr4ls_common::token::{Token, TokenKind};

use super::{PResult, Parser, Recovery};
use crate::node_kind::NodeKind;
use crate::tree::{AltLabel, NodeId};

impl Parser<'_> {
    pub(crate) fn at_rule_start(&self) -> bool {
        matches!(
            self.current(),
            TokenKind::TokenRef
                | TokenKind::RuleRef
                | TokenKind::Fragment
                | TokenKind::Public
                | TokenKind::Private
                | TokenKind::Protected
        )
    }

    /// ```text
    /// parserRule: ruleModifiers? RULE_REF ARG_ACTION? returns? throws? locals?
    ///             rulePrequel* ':' ruleBlock ';' exceptionGroup
    /// lexerRule:  fragment? TOKEN_REF optionsSpec? ':' lexerRuleBlock ';'
    /// ```
    pub(crate) fn rule(&mut self) -> PResult<NodeId> {
        let mut modifiers = Vec::new();
        while self.at_any(&[
            TokenKind::Fragment,
            TokenKind::Public,
            TokenKind::Private,
            TokenKind::Protected,
        ]) {
            let token = self.bump();
            modifiers.push(self.leaf(NodeKind::RuleModifier, &token));
        }

        if !self.at_identifier() {
            return Err(self.error_expecting("a rule name"));
        }
        let name_token = self.bump();
        let lexer = name_token.kind == TokenKind::TokenRef;
        let name_kind = if lexer {
            NodeKind::TokenRef
        } else {
            NodeKind::RuleRef
        };

        let rule = self.node_at(NodeKind::Rule, None);
        let name = self.leaf(name_kind, &name_token);
        self.attach(rule, name);
        if !modifiers.is_empty() {
            let mods = self.node_at(NodeKind::RuleModifiers, None);
            for modifier in modifiers {
                self.attach(mods, modifier);
            }
            self.attach(rule, mods);
        }

        if !lexer {
            self.parser_rule_signature(rule)?;
        }
        loop {
            let prequel = match self.current().clone() {
                TokenKind::OptionsOpen => self.options_spec()?,
                TokenKind::At => self.named_action()?,
                _ => break,
            };
            self.attach(rule, prequel);
        }

        let colon = self.expect(TokenKind::Colon)?;
        let block = self.rule_block(rule, &colon, lexer)?;
        self.attach(rule, block);
        self.expect(TokenKind::Semi)?;

        if !lexer {
            self.exception_group(rule);
        }
        Ok(rule)
    }

    /// Arguments, `returns`, `throws` and `locals` of a parser rule.
    fn parser_rule_signature(&mut self, rule: NodeId) -> PResult<()> {
        if self.at(TokenKind::BracketBlock) {
            let args = self.bump();
            let args = self.leaf(NodeKind::ArgAction, &args);
            self.attach(rule, args);
        }
        if self.at(TokenKind::Returns) {
            let returns = self.keyword_with_arg(NodeKind::Returns)?;
            self.attach(rule, returns);
        }
        if let Some(keyword) = self.eat(TokenKind::Throws) {
            let throws = self.node_at(NodeKind::Throws, Some(keyword.span));
            loop {
                let name = self.identifier()?;
                let name = self.leaf(NodeKind::Id, &name);
                self.attach(throws, name);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.attach(rule, throws);
        }
        if self.at(TokenKind::Locals) {
            let locals = self.keyword_with_arg(NodeKind::Locals)?;
            self.attach(rule, locals);
        }
        Ok(())
    }

    /// `returns [..]` / `locals [..]`
    fn keyword_with_arg(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let keyword = self.bump();
        let node = self.node_at(kind, Some(keyword.span));
        let arg = self.expect(TokenKind::BracketBlock)?;
        let arg = self.leaf(NodeKind::ArgAction, &arg);
        self.attach(node, arg);
        Ok(node)
    }

    /// Top-level alternatives of a rule. The block sits at the colon.
    fn rule_block(&mut self, rule: NodeId, colon: &Token, lexer: bool) -> PResult<NodeId> {
        let block = self.node_at(NodeKind::Block, Some(colon.span));
        loop {
            let alt = self.alternative(lexer)?;
            self.attach(block, alt);
            if !lexer && self.at(TokenKind::Pound) {
                self.bump();
                let label = self.identifier()?;
                let text = self.token_text(&label).to_string();
                self.push_label(AltLabel {
                    label: text,
                    rule,
                    alt,
                    span: label.span,
                });
            }
            if self.eat(TokenKind::Or).is_none() {
                break;
            }
        }
        Ok(block)
    }

    /// `(catch [..] {..})* (finally {..})?`
    ///
    /// Errors here are reported but do not discard the rule.
    fn exception_group(&mut self, rule: NodeId) {
        while self.at(TokenKind::Catch) {
            match self.exception_handler() {
                Ok(handler) => self.attach(rule, handler),
                Err(Recovery) => return,
            }
        }
        if let Some(keyword) = self.eat(TokenKind::Finally) {
            let finally = self.node_at(NodeKind::Finally, Some(keyword.span));
            if let Ok(action) = self.expect(TokenKind::Action) {
                let action = self.leaf(NodeKind::Action, &action);
                self.attach(finally, action);
                self.attach(rule, finally);
            }
        }
    }

    fn exception_handler(&mut self) -> PResult<NodeId> {
        let keyword = self.bump();
        let handler = self.node_at(NodeKind::Catch, Some(keyword.span));
        let arg = self.expect(TokenKind::BracketBlock)?;
        let arg = self.leaf(NodeKind::ArgAction, &arg);
        let action = self.expect(TokenKind::Action)?;
        let action = self.leaf(NodeKind::Action, &action);
        self.attach(handler, arg);
        self.attach(handler, action);
        Ok(handler)
    }
}
