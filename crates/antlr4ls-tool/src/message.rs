//! Grammar tool messages.
//!
//! Every problem the tool finds is a [`ToolMessage`]: an [`ErrorType`] (code,
//! severity and message template), where it happened, and the arguments that
//! fill the template. Argument 0 is, by convention, the text of the token
//! the message points at, so `line`/`column` plus its length spans the
//! offending name.

use std::fmt;

use antlr4ls_common::span::Span;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// The message types the tool can emit, with ANTLR's numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    FileAndGrammarNameDiffer,
    SyntaxError,
    RuleRedefinition,
    LexerRulesNotAllowed,
    ParserRulesNotAllowed,
    UndefinedRuleRef,
    RepeatedPrequel,
    IllegalOption,
    RuleWithTooFewAltLabels,
    AltLabelConflictsWithRule,
    AltLabelRedef,
    NoRules,
    CannotFindImportedGrammar,
    CannotFindTokensFile,
    ModeNotInLexer,
    ImplicitTokenDefinition,
    ImplicitStringDefinition,
    EpsilonToken,
    InvalidLexerCommand,
    MissingLexerCommandArgument,
    UnwantedLexerCommandArgument,
    EpsilonClosure,
    EpsilonOptional,
    InvalidEscapeSequence,
    ParserRuleRefInLexerRule,
    EmptyStringsAndSetsNotAllowed,
}

impl ErrorType {
    pub fn code(self) -> u32 {
        match self {
            ErrorType::FileAndGrammarNameDiffer => 8,
            ErrorType::SyntaxError => 50,
            ErrorType::RuleRedefinition => 51,
            ErrorType::LexerRulesNotAllowed => 53,
            ErrorType::ParserRulesNotAllowed => 54,
            ErrorType::UndefinedRuleRef => 56,
            ErrorType::RepeatedPrequel => 79,
            ErrorType::IllegalOption => 83,
            ErrorType::RuleWithTooFewAltLabels => 94,
            ErrorType::AltLabelConflictsWithRule => 95,
            ErrorType::AltLabelRedef => 96,
            ErrorType::NoRules => 99,
            ErrorType::CannotFindImportedGrammar => 110,
            ErrorType::CannotFindTokensFile => 114,
            ErrorType::ModeNotInLexer => 120,
            ErrorType::ImplicitTokenDefinition => 125,
            ErrorType::ImplicitStringDefinition => 126,
            ErrorType::EpsilonToken => 146,
            ErrorType::InvalidLexerCommand => 149,
            ErrorType::MissingLexerCommandArgument => 150,
            ErrorType::UnwantedLexerCommandArgument => 151,
            ErrorType::EpsilonClosure => 153,
            ErrorType::EpsilonOptional => 154,
            ErrorType::InvalidEscapeSequence => 156,
            ErrorType::ParserRuleRefInLexerRule => 160,
            ErrorType::EmptyStringsAndSetsNotAllowed => 174,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            ErrorType::IllegalOption
            | ErrorType::ImplicitTokenDefinition
            | ErrorType::EpsilonToken
            | ErrorType::EpsilonOptional
            | ErrorType::InvalidEscapeSequence => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Message template. `<arg>`, `<arg2>` and `<arg3>` are replaced by
    /// the message arguments.
    pub fn template(self) -> &'static str {
        match self {
            ErrorType::FileAndGrammarNameDiffer => "grammar name <arg> and file name <arg2> differ",
            ErrorType::SyntaxError => "syntax error: <arg2>",
            ErrorType::RuleRedefinition => "rule <arg> redefinition; previous at line <arg2>",
            ErrorType::LexerRulesNotAllowed => "lexer rule <arg> not allowed in parser",
            ErrorType::ParserRulesNotAllowed => "parser rule <arg> not allowed in lexer",
            ErrorType::UndefinedRuleRef => "reference to undefined rule: <arg>",
            ErrorType::RepeatedPrequel => {
                "repeated grammar prequel spec (options, tokens, or import); please merge"
            }
            ErrorType::IllegalOption => "unsupported option <arg>",
            ErrorType::RuleWithTooFewAltLabels => "rule <arg>: must label all alternatives or none",
            ErrorType::AltLabelConflictsWithRule => "rule alt label <arg> conflicts with rule <arg2>",
            ErrorType::AltLabelRedef => {
                "rule alt label <arg> redefined in rule <arg2>, originally in rule <arg3>"
            }
            ErrorType::NoRules => "grammar <arg> has no rules",
            ErrorType::CannotFindImportedGrammar => "can't find or load grammar <arg>",
            ErrorType::CannotFindTokensFile => "cannot find tokens file <arg>",
            ErrorType::ModeNotInLexer => "lexical modes are only allowed in lexer grammars",
            ErrorType::ImplicitTokenDefinition => "implicit definition of token <arg> in parser",
            ErrorType::ImplicitStringDefinition => {
                "cannot create implicit token for string literal in non-combined grammar: <arg>"
            }
            ErrorType::EpsilonToken => "non-fragment lexer rule <arg> can match the empty string",
            ErrorType::InvalidLexerCommand => {
                "lexer command <arg> does not exist or is not supported by the current target"
            }
            ErrorType::MissingLexerCommandArgument => "missing argument for lexer command <arg>",
            ErrorType::UnwantedLexerCommandArgument => "lexer command <arg> does not take any arguments",
            ErrorType::EpsilonClosure => {
                "rule <arg> contains a closure with at least one alternative that can match an empty string"
            }
            ErrorType::EpsilonOptional => {
                "rule <arg> contains an optional block with at least one alternative that can match an empty string"
            }
            ErrorType::InvalidEscapeSequence => "invalid escape sequence <arg>",
            ErrorType::ParserRuleRefInLexerRule => "reference to parser rule <arg> in lexer rule <arg2>",
            ErrorType::EmptyStringsAndSetsNotAllowed => "string literals and sets cannot be empty: <arg>",
        }
    }
}

/// One diagnostic produced while parsing or analyzing a grammar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolMessage {
    pub error_type: ErrorType,
    pub file_name: String,
    /// One-based line.
    pub line: u32,
    /// Zero-based column in UTF-16 code units.
    pub column: u32,
    /// Byte span of the token the message points at.
    pub span: Span,
    pub args: Vec<String>,
}

impl ToolMessage {
    pub fn severity(&self) -> Severity {
        self.error_type.severity()
    }

    /// The template with its placeholders filled in. Missing arguments
    /// render as empty text.
    pub fn render(&self) -> String {
        let arg = |i: usize| self.args.get(i).map(String::as_str).unwrap_or("");
        self.error_type
            .template()
            .replace("<arg3>", arg(2))
            .replace("<arg2>", arg(1))
            .replace("<arg>", arg(0))
    }
}

impl fmt::Display for ToolMessage {
    /// `error(56): T.g4:4:6: reference to undefined rule: x`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}): {}:{}:{}: {}",
            self.severity(),
            self.error_type.code(),
            self.file_name,
            self.line,
            self.column,
            self.render()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(error_type: ErrorType, args: &[&str]) -> ToolMessage {
        ToolMessage {
            error_type,
            file_name: "T.g4".to_string(),
            line: 4,
            column: 6,
            span: Span::new(30, 39),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn render_fills_placeholders_in_order() {
        let msg = message(ErrorType::AltLabelRedef, &["A", "r2", "r1"]);
        assert_eq!(
            msg.render(),
            "rule alt label A redefined in rule r2, originally in rule r1"
        );
    }

    #[test]
    fn syntax_error_renders_description_only() {
        let msg = message(
            ErrorType::SyntaxError,
            &[";", "mismatched input ';' expecting ')'"],
        );
        assert_eq!(msg.render(), "syntax error: mismatched input ';' expecting ')'");
    }

    #[test]
    fn missing_args_render_empty() {
        let msg = message(ErrorType::RepeatedPrequel, &[]);
        assert!(msg.render().starts_with("repeated grammar prequel"));
        let msg = message(ErrorType::UndefinedRuleRef, &[]);
        assert_eq!(msg.render(), "reference to undefined rule: ");
    }

    #[test]
    fn display_includes_code_and_location() {
        let msg = message(ErrorType::UndefinedRuleRef, &["expresion"]);
        assert_eq!(
            msg.to_string(),
            "error(56): T.g4:4:6: reference to undefined rule: expresion"
        );
        assert_eq!(ErrorType::ImplicitTokenDefinition.severity(), Severity::Warning);
        assert_eq!(ErrorType::EpsilonClosure.code(), 153);
    }
}
