//! End-to-end analysis tests: parse + process, then snapshot the messages
//! in emission order.

use std::fs;
use std::path::{Path, PathBuf};

use antlr4ls_tool::{ErrorType, MessageCollector, Severity, Tool};
use insta::assert_snapshot;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

fn analyze(file_name: &str, source: &str) -> MessageCollector {
    let tool = Tool::new();
    let mut collector = MessageCollector::new();
    let grammar = tool.parse_grammar_source(file_name, source, &mut collector);
    tool.process(&grammar, &mut collector);
    collector
}

fn analyze_file(tool: &Tool, path: &Path) -> MessageCollector {
    let mut collector = MessageCollector::new();
    let grammar = tool
        .parse_grammar(path, &mut collector)
        .expect("grammar file should be readable");
    tool.process(&grammar, &mut collector);
    collector
}

fn render(collector: &MessageCollector) -> String {
    collector
        .messages
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Fixtures ───────────────────────────────────────────────────────────

#[test]
fn interpreter_is_clean() {
    let collector = analyze_file(&Tool::new(), &fixture("Interpreter.g4"));
    assert!(collector.messages.is_empty(), "{}", render(&collector));
}

#[test]
fn wrong_ref_sample_has_one_error() {
    let collector = analyze_file(&Tool::new(), &fixture("WrongRefSample.g4"));
    assert_eq!(collector.errors().count(), 1);
    assert_eq!(collector.warnings().count(), 0);
    let msg = &collector.messages[0];
    assert_eq!(msg.error_type, ErrorType::UndefinedRuleRef);
    assert_eq!((msg.line, msg.column), (4, 6));
    assert_eq!(msg.args, vec!["expresion".to_string()]);
    assert_eq!(
        msg.to_string(),
        "error(56): WrongRefSample.g4:4:6: reference to undefined rule: expresion"
    );
}

// ── Message order ──────────────────────────────────────────────────────

#[test]
fn checks_report_in_a_fixed_order() {
    let source = "grammar Other;
options { foo = bar; }
options { language = Java; }
r : s X ;
r : A ;
A : 'a' -> skip, more(1), mode ;
";
    assert_snapshot!(render(&analyze("T.g4", source)), @r"
    error(8): T.g4:1:8: grammar name Other and file name T.g4 differ
    error(79): T.g4:3:0: repeated grammar prequel spec (options, tokens, or import); please merge
    warning(83): T.g4:2:10: unsupported option foo
    error(51): T.g4:5:0: rule r redefinition; previous at line 4
    error(56): T.g4:4:4: reference to undefined rule: s
    warning(125): T.g4:4:6: implicit definition of token X in parser
    error(151): T.g4:6:17: lexer command more does not take any arguments
    error(150): T.g4:6:26: missing argument for lexer command mode
    ");
}

#[test]
fn syntax_errors_skip_analysis() {
    let collector = analyze("T.g4", "grammar T;\nr : ( undefined ;\n");
    assert_eq!(collector.messages.len(), 1);
    assert_eq!(collector.messages[0].error_type, ErrorType::SyntaxError);
}

#[test]
fn grammar_without_rules() {
    assert_snapshot!(render(&analyze("T.g4", "grammar T;\n")), @"error(99): T.g4:1:8: grammar T has no rules");
}

// ── Grammar kinds ──────────────────────────────────────────────────────

#[test]
fn lexer_grammar_rules_and_commands() {
    let source = "lexer grammar L;
r : A ;
A : 'a' -> pushMode(Inside) ;
B : 'b' -> jump ;
mode Inside;
C : 'c' -> popMode, type(A) ;
";
    assert_snapshot!(render(&analyze("L.g4", source)), @r"
    error(54): L.g4:2:0: parser rule r not allowed in lexer
    error(149): L.g4:4:11: lexer command jump does not exist or is not supported by the current target
    ");
}

#[test]
fn parser_grammar_restrictions() {
    let source = "parser grammar P;
r : A 'x' ;
B : 'b' ;
mode M;
";
    assert_snapshot!(render(&analyze("P.g4", source)), @r"
    error(120): P.g4:4:5: lexical modes are only allowed in lexer grammars
    error(53): P.g4:3:0: lexer rule B not allowed in parser
    warning(125): P.g4:2:4: implicit definition of token A in parser
    error(126): P.g4:2:6: cannot create implicit token for string literal in non-combined grammar: 'x'
    ");
}

#[test]
fn lexer_rule_references() {
    let source = "grammar T;
r : A ;
A : r B EOF ;
";
    let collector = analyze("T.g4", source);
    let found: Vec<_> = collector
        .messages
        .iter()
        .map(|m| (m.error_type, m.args.clone()))
        .collect();
    assert_eq!(
        found,
        vec![
            (
                ErrorType::ParserRuleRefInLexerRule,
                vec!["r".to_string(), "A".to_string()]
            ),
            (ErrorType::UndefinedRuleRef, vec!["B".to_string()]),
        ]
    );
}

// ── Alternatives ───────────────────────────────────────────────────────

#[test]
fn alternative_labels() {
    let source = "grammar T;
e : e '*' e # Mul
  | INT     # Int
  | ID
  ;
s : ID # Mul ;
int : INT ;
INT : [0-9]+ ;
ID : [a-z]+ ;
";
    assert_snapshot!(render(&analyze("T.g4", source)), @r"
    error(94): T.g4:2:0: rule e: must label all alternatives or none
    error(95): T.g4:3:14: rule alt label Int conflicts with rule int
    error(96): T.g4:6:9: rule alt label Mul redefined in rule s, originally in rule e
    ");
}

#[test]
fn empty_matches() {
    let source = "grammar T;
r : (A | )* B? (C?)? ;
EMPTY : 'x'? ;
fragment F : 'y'* ;
A : 'a' ;
B : 'b' ;
C : 'c' ;
";
    assert_snapshot!(render(&analyze("T.g4", source)), @r"
    error(153): T.g4:2:4: rule r contains a closure with at least one alternative that can match an empty string
    warning(154): T.g4:2:15: rule r contains an optional block with at least one alternative that can match an empty string
    warning(146): T.g4:3:0: non-fragment lexer rule EMPTY can match the empty string
    ");
}

#[test]
fn literals_and_sets() {
    let source = "grammar T;
A : 'a\\qb' ;
B : [\\]\\-a\\z] ;
C : '' ;
";
    assert_snapshot!(render(&analyze("T.g4", source)), @r"
    warning(156): T.g4:2:6: invalid escape sequence \q
    warning(156): T.g4:3:10: invalid escape sequence \z
    error(174): T.g4:4:4: string literals and sets cannot be empty: ''
    warning(146): T.g4:4:0: non-fragment lexer rule C can match the empty string
    ");
    let collector = analyze("T.g4", source);
    let escape = &collector.messages[0];
    assert_eq!(escape.severity(), Severity::Warning);
    assert_eq!(&source[escape.span.as_range()], "\\q");
}

// ── Vocabularies and imports ───────────────────────────────────────────

#[test]
fn token_vocab_from_tokens_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("L.tokens"), "A=1\n'+'=2\n").unwrap();
    let grammar = dir.path().join("P.g4");
    fs::write(
        &grammar,
        "parser grammar P;\noptions { tokenVocab = L; }\nr : A '+' B ;\n",
    )
    .unwrap();

    let collector = analyze_file(&Tool::new(), &grammar);
    assert_eq!(collector.infos.len(), 1);
    assert!(collector.infos[0].contains("L.tokens"));
    assert_eq!(render(&collector), "warning(125): P.g4:3:10: implicit definition of token B in parser");
}

#[test]
fn token_vocab_from_lexer_grammar() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("L.g4"), "lexer grammar L;\nA : 'a' ;\nPLUS : '+' ;\n").unwrap();
    let grammar = dir.path().join("P.g4");
    fs::write(
        &grammar,
        "parser grammar P;\noptions { tokenVocab = L; }\nr : A '+' ;\n",
    )
    .unwrap();

    let collector = analyze_file(&Tool::new(), &grammar);
    assert!(collector.messages.is_empty(), "{}", render(&collector));
}

#[test]
fn missing_token_vocab() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = dir.path().join("P.g4");
    fs::write(&grammar, "parser grammar P;\noptions { tokenVocab = L; }\nr : A ;\n").unwrap();

    let collector = analyze_file(&Tool::new(), &grammar);
    assert_snapshot!(render(&collector), @r"
    error(114): P.g4:2:23: cannot find tokens file L
    warning(125): P.g4:3:4: implicit definition of token A in parser
    ");
}

#[test]
fn imports_resolve_next_to_the_grammar() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Base.g4"), "parser grammar Base;\nbase : ID ;\n").unwrap();
    let grammar = dir.path().join("Main.g4");
    fs::write(
        &grammar,
        "grammar Main;\nimport Base;\nr : base ID ;\nID : [a-z]+ ;\n",
    )
    .unwrap();

    let collector = analyze_file(&Tool::new(), &grammar);
    assert!(collector.messages.is_empty(), "{}", render(&collector));
    assert_eq!(collector.infos.len(), 1);
}

#[test]
fn imports_resolve_from_the_library_directory() {
    let lib = tempfile::tempdir().unwrap();
    fs::write(lib.path().join("Base.g4"), "parser grammar Base;\nbase : ID ;\n").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let grammar = dir.path().join("Main.g4");
    fs::write(
        &grammar,
        "grammar Main;\nimport Base, Nope;\nr : base ID ;\nID : [a-z]+ ;\n",
    )
    .unwrap();

    let without_lib = analyze_file(&Tool::new(), &grammar);
    assert_snapshot!(render(&without_lib), @r"
    error(110): Main.g4:2:7: can't find or load grammar Base
    error(110): Main.g4:2:13: can't find or load grammar Nope
    error(56): Main.g4:3:4: reference to undefined rule: base
    ");

    let with_lib = analyze_file(&Tool::new().with_lib_dir(lib.path()), &grammar);
    assert_snapshot!(render(&with_lib), @"error(110): Main.g4:2:13: can't find or load grammar Nope");
}
