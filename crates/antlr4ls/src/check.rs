//! `antlr4ls check`: offline parse + analysis of grammar files.

use std::path::Path;

use antlr4ls_tool::render::render_message;
use antlr4ls_tool::{MessageCollector, Severity, Tool, ToolMessage};

/// How diagnostics are printed.
pub struct CheckOptions {
    pub color: bool,
    pub json: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub errors: usize,
    pub warnings: usize,
    /// Files that could not be read at all.
    pub unreadable: usize,
}

impl CheckSummary {
    pub fn failed(&self) -> bool {
        self.errors > 0 || self.unreadable > 0
    }
}

/// Analyze each file in turn and print its diagnostics to stderr.
pub fn check_files(tool: &Tool, files: &[impl AsRef<Path>], options: &CheckOptions) -> CheckSummary {
    let mut summary = CheckSummary::default();

    for path in files {
        let path = path.as_ref();
        let mut collector = MessageCollector::new();
        let grammar = match tool.parse_grammar(path, &mut collector) {
            Ok(grammar) => grammar,
            Err(e) => {
                summary.unreadable += 1;
                if options.json {
                    let msg = serde_json::json!({
                        "code": null,
                        "severity": "error",
                        "message": e.to_string(),
                        "file": path.display().to_string(),
                        "spans": [],
                    });
                    eprintln!("{}", msg);
                } else {
                    eprintln!("error: {}", e);
                }
                continue;
            }
        };
        tool.process(&grammar, &mut collector);

        for info in &collector.infos {
            tracing::info!(file = %path.display(), "{}", info);
        }
        for message in &collector.messages {
            match message.severity() {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
            }
            if options.json {
                eprintln!("{}", message_json(path, message));
            } else {
                eprint!("{}", render_message(message, &grammar.source, options.color));
            }
        }
    }

    if !options.json && (summary.errors > 0 || summary.warnings > 0) {
        eprintln!(
            "{} error(s), {} warning(s)",
            summary.errors, summary.warnings
        );
    }
    summary
}

fn message_json(path: &Path, message: &ToolMessage) -> serde_json::Value {
    let start = message.span.start as usize;
    let end = (message.span.end as usize).max(start);
    serde_json::json!({
        "code": message.error_type.code(),
        "severity": message.severity(),
        "message": message.render(),
        "file": path.display().to_string(),
        "line": message.line,
        "column": message.column,
        "spans": [{
            "start": start,
            "end": end,
            "label": message.args.first(),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_carries_code_position_and_span() {
        let tool = Tool::new();
        let mut collector = MessageCollector::new();
        let source = "grammar T;\nr : missing ;\n";
        let grammar = tool.parse_grammar_source("T.g4", source, &mut collector);
        tool.process(&grammar, &mut collector);

        let value = message_json(Path::new("T.g4"), &collector.messages[0]);
        assert_eq!(value["code"], 56);
        assert_eq!(value["severity"], "error");
        assert_eq!(value["message"], "reference to undefined rule: missing");
        assert_eq!(value["line"], 2);
        assert_eq!(value["column"], 4);
        assert_eq!(value["spans"][0]["start"], 15);
        assert_eq!(value["spans"][0]["end"], 22);
        assert_eq!(value["spans"][0]["label"], "missing");
    }

    #[test]
    fn unreadable_files_fail_the_check() {
        let options = CheckOptions {
            color: false,
            json: true,
        };
        let summary = check_files(&Tool::new(), &["/nonexistent/G.g4"], &options);
        assert_eq!(
            summary,
            CheckSummary {
                errors: 0,
                warnings: 0,
                unreadable: 1,
            }
        );
        assert!(summary.failed());
    }

    #[test]
    fn warnings_alone_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("P.g4");
        std::fs::write(&path, "parser grammar P;\nr : A ;\n").unwrap();
        let options = CheckOptions {
            color: false,
            json: false,
        };
        let summary = check_files(&Tool::new(), &[&path], &options);
        assert_eq!(summary.warnings, 1);
        assert!(!summary.failed());
    }
}
