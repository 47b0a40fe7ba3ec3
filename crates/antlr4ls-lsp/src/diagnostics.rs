//! Tool messages as LSP diagnostics.

use std::sync::Arc;

use antlr4ls_tool::{Severity, ToolListener, ToolMessage};
use parking_lot::Mutex;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};

use crate::position::range_of_message;

/// Source tag on every published diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "antlr4";

pub fn to_diagnostic(message: &ToolMessage) -> Diagnostic {
    let severity = match message.severity() {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
    };
    Diagnostic {
        range: range_of_message(message),
        severity: Some(severity),
        code: Some(NumberOrString::Number(message.error_type.code() as i32)),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: message.render(),
        ..Default::default()
    }
}

/// Listener that converts messages to diagnostics as they arrive.
///
/// The list lives behind an `Arc` so whoever holds a clone can still read
/// what was collected if analysis dies halfway.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything collected so far, in emission order.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }
}

impl ToolListener for DiagnosticCollector {
    fn info(&mut self, message: &str) {
        tracing::debug!("{}", message);
    }

    fn error(&mut self, message: &ToolMessage) {
        self.diagnostics.lock().push(to_diagnostic(message));
    }

    fn warning(&mut self, message: &ToolMessage) {
        self.diagnostics.lock().push(to_diagnostic(message));
    }
}

#[cfg(test)]
mod tests {
    use antlr4ls_tool::Tool;
    use tower_lsp::lsp_types::{Position, Range};

    use super::*;

    #[test]
    fn collects_in_emission_order() {
        let tool = Tool::new();
        let mut collector = DiagnosticCollector::new();
        let shared = collector.clone();
        let grammar = tool.parse_grammar_source(
            "T.g4",
            "grammar T;\nr : x Y ;\n",
            &mut collector,
        );
        tool.process(&grammar, &mut collector);

        let diagnostics = shared.snapshot();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diagnostics[0].message, "reference to undefined rule: x");
        assert_eq!(
            diagnostics[0].range,
            Range::new(Position::new(1, 4), Position::new(1, 5))
        );
        assert_eq!(diagnostics[1].severity, Some(DiagnosticSeverity::WARNING));
        assert!(diagnostics
            .iter()
            .all(|d| d.source.as_deref() == Some(DIAGNOSTIC_SOURCE)));
    }

    #[test]
    fn info_is_dropped() {
        let mut collector = DiagnosticCollector::new();
        collector.info("loaded imported grammar Base.g4");
        assert!(collector.snapshot().is_empty());
    }
}
