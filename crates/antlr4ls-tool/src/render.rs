//! Terminal rendering of tool messages with source excerpts.

use std::ops::Range;

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};

use crate::message::{Severity, ToolMessage};

/// Render a message as an ariadne report over `source`.
///
/// The label covers the message's span, widened to one character when empty so
/// that zero-width messages still point somewhere. Falls back to the plain
/// one-line form for empty sources.
pub fn render_message(message: &ToolMessage, source: &str, color: bool) -> String {
    if source.is_empty() {
        return message.to_string();
    }
    let config = Config::default()
        .with_color(color)
        .with_index_type(IndexType::Byte);

    let range = label_range(source, message.span.start as usize, message.span.end as usize);

    let (kind, label_color) = match message.severity() {
        Severity::Error => (ReportKind::Error, Color::Red),
        Severity::Warning => (ReportKind::Warning, Color::Yellow),
    };
    let text = message.render();
    let label_text = match message.args.first() {
        Some(arg) if !arg.is_empty() => format!("`{arg}`"),
        _ => "here".to_string(),
    };

    let report = Report::build(kind, range.clone())
        .with_code(message.error_type.code())
        .with_message(&text)
        .with_config(config)
        .with_label(
            Label::new(range)
                .with_message(label_text)
                .with_color(label_color),
        )
        .finish();

    let mut buf = Vec::new();
    if report.write(Source::from(source), &mut buf).is_err() {
        return message.to_string();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Clamp `start..end` to `source` on char boundaries, covering at least
/// one character. `source` must be non-empty.
fn label_range(source: &str, start: usize, end: usize) -> Range<usize> {
    let last = source.char_indices().last().map_or(0, |(i, _)| i);
    let mut start = start.min(last);
    while !source.is_char_boundary(start) {
        start -= 1;
    }
    let first_char_end = start + source[start..].chars().next().map_or(0, char::len_utf8);
    let mut end = end.clamp(first_char_end, source.len());
    while !source.is_char_boundary(end) {
        end += 1;
    }
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MessageCollector, Tool};

    #[test]
    fn report_names_code_and_message() {
        let source = "grammar T;\nr : missing ;\n";
        let tool = Tool::new();
        let mut collector = MessageCollector::new();
        let grammar = tool.parse_grammar_source("T.g4", source, &mut collector);
        tool.process(&grammar, &mut collector);
        assert_eq!(collector.messages.len(), 1);

        let output = render_message(&collector.messages[0], source, false);
        assert!(output.contains("[56]"), "{output}");
        assert!(output.contains("reference to undefined rule: missing"), "{output}");
        assert!(output.contains("`missing`"), "{output}");
    }

    #[test]
    fn zero_width_span_at_end_of_source() {
        let source = "grammar T;";
        let message = ToolMessage {
            error_type: crate::ErrorType::NoRules,
            file_name: "T.g4".to_string(),
            line: 1,
            column: 10,
            span: antlr4ls_common::span::Span::empty(10),
            args: vec!["T".to_string()],
        };
        let output = render_message(&message, source, false);
        assert!(output.contains("grammar T has no rules"), "{output}");
    }

    #[test]
    fn label_stays_on_char_boundaries() {
        let source = "r : '\u{00e9}\u{1F600}";
        let emoji = source.len() - 4;
        assert_eq!(label_range(source, source.len(), source.len()), emoji..source.len());
        assert_eq!(label_range(source, emoji + 1, emoji + 2), emoji..source.len());
        assert_eq!(label_range(source, 5, 5), 5..7);
        assert_eq!(label_range(source, 0, 100), 0..source.len());
    }

    #[test]
    fn messages_at_end_of_multibyte_source_render() {
        let source = "grammar G;\nr : 'x' '\\u00e9\u{1F600}";
        let tool = Tool::new();
        let mut collector = MessageCollector::new();
        let grammar = tool.parse_grammar_source("G.g4", source, &mut collector);
        tool.process(&grammar, &mut collector);
        assert!(!collector.messages.is_empty());

        for message in &collector.messages {
            let output = render_message(message, source, false);
            assert!(output.contains(&message.render()), "{output}");
        }

        let at_eof = ToolMessage {
            error_type: crate::ErrorType::SyntaxError,
            file_name: "G.g4".to_string(),
            line: 2,
            column: 16,
            span: antlr4ls_common::span::Span::empty(source.len() as u32),
            args: vec!["<EOF>".to_string(), "unterminated string literal".to_string()],
        };
        let output = render_message(&at_eof, source, false);
        assert!(output.contains("syntax error: unterminated string literal"), "{output}");
    }
}
