//! Diagnostics
//!
//! Structured error and warning information for tools (the `synkit` command, an editor
//! integration) built from a finished run.
//!
//! Sources
//!
//!     - Error nodes in the tree: reported parse errors, constructor rejections and builder
//!       fallbacks. Severity `Error`.
//!     - Lexical `Error` tokens. Severity `Warning`: they do not affect validity on their own,
//!       and a grammar that meets one usually reports a parse error at the same spot.
//!
//! Offsets are converted to line:column with [`SourceLocation`], and
//! [`format_source_context`] renders the lines around a diagnostic with a `>>` marker.

use crate::synkit::building::{NodeKind, SyntaxNode};
use crate::synkit::parsing::ElementKind;
use crate::synkit::range::{Position, SourceLocation, TextRange};
use crate::synkit::token::TokenType;
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub range: TextRange,
    pub start: Position,
    pub end: Position,
    pub severity: DiagnosticSeverity,
    pub message: String,
    /// Short machine-readable category
    pub code: &'static str,
}

impl Diagnostic {
    pub fn new(
        location: &SourceLocation<'_>,
        range: TextRange,
        severity: DiagnosticSeverity,
        message: impl Into<String>,
        code: &'static str,
    ) -> Self {
        let (start, end) = location.positions(range);
        Self {
            range,
            start,
            end,
            severity,
            message: message.into(),
            code,
        }
    }

    /// The diagnostic line followed by the source context around it
    pub fn render(&self, source: &str) -> String {
        format!("{}\n{}", self, format_source_context(source, self.start.line))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {} at {}",
            self.severity, self.code, self.message, self.start
        )
    }
}

/// Collect diagnostics for a built tree, ordered by position
pub fn collect_diagnostics<K: ElementKind>(source: &str, root: &SyntaxNode<K>) -> Vec<Diagnostic> {
    let location = SourceLocation::new(source);
    let mut diagnostics = Vec::new();

    for node in root.errors() {
        let code = match node.kind() {
            NodeKind::Error {
                token_index: Some(_),
                ..
            } => "parse-error",
            _ => "invalid-element",
        };
        let message = node.error_message().unwrap_or_default();
        diagnostics.push(Diagnostic::new(
            &location,
            node.range(),
            DiagnosticSeverity::Error,
            message,
            code,
        ));
    }

    for token in root.tokens().filter(|t| t.kind == TokenType::Error) {
        diagnostics.push(Diagnostic::new(
            &location,
            token.range,
            DiagnosticSeverity::Warning,
            format!("unrecognized input {:?}", token.text),
            "lex-error",
        ));
    }

    diagnostics.sort_by_key(|d| (d.range.start, d.severity));
    diagnostics
}

/// Format source code context around a line
///
/// Shows 2 lines before the line, the line itself with a >> marker, and 2 lines after.
/// All lines are numbered for easy reference.
pub fn format_source_context(source: &str, line: usize) -> String {
    let location = SourceLocation::new(source);
    let lines: Vec<&str> = (0..location.line_count())
        .filter_map(|line| location.line_text(line))
        .collect();

    let start_line = line.saturating_sub(2);
    let end_line = (line + 3).min(lines.len());

    let mut context = String::new();
    for line_num in start_line..end_line {
        let marker = if line_num == line { ">>" } else { "  " };
        context.push_str(&format!(
            "{} {:3} | {}\n",
            marker,
            line_num + 1,
            lines[line_num]
        ));
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synkit::building::{build, ElementRegistry};
    use crate::synkit::lexing::{tokenize, LexerConfig};
    use crate::synkit::parsing::ParseError;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {}

    #[test]
    fn test_format_source_context() {
        let source = "line 1\nline 2\nline 3\nerror line\nline 5\nline 6\nline 7";
        let context = format_source_context(source, 3);

        assert!(!context.contains("line 1"));
        assert!(context.contains("line 2"));
        assert!(context.contains(">>   4 | error line"));
        assert!(context.contains("line 5"));
        assert!(!context.contains("line 7"));
    }

    #[test]
    fn test_carriage_return_line_ends() {
        let source = "x = 1\ry @\rz";
        let context = format_source_context(source, 1);
        assert!(context.contains(">>   2 | y @\n"));
        assert!(context.contains("     3 | z\n"));

        let tokens = tokenize(source, &LexerConfig::c_like(), None);
        let out = build::<Kind>(&tokens, &[], &[], &ElementRegistry::new());
        let diagnostics = collect_diagnostics(source, &out.root);
        assert_eq!(diagnostics[0].start, Position::new(1, 2));
    }

    #[test]
    fn test_collect_diagnostics() {
        let source = "a\nb @";
        let tokens = tokenize(source, &LexerConfig::c_like(), None);
        let errors = vec![ParseError::new(2, "expected '='", tokens[2].range)];
        let out = build::<Kind>(&tokens, &[], &errors, &ElementRegistry::new());

        let diagnostics = collect_diagnostics(source, &out.root);
        assert_eq!(diagnostics.len(), 2);

        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostics[0].code, "parse-error");
        assert_eq!(
            diagnostics[0].to_string(),
            "error [parse-error]: expected '=' at 2:1"
        );

        assert_eq!(diagnostics[1].severity, DiagnosticSeverity::Warning);
        assert_eq!(diagnostics[1].message, "unrecognized input \"@\"");
        assert_eq!(diagnostics[1].start, Position::new(1, 2));
    }

    #[test]
    fn test_render_includes_context() {
        let source = "x\ny\n";
        let location = SourceLocation::new(source);
        let diagnostic = Diagnostic::new(
            &location,
            TextRange::new(2, 3),
            DiagnosticSeverity::Error,
            "bad y",
            "parse-error",
        );
        let rendered = diagnostic.render(source);
        assert!(rendered.starts_with("error [parse-error]: bad y at 2:1\n"));
        assert!(rendered.contains(">>   2 | y"));
    }
}
