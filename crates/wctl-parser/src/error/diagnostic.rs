//! A single error or warning with source locations.

use std::fmt;

use crate::{
    Span,
    error::{Label, Severity, error_code::ErrorCode},
};

/// A diagnostic message with an optional code, labelled spans and help text.
///
/// Diagnostics are built with a chain of `with_*` calls:
///
/// ```
/// # use wctl_parser::error::{Diagnostic, ErrorCode};
/// # use wctl_parser::Span;
///
/// let diag = Diagnostic::error("unresolved type `abc.abc`")
///     .with_code(ErrorCode::E300)
///     .with_label(Span::new(40..47), "not found")
///     .with_help("import the file declaring `abc` or fix the name");
/// assert_eq!(diag.to_string(), "error[E300]: unresolved type `abc.abc`");
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// The span of the first primary label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_defaults() {
        let diag = Diagnostic::error("test error");

        assert!(diag.severity().is_error());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
        assert!(diag.primary_span().is_none());
    }

    #[test]
    fn test_duplicate_definition_labels() {
        let diag = Diagnostic::error("`m1` is defined multiple times")
            .with_code(ErrorCode::E203)
            .with_secondary_label(Span::new(5..7), "first defined here")
            .with_label(Span::new(30..32), "duplicate definition");

        assert_eq!(diag.code(), Some(ErrorCode::E203));
        assert_eq!(diag.labels().len(), 2);
        assert!(diag.labels()[0].is_secondary());
        assert_eq!(diag.primary_span(), Some(Span::new(30..32)));
    }

    #[test]
    fn test_diagnostic_display() {
        let with_code =
            Diagnostic::error("field tag 256 is out of range").with_code(ErrorCode::E106);
        assert_eq!(
            with_code.to_string(),
            "error[E106]: field tag 256 is out of range"
        );

        let without_code = Diagnostic::warning("option key without `.` skipped");
        assert_eq!(
            without_code.to_string(),
            "warning: option key without `.` skipped"
        );
    }

    #[test]
    fn test_diagnostic_with_help() {
        let diag = Diagnostic::error("invalid map key").with_help("use a scalar key type");
        assert_eq!(diag.help(), Some("use a scalar key type"));
    }
}
