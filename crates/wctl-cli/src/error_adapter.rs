//! Error adapter for converting WctlError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Error Support
//!
//! Every diagnostic of a [`wctl_parser::error::ParseError`] is rendered on
//! its own, against the source of the file it came from. An error inside an
//! imported file is rendered first, followed by one entry per import that
//! led to it. Accumulated build errors are rendered one by one.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, SourceSpan};

use wctl::WctlError;
use wctl_parser::error::Diagnostic;

/// Adapter for a single wctl diagnostic.
///
/// This adapter wraps a single [`Diagnostic`] and implements
/// [`MietteDiagnostic`] to enable rich error formatting in the CLI.
pub struct DiagnosticAdapter<'a> {
    /// The wrapped diagnostic
    diag: &'a Diagnostic,
    /// Source code of the file, for displaying snippets
    src: NamedSource<String>,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create a new diagnostic adapter for a diagnostic of `file`.
    pub fn new(diag: &'a Diagnostic, file: &str, src: &str) -> Self {
        Self {
            diag,
            src: NamedSource::new(file, src.to_string()),
        }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .field("file", &self.src.name())
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = span_to_miette(label.span());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Adapter for [`WctlError`] variants without source spans.
pub struct ErrorAdapter<'a>(pub &'a WctlError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.0 {
            // The imported error is rendered as its own report.
            WctlError::Import { .. } => None,
            err => std::error::Error::source(err),
        }
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            WctlError::Io { .. } => "wctl::io",
            WctlError::Parse { .. } | WctlError::Multiple(_) => return None,
            WctlError::Import { .. } => "wctl::import",
            WctlError::UnsupportedFile(_) => "wctl::unsupported_file",
            WctlError::Generate { .. } => "wctl::generate",
            WctlError::Overwrite { .. } => "wctl::overwrite",
            WctlError::EmptyOutputName { .. } => "wctl::empty_output_name",
            WctlError::Plugin { .. } => "wctl::plugin",
            WctlError::Wire(_) => "wctl::wire",
            WctlError::Config(_) => "wctl::config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            WctlError::UnsupportedFile(_) => "schema files end in `.wproto` or `.proto`",
            WctlError::Overwrite { .. } => {
                "pass --merge-same-file to concatenate outputs sharing a name"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// A reportable error that can be rendered by miette.
///
/// This enum wraps either a single diagnostic or a non-diagnostic error,
/// providing a uniform interface for error rendering.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A rich diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => std::error::Error::source(e),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a wctl [`Span`](wctl_parser::Span) to a miette [`SourceSpan`].
fn span_to_miette(span: wctl_parser::Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Convert a [`WctlError`] into a list of reportable errors.
///
/// [`WctlError::Parse`] gives one [`Reportable`] per diagnostic. An import
/// chain gives the reportables of the failing file followed by one per
/// import, innermost first. [`WctlError::Multiple`] is flattened. Any other
/// variant gives a single [`Reportable`].
pub fn to_reportables(err: &WctlError) -> Vec<Reportable<'_>> {
    match err {
        WctlError::Parse {
            err: parse_err,
            file,
            src,
        } => parse_err
            .diagnostics()
            .iter()
            .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d, file, src)))
            .collect(),
        WctlError::Import { .. } => {
            let (inner, trail) = err.innermost();
            let mut reportables = to_reportables(inner);

            let mut level = err;
            let mut imports = Vec::with_capacity(trail.len());
            while let WctlError::Import { source, .. } = level {
                imports.push(Reportable::Error(ErrorAdapter(level)));
                level = source;
            }
            reportables.extend(imports.into_iter().rev());
            reportables
        }
        WctlError::Multiple(errors) => errors.iter().flat_map(to_reportables).collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}
