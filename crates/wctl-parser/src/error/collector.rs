//! Collector for accumulating diagnostics during a processing phase.

use crate::error::{Diagnostic, ParseError};

/// Accumulates diagnostics so a phase can report every problem it finds
/// instead of stopping at the first one.
///
/// Used by the lexer, which recovers by skipping the offending character.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// `Err` with every diagnostic if at least one error was emitted.
    /// Warnings alone are dropped.
    pub fn finish(self) -> Result<(), ParseError> {
        if self.has_errors {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(())
        }
    }
}
