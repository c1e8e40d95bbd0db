//! Validation and linking of parsed programs.
//!
//! A program goes through the passes below in this order; each pass stops at
//! the first problem it finds.
//!
//! 1. [`check_imports`] - no file or alias is imported twice
//! 2. [`check_repeated_definitions`] - names, numbers and option keys are
//!    unique in their scope; fills the program's symbol tables
//! 3. [`link_imports`] - once every import is bound to an analysed program,
//!    builds the reference-name map and checks package consistency
//! 4. [`fix_references`] - binds every custom type to its declaration
//!
//! Passes 1 and 2 only look at the program itself, so they run before any
//! import is followed. That makes the program's names visible to files that
//! import it back while it is still being analysed.

mod definitions;
mod imports;
mod references;

use wctl_core::span::Span;

use crate::error::{Diagnostic, ErrorCode};

pub use definitions::check_repeated_definitions;
pub use imports::{check_imports, link_imports};
pub use references::fix_references;

/// A collision between `span` and the earlier definition at `first`.
fn duplicate(code: ErrorCode, message: String, span: Span, first: Span) -> Diagnostic {
    Diagnostic::error(message)
        .with_code(code)
        .with_label(span, code.description())
        .with_secondary_label(first, "first defined here")
}
