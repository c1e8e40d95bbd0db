//! Diagnostics reported while reading a schema file.
//!
//! Every problem found by the lexer, the two grammars or the resolution
//! passes is a [`Diagnostic`]: a severity, an optional [`ErrorCode`] grouped
//! by phase (`E0xx` lexing, `E1xx` grammar, `E2xx` definitions, `E3xx`
//! references), labelled spans and an optional help line. The diagnostics of
//! one file travel together in a [`ParseError`].
//!
//! ```
//! # use wctl_parser::error::{Diagnostic, ErrorCode};
//! # use wctl_parser::Span;
//! let diag = Diagnostic::error("message `user` is defined multiple times")
//!     .with_code(ErrorCode::E203)
//!     .with_label(Span::new(100..104), "duplicate definition")
//!     .with_secondary_label(Span::new(50..54), "first defined here");
//!
//! assert_eq!(diag.code(), Some(ErrorCode::E203));
//! assert_eq!(diag.labels().len(), 2);
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::{ParseError, Result};
pub use severity::Severity;
