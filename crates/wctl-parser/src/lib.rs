//! # wctl Parser
//!
//! Parsing and reference resolution for wctl schema files. Two dialects are
//! understood: the native `.wproto` language and a protobuf-compatible
//! `.proto` subset. Both produce the same [`Program`] tree.
//!
//! ## Usage
//!
//! ```
//! # use wctl_parser::{parse_native, ParseConfig, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         package x1
//!
//!         message m1 {
//!             int32 id = 1
//!         }
//!     "#;
//!
//!     let program = parse_native(source, &ParseConfig::default())?;
//!     assert_eq!(program.package_name(), "x1");
//!     Ok(())
//! }
//! ```
//!
//! Parsing covers a single file. Cross-file analysis is driven by the caller
//! through the passes in [`resolve`], which need every imported program to
//! be available through a [`ProgramLookup`](wctl_core::ast::ProgramLookup).

mod docs;
pub mod error;
mod lexer;
mod parser;
#[cfg(test)]
mod parser_tests;
pub mod resolve;
mod tokens;

pub use wctl_core::span::Span;

use wctl_core::ast::Program;

use error::ParseError;

/// Settings that change how schema files are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseConfig {
    /// Keep method ids and require one on every method.
    pub use_method_id: bool,
}

/// Signature shared by the dialect parsers.
pub type ParseFn = fn(&str, &ParseConfig) -> Result<Program, ParseError>;

/// Parse a native `.wproto` source.
///
/// 1. **Tokenize** - every lexical error is reported
/// 2. **Parse** - stops at the first grammar error
/// 3. **Docs** - comments are attached to the declarations they describe
pub fn parse_native(source: &str, config: &ParseConfig) -> Result<Program, ParseError> {
    let tokens = lexer::tokenize(source)?;
    let mut program = parser::build_native(&tokens, config)?;
    docs::attach(&mut program, source, &tokens);
    Ok(program)
}

/// Parse a protobuf-compatible `.proto` source.
///
/// As with [`parse_native`], `rpc` ids written as `returns (Rep) = 3` are
/// kept only when [`ParseConfig::use_method_id`] is set.
pub fn parse_protobuf(source: &str, config: &ParseConfig) -> Result<Program, ParseError> {
    let tokens = lexer::tokenize(source)?;
    let mut program = parser::build_protobuf(&tokens, config)?;
    docs::attach(&mut program, source, &tokens);
    Ok(program)
}
