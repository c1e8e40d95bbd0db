//! Core types for the wctl IDL compiler.
//!
//! This crate holds the schema model shared by the parser, the analysis
//! driver and generators:
//!
//! - [`span`] - source locations attached to syntax nodes
//! - [`ast`] - the declaration tree of one schema file and the handles used
//!   to link resolved references between files
//! - [`checker`] - duplicate name/number detection within a scope
//! - [`desc`] - generator-neutral descriptors of analysed programs

pub mod ast;
pub mod checker;
pub mod desc;
pub mod span;
