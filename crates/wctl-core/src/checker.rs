//! Duplicate detection for names and numeric identifiers within one scope.
//!
//! Every scope-bearing node (program, enum, message, service) owns its own
//! [`UniqueChecker`]. The checker never deduplicates on its own: callers ask
//! with [`UniqueChecker::check_name`] / [`UniqueChecker::check_number`] first
//! and only then record the definition, so the reported position is always
//! the *first* definition.

use std::collections::HashMap;

use crate::span::Span;

/// Records where names and numbers were first defined in a scope.
///
/// Both maps start empty and only allocate on the first insertion.
#[derive(Debug, Clone, Default)]
pub struct UniqueChecker {
    names: HashMap<String, Span>,
    numbers: HashMap<i64, Span>,
}

impl UniqueChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the span of the earlier definition of `name`, if any.
    pub fn check_name(&self, name: &str) -> Option<Span> {
        self.names.get(name).copied()
    }

    /// Records `name` as defined at `span`.
    ///
    /// An existing entry is overwritten; check first.
    pub fn add_name(&mut self, name: impl Into<String>, span: Span) {
        self.names.insert(name.into(), span);
    }

    /// Returns the span of the earlier definition of `number`, if any.
    pub fn check_number(&self, number: i64) -> Option<Span> {
        self.numbers.get(&number).copied()
    }

    /// Records `number` as defined at `span`.
    pub fn add_number(&mut self, number: i64, span: Span) {
        self.numbers.insert(number, span);
    }

    /// Records `name` unless it is already defined, returning the first
    /// definition on collision.
    pub fn insert_name(&mut self, name: &str, span: Span) -> Result<(), Span> {
        match self.check_name(name) {
            Some(first) => Err(first),
            None => {
                self.add_name(name, span);
                Ok(())
            }
        }
    }

    /// Records `number` unless it is already defined, returning the first
    /// definition on collision.
    pub fn insert_number(&mut self, number: i64, span: Span) -> Result<(), Span> {
        match self.check_number(number) {
            Some(first) => Err(first),
            None => {
                self.add_number(number, span);
                Ok(())
            }
        }
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.names.clear();
        self.numbers.clear();
    }
}
