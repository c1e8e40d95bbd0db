//! Labeled source spans for diagnostic messages.

use crate::Span;

/// A message attached to a span of the source.
///
/// The primary label marks where the problem is; secondary labels point at
/// related places, such as the first definition of a duplicated name:
///
/// ```text
/// error[E203]: `m1` is defined multiple times
///   --> proto/x1.wproto:9:9
///    |
///  9 | message m1 {
///    |         ^^ duplicate definition
///    |
///  3 | message m1 {
///    |         -- first defined here
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_label() {
        let label = Label::primary(Span::new(10..20), "duplicate definition");

        assert_eq!(label.span(), Span::new(10..20));
        assert_eq!(label.message(), "duplicate definition");
        assert!(label.is_primary());
        assert!(!label.is_secondary());
    }

    #[test]
    fn test_secondary_label() {
        let label = Label::secondary(Span::new(5..15), "first defined here");

        assert_eq!(label.span().start(), 5);
        assert_eq!(label.span().end(), 15);
        assert!(label.is_secondary());
    }
}
