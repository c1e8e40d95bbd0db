use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::{ast::Doc, span::Spanned};

/// The value half of an option: either a string or an integer, never both.
///
/// Boolean literals are stored as integers (`true` = 1, `false` = 0).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionValue {
    Int(i64),
    Str(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(value) => write!(f, "{value}"),
            OptionValue::Str(value) => write!(f, "{value:?}"),
        }
    }
}

/// A `dotted.key [= value]` option attached to a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDecl {
    pub key: Spanned<String>,
    pub value: Option<OptionValue>,
    pub doc: Doc,
}

impl OptionDecl {
    pub fn new(key: Spanned<String>, value: Option<OptionValue>) -> Self {
        Self {
            key,
            value,
            doc: Doc::default(),
        }
    }

    /// The integer value, if this option carries one.
    pub fn int_value(&self) -> Option<i64> {
        match &self.value {
            Some(OptionValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// The string value, if this option carries one.
    pub fn str_value(&self) -> Option<&str> {
        match &self.value {
            Some(OptionValue::Str(value)) => Some(value),
            _ => None,
        }
    }
}

/// Find the first option with `key`.
pub fn find_option<'a>(options: &'a [OptionDecl], key: &str) -> Option<&'a OptionDecl> {
    options.iter().find(|option| option.key.inner() == key)
}

/// Errors from parsing a command-line option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CmdOptionError {
    #[error("empty option")]
    Empty,

    #[error("option `{0}` is not valid: the key must contain a '.'")]
    MissingDot(String),
}

/// A global option given on the command line.
///
/// Accepted forms are `key.sub`, `key.sub=text` and `key.sub=12`; the value
/// is an integer whenever it parses as a decimal `i64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdOption {
    pub key: String,
    pub value: Option<OptionValue>,
}

impl FromStr for CmdOption {
    type Err = CmdOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CmdOptionError::Empty);
        }

        let (key, value) = match s.split_once('=') {
            Some((key, value)) => {
                let value = value.trim();
                let value = match value.parse::<i64>() {
                    Ok(number) => OptionValue::Int(number),
                    Err(_) => OptionValue::Str(value.to_string()),
                };
                (key.trim(), Some(value))
            }
            None => (s, None),
        };

        if !key.contains('.') {
            return Err(CmdOptionError::MissingDot(s.to_string()));
        }

        Ok(Self {
            key: key.to_string(),
            value,
        })
    }
}

impl CmdOption {
    /// Apply to a list of options: an existing option with the same key takes
    /// the command-line value, otherwise the option is appended.
    pub fn apply_to(&self, options: &mut Vec<OptionDecl>) {
        match options
            .iter_mut()
            .find(|option| option.key.inner() == &self.key)
        {
            Some(existing) => existing.value = self.value.clone(),
            None => options.push(OptionDecl::new(
                Spanned::new(self.key.clone(), Default::default()),
                self.value.clone(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::span::Span;

    #[test]
    fn test_cmd_option_forms() {
        let bare: CmdOption = "go.pkg".parse().unwrap();
        assert_eq!(bare.key, "go.pkg");
        assert_eq!(bare.value, None);

        let text: CmdOption = " go.pkg = github.com/x/y ".parse().unwrap();
        assert_eq!(text.key, "go.pkg");
        assert_eq!(text.value, Some(OptionValue::Str("github.com/x/y".to_string())));

        let number: CmdOption = "svc.port=-12".parse().unwrap();
        assert_eq!(number.value, Some(OptionValue::Int(-12)));
    }

    #[test]
    fn test_cmd_option_requires_dot() {
        assert_eq!(
            "gopkg=x".parse::<CmdOption>(),
            Err(CmdOptionError::MissingDot("gopkg=x".to_string()))
        );
        assert_eq!("".parse::<CmdOption>(), Err(CmdOptionError::Empty));
    }

    #[test]
    fn test_cmd_option_apply_overrides_and_appends() {
        let mut options = vec![OptionDecl::new(
            Spanned::new("go.pkg".to_string(), Span::new(4..10)),
            Some(OptionValue::Str("old".to_string())),
        )];

        "go.pkg=new".parse::<CmdOption>().unwrap().apply_to(&mut options);
        "go.tag=3".parse::<CmdOption>().unwrap().apply_to(&mut options);

        assert_eq!(options.len(), 2);
        assert_eq!(options[0].str_value(), Some("new"));
        assert_eq!(options[0].key.span(), Span::new(4..10));
        assert_eq!(options[1].int_value(), Some(3));
        assert_eq!(find_option(&options, "go.tag").map(|o| o.key.span()), Some(Span::default()));
    }

    proptest! {
        #[test]
        fn prop_integer_values_round_trip(key in "[a-z]{1,5}\\.[a-z]{1,5}", value in any::<i64>()) {
            let option: CmdOption = format!("{key}={value}").parse().unwrap();
            prop_assert_eq!(option.key, key);
            prop_assert_eq!(option.value, Some(OptionValue::Int(value)));
        }
    }
}
