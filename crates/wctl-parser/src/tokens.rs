//! Token types shared by the native and protobuf grammars.

use std::fmt;

use crate::Span;

/// A lexical token.
///
/// Keywords are not distinguished here: `message`, `enum`, `rpc` and the
/// rest arrive as [`Token::Identifier`] and the grammars match them by text,
/// so a keyword remains usable as a name where the grammar allows it.
/// Dotted names such as `abc.abc` or `proto.gopkg` are a single identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Identifier(&'a str),
    IntLiteral(i64),
    StringLiteral(String),
    /// A `//` comment, including the marker.
    LineComment(&'a str),

    Whitespace,
    Newline,

    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftAngle,
    RightAngle,
    LeftBracket,
    RightBracket,
    Equals,
    Semicolon,
    Colon,
    Comma,
}

impl Token<'_> {
    /// Whether the grammar skips this token between meaningful ones.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::Newline | Token::LineComment(_)
        )
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "identifier `{name}`"),
            Token::IntLiteral(value) => write!(f, "integer `{value}`"),
            Token::StringLiteral(value) => write!(f, "string {value:?}"),
            Token::LineComment(_) => f.write_str("comment"),
            Token::Whitespace => f.write_str("whitespace"),
            Token::Newline => f.write_str("newline"),
            Token::LeftBrace => f.write_str("`{`"),
            Token::RightBrace => f.write_str("`}`"),
            Token::LeftParen => f.write_str("`(`"),
            Token::RightParen => f.write_str("`)`"),
            Token::LeftAngle => f.write_str("`<`"),
            Token::RightAngle => f.write_str("`>`"),
            Token::LeftBracket => f.write_str("`[`"),
            Token::RightBracket => f.write_str("`]`"),
            Token::Equals => f.write_str("`=`"),
            Token::Semicolon => f.write_str("`;`"),
            Token::Colon => f.write_str("`:`"),
            Token::Comma => f.write_str("`,`"),
        }
    }
}

/// A token with its byte span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'a> {
    pub token: Token<'a>,
    pub span: Span,
}

impl<'a> PositionedToken<'a> {
    pub fn new(token: Token<'a>, span: Span) -> Self {
        Self { token, span }
    }
}
