//! Grammars for schema tokens.
//!
//! This module turns the token stream from the [`lexer`](super::lexer) into
//! a [`Program`]. The two dialects live in [`native`] (`.wproto`) and
//! [`protobuf`] (`.proto`); the helpers here are shared by both.
//!
//! Grammar errors stop at the first problem. Structural mistakes surface as
//! `E100`/`E101` with the expected construct; semantic checks done while
//! parsing (identifier shape, tag range, map keys) carry their own code.

mod native;
mod protobuf;

use winnow::{
    Parser as _,
    combinator::{preceded, repeat},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use wctl_core::{
    ast::{ElemType, FieldType, OptionDecl, OptionValue, Program},
    span::Spanned,
};

use crate::{
    ParseConfig, Span,
    error::{Diagnostic, ErrorCode},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone)]
enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) at error start position
    StartOffset(usize),
    /// A complete diagnostic, reported unchanged
    Diagnostic(Box<Diagnostic>),
}

type Input<'src> = WctlTokenSlice<'src>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;
/// Type alias for winnow TokenSlice with our positioned tokens
type WctlTokenSlice<'src> = TokenSlice<'src, PositionedToken<'src>>;

/// Run `f`, turning a failure into a cut error that remembers where `f`
/// started.
fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::StartOffset(start_remaining));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

/// Fail with a fully described diagnostic.
fn reject<O>(diagnostic: Diagnostic) -> IResult<O> {
    let mut e = ContextError::new();
    e.push(Context::Diagnostic(Box::new(diagnostic)));
    Err(ErrMode::Cut(e))
}

/// Fail with an "expected ..." error at the current token.
fn expected<O>(input: &Input<'_>, label: &'static str) -> IResult<O> {
    let mut e = ContextError::new();
    e.push(Context::Label(label));
    e.push(Context::StartOffset(input.eof_offset()));
    Err(ErrMode::Cut(e))
}

/// Parse whitespace and comments
fn ws_comment<'src>(input: &mut Input<'src>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| token.token.is_trivia())
        .void()
        .parse_next(input)
}

/// Parse zero or more whitespace/comments
fn ws_comments0<'src>(input: &mut Input<'src>) -> IResult<()> {
    repeat(0.., ws_comment).parse_next(input)
}

/// The next `N` significant tokens, without consuming anything.
fn peek_tokens<'src, const N: usize>(
    input: &mut Input<'src>,
) -> [Option<&'src PositionedToken<'src>>; N] {
    let checkpoint = input.checkpoint();
    let mut tokens = [None; N];
    for slot in &mut tokens {
        if ws_comments0(input).is_err() {
            break;
        }
        *slot = input.next_token();
    }
    input.reset(&checkpoint);
    tokens
}

fn lookahead<'src, const N: usize>(input: &mut Input<'src>) -> [Option<&'src Token<'src>>; N] {
    peek_tokens::<N>(input).map(|token| token.map(|t| &t.token))
}

/// Span of the next significant token; empty at the end of input.
fn next_span(input: &mut Input<'_>) -> Span {
    match peek_tokens::<1>(input) {
        [Some(token)] => token.span,
        [None] => Span::default(),
    }
}

fn at(input: &mut Input<'_>, expected: Token<'static>) -> bool {
    matches!(lookahead::<1>(input), [Some(token)] if *token == expected)
}

fn at_keyword(input: &mut Input<'_>, keyword: &str) -> bool {
    matches!(lookahead::<1>(input), [Some(Token::Identifier(name))] if *name == keyword)
}

/// Parse one punctuation token, skipping leading trivia.
fn punct<'src>(
    input: &mut Input<'src>,
    expected: Token<'static>,
    label: &'static str,
) -> IResult<Span> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'_>| {
            (token.token == expected).then_some(token.span)
        }),
    )
    .context(Context::Label(label))
    .parse_next(input)
}

/// Consume `expected` if it is next.
fn eat(input: &mut Input<'_>, expected: Token<'static>) -> IResult<Option<Span>> {
    if at(input, expected.clone()) {
        punct(input, expected, "token").map(Some)
    } else {
        Ok(None)
    }
}

/// Parse a raw identifier string with span preservation
fn raw_identifier<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'_>| match &token.token {
            Token::Identifier(name) => Some(Spanned::new(*name, token.span)),
            _ => None,
        }),
    )
    .context(Context::Label("identifier"))
    .parse_next(input)
}

fn keyword<'src>(input: &mut Input<'src>, keyword: &'static str) -> IResult<Span> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'_>| match &token.token {
            Token::Identifier(name) if *name == keyword => Some(token.span),
            _ => None,
        }),
    )
    .context(Context::Label(keyword))
    .parse_next(input)
}

fn string_literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'_>| match &token.token {
            Token::StringLiteral(s) => Some(Spanned::new(s.clone(), token.span)),
            _ => None,
        }),
    )
    .context(Context::Label("string literal"))
    .parse_next(input)
}

fn int_literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<i64>> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'_>| match &token.token {
            Token::IntLiteral(value) => Some(Spanned::new(*value, token.span)),
            _ => None,
        }),
    )
    .context(Context::Label("integer"))
    .parse_next(input)
}

/// `[a-z][a-z0-9_]*`
fn is_lower_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Lowercase segments joined by single dots, with at least one dot.
fn is_option_name(name: &str) -> bool {
    name.contains('.') && name.split('.').all(is_lower_identifier)
}

/// An identifier naming a declaration; must be lowercase.
fn lower_identifier<'src>(input: &mut Input<'src>, what: &'static str) -> IResult<Spanned<String>> {
    let name = raw_identifier(input)?;
    if !is_lower_identifier(name.inner()) {
        return reject(
            Diagnostic::error(format!("invalid {what} `{}`", name.inner()))
                .with_code(ErrorCode::E103)
                .with_label(name.span(), "not a lowercase identifier")
                .with_help("names start with `a-z` and contain only `a-z`, `0-9` and `_`"),
        );
    }
    Ok(name.map(|name| name.to_string()))
}

/// A `dotted.option` name.
fn option_key<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    let key = raw_identifier(input)?;
    if !is_option_name(key.inner()) {
        return reject(
            Diagnostic::error(format!("invalid option name `{}`", key.inner()))
                .with_code(ErrorCode::E104)
                .with_label(key.span(), ErrorCode::E104.description())
                .with_help("option names are lowercase and contain a `.`, like `proto.gopkg`"),
        );
    }
    Ok(key.map(|key| key.to_string()))
}

/// A string, an integer, or `true`/`false` (stored as 1/0).
fn option_value<'src>(input: &mut Input<'src>) -> IResult<OptionValue> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'_>| match &token.token {
            Token::StringLiteral(value) => Some(OptionValue::Str(value.clone())),
            Token::IntLiteral(value) => Some(OptionValue::Int(*value)),
            Token::Identifier("true") => Some(OptionValue::Int(1)),
            Token::Identifier("false") => Some(OptionValue::Int(0)),
            _ => None,
        }),
    )
    .context(Context::Label("option value"))
    .parse_next(input)
}

/// `dotted.key [= value] [;]`
fn option_decl<'src>(input: &mut Input<'src>) -> IResult<OptionDecl> {
    let key = option_key(input)?;
    let value = match eat(input, Token::Equals)? {
        Some(_) => Some(cut_err(input, option_value)?),
        None => None,
    };
    eat(input, Token::Semicolon)?;
    Ok(OptionDecl::new(key, value))
}

/// `{ option... }`
fn options_block<'src>(input: &mut Input<'src>) -> IResult<Vec<OptionDecl>> {
    punct(input, Token::LeftBrace, "`{`")?;
    let mut options = Vec::new();
    while !at(input, Token::RightBrace) {
        options.push(option_decl(input)?);
    }
    punct(input, Token::RightBrace, "`}`")?;
    Ok(options)
}

fn field_tag<'src>(input: &mut Input<'src>) -> IResult<Spanned<i64>> {
    let tag = int_literal(input)?;
    if !(1..=255).contains(tag.inner()) {
        return reject(
            Diagnostic::error(format!("field tag {} is out of range", tag.inner()))
                .with_code(ErrorCode::E106)
                .with_label(tag.span(), "must be between 1 and 255"),
        );
    }
    Ok(tag)
}

/// `map<key, value>`, with `elem` parsing the key and value types.
fn map_type<'src, F>(input: &mut Input<'src>, mut elem: F) -> IResult<FieldType>
where
    F: FnMut(&mut Input<'src>) -> IResult<Spanned<ElemType>>,
{
    keyword(input, "map")?;
    cut_err(input, |input| {
        punct(input, Token::LeftAngle, "`<`")?;
        let key = elem(input)?;
        punct(input, Token::Comma, "`,`")?;
        if at_keyword(input, "map") || at_keyword(input, "repeated") {
            return reject(
                Diagnostic::error("map value can't be a container")
                    .with_code(ErrorCode::E108)
                    .with_label(next_span(input), ErrorCode::E108.description())
                    .with_help("wrap the container in a message"),
            );
        }
        let value = elem(input)?;
        punct(input, Token::RightAngle, "`>`")?;

        let key_span = key.span();
        match key.into_inner() {
            ElemType::Base(base) if base.is_map_key() => Ok(FieldType::Map {
                key: base,
                value: value.into_inner(),
            }),
            ElemType::Base(_) => reject(
                Diagnostic::error("map key can't set binary type")
                    .with_code(ErrorCode::E107)
                    .with_label(key_span, ErrorCode::E107.description()),
            ),
            ElemType::Custom(custom) => reject(
                Diagnostic::error(format!("map key must be a base type, found `{}`", custom.name()))
                    .with_code(ErrorCode::E107)
                    .with_label(key_span, ErrorCode::E107.description()),
            ),
        }
    })
}

/// Convert a winnow error to a diagnostic.
///
/// A [`Context::Diagnostic`] is returned as is. Otherwise the primary label
/// marks the token where parsing stopped, and the innermost
/// [`Context::StartOffset`] marks the declaration being parsed.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken],
    current_remaining: usize,
) -> Diagnostic {
    let context = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    if let Some(diagnostic) = context.context().find_map(|ctx| match ctx {
        Context::Diagnostic(diagnostic) => Some(diagnostic.as_ref().clone()),
        _ => None,
    }) {
        return diagnostic;
    }

    let start_remaining = context.context().find_map(|ctx| match ctx {
        Context::StartOffset(n) => Some(*n),
        _ => None,
    });
    let end_offset = tokens.len() - current_remaining;
    let start_offset = start_remaining.map(|r| tokens.len() - r).unwrap_or(end_offset);

    let at_end = tokens[end_offset..].iter().all(|t| t.token.is_trivia());
    let label = context.context().find_map(|ctx| match ctx {
        Context::Label(label) => Some(*label),
        _ => None,
    });

    if at_end {
        let span = tokens
            .iter()
            .rev()
            .find(|t| !t.token.is_trivia())
            .map(|t| Span::new(t.span.end()..t.span.end()))
            .unwrap_or_default();
        let message = match label {
            Some(label) => format!("unexpected end of input, expected {label}"),
            None => "unexpected end of input".to_string(),
        };
        return Diagnostic::error(message)
            .with_code(ErrorCode::E101)
            .with_label(span, "input ends here")
            .with_help("the declaration is incomplete");
    }

    let significant = |t: &&PositionedToken| !t.token.is_trivia();
    let (found, span) = tokens[end_offset..]
        .iter()
        .find(significant)
        .map(|t| (t.token.to_string(), t.span))
        .unwrap_or_default();
    let message = match label {
        Some(label) => format!("expected {label}, found {found}"),
        None => format!("unexpected {found}"),
    };

    let mut diagnostic = Diagnostic::error(message)
        .with_code(ErrorCode::E100)
        .with_label(span, "unexpected token");
    if let Some(start) = tokens[start_offset.min(end_offset)..end_offset]
        .iter()
        .find(significant)
    {
        diagnostic = diagnostic.with_secondary_label(start.span, "while parsing this");
    }
    diagnostic.with_help("check syntax and token positioning")
}

fn run<'src, O, F>(tokens: &'src [PositionedToken<'src>], parser: F) -> Result<O, Diagnostic>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let mut token_slice = TokenSlice::new(tokens);

    parser(&mut token_slice).map_err(|e| {
        let current_remaining = token_slice.eof_offset();
        convert_error(e, tokens, current_remaining)
    })
}

/// Build a program from `.wproto` tokens.
pub(crate) fn build_native<'src>(
    tokens: &'src [PositionedToken<'src>],
    config: &ParseConfig,
) -> Result<Program, Diagnostic> {
    run(tokens, |input| native::program(input, config))
}

/// Build a program from `.proto` tokens.
pub(crate) fn build_protobuf<'src>(
    tokens: &'src [PositionedToken<'src>],
    config: &ParseConfig,
) -> Result<Program, Diagnostic> {
    run(tokens, |input| protobuf::program(input, config))
}
