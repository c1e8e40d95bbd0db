//! Lexical analyzer for schema source text.
//!
//! Both dialects share one token set (see [`tokens`](super::tokens)), so a
//! single lexer serves `.wproto` and `.proto` files alike. The entry point
//! is [`tokenize`], which recovers from bad input and reports every lexical
//! error of the file at once.

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, not, opt, peek, preceded, repeat, terminated},
    error::{ContextError, ErrMode},
    stream::{LocatingSlice, Location, Stream},
    token::{none_of, one_of, take_while},
};

use crate::{
    Span,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    tokens::{PositionedToken, Token},
};

/// Diagnostic details attached to winnow errors via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<LexerDiagnostic>>>;

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn cut_with(diagnostic: LexerDiagnostic) -> ErrMode<ContextError<LexerDiagnostic>> {
    let mut e = ContextError::new();
    e.push(diagnostic);
    ErrMode::Cut(e)
}

/// Parse an escape sequence after the backslash.
fn string_escape<'a>(input: &mut Input<'a>) -> IResult<char> {
    let escape_start = input.current_token_start();
    '\\'.parse_next(input)?;

    let escaped = one_of(['n', 'r', 't', '\\', '\'', '"', '0'])
        .map(|c| match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            other => other,
        })
        .parse_next(input);

    escaped.map_err(|_: ErrMode<ContextError<LexerDiagnostic>>| {
        cut_with(LexerDiagnostic {
            code: ErrorCode::E003,
            message: "invalid escape sequence",
            help: Some("valid escapes: `\\n`, `\\r`, `\\t`, `\\\\`, `\\'`, `\\\"`, `\\0`"),
            start: escape_start,
        })
    })
}

/// Parse a double-quoted string literal. Strings end on the same line.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let string_char = none_of(['"', '\\', '\n', '\r']);
    let string_content = repeat(0.., alt((string_escape, string_char))).fold(
        String::new,
        |mut acc, ch| {
            acc.push(ch);
            acc
        },
    );

    let start_pos = input.current_token_start();
    '"'.parse_next(input)?;

    cut_err(terminated(string_content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add closing `\"` before the end of the line"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::StringLiteral)
}

/// Parse a decimal or `0x` hexadecimal integer with an optional sign.
fn int_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start_pos = input.current_token_start();

    let (sign, (digits, radix)) = terminated(
        (
            opt(one_of(['+', '-'])),
            alt((
                preceded(
                    alt(("0x", "0X")),
                    take_while(1.., |c: char| c.is_ascii_hexdigit()),
                )
                .map(|digits: &str| (digits, 16)),
                take_while(1.., |c: char| c.is_ascii_digit()).map(|digits: &str| (digits, 10)),
            )),
        ),
        peek(not(one_of(|c: char| is_ident_char(c) || c == '.'))),
    )
    .parse_next(input)?;

    let text = match sign {
        Some('-') => format!("-{digits}"),
        _ => digits.to_string(),
    };

    i64::from_str_radix(&text, radix)
        .map(Token::IntLiteral)
        .map_err(|_| {
            cut_with(LexerDiagnostic {
                code: ErrorCode::E004,
                message: "integer literal out of range",
                help: Some("integers must fit in a signed 64-bit value"),
                start: start_pos,
            })
        })
}

/// Parse an identifier segment: a letter or `_`, then letters, digits or `_`.
fn identifier_segment<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    (one_of(is_ident_start), take_while(0.., is_ident_char))
        .take()
        .parse_next(input)
}

/// Parse an identifier, including dotted names like `proto.gopkg`.
fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    (
        identifier_segment,
        repeat::<_, _, (), _, _>(0.., preceded('.', identifier_segment)),
    )
        .take()
        .map(Token::Identifier)
        .parse_next(input)
}

/// Parse a line comment, keeping the `//` marker.
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    ("//", take_while(0.., |c| c != '\n'))
        .take()
        .map(|comment: &str| Token::LineComment(comment.trim_end_matches('\r')))
        .parse_next(input)
}

fn punctuation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        alt((
            '{'.value(Token::LeftBrace),
            '}'.value(Token::RightBrace),
            '('.value(Token::LeftParen),
            ')'.value(Token::RightParen),
            '<'.value(Token::LeftAngle),
            '>'.value(Token::RightAngle),
        )),
        alt((
            '['.value(Token::LeftBracket),
            ']'.value(Token::RightBracket),
            '='.value(Token::Equals),
            ';'.value(Token::Semicolon),
            ':'.value(Token::Colon),
            ','.value(Token::Comma),
        )),
    ))
    .parse_next(input)
}

/// Whitespace other than newlines.
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,
        string_literal,
        int_literal,
        identifier,
        punctuation,
        newline,
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    let error_pos = input.current_token_start();
                    self.diagnostics.emit(Self::convert_err_mode(e, error_pos));

                    // Skip one character and carry on.
                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        self.diagnostics.finish().map(|()| self.tokens)
    }

    /// Turn a winnow error into a diagnostic, falling back to E002 when no
    /// [`LexerDiagnostic`] context was attached.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let end = error_pos.max(start + 1);
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(Span::new(*start..end), code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(
                Span::new(error_pos..error_pos.saturating_add(1)),
                ErrorCode::E002.description(),
            )
    }
}

/// Tokenize `input`, collecting every lexical error.
///
/// # Returns
///
/// - `Ok(tokens)` - the whole input was tokenized
/// - `Err(ParseError)` - one or more errors occurred; contains all diagnostics
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}
