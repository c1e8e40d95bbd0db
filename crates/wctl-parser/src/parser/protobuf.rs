//! The protobuf-compatible `.proto` grammar.
//!
//! Only the subset that maps onto the schema model is accepted: `syntax`,
//! `package`, `import`, `option`, `enum`, `message` and `service` with
//! `rpc` methods. Protobuf scalars are folded onto base types; the encoding
//! hints they carry (`sint*`, `fixed*`) survive as field options.

use log::trace;

use wctl_core::{
    ast::{
        BaseType, CustomType, Doc, ElemType, EnumDef, Field, FieldType, Import, Message, Method,
        OptionDecl, OptionValue, Package, Program, Service,
    },
    span::Spanned,
};

use super::{
    IResult, Input, at, at_keyword, cut_err, eat, expected, field_tag, int_literal, keyword,
    lookahead, map_type, next_span, option_value, punct, raw_identifier, reject, string_literal,
};
use crate::{
    ParseConfig,
    error::{Diagnostic, ErrorCode},
    tokens::Token,
};

const SIGNED: &str = "proto.signed";
const FIXED: &str = "proto.fixed";

pub(super) fn program<'src>(input: &mut Input<'src>, config: &ParseConfig) -> IResult<Program> {
    let syntax = syntax(input)?;
    let package = package(input)?;
    let mut program = Program::new(package);
    program.options.extend(syntax);

    loop {
        match lookahead::<1>(input) {
            [None] => break,
            [Some(Token::Semicolon)] => {
                punct(input, Token::Semicolon, "`;`")?;
            }
            [Some(Token::Identifier("import"))] => program.imports.push(import(input)?),
            [Some(Token::Identifier("option"))] => program.options.push(option_statement(input)?),
            [Some(Token::Identifier("enum"))] => program.enums.push(enum_def(input)?),
            [Some(Token::Identifier("message"))] => program.messages.push(message(input)?),
            [Some(Token::Identifier("service"))] => program.services.push(service(input, config)?),
            _ => return expected(input, "top-level declaration"),
        }
    }

    trace!(
        package = program.package_name(),
        messages = program.messages.len(),
        services = program.services.len();
        "Parsed protobuf program"
    );
    Ok(program)
}

/// `syntax = "proto3";`, kept as the `proto.syntax` option.
fn syntax<'src>(input: &mut Input<'src>) -> IResult<Option<OptionDecl>> {
    if !at_keyword(input, "syntax") {
        return Ok(None);
    }
    let span = keyword(input, "syntax")?;
    cut_err(input, |input| {
        punct(input, Token::Equals, "`=`")?;
        let version = string_literal(input)?;
        let number = match version.inner().as_str() {
            "proto3" => 3,
            "proto2" => 2,
            other => {
                return reject(
                    Diagnostic::error(format!("unsupported syntax `{other}`"))
                        .with_code(ErrorCode::E112)
                        .with_label(version.span(), ErrorCode::E112.description())
                        .with_help("use \"proto3\" or \"proto2\""),
                );
            }
        };
        eat(input, Token::Semicolon)?;

        Ok(Some(OptionDecl::new(
            Spanned::new("proto.syntax".to_string(), span),
            Some(OptionValue::Int(number)),
        )))
    })
}

fn package<'src>(input: &mut Input<'src>) -> IResult<Package> {
    if !at_keyword(input, "package") {
        return reject(
            Diagnostic::error("missing package declaration")
                .with_code(ErrorCode::E102)
                .with_label(next_span(input), "expected `package` here")
                .with_help("add `package name;` after the syntax statement"),
        );
    }
    keyword(input, "package")?;
    let name = cut_err(input, raw_identifier)?;
    eat(input, Token::Semicolon)?;

    Ok(Package {
        name: name.map(|name| name.to_string()),
        doc: Doc::default(),
    })
}

fn import<'src>(input: &mut Input<'src>) -> IResult<Import> {
    keyword(input, "import")?;
    cut_err(input, |input| {
        let alias = match lookahead::<1>(input) {
            [Some(Token::Identifier(_))] => {
                Some(raw_identifier(input)?.map(|alias| alias.to_string()))
            }
            _ => None,
        };
        let file = string_literal(input)?;
        eat(input, Token::Semicolon)?;
        Ok(Import::new(file, alias))
    })
}

/// `option name = value;`
fn option_statement<'src>(input: &mut Input<'src>) -> IResult<OptionDecl> {
    keyword(input, "option")?;
    cut_err(input, |input| {
        let key = option_name(input)?;
        punct(input, Token::Equals, "`=`")?;
        let value = option_value(input)?;
        eat(input, Token::Semicolon)?;

        let key = if key.inner() == "go_package" {
            Spanned::new("proto.gopkg".to_string(), key.span())
        } else {
            key
        };
        Ok(OptionDecl::new(key, Some(value)))
    })
}

/// `name` or `(custom.name)`.
fn option_name<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    match eat(input, Token::LeftParen)? {
        Some(open) => {
            let name = raw_identifier(input)?;
            let close = punct(input, Token::RightParen, "`)`")?;
            Ok(Spanned::new(name.inner().to_string(), open.union(close)))
        }
        None => Ok(raw_identifier(input)?.map(|name| name.to_string())),
    }
}

/// `[name = value, ...]` after a field tag.
fn field_options<'src>(input: &mut Input<'src>) -> IResult<Vec<OptionDecl>> {
    punct(input, Token::LeftBracket, "`[`")?;
    let mut options = Vec::new();
    loop {
        let key = option_name(input)?;
        punct(input, Token::Equals, "`=`")?;
        let value = option_value(input)?;
        options.push(OptionDecl::new(key, Some(value)));
        if eat(input, Token::Comma)?.is_none() {
            break;
        }
    }
    punct(input, Token::RightBracket, "`]`")?;
    Ok(options)
}

fn enum_def<'src>(input: &mut Input<'src>) -> IResult<EnumDef> {
    keyword(input, "enum")?;
    cut_err(input, |input| {
        let name = raw_identifier(input)?;
        let mut def = EnumDef::new(name.map(|name| name.to_string()));
        punct(input, Token::LeftBrace, "`{`")?;

        loop {
            match lookahead::<1>(input) {
                [Some(Token::RightBrace)] => break,
                [Some(Token::Semicolon)] => {
                    punct(input, Token::Semicolon, "`;`")?;
                }
                [Some(Token::Identifier("option"))] => def.options.push(option_statement(input)?),
                _ => {
                    let name = raw_identifier(input)?;
                    punct(input, Token::Equals, "`=`")?;
                    let value = int_literal(input)?;
                    if at(input, Token::LeftBracket) {
                        let span = next_span(input);
                        return reject(
                            Diagnostic::error(format!(
                                "options on enum value `{}` are not supported",
                                name.inner()
                            ))
                            .with_code(ErrorCode::E109)
                            .with_label(span, ErrorCode::E109.description())
                            .with_help(
                                "move the option into the enum body as `option name = value;`",
                            ),
                        );
                    }
                    eat(input, Token::Semicolon)?;
                    def.push_value(
                        name.map(|name| name.to_string()),
                        Some(*value.inner()),
                        Doc::default(),
                    );
                }
            }
        }

        punct(input, Token::RightBrace, "`}`")?;
        Ok(def)
    })
}

fn message<'src>(input: &mut Input<'src>) -> IResult<Message> {
    keyword(input, "message")?;
    cut_err(input, |input| {
        let name = raw_identifier(input)?;
        let mut message = Message::new(name.map(|name| name.to_string()));
        punct(input, Token::LeftBrace, "`{`")?;

        loop {
            match lookahead::<2>(input) {
                [Some(Token::RightBrace), _] => break,
                [Some(Token::Semicolon), _] => {
                    punct(input, Token::Semicolon, "`;`")?;
                }
                [Some(Token::Identifier("message")), Some(Token::Identifier(_))] => {
                    message.messages.push(self::message(input)?)
                }
                [Some(Token::Identifier("enum")), Some(Token::Identifier(_))] => {
                    message.enums.push(enum_def(input)?)
                }
                [
                    Some(Token::Identifier("option")),
                    Some(Token::Identifier(_) | Token::LeftParen),
                ] => {
                    message.options.push(option_statement(input)?)
                }
                _ => message.fields.push(field(input)?),
            }
        }

        punct(input, Token::RightBrace, "`}`")?;
        Ok(message)
    })
}

/// `[repeated|optional|required] type name = tag [options];`
fn field<'src>(input: &mut Input<'src>) -> IResult<Field> {
    let repeated = if at_keyword(input, "repeated") {
        keyword(input, "repeated")?;
        true
    } else {
        if at_keyword(input, "optional") {
            keyword(input, "optional")?;
        } else if at_keyword(input, "required") {
            keyword(input, "required")?;
        }
        false
    };

    let mut hints = Vec::new();
    let ty = if !repeated && at_keyword(input, "map") {
        map_type(input, |input| elem_type(input, &mut hints))?
    } else {
        let elem = elem_type(input, &mut hints)?.into_inner();
        if repeated {
            FieldType::List(elem)
        } else {
            elem.into()
        }
    };

    cut_err(input, |input| {
        let name = raw_identifier(input)?;
        punct(input, Token::Equals, "`=`")?;
        let tag = field_tag(input)?;

        let mut options: Vec<OptionDecl> = hints
            .into_iter()
            .map(|key| {
                OptionDecl::new(
                    Spanned::new(key.to_string(), tag.span()),
                    Some(OptionValue::Int(1)),
                )
            })
            .collect();
        if at(input, Token::LeftBracket) {
            options.extend(field_options(input)?);
        }
        eat(input, Token::Semicolon)?;

        Ok(Field {
            name: name.map(|name| name.to_string()),
            tag,
            ty,
            options,
            doc: Doc::default(),
        })
    })
}

/// A protobuf scalar, or a message/enum reference. Encoding hints of the
/// scalar are appended to `hints`.
fn elem_type<'src>(
    input: &mut Input<'src>,
    hints: &mut Vec<&'static str>,
) -> IResult<Spanned<ElemType>> {
    let name = raw_identifier(input)?;
    let (base, extra): (BaseType, &[&'static str]) = match *name.inner() {
        "int32" => (BaseType::Int32, &[]),
        "int64" => (BaseType::Int64, &[]),
        "uint32" => (BaseType::Uint32, &[]),
        "uint64" => (BaseType::Uint64, &[]),
        "string" => (BaseType::String, &[]),
        "bool" => (BaseType::Bool, &[]),
        "bytes" => (BaseType::Binary, &[]),
        "float" => (BaseType::Float32, &[]),
        "double" => (BaseType::Float64, &[]),
        "sint32" => (BaseType::Int32, &[SIGNED]),
        "sint64" => (BaseType::Int64, &[SIGNED]),
        "fixed32" => (BaseType::Uint32, &[FIXED]),
        "fixed64" => (BaseType::Uint64, &[FIXED]),
        "sfixed32" => (BaseType::Int32, &[SIGNED, FIXED]),
        "sfixed64" => (BaseType::Int64, &[SIGNED, FIXED]),
        _ => {
            let custom = CustomType::new(name.map(|name| name.to_string()));
            return Ok(Spanned::new(ElemType::Custom(custom), name.span()));
        }
    };

    for hint in extra {
        if !hints.contains(hint) {
            hints.push(*hint);
        }
    }
    Ok(Spanned::new(ElemType::Base(base), name.span()))
}

fn service<'src>(input: &mut Input<'src>, config: &ParseConfig) -> IResult<Service> {
    keyword(input, "service")?;
    cut_err(input, |input| {
        let name = raw_identifier(input)?;
        let mut service = Service::new(name.map(|name| name.to_string()));
        punct(input, Token::LeftBrace, "`{`")?;

        loop {
            match lookahead::<1>(input) {
                [Some(Token::RightBrace)] => break,
                [Some(Token::Semicolon)] => {
                    punct(input, Token::Semicolon, "`;`")?;
                }
                [Some(Token::Identifier("option"))] => {
                    service.options.push(option_statement(input)?)
                }
                [Some(Token::Identifier("rpc"))] => service.methods.push(rpc(input, config)?),
                _ => return expected(input, "`rpc` or `option`"),
            }
        }

        punct(input, Token::RightBrace, "`}`")?;
        Ok(service)
    })
}

/// `rpc Name(Req) returns (Rep) [= id] { [option ...;] }` or `... ;`
fn rpc<'src>(input: &mut Input<'src>, config: &ParseConfig) -> IResult<Method> {
    keyword(input, "rpc")?;
    cut_err(input, |input| {
        let name = raw_identifier(input)?;
        let mut method = Method::new(name.map(|name| name.to_string()));

        punct(input, Token::LeftParen, "`(`")?;
        method.request = Some(rpc_message(input)?);
        punct(input, Token::RightParen, "`)`")?;
        keyword(input, "returns")?;
        punct(input, Token::LeftParen, "`(`")?;
        method.reply = Some(rpc_message(input)?);
        punct(input, Token::RightParen, "`)`")?;

        if eat(input, Token::Equals)?.is_some() {
            let id = int_literal(input)?;
            if config.use_method_id {
                method.id = Some(id);
            }
        }

        if eat(input, Token::LeftBrace)?.is_some() {
            loop {
                match lookahead::<1>(input) {
                    [Some(Token::RightBrace)] => break,
                    [Some(Token::Semicolon)] => {
                        punct(input, Token::Semicolon, "`;`")?;
                    }
                    _ => method.options.push(option_statement(input)?),
                }
            }
            punct(input, Token::RightBrace, "`}`")?;
        }
        eat(input, Token::Semicolon)?;
        Ok(method)
    })
}

/// A bare message name in an `rpc` signature. `stream` is not supported.
fn rpc_message<'src>(input: &mut Input<'src>) -> IResult<Message> {
    let name = raw_identifier(input)?;
    if *name.inner() == "stream" {
        return reject(
            Diagnostic::error("streaming rpc is not supported")
                .with_code(ErrorCode::E111)
                .with_label(name.span(), ErrorCode::E111.description()),
        );
    }
    if BaseType::from_name(name.inner()).is_some() {
        return reject(
            Diagnostic::error(format!(
                "rpc message must be a message type, found `{}`",
                name.inner()
            ))
            .with_code(ErrorCode::E111)
            .with_label(name.span(), ErrorCode::E111.description()),
        );
    }
    Ok(Message::protobuf_stub(name.map(|name| name.to_string())))
}
