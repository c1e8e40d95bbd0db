//! The native `.wproto` grammar.
//!
//! ```text
//! package x1
//!
//! import abc "abc_file"
//! proto.gopkg = "example.com/x1"
//!
//! enum color { red; green = 5; blue }
//!
//! message m2 {
//!     abc.abc f2 = 1
//!     repeated int32 ids = 2 { json.omit }
//!     map<string, color> tags = 3
//! }
//!
//! service s1 {
//!     get(m2) abc.abc = 1
//!     notify:
//!     changed(m2) void
//! }
//!
//! project deploy {
//!     ci.enable
//!     prod:
//!         svc.replicas = 3
//! }
//! ```
//!
//! Statement terminators (`;`) are optional everywhere.

use log::trace;

use wctl_core::{
    ast::{
        BaseType, CallMode, CustomType, Doc, ElemType, EnumDef, Field, FieldType, Import,
        Message, Method, Package, Program, Project, Service,
    },
    span::Spanned,
};

use super::{
    IResult, Input, at, at_keyword, cut_err, eat, field_tag, int_literal, is_lower_identifier,
    keyword, lookahead, lower_identifier, map_type, next_span, option_decl, options_block,
    peek_tokens, punct, raw_identifier, reject, string_literal,
};
use crate::{
    ParseConfig, Span,
    error::{Diagnostic, ErrorCode},
    tokens::Token,
};

pub(super) fn program<'src>(input: &mut Input<'src>, config: &ParseConfig) -> IResult<Program> {
    let package = package(input)?;
    let mut program = Program::new(package);

    loop {
        match lookahead::<1>(input) {
            [None] => break,
            [Some(Token::Semicolon)] => {
                punct(input, Token::Semicolon, "`;`")?;
            }
            [Some(Token::Identifier("import"))] => program.imports.push(import(input)?),
            [Some(Token::Identifier("enum"))] => program.enums.push(enum_def(input)?),
            [Some(Token::Identifier("message"))] => program.messages.push(message(input)?),
            [Some(Token::Identifier("service"))] => {
                program.services.push(service(input, config)?)
            }
            [Some(Token::Identifier("project"))] => program.projects.push(project(input)?),
            _ => program.options.push(option_decl(input)?),
        }
    }

    trace!(
        package = program.package_name(),
        messages = program.messages.len(),
        services = program.services.len();
        "Parsed native program"
    );
    Ok(program)
}

/// `package name [;]`, which must open the file.
fn package<'src>(input: &mut Input<'src>) -> IResult<Package> {
    if !at_keyword(input, "package") {
        return reject(
            Diagnostic::error("missing package declaration")
                .with_code(ErrorCode::E102)
                .with_label(next_span(input), "expected `package` here")
                .with_help("start the file with `package name`"),
        );
    }
    keyword(input, "package")?;
    let name = cut_err(input, |input| lower_identifier(input, "package name"))?;
    eat(input, Token::Semicolon)?;

    Ok(Package {
        name,
        doc: Doc::default(),
    })
}

/// `import [alias] "file" [;]`
fn import<'src>(input: &mut Input<'src>) -> IResult<Import> {
    keyword(input, "import")?;
    cut_err(input, |input| {
        let alias = match lookahead::<1>(input) {
            [Some(Token::Identifier(_))] => Some(lower_identifier(input, "import alias")?),
            _ => None,
        };
        let file = string_literal(input)?;
        eat(input, Token::Semicolon)?;
        Ok(Import::new(file, alias))
    })
}

/// `enum name { value [= n] | option ... } [;]`
fn enum_def<'src>(input: &mut Input<'src>) -> IResult<EnumDef> {
    keyword(input, "enum")?;
    cut_err(input, |input| {
        let mut def = EnumDef::new(lower_identifier(input, "enum name")?);
        punct(input, Token::LeftBrace, "`{`")?;

        loop {
            match lookahead::<1>(input) {
                [Some(Token::RightBrace)] => break,
                [Some(Token::Semicolon)] => {
                    punct(input, Token::Semicolon, "`;`")?;
                }
                [Some(Token::Identifier(name))] if name.contains('.') => {
                    def.options.push(option_decl(input)?)
                }
                _ => enum_value(input, &mut def)?,
            }
        }

        punct(input, Token::RightBrace, "`}`")?;
        eat(input, Token::Semicolon)?;
        Ok(def)
    })
}

fn enum_value<'src>(input: &mut Input<'src>, def: &mut EnumDef) -> IResult<()> {
    let name = lower_identifier(input, "enum value name")?;

    let value = match eat(input, Token::Equals)? {
        None => None,
        Some(_) => {
            let [next] = peek_tokens::<1>(input);
            if let Some(token) = next.filter(|t| matches!(t.token, Token::StringLiteral(_))) {
                return reject(
                    Diagnostic::error(format!("enum value `{}` must be an integer", name.inner()))
                        .with_code(ErrorCode::E109)
                        .with_label(token.span, ErrorCode::E109.description())
                        .with_help(
                            "enum values are numbers; \
                             leave the value out to count on from the previous one",
                        ),
                );
            }
            Some(*int_literal(input)?.inner())
        }
    };
    eat(input, Token::Semicolon)?;

    def.push_value(name, value, Doc::default());
    Ok(())
}

/// `message name { field | message | enum | option ... } [;]`
fn message<'src>(input: &mut Input<'src>) -> IResult<Message> {
    keyword(input, "message")?;
    cut_err(input, |input| {
        let mut message = Message::new(lower_identifier(input, "message name")?);
        punct(input, Token::LeftBrace, "`{`")?;

        loop {
            match lookahead::<3>(input) {
                [Some(Token::RightBrace), ..] => break,
                [Some(Token::Semicolon), ..] => {
                    punct(input, Token::Semicolon, "`;`")?;
                }
                [
                    Some(Token::Identifier("message")),
                    Some(Token::Identifier(_)),
                    Some(Token::LeftBrace),
                ] => message.messages.push(self::message(input)?),
                [
                    Some(Token::Identifier("enum")),
                    Some(Token::Identifier(_)),
                    Some(Token::LeftBrace),
                ] => message.enums.push(enum_def(input)?),
                [Some(Token::Identifier("repeated")), ..]
                | [Some(Token::Identifier("map")), Some(Token::LeftAngle), _]
                | [Some(Token::LeftBracket), ..]
                | [
                    Some(Token::Identifier(_)),
                    Some(Token::Identifier(_)),
                    Some(Token::Equals),
                ] => message.fields.push(field(input)?),
                _ => message.options.push(option_decl(input)?),
            }
        }

        punct(input, Token::RightBrace, "`}`")?;
        eat(input, Token::Semicolon)?;
        Ok(message)
    })
}

/// `type name = tag [{ options }] [;]`
fn field<'src>(input: &mut Input<'src>) -> IResult<Field> {
    let ty = field_type(input)?;
    cut_err(input, |input| {
        let name = raw_identifier(input)?;
        punct(input, Token::Equals, "`=`")?;
        let tag = field_tag(input)?;
        let options = if at(input, Token::LeftBrace) {
            options_block(input)?
        } else {
            Vec::new()
        };
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

fn field_type<'src>(input: &mut Input<'src>) -> IResult<FieldType> {
    if at_keyword(input, "map") {
        return map_type(input, elem_type);
    }
    if at_keyword(input, "repeated") {
        keyword(input, "repeated")?;
        if at_keyword(input, "repeated") || at_keyword(input, "map") {
            return reject(
                Diagnostic::error("repeated field can't hold a container")
                    .with_code(ErrorCode::E110)
                    .with_label(next_span(input), ErrorCode::E110.description())
                    .with_help("wrap the inner container in a message"),
            );
        }
        return Ok(FieldType::List(cut_err(input, elem_type)?.into_inner()));
    }
    Ok(elem_type(input)?.into_inner().into())
}

/// A base type (including `[]byte`) or a custom `name` / `ref.name`.
fn elem_type<'src>(input: &mut Input<'src>) -> IResult<Spanned<ElemType>> {
    if at(input, Token::LeftBracket) {
        let open = punct(input, Token::LeftBracket, "`[`")?;
        punct(input, Token::RightBracket, "`]`")?;
        let byte = keyword(input, "byte")?;
        return Ok(Spanned::new(
            ElemType::Base(BaseType::Binary),
            open.union(byte),
        ));
    }

    let name = raw_identifier(input)?;
    if let Some(base) = BaseType::from_name(name.inner()) {
        return Ok(Spanned::new(ElemType::Base(base), name.span()));
    }

    let segments: Vec<&str> = name.inner().split('.').collect();
    if segments.len() > 2 || !segments.iter().all(|segment| is_lower_identifier(segment)) {
        return reject(
            Diagnostic::error(format!("invalid field type `{}`", name.inner()))
                .with_code(ErrorCode::E105)
                .with_label(name.span(), ErrorCode::E105.description())
                .with_help("types are base types or lowercase `name` / `ref.name` references"),
        );
    }

    let custom = CustomType::new(name.map(|name| name.to_string()));
    Ok(Spanned::new(ElemType::Custom(custom), name.span()))
}

/// `service name { call: | notify: | method | option ... } [;]`
fn service<'src>(input: &mut Input<'src>, config: &ParseConfig) -> IResult<Service> {
    keyword(input, "service")?;
    cut_err(input, |input| {
        let mut service = Service::new(lower_identifier(input, "service name")?);
        let mut mode = CallMode::Call;
        punct(input, Token::LeftBrace, "`{`")?;

        loop {
            match lookahead::<2>(input) {
                [Some(Token::RightBrace), _] => break,
                [Some(Token::Semicolon), _] => {
                    punct(input, Token::Semicolon, "`;`")?;
                }
                [Some(Token::Identifier(flag)), Some(Token::Colon)] => {
                    let span = keyword_span(input)?;
                    mode = match *flag {
                        "call" => CallMode::Call,
                        "notify" => CallMode::Notify,
                        other => {
                            return reject(
                                Diagnostic::error(format!("unknown service flag `{other}`"))
                                    .with_code(ErrorCode::E100)
                                    .with_label(span, "unknown flag")
                                    .with_help("use `call:` or `notify:`"),
                            );
                        }
                    };
                    punct(input, Token::Colon, "`:`")?;
                }
                [Some(Token::Identifier(_)), Some(Token::LeftParen)] => {
                    service.methods.push(method(input, mode, config)?)
                }
                _ => service.options.push(option_decl(input)?),
            }
        }

        punct(input, Token::RightBrace, "`}`")?;
        eat(input, Token::Semicolon)?;
        Ok(service)
    })
}

/// Consume an identifier and return its span.
fn keyword_span<'src>(input: &mut Input<'src>) -> IResult<Span> {
    raw_identifier(input).map(|name| name.span())
}

/// `name(request) reply [= id] [{ options }] [;]`
fn method<'src>(input: &mut Input<'src>, mode: CallMode, config: &ParseConfig) -> IResult<Method> {
    let mut method = Method::new(lower_identifier(input, "method name")?);
    method.mode = mode;

    cut_err(input, |input| {
        punct(input, Token::LeftParen, "`(`")?;
        if !at(input, Token::RightParen) {
            method.request = method_message(input, "rq", "request")?;
        }
        punct(input, Token::RightParen, "`)`")?;

        method.reply = method_message(input, "rs", "reply")?;

        if eat(input, Token::Equals)?.is_some() {
            let id = int_literal(input)?;
            if config.use_method_id {
                method.id = Some(id);
            }
        }

        if at(input, Token::LeftBrace) {
            method.options = options_block(input)?;
        }
        eat(input, Token::Semicolon)?;
        Ok(())
    })?;

    Ok(method)
}

/// A request or reply: a message named after the written type, holding one
/// field of that type. `void` means no message.
fn method_message<'src>(
    input: &mut Input<'src>,
    field: &'static str,
    role: &'static str,
) -> IResult<Option<Message>> {
    let ty = elem_type(input)?;
    let span = ty.span();

    match ty.into_inner() {
        ElemType::Custom(custom) if custom.name() == "void" => Ok(None),
        ElemType::Custom(custom) => {
            let mut message = Message::new(Spanned::new(custom.name().to_string(), span));
            message.fields.push(Field {
                name: Spanned::new(field.to_string(), span),
                tag: Spanned::new(1, span),
                ty: FieldType::Custom(custom),
                options: Vec::new(),
                doc: Doc::default(),
            });
            Ok(Some(message))
        }
        ElemType::Base(base) => reject(
            Diagnostic::error(format!(
                "method {role} must be a custom message type, found `{base}`"
            ))
            .with_code(ErrorCode::E111)
            .with_label(span, ErrorCode::E111.description()),
        ),
    }
}

/// `project name { [area:] option ... } [;]`
fn project<'src>(input: &mut Input<'src>) -> IResult<Project> {
    keyword(input, "project")?;
    cut_err(input, |input| {
        let mut project = Project::new(lower_identifier(input, "project name")?);
        let mut area = Spanned::new(String::new(), Span::default());
        punct(input, Token::LeftBrace, "`{`")?;

        loop {
            match lookahead::<2>(input) {
                [Some(Token::RightBrace), _] => break,
                [Some(Token::Semicolon), _] => {
                    punct(input, Token::Semicolon, "`;`")?;
                }
                [Some(Token::Identifier(_)), Some(Token::Colon)] => {
                    area = lower_identifier(input, "project area")?;
                    punct(input, Token::Colon, "`:`")?;
                    project.area_mut(area.clone());
                }
                _ => {
                    let option = option_decl(input)?;
                    project.area_mut(area.clone()).options.push(option);
                }
            }
        }

        punct(input, Token::RightBrace, "`}`")?;
        eat(input, Token::Semicolon)?;
        Ok(project)
    })
}
