use log::debug;

use wctl_core::{
    ast::{EnumDef, EnumPath, Message, MessagePath, OptionDecl, Program, Service, Symbols},
    checker::UniqueChecker,
    span::Spanned,
};

use super::duplicate;
use crate::{
    ParseConfig,
    error::{Diagnostic, ErrorCode, Result},
};

/// Program-wide namespace shared by enums, messages and services. Nested
/// messages and enums are hoisted into it.
struct Scope<'a> {
    checker: &'a mut UniqueChecker,
    symbols: &'a mut Symbols,
}

impl Scope<'_> {
    fn define(&mut self, kind: &str, name: &Spanned<String>) -> Result<()> {
        self.checker
            .insert_name(name.inner(), name.span())
            .map_err(|first| {
                duplicate(
                    ErrorCode::E203,
                    format!("{kind} `{}` is defined multiple times", name.inner()),
                    name.span(),
                    first,
                )
            })
    }
}

/// Check that every name, number and option key is unique in its scope.
///
/// Fills the scope checkers of each node and the program's symbol tables.
/// With `use_method_id`, every method must carry an id and ids are unique per
/// service.
pub fn check_repeated_definitions(program: &mut Program, config: &ParseConfig) -> Result<()> {
    check_options(&program.options, "package")?;

    let mut scope = Scope {
        checker: &mut program.checker,
        symbols: &mut program.symbols,
    };

    for (index, def) in program.enums.iter_mut().enumerate() {
        check_enum(def, EnumPath { owner: None, index }, &mut scope)?;
    }
    for (index, message) in program.messages.iter_mut().enumerate() {
        check_message(message, MessagePath::root(index), &mut scope)?;
    }
    for service in &mut program.services {
        scope.define("service", &service.name)?;
        check_service(service, config)?;
    }

    for project in &program.projects {
        for area in project.areas.values() {
            let what = if area.name.is_empty() {
                format!("project `{}`", project.name.inner())
            } else {
                format!("project `{}` area `{}`", project.name.inner(), area.name.inner())
            };
            check_options(&area.options, &what)?;
        }
    }

    debug!(
        file = program.file.as_str(),
        messages = program.symbols.messages.len(),
        enums = program.symbols.enums.len();
        "Checked definitions"
    );
    Ok(())
}

/// Option keys are unique per declaration.
fn check_options(options: &[OptionDecl], owner: &str) -> Result<()> {
    let mut checker = UniqueChecker::new();
    for option in options {
        checker
            .insert_name(option.key.inner(), option.key.span())
            .map_err(|first| {
                duplicate(
                    ErrorCode::E206,
                    format!("option `{}` of {owner} is set more than once", option.key.inner()),
                    option.key.span(),
                    first,
                )
            })?;
    }
    Ok(())
}

fn check_enum(def: &mut EnumDef, path: EnumPath, scope: &mut Scope<'_>) -> Result<()> {
    scope.define("enum", &def.name)?;
    scope.symbols.enums.insert(def.name.inner().clone(), path);

    for value in &def.values {
        def.checker
            .insert_name(value.name.inner(), value.name.span())
            .map_err(|first| {
                duplicate(
                    ErrorCode::E204,
                    format!(
                        "enum `{}` has more than one value named `{}`",
                        def.name.inner(),
                        value.name.inner()
                    ),
                    value.name.span(),
                    first,
                )
            })?;
        def.checker
            .insert_number(value.value, value.name.span())
            .map_err(|first| {
                duplicate(
                    ErrorCode::E205,
                    format!(
                        "value {} of `{}.{}` is already used",
                        value.value,
                        def.name.inner(),
                        value.name.inner()
                    ),
                    value.name.span(),
                    first,
                )
            })?;
    }

    check_options(&def.options, &format!("enum `{}`", def.name.inner()))
}

fn check_message(message: &mut Message, path: MessagePath, scope: &mut Scope<'_>) -> Result<()> {
    scope.define("message", &message.name)?;
    scope
        .symbols
        .messages
        .insert(message.name.inner().clone(), path.clone());

    for field in &message.fields {
        message
            .checker
            .insert_number(*field.tag.inner(), field.tag.span())
            .map_err(|first| {
                duplicate(
                    ErrorCode::E205,
                    format!(
                        "tag {} of `{}.{}` is already used",
                        field.tag.inner(),
                        message.name.inner(),
                        field.name.inner()
                    ),
                    field.tag.span(),
                    first,
                )
            })?;
        message
            .checker
            .insert_name(field.name.inner(), field.name.span())
            .map_err(|first| {
                duplicate(
                    ErrorCode::E204,
                    format!(
                        "message `{}` has more than one field named `{}`",
                        message.name.inner(),
                        field.name.inner()
                    ),
                    field.name.span(),
                    first,
                )
            })?;
        check_options(
            &field.options,
            &format!("field `{}.{}`", message.name.inner(), field.name.inner()),
        )?;
    }
    check_options(&message.options, &format!("message `{}`", message.name.inner()))?;

    for (index, def) in message.enums.iter_mut().enumerate() {
        let path = EnumPath {
            owner: Some(path.clone()),
            index,
        };
        check_enum(def, path, scope)?;
    }
    for (index, sub) in message.messages.iter_mut().enumerate() {
        check_message(sub, path.child(index), scope)?;
    }
    Ok(())
}

fn check_service(service: &mut Service, config: &ParseConfig) -> Result<()> {
    for method in &service.methods {
        service
            .checker
            .insert_name(method.name.inner(), method.name.span())
            .map_err(|first| {
                duplicate(
                    ErrorCode::E204,
                    format!(
                        "service `{}` has more than one method named `{}`",
                        service.name.inner(),
                        method.name.inner()
                    ),
                    method.name.span(),
                    first,
                )
            })?;
        check_options(
            &method.options,
            &format!("method `{}.{}`", service.name.inner(), method.name.inner()),
        )?;
    }
    check_options(&service.options, &format!("service `{}`", service.name.inner()))?;

    if !config.use_method_id {
        return Ok(());
    }
    for method in &service.methods {
        let Some(id) = &method.id else {
            return Err(Diagnostic::error(format!(
                "method `{}.{}` has no id",
                service.name.inner(),
                method.name.inner()
            ))
            .with_code(ErrorCode::E207)
            .with_label(method.name.span(), ErrorCode::E207.description())
            .with_help("add `= <id>` after the method signature"));
        };

        if let Err(first) = service.checker.insert_number(*id.inner(), id.span()) {
            let owner = service
                .methods
                .iter()
                .find(|other| other.id.as_ref().is_some_and(|other| other.span() == first))
                .map_or("", |other| other.name.inner().as_str());
            return Err(duplicate(
                ErrorCode::E205,
                format!(
                    "methods `{owner}` and `{}` of service `{}` share id {}",
                    method.name.inner(),
                    service.name.inner(),
                    id.inner()
                ),
                id.span(),
                first,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_native, parse_protobuf};

    fn check(source: &str, config: ParseConfig) -> Result<Program> {
        let mut program = parse_native(source, &config).expect("valid source");
        check_repeated_definitions(&mut program, &config).map(|()| program)
    }

    fn code(source: &str) -> Option<ErrorCode> {
        check(source, ParseConfig::default()).unwrap_err().code()
    }

    #[test]
    fn test_symbols_hoist_nested_types() {
        let program = check(
            "package x1\nenum color { red }\nmessage outer {\n  message inner { enum kind { a } }\n  int32 id = 1\n}\n",
            ParseConfig::default(),
        )
        .expect("no duplicates");

        let names: Vec<_> = program.symbols.messages.keys().cloned().collect();
        assert_eq!(names, vec!["outer", "inner"]);
        assert_eq!(
            program.symbols.messages["inner"],
            MessagePath::root(0).child(0)
        );
        assert_eq!(
            program.symbols.enums["kind"].owner,
            Some(MessagePath::root(0).child(0))
        );
        assert!(program.symbols.enums["color"].owner.is_none());
    }

    #[test]
    fn test_duplicate_definitions() {
        assert_eq!(code("package x1\nmessage m1 {}\nmessage m1 {}\n"), Some(ErrorCode::E203));
        assert_eq!(code("package x1\nenum m1 { a }\nmessage m1 {}\n"), Some(ErrorCode::E203));
        assert_eq!(code("package x1\nmessage m1 {}\nservice m1 {}\n"), Some(ErrorCode::E203));
        assert_eq!(
            code("package x1\nmessage outer { message m1 {} }\nmessage m1 {}\n"),
            Some(ErrorCode::E203)
        );
    }

    #[test]
    fn test_duplicate_reports_first_definition() {
        let source = "package x1\nmessage m1 {}\nmessage m1 {}\n";
        let err = check(source, ParseConfig::default()).unwrap_err();
        let first = source.find("m1").unwrap_or_default();
        let second = source.rfind("m1").unwrap_or_default();

        assert_eq!(err.primary_span().map(|s| s.start()), Some(second));
        assert!(
            err.labels()
                .iter()
                .any(|label| label.is_secondary() && label.span().start() == first)
        );
    }

    #[test]
    fn test_duplicate_members() {
        assert_eq!(
            code("package x1\nmessage m1 { int32 a = 1\n string a = 2 }\n"),
            Some(ErrorCode::E204)
        );
        assert_eq!(
            code("package x1\nmessage m1 { int32 a = 1\n string b = 1 }\n"),
            Some(ErrorCode::E205)
        );
        assert_eq!(code("package x1\nenum e { a\n a = 4 }\n"), Some(ErrorCode::E204));
        assert_eq!(code("package x1\nenum e { a = 1\n b = 1 }\n"), Some(ErrorCode::E205));
        assert_eq!(
            code("package x1\nservice s1 { get(m1) void\n get(m2) void }\n"),
            Some(ErrorCode::E204)
        );
    }

    #[test]
    fn test_duplicate_options() {
        assert_eq!(code("package x1\na.b = 1\na.b = 2\n"), Some(ErrorCode::E206));
        assert_eq!(
            code("package x1\nmessage m1 { int32 a = 1 { x.y\n x.y } }\n"),
            Some(ErrorCode::E206)
        );
        assert_eq!(
            code("package x1\nproject p { c.d = 1\n prod:\n c.d = 1\n prod:\n c.d = 2 }\n"),
            Some(ErrorCode::E206)
        );
        // Same key in different scopes is fine.
        assert!(check("package x1\na.b\nenum e { a.b\n x }\n", ParseConfig::default()).is_ok());
    }

    #[test]
    fn test_method_ids() {
        let ids = ParseConfig {
            use_method_id: true,
        };
        let source = "package x1\nservice s1 { get(m1) void = 1\n put(m1) void = 1 }\n";

        assert!(check(source, ParseConfig::default()).is_ok());
        let err = check(source, ids).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E205));
        assert!(err.message().contains("`get`"));
        assert!(err.message().contains("`put`"));

        let missing = check(
            "package x1\nservice s1 { get(m1) void = 1\n put(m1) void }\n",
            ids,
        )
        .unwrap_err();
        assert_eq!(missing.code(), Some(ErrorCode::E207));
    }

    #[test]
    fn test_protobuf_method_ids() {
        let ids = ParseConfig {
            use_method_id: true,
        };
        let source = "package demo;\nservice S {\n  rpc Call(Req) returns (Rep) = 1;\n  rpc Ping(Req) returns (Rep) = 2 {}\n}\n";
        let mut program = parse_protobuf(source, &ids).expect("valid source");
        assert!(check_repeated_definitions(&mut program, &ids).is_ok());

        let mut clash = parse_protobuf(
            "package demo;\nservice S {\n  rpc A(Req) returns (Rep) = 7;\n  rpc B(Req) returns (Rep) = 7;\n}\n",
            &ids,
        )
        .expect("valid source");
        let err = check_repeated_definitions(&mut clash, &ids).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E205));
    }
}
