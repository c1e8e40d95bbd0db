//! Grammar tests for both schema dialects.
//!
//! These run the lexer, the grammar and doc association together, but none of
//! the resolution passes.

use wctl_core::ast::{BaseType, CallMode, ElemType, FieldType, OptionValue, Program};

use crate::{
    ParseConfig,
    error::{ErrorCode, ParseError},
    parse_native, parse_protobuf,
};

fn native(source: &str) -> Program {
    parse_native(source, &ParseConfig::default())
        .unwrap_or_else(|err| panic!("Expected parsing to succeed, but got error: {err}"))
}

fn native_with_ids(source: &str) -> Program {
    let config = ParseConfig {
        use_method_id: true,
    };
    parse_native(source, &config)
        .unwrap_or_else(|err| panic!("Expected parsing to succeed, but got error: {err}"))
}

fn protobuf(source: &str) -> Program {
    parse_protobuf(source, &ParseConfig::default())
        .unwrap_or_else(|err| panic!("Expected parsing to succeed, but got error: {err}"))
}

fn first_code(result: Result<Program, ParseError>) -> Option<ErrorCode> {
    match result {
        Ok(_) => panic!("Expected parsing to fail, but it succeeded"),
        Err(err) => err.first().and_then(|diagnostic| diagnostic.code()),
    }
}

fn native_error(source: &str) -> Option<ErrorCode> {
    first_code(parse_native(source, &ParseConfig::default()))
}

fn protobuf_error(source: &str) -> Option<ErrorCode> {
    first_code(parse_protobuf(source, &ParseConfig::default()))
}

fn field_type(program: &Program, field: usize) -> &FieldType {
    &program.messages[0].fields[field].ty
}

mod native_declarations {
    use super::*;

    #[test]
    fn test_minimal_program() {
        let program = native("package x1");
        assert_eq!(program.package_name(), "x1");
        assert!(program.messages.is_empty());
    }

    #[test]
    fn test_full_program() {
        let program = native(
            r#"
            package x1;

            import abc "abc_file"
            import "common"
            proto.gopkg = "example.com/x1"

            enum color { red; green = 5; blue }

            message m2 {
                abc.abc f2 = 1
                repeated int32 ids = 2 { json.omit }
                map<string, color> tags = 3
            };

            service s1 {
                get(m2) abc.abc = 1
            }

            project deploy {
                ci.enable
            }
            "#,
        );

        assert_eq!(program.imports.len(), 2);
        assert_eq!(program.imports[0].alias.as_ref().map(|a| a.inner().as_str()), Some("abc"));
        assert_eq!(program.imports[1].file.inner(), "common");
        assert_eq!(program.options[0].key.inner(), "proto.gopkg");
        assert_eq!(program.enums.len(), 1);
        assert_eq!(program.messages[0].fields.len(), 3);
        assert_eq!(program.services[0].methods.len(), 1);
        assert_eq!(program.projects[0].name.inner(), "deploy");
    }

    #[test]
    fn test_missing_package() {
        assert_eq!(native_error("message m1 {}"), Some(ErrorCode::E102));
        assert_eq!(native_error(""), Some(ErrorCode::E102));
    }

    #[test]
    fn test_package_must_be_lowercase() {
        assert_eq!(native_error("package X1"), Some(ErrorCode::E103));
        assert_eq!(native_error("package x1\nmessage Msg {}"), Some(ErrorCode::E103));
    }

    #[test]
    fn test_top_level_options() {
        let program = native("package x1\na.b = \"x\"\nc.d = -3;\ne.f = true\ng.h\n");
        let values: Vec<_> = program.options.iter().map(|o| o.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                Some(OptionValue::Str("x".to_string())),
                Some(OptionValue::Int(-3)),
                Some(OptionValue::Int(1)),
                None,
            ]
        );
    }

    #[test]
    fn test_invalid_option_name() {
        assert_eq!(native_error("package x1\ngopkg = 1\n"), Some(ErrorCode::E104));
        assert_eq!(native_error("package x1\nProto.gopkg = 1\n"), Some(ErrorCode::E104));
    }
}

mod native_enums {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_auto_increment() {
        let program = native("package x1\nenum color { red; green = 5; blue }");
        let values: Vec<_> = program.enums[0]
            .values
            .iter()
            .map(|v| (v.name.inner().as_str(), v.value))
            .collect();
        assert_eq!(values, vec![("red", 0), ("green", 5), ("blue", 6)]);
    }

    #[test]
    fn test_hex_and_negative_values() {
        let program = native("package x1\nenum e { a = 0x10\n b\n c = -1\n d }");
        let values: Vec<_> = program.enums[0].values.iter().map(|v| v.value).collect();
        assert_eq!(values, vec![16, 17, -1, 0]);
    }

    #[test]
    fn test_enum_options() {
        let program = native("package x1\nenum e { a\n go.prefix = \"E\"\n b }");
        assert_eq!(program.enums[0].values.len(), 2);
        assert_eq!(program.enums[0].options[0].key.inner(), "go.prefix");
    }

    #[test]
    fn test_string_value_rejected() {
        assert_eq!(
            native_error("package x1\nenum e { a = \"x\" }"),
            Some(ErrorCode::E109)
        );
    }

    #[test]
    fn test_missing_value_after_equals() {
        let err = parse_native("package x1\nenum e { a = }", &ParseConfig::default())
            .expect_err("incomplete enum value");
        let diagnostic = err.first().expect("one diagnostic");
        assert_eq!(diagnostic.code(), Some(ErrorCode::E100));
        assert_eq!(diagnostic.message(), "expected integer, found `}`");
    }

    proptest! {
        #[test]
        fn omitted_values_follow_previous(
            written in prop::collection::vec(prop::option::of(-1000i64..1000), 1..8)
        ) {
            let body: Vec<_> = written
                .iter()
                .enumerate()
                .map(|(i, value)| match value {
                    Some(value) => format!("v{i} = {value}"),
                    None => format!("v{i}"),
                })
                .collect();
            let program = native(&format!("package x1\nenum e {{\n{}\n}}", body.join("\n")));

            let mut previous: Option<i64> = None;
            for (value, given) in program.enums[0].values.iter().zip(&written) {
                let expected = given.unwrap_or_else(|| previous.map_or(0, |p| p + 1));
                prop_assert_eq!(value.value, expected);
                previous = Some(expected);
            }
        }
    }
}

mod native_messages {
    use super::*;

    #[test]
    fn test_base_types_and_aliases() {
        let program = native(
            "package x1\nmessage m1 {\n bytes a = 1\n []byte b = 2\n double c = 3\n boolean d = 4\n uint16 e = 5\n}",
        );
        let types: Vec<_> = (0..5).map(|i| field_type(&program, i).clone()).collect();
        assert_eq!(
            types,
            vec![
                FieldType::Base(BaseType::Binary),
                FieldType::Base(BaseType::Binary),
                FieldType::Base(BaseType::Float64),
                FieldType::Base(BaseType::Bool),
                FieldType::Base(BaseType::Uint16),
            ]
        );
    }

    #[test]
    fn test_container_types() {
        let program = native(
            "package x1\nmessage m1 {\n repeated int32 a = 1\n map<string, color> b = 2\n repeated abc.abc c = 3\n}",
        );

        assert_eq!(
            field_type(&program, 0),
            &FieldType::List(ElemType::Base(BaseType::Int32))
        );
        match field_type(&program, 1) {
            FieldType::Map { key, value } => {
                assert_eq!(*key, BaseType::String);
                assert_eq!(value.name(), "color");
            }
            other => panic!("Expected map type, got {other}"),
        }
        assert_eq!(field_type(&program, 2).to_string(), "repeated abc.abc");
    }

    #[test]
    fn test_field_options() {
        let program = native("package x1\nmessage m1 { int32 a = 1 { json.omit\n db.index = 2 } }");
        let options = &program.messages[0].fields[0].options;
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].int_value(), Some(2));
    }

    #[test]
    fn test_nested_declarations() {
        let program = native(
            "package x1\nmessage outer {\n message inner { int32 a = 1 }\n enum kind { x }\n inner i = 1\n kind k = 2\n}",
        );
        let outer = &program.messages[0];
        assert_eq!(outer.messages[0].name.inner(), "inner");
        assert_eq!(outer.enums[0].name.inner(), "kind");
        assert_eq!(outer.fields.len(), 2);
    }

    #[test]
    fn test_message_options() {
        let program = native("package x1\nmessage m1 {\n int32 a = 1\n db.table = \"t\"\n}");
        assert_eq!(program.messages[0].options[0].str_value(), Some("t"));
    }

    #[test]
    fn test_invalid_field_types() {
        assert_eq!(native_error("package x1\nmessage m1 { Foo a = 1 }"), Some(ErrorCode::E105));
        assert_eq!(
            native_error("package x1\nmessage m1 { a.b.c a = 1 }"),
            Some(ErrorCode::E105)
        );
    }

    #[test]
    fn test_field_tag_boundary() {
        let config = ParseConfig::default();
        assert!(parse_native("package x1\nmessage m1 { int32 a = 255 }", &config).is_ok());
        assert_eq!(native_error("package x1\nmessage m1 { int32 a = 256 }"), Some(ErrorCode::E106));
        assert_eq!(native_error("package x1\nmessage m1 { int32 a = 0 }"), Some(ErrorCode::E106));
    }

    #[test]
    fn test_map_key_restrictions() {
        let err = parse_native(
            "package x1\nmessage m1 { map<binary, string> a = 1 }",
            &ParseConfig::default(),
        )
        .expect_err("binary key");
        let diagnostic = err.first().expect("one diagnostic");
        assert_eq!(diagnostic.code(), Some(ErrorCode::E107));
        assert_eq!(diagnostic.message(), "map key can't set binary type");

        assert_eq!(
            native_error("package x1\nmessage m1 { map<m2, string> a = 1 }"),
            Some(ErrorCode::E107)
        );
        assert!(
            parse_native(
                "package x1\nmessage m1 { map<int32, string> a = 1 }",
                &ParseConfig::default()
            )
            .is_ok()
        );
    }

    #[test]
    fn test_nested_containers_rejected() {
        assert_eq!(
            native_error("package x1\nmessage m1 { map<string, repeated int32> a = 1 }"),
            Some(ErrorCode::E108)
        );
        assert_eq!(
            native_error("package x1\nmessage m1 { repeated repeated int32 a = 1 }"),
            Some(ErrorCode::E110)
        );
        assert_eq!(
            native_error("package x1\nmessage m1 { repeated map<int32, int32> a = 1 }"),
            Some(ErrorCode::E110)
        );
    }

    #[test]
    fn test_unclosed_message() {
        assert_eq!(native_error("package x1\nmessage m1 {"), Some(ErrorCode::E101));
        assert_eq!(
            native_error("package x1\nmessage m1 { int32 a = 1"),
            Some(ErrorCode::E101)
        );
    }
}

mod native_services {
    use super::*;

    #[test]
    fn test_call_and_notify_modes() {
        let program = native(
            "package x1\nservice s1 {\n a(m1) m2\n notify:\n b(m1) void\n c() void\n call:\n d(m1) void\n}",
        );
        let modes: Vec<_> = program.services[0].methods.iter().map(|m| m.mode).collect();
        assert_eq!(
            modes,
            vec![CallMode::Call, CallMode::Notify, CallMode::Notify, CallMode::Call]
        );
    }

    #[test]
    fn test_synthesized_messages() {
        let program = native("package x1\nservice s1 { get(m1) abc.abc }");
        let method = &program.services[0].methods[0];

        let request = method.request.as_ref().expect("request");
        assert_eq!(request.name.inner(), "m1");
        assert_eq!(request.fields[0].name.inner(), "rq");
        assert_eq!(*request.fields[0].tag.inner(), 1);
        assert!(!request.protobuf);

        let reply = method.reply.as_ref().expect("reply");
        assert_eq!(reply.name.inner(), "abc.abc");
        assert_eq!(reply.fields[0].name.inner(), "rs");
    }

    #[test]
    fn test_void_messages() {
        let program = native("package x1\nservice s1 {\n a() void\n b(void) void\n c(m1) void\n}");
        let methods = &program.services[0].methods;
        assert!(methods[0].request.is_none() && methods[0].reply.is_none());
        assert!(methods[1].request.is_none() && methods[1].reply.is_none());
        assert!(methods[2].request.is_some() && methods[2].reply.is_none());
    }

    #[test]
    fn test_method_ids_follow_config() {
        let source = "package x1\nservice s1 { get(m1) m2 = 3\n put(m1) void = 4 }";

        let without = native(source);
        assert!(without.services[0].methods.iter().all(|m| m.id.is_none()));
        assert!(without.services[0].methods[0].reply.is_some());
        assert!(without.services[0].methods[1].reply.is_none());

        let with = native_with_ids(source);
        let ids: Vec<_> = with.services[0]
            .methods
            .iter()
            .map(|m| m.id.as_ref().map(|id| *id.inner()))
            .collect();
        assert_eq!(ids, vec![Some(3), Some(4)]);
    }

    #[test]
    fn test_method_and_service_options() {
        let program = native(
            "package x1\nservice s1 {\n rpc.prefix = \"S\"\n get(m1) void { http.path = \"/get\" }\n}",
        );
        let service = &program.services[0];
        assert_eq!(service.options[0].key.inner(), "rpc.prefix");
        assert_eq!(service.methods[0].options[0].str_value(), Some("/get"));
    }

    #[test]
    fn test_options_after_methods() {
        let program = native(
            "package x1\nservice s1 {\n get(m1) void\n x.y = 3\n put(m1) m2\n x.z\n}",
        );
        let service = &program.services[0];

        let keys: Vec<_> = service.options.iter().map(|o| o.key.inner().as_str()).collect();
        assert_eq!(keys, vec!["x.y", "x.z"]);
        assert_eq!(service.options[0].int_value(), Some(3));
        assert!(service.methods[0].reply.is_none());
        assert_eq!(
            service.methods[1].reply.as_ref().map(|m| m.name.inner().as_str()),
            Some("m2")
        );
    }

    #[test]
    fn test_reply_required() {
        assert_eq!(native_error("package x1\nservice s1 { get(m1) }"), Some(ErrorCode::E100));
    }

    #[test]
    fn test_base_type_request_rejected() {
        assert_eq!(
            native_error("package x1\nservice s1 { get(int32) void }"),
            Some(ErrorCode::E111)
        );
        assert_eq!(
            native_error("package x1\nservice s1 { get(m1) string }"),
            Some(ErrorCode::E111)
        );
    }

    #[test]
    fn test_unknown_flag() {
        assert_eq!(
            native_error("package x1\nservice s1 { stream:\n a() void }"),
            Some(ErrorCode::E100)
        );
    }
}

mod native_projects {
    use super::*;

    #[test]
    fn test_areas() {
        let program = native(
            "package x1\nproject deploy {\n ci.enable\n prod:\n svc.replicas = 3\n dev:\n svc.replicas = 1\n prod:\n svc.zone = \"eu\"\n}",
        );
        let areas = &program.projects[0].areas;
        let names: Vec<_> = areas.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["", "prod", "dev"]);
        assert_eq!(areas["prod"].options.len(), 2);
        assert_eq!(areas[""].options[0].key.inner(), "ci.enable");
    }

    #[test]
    fn test_area_name_must_be_lowercase() {
        assert_eq!(
            native_error("package x1\nproject p {\n Prod:\n a.b\n}"),
            Some(ErrorCode::E103)
        );
    }
}

mod native_docs {
    use super::*;

    #[test]
    fn test_doc_and_tail_comments() {
        let program = native(
            "// The package.\npackage x1 // tail\n\n// First line.\n// Second line.\nmessage m1 {\n    int32 id = 1 // the id\n}\n",
        );

        assert_eq!(program.package.doc.lines, vec!["// The package."]);
        assert_eq!(program.package.doc.tail.as_deref(), Some("// tail"));
        assert_eq!(
            program.messages[0].doc.lines,
            vec!["// First line.", "// Second line."]
        );
        assert_eq!(
            program.messages[0].fields[0].doc.tail.as_deref(),
            Some("// the id")
        );
    }

    #[test]
    fn test_blank_line_breaks_doc_run() {
        let program = native("package x1\n// detached\n\nmessage m1 {}\n");
        assert!(program.messages[0].doc.lines.is_empty());
    }

    #[test]
    fn test_comment_claimed_once() {
        let program = native("package x1\n// shared\nenum e { a }\n");
        assert_eq!(program.enums[0].doc.lines, vec!["// shared"]);
        assert!(program.enums[0].values[0].doc.lines.is_empty());
    }
}

mod protobuf_files {
    use super::*;

    #[test]
    fn test_syntax_and_package() {
        let program = protobuf("syntax = \"proto3\";\npackage demo.api;\n");
        assert_eq!(program.package_name(), "demo.api");
        assert_eq!(program.options[0].key.inner(), "proto.syntax");
        assert_eq!(program.options[0].int_value(), Some(3));

        let proto2 = protobuf("syntax = \"proto2\";\npackage demo;");
        assert_eq!(proto2.options[0].int_value(), Some(2));

        let bare = protobuf("package demo;");
        assert!(bare.options.is_empty());
    }

    #[test]
    fn test_unsupported_syntax() {
        assert_eq!(
            protobuf_error("syntax = \"proto4\";\npackage demo;"),
            Some(ErrorCode::E112)
        );
    }

    #[test]
    fn test_missing_package() {
        assert_eq!(protobuf_error("syntax = \"proto3\";\nmessage A {}"), Some(ErrorCode::E102));
    }

    #[test]
    fn test_options_and_imports() {
        let program = protobuf(
            "package demo;\nimport \"other.proto\";\noption go_package = \"example.com/demo\";\noption java_package = \"com.demo\";\n",
        );
        assert_eq!(program.imports[0].file.inner(), "other.proto");
        assert_eq!(program.options[0].key.inner(), "proto.gopkg");
        assert_eq!(program.options[0].str_value(), Some("example.com/demo"));
        assert_eq!(program.options[1].key.inner(), "java_package");
    }

    #[test]
    fn test_scalar_mapping() {
        let program = protobuf(
            "package demo;\nmessage A {\n  sint32 a = 1;\n  fixed64 b = 2;\n  sfixed64 c = 3;\n  bytes d = 4;\n  float e = 5;\n  string f = 6;\n}",
        );
        let fields = &program.messages[0].fields;
        let keys = |i: usize| {
            fields[i]
                .options
                .iter()
                .map(|o| o.key.inner().as_str())
                .collect::<Vec<_>>()
        };

        assert_eq!(fields[0].ty, FieldType::Base(BaseType::Int32));
        assert_eq!(keys(0), vec!["proto.signed"]);
        assert_eq!(fields[1].ty, FieldType::Base(BaseType::Uint64));
        assert_eq!(keys(1), vec!["proto.fixed"]);
        assert_eq!(fields[2].ty, FieldType::Base(BaseType::Int64));
        assert_eq!(keys(2), vec!["proto.signed", "proto.fixed"]);
        assert_eq!(fields[3].ty, FieldType::Base(BaseType::Binary));
        assert_eq!(fields[4].ty, FieldType::Base(BaseType::Float32));
        assert!(fields[5].options.is_empty());
    }

    #[test]
    fn test_message_bodies() {
        let program = protobuf(
            "package demo;\nmessage A {\n  option (db.table) = \"a\";\n  repeated B items = 1;\n  map<string, int64> counts = 2;\n  optional string note = 3 [deprecated = true];\n  message B { int32 x = 1; }\n  enum Kind { K_NONE = 0; K_ONE = 0x1; }\n}",
        );
        let message = &program.messages[0];

        assert_eq!(message.options[0].key.inner(), "db.table");
        assert_eq!(message.fields[0].ty.to_string(), "repeated B");
        assert_eq!(
            message.fields[1].ty,
            FieldType::Map {
                key: BaseType::String,
                value: ElemType::Base(BaseType::Int64),
            }
        );
        assert_eq!(message.fields[2].options[0].key.inner(), "deprecated");
        assert_eq!(message.messages[0].name.inner(), "B");
        assert_eq!(message.enums[0].values[1].value, 1);
    }

    #[test]
    fn test_services() {
        let program = protobuf(
            "package demo;\nservice Greeter {\n  option (svc.name) = \"g\";\n  rpc Hello(HelloRequest) returns (HelloReply) {}\n  rpc Bye(other.Req) returns (other.Rep);\n}",
        );
        let service = &program.services[0];
        assert_eq!(service.options.len(), 1);

        let hello = &service.methods[0];
        let request = hello.request.as_ref().expect("request");
        assert!(request.protobuf);
        assert_eq!(request.name.inner(), "HelloRequest");
        assert!(request.fields.is_empty());
        assert_eq!(
            service.methods[1].reply.as_ref().map(|m| m.name.inner().as_str()),
            Some("other.Rep")
        );
    }

    #[test]
    fn test_rpc_ids_follow_config() {
        let source = "package demo;\nservice S {\n  rpc Call(Req) returns (Rep) = 3;\n  rpc Ping(Req) returns (Rep) = 4 {}\n}";

        let without = protobuf(source);
        assert!(without.services[0].methods.iter().all(|m| m.id.is_none()));

        let with = parse_protobuf(
            source,
            &ParseConfig {
                use_method_id: true,
            },
        )
        .expect("Failed to parse protobuf source");
        let ids: Vec<_> = with.services[0]
            .methods
            .iter()
            .map(|m| m.id.as_ref().map(|id| *id.inner()))
            .collect();
        assert_eq!(ids, vec![Some(3), Some(4)]);
    }

    #[test]
    fn test_enum_value_options_rejected() {
        assert_eq!(
            protobuf_error("package demo;\nenum Kind {\n  K_NONE = 0 [deprecated = true];\n}"),
            Some(ErrorCode::E109)
        );
    }

    #[test]
    fn test_streaming_rejected() {
        assert_eq!(
            protobuf_error("package demo;\nservice S { rpc A(stream Req) returns (Rep); }"),
            Some(ErrorCode::E111)
        );
    }

    #[test]
    fn test_unknown_top_level() {
        assert_eq!(protobuf_error("package demo;\nextend Foo {}"), Some(ErrorCode::E100));
    }
}
