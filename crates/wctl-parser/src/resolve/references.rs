use log::{debug, trace};

use wctl_core::{
    ast::{
        CustomType, EnumPath, EnumRef, Message, MessagePath, MessageRef, Program, ProgramId,
        ProgramLookup, TypeRef,
    },
    span::Span,
};

use crate::error::{Diagnostic, ErrorCode, Result};

/// Bind every custom type of program `id` to the message or enum it names.
///
/// Imports must already be linked. Types that are already bound are left
/// alone, so running the pass again is harmless.
pub fn fix_references(id: ProgramId, lookup: &dyn ProgramLookup) -> Result<()> {
    let Some(program) = lookup.program(id) else {
        return Err(Diagnostic::error(format!("program {id} is not loaded")));
    };
    let resolver = Resolver {
        id,
        program,
        lookup,
    };

    for service in &program.services {
        for method in &service.methods {
            let trail = format!("method `{}.{}`", service.name.inner(), method.name.inner());
            for (role, message) in [("request", &method.request), ("reply", &method.reply)] {
                let Some(message) = message else { continue };
                if message.protobuf {
                    resolver.fix_protobuf_stub(message, &format!("{role} of {trail}"))?;
                } else {
                    resolver.fix_message(message, None, &format!("{role} of {trail}"))?;
                }
            }
        }
    }

    for (index, message) in program.messages.iter().enumerate() {
        resolver.fix_tree(message, MessagePath::root(index))?;
    }

    debug!(file = program.file.as_str(); "Fixed references");
    Ok(())
}

struct Resolver<'a> {
    id: ProgramId,
    program: &'a Program,
    lookup: &'a dyn ProgramLookup,
}

impl Resolver<'_> {
    fn fix_tree(&self, message: &Message, path: MessagePath) -> Result<()> {
        self.fix_message(
            message,
            Some(&path),
            &format!("message `{}`", message.name.inner()),
        )?;
        for (index, sub) in message.messages.iter().enumerate() {
            self.fix_tree(sub, path.child(index))?;
        }
        Ok(())
    }

    /// Resolve the field types of `message`. `path` locates the message in
    /// the program when its nested types may shadow program-level ones.
    fn fix_message(
        &self,
        message: &Message,
        path: Option<&MessagePath>,
        trail: &str,
    ) -> Result<()> {
        for field in &message.fields {
            let Some(custom) = field.ty.custom() else {
                continue;
            };
            if custom.target().is_some() {
                continue;
            }

            let local = path.and_then(|path| self.local(message, path, custom.name()));
            let target = match local {
                Some(target) => Some(target),
                None => self.resolve(custom),
            };
            match target {
                Some(target) => {
                    trace!(name = custom.name(), field = field.name.inner().as_str(); "Bound type");
                    custom.bind(target);
                }
                None => {
                    return Err(unresolved(
                        ErrorCode::E300,
                        custom.name(),
                        custom.span(),
                        &format!("field `{}` of {trail}", field.name.inner()),
                    ));
                }
            }
        }
        Ok(())
    }

    /// A message or enum declared inside `message` itself.
    fn local(&self, message: &Message, path: &MessagePath, name: &str) -> Option<TypeRef> {
        if let Some((index, _)) = message.sub_message(name) {
            return Some(self.message_ref(self.id, path.child(index)));
        }
        let (index, _) = message.sub_enum(name)?;
        Some(TypeRef::Enum(EnumRef {
            program: self.id,
            path: EnumPath {
                owner: Some(path.clone()),
                index,
            },
        }))
    }

    fn resolve(&self, custom: &CustomType) -> Option<TypeRef> {
        let Some((reference, name)) = custom.qualified() else {
            return self.find_in(self.id, self.program, custom.name());
        };

        match self.imported(reference) {
            Some(ids) => ids.iter().find_map(|id| {
                let imported = self.lookup.program(*id)?;
                self.find_in(*id, imported, name)
            }),
            // A protobuf file may qualify its own types with its package.
            None if reference == self.program.package_name() => {
                self.find_in(self.id, self.program, name)
            }
            None => None,
        }
    }

    fn imported(&self, reference: &str) -> Option<&[ProgramId]> {
        self.program
            .references()
            .and_then(|references| references.get(reference))
            .map(Vec::as_slice)
    }

    /// Look `name` up among the program-level (and hoisted) types of a
    /// program.
    fn find_in(&self, id: ProgramId, program: &Program, name: &str) -> Option<TypeRef> {
        if let Some(path) = program.symbols.messages.get(name) {
            return Some(self.message_ref(id, path.clone()));
        }
        program.symbols.enums.get(name).map(|path| {
            TypeRef::Enum(EnumRef {
                program: id,
                path: path.clone(),
            })
        })
    }

    fn message_ref(&self, program: ProgramId, path: MessagePath) -> TypeRef {
        TypeRef::Message(MessageRef { program, path })
    }

    /// Bind a bare protobuf `rpc` message name to the declared message.
    ///
    /// `pkg.Name` may refer to the program's own package or to any imported
    /// program that declares package `pkg`.
    fn fix_protobuf_stub(&self, stub: &Message, trail: &str) -> Result<()> {
        if stub.alias.get().is_some() {
            return Ok(());
        }
        let name = stub.name.inner();

        let found = match name.rsplit_once('.') {
            None => self.stub_in(self.id, self.program, name),
            Some((package, short)) if package == self.program.package_name() => {
                self.stub_in(self.id, self.program, short)
            }
            Some((package, short)) => self
                .program
                .references()
                .into_iter()
                .flat_map(|references| references.values().flatten())
                .find_map(|id| {
                    let imported = self.lookup.program(*id)?;
                    (imported.package_name() == package)
                        .then(|| self.stub_in(*id, imported, short))
                        .flatten()
                }),
        };

        match found {
            Some(target) => {
                let _ = stub.alias.set(target);
                Ok(())
            }
            None => Err(unresolved(ErrorCode::E301, name, stub.name.span(), trail)),
        }
    }

    fn stub_in(&self, id: ProgramId, program: &Program, name: &str) -> Option<MessageRef> {
        program.symbols.messages.get(name).map(|path| MessageRef {
            program: id,
            path: path.clone(),
        })
    }
}

fn unresolved(code: ErrorCode, name: &str, span: Span, trail: &str) -> Diagnostic {
    Diagnostic::error(format!("unresolved type `{name}` in {trail}"))
        .with_code(code)
        .with_label(span, "not found")
        .with_help("declare the type, or import the file that declares it and qualify the name")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ParseConfig, parse_native, parse_protobuf,
        resolve::{check_imports, check_repeated_definitions, link_imports},
    };

    /// Run every pass over `sources`, where each file imports by index into
    /// the list. Returns the arena.
    fn analyse(
        sources: &[(&str, &str)],
        native: bool,
    ) -> std::result::Result<Vec<Program>, Diagnostic> {
        let config = ParseConfig::default();
        let mut arena = Vec::new();
        for (file, source) in sources {
            let mut program = if native {
                parse_native(source, &config)
            } else {
                parse_protobuf(source, &config)
            }
            .expect("valid source");
            program.file = file.to_string();
            check_imports(&program)?;
            check_repeated_definitions(&mut program, &config)?;
            arena.push(program);
        }
        for program in &arena {
            for import in &program.imports {
                let position = sources.iter().position(|(file, _)| file == import.file.inner());
                if let Some(index) = position {
                    import.bind(ProgramId::new(index));
                }
            }
        }
        for (index, program) in arena.iter().enumerate() {
            link_imports(program, &arena)?;
            fix_references(ProgramId::new(index), &arena)?;
        }
        Ok(arena)
    }

    fn target(program: &Program, message: usize, field: usize) -> Option<TypeRef> {
        program.messages[message].fields[field]
            .ty
            .custom()
            .and_then(|custom| custom.target().cloned())
    }

    #[test]
    fn test_local_and_nested_types() {
        let arena = analyse(
            &[(
                "x1",
                "package x1\nenum color { red }\nmessage m1 {\n  message inner {}\n  inner a = 1\n  color b = 2\n  repeated m1 c = 3\n  map<int32, inner> d = 4\n}\n",
            )],
            true,
        )
        .expect("resolves");
        let id = ProgramId::new(0);
        let inner = TypeRef::Message(MessageRef {
            program: id,
            path: MessagePath::root(0).child(0),
        });

        assert_eq!(target(&arena[0], 0, 0), Some(inner.clone()));
        assert!(matches!(target(&arena[0], 0, 1), Some(TypeRef::Enum(_))));
        assert_eq!(
            target(&arena[0], 0, 2),
            Some(TypeRef::Message(MessageRef {
                program: id,
                path: MessagePath::root(0),
            }))
        );
        assert_eq!(target(&arena[0], 0, 3), Some(inner));
    }

    #[test]
    fn test_nested_type_shadows_program_type() {
        let arena = analyse(
            &[(
                "x1",
                "package x1\nmessage outer {\n  enum kind { a }\n  kind k = 1\n}\nmessage other { enum kind2 { b } }\n",
            )],
            true,
        )
        .expect("resolves");
        assert_eq!(
            target(&arena[0], 0, 0),
            Some(TypeRef::Enum(EnumRef {
                program: ProgramId::new(0),
                path: EnumPath {
                    owner: Some(MessagePath::root(0)),
                    index: 0,
                },
            }))
        );
    }

    #[test]
    fn test_cross_package_reference() {
        let arena = analyse(
            &[
                ("x1", "package x1\nimport abc \"abc_file\"\nmessage m2 { abc.abc f2 = 1 }\n"),
                ("abc_file", "package abc\nmessage abc { int32 id = 1 }\n"),
            ],
            true,
        )
        .expect("resolves");
        let expected = MessageRef {
            program: ProgramId::new(1),
            path: MessagePath::root(0),
        };
        assert_eq!(target(&arena[0], 0, 0), Some(TypeRef::Message(expected.clone())));
        assert_eq!(
            arena.message(&expected).map(|m| m.name.inner().as_str()),
            Some("abc")
        );
    }

    #[test]
    fn test_unresolved_type() {
        let err = analyse(&[("x1", "package x1\nmessage m1 { m3 a = 1 }\n")], true).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E300));
        assert!(err.message().contains("`m3`"));
        assert!(err.message().contains("message `m1`"));

        let err = analyse(
            &[("x1", "package x1\nmessage m1 { abc.m3 a = 1 }\n")],
            true,
        )
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E300));
    }

    #[test]
    fn test_method_messages() {
        let arena = analyse(
            &[("x1", "package x1\nmessage m1 {}\nservice s1 { get(m1) m1\n ping() void }\n")],
            true,
        )
        .expect("resolves");
        let get = &arena[0].services[0].methods[0];
        let request = get.request.as_ref().expect("request");
        assert!(request.fields[0].ty.custom().and_then(CustomType::target).is_some());

        let err = analyse(
            &[("x1", "package x1\nservice s1 { get(m9) void }\n")],
            true,
        )
        .unwrap_err();
        assert!(err.message().contains("request of method `s1.get`"));
    }

    #[test]
    fn test_cyclic_imports_resolve() {
        let arena = analyse(
            &[
                ("a", "package a\nimport \"b\"\nmessage ma { b.mb peer = 1 }\n"),
                ("b", "package b\nimport \"a\"\nmessage mb { a.ma peer = 1 }\n"),
            ],
            true,
        )
        .expect("resolves");
        assert!(target(&arena[0], 0, 0).is_some());
        assert!(target(&arena[1], 0, 0).is_some());
    }

    #[test]
    fn test_protobuf_own_package_and_stubs() {
        let arena = analyse(
            &[(
                "svc.proto",
                "syntax = \"proto3\";\npackage demo;\nmessage Req { demo.Rep back = 1; }\nmessage Rep {}\nservice S { rpc Call(Req) returns (demo.Rep); }\n",
            )],
            false,
        )
        .expect("resolves");
        let call = &arena[0].services[0].methods[0];
        let request = call.request.as_ref().expect("request");
        let reply = call.reply.as_ref().expect("reply");
        assert_eq!(request.alias.get().map(|m| m.path.clone()), Some(MessagePath::root(0)));
        assert_eq!(reply.alias.get().map(|m| m.path.clone()), Some(MessagePath::root(1)));
        assert!(target(&arena[0], 0, 0).is_some());
    }

    #[test]
    fn test_protobuf_stub_unresolved() {
        let err = analyse(
            &[(
                "svc.proto",
                "package demo;\nservice S { rpc Call(Missing) returns (Missing); }\n",
            )],
            false,
        )
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E301));
    }

    #[test]
    fn test_fix_is_idempotent() {
        let arena = analyse(&[("x1", "package x1\nmessage m1 { m1 a = 1 }\n")], true)
            .expect("resolves");
        let before = target(&arena[0], 0, 0);
        fix_references(ProgramId::new(0), &arena).expect("second run");
        assert_eq!(target(&arena[0], 0, 0), before);
    }
}
