use indexmap::IndexMap;
use log::debug;

use crate::{
    ast::{
        Doc, ElemType, EnumDef, Field, FieldType, Message, MessageRef, Method, OptionDecl,
        OptionValue, Program, ProgramLookup, Project, Service, TypeRef,
    },
    desc::{
        DocDesc, EnumDesc, EnumValueDesc, FieldDesc, FieldKind, FileDesc, ImportDesc,
        MethodDesc, MsgDesc, OptionValueDesc, OptionsDesc, PackageDesc, ProjectDesc,
        ServiceDesc, TypeDesc,
    },
};

/// Builds descriptors, expanding resolved message references in place.
///
/// Messages currently being expanded are tracked so that a message reaching
/// itself (directly or through other messages) is embedded by name only at
/// the point where it recurs.
pub(super) struct Converter<'a> {
    lookup: &'a dyn ProgramLookup,
    expanding: Vec<MessageRef>,
}

impl<'a> Converter<'a> {
    pub(super) fn new(lookup: &'a dyn ProgramLookup) -> Self {
        Self {
            lookup,
            expanding: Vec::new(),
        }
    }

    pub(super) fn file(&mut self, program: &Program) -> FileDesc {
        FileDesc {
            file: program.file.clone(),
            package: PackageDesc {
                package: program.package_name().to_string(),
                doc: doc(&program.package.doc),
            },
            options: options(&program.options),
            imports: program
                .imports
                .iter()
                .map(|import| ImportDesc {
                    alias: import
                        .alias
                        .as_ref()
                        .map(|alias| alias.inner().clone())
                        .unwrap_or_default(),
                    file: import.file.inner().clone(),
                    doc: doc(&import.doc),
                })
                .collect(),
            enums: program.enums.iter().map(enum_desc).collect(),
            messages: program
                .messages
                .iter()
                .map(|message| self.message(message))
                .collect(),
            services: program
                .services
                .iter()
                .map(|service| self.service(service))
                .collect(),
            projects: program.projects.iter().map(project).collect(),
        }
    }

    fn message(&mut self, message: &Message) -> MsgDesc {
        if message.protobuf {
            return self.protobuf_message(message);
        }

        MsgDesc {
            name: message.name.inner().clone(),
            doc: doc(&message.doc),
            options: options(&message.options),
            fields: message.fields.iter().map(|field| self.field(field)).collect(),
            sub_msgs: message
                .messages
                .iter()
                .map(|sub| self.message(sub))
                .collect(),
            sub_enums: message.enums.iter().map(enum_desc).collect(),
        }
    }

    /// A protobuf request/reply is a copy of the message it aliases, under
    /// the name written in the signature.
    fn protobuf_message(&mut self, stub: &Message) -> MsgDesc {
        let lookup = self.lookup;
        let aliased = stub
            .alias
            .get()
            .and_then(|target| Some((target, lookup.message(target)?)));

        let mut desc = match aliased {
            Some((target, message)) if !self.expanding.contains(target) => {
                self.expanding.push(target.clone());
                let desc = self.message(message);
                self.expanding.pop();
                desc
            }
            _ => MsgDesc::default(),
        };
        desc.name = stub.name.inner().clone();
        desc
    }

    fn field(&mut self, field: &Field) -> FieldDesc {
        FieldDesc {
            name: field.name.inner().clone(),
            no: *field.tag.inner(),
            ty: self.type_desc(&field.ty),
            options: options(&field.options),
            doc: doc(&field.doc),
        }
    }

    fn type_desc(&mut self, ty: &FieldType) -> TypeDesc {
        match ty {
            FieldType::Base(base) => TypeDesc {
                kind: FieldKind::Base,
                key: base.name().to_string(),
                key_base: Some(*base),
                ..TypeDesc::default()
            },
            FieldType::Custom(custom) => TypeDesc {
                kind: FieldKind::Custom,
                key: custom.name().to_string(),
                elem_custom: true,
                msg: self.embedded(custom.target()),
                ..TypeDesc::default()
            },
            FieldType::List(ElemType::Base(base)) => TypeDesc {
                kind: FieldKind::List,
                key: base.name().to_string(),
                key_base: Some(*base),
                ..TypeDesc::default()
            },
            FieldType::List(ElemType::Custom(custom)) => TypeDesc {
                kind: FieldKind::List,
                key: custom.name().to_string(),
                elem_custom: true,
                msg: self.embedded(custom.target()),
                ..TypeDesc::default()
            },
            FieldType::Map { key, value } => {
                let mut desc = TypeDesc {
                    kind: FieldKind::Map,
                    key: key.name().to_string(),
                    value: value.name().to_string(),
                    key_base: Some(*key),
                    ..TypeDesc::default()
                };
                match value {
                    ElemType::Base(base) => desc.value_base = Some(*base),
                    ElemType::Custom(custom) => {
                        desc.elem_custom = true;
                        desc.msg = self.embedded(custom.target());
                    }
                }
                desc
            }
        }
    }

    /// Copy of the message a custom type resolved to. Enums and unresolved
    /// references embed nothing.
    fn embedded(&mut self, target: Option<&TypeRef>) -> Option<Box<MsgDesc>> {
        let Some(TypeRef::Message(target)) = target else {
            return None;
        };
        let lookup = self.lookup;
        let message = lookup.message(target)?;

        if self.expanding.contains(target) {
            debug!(message = message.name.inner().as_str(); "Recursive message embedded by name");
            return Some(Box::new(MsgDesc {
                name: message.name.inner().clone(),
                ..MsgDesc::default()
            }));
        }

        self.expanding.push(target.clone());
        let desc = self.message(message);
        self.expanding.pop();
        Some(Box::new(desc))
    }

    fn service(&mut self, service: &Service) -> ServiceDesc {
        ServiceDesc {
            name: service.name.inner().clone(),
            doc: doc(&service.doc),
            options: options(&service.options),
            methods: service
                .methods
                .iter()
                .map(|method| self.method(method))
                .collect(),
        }
    }

    fn method(&mut self, method: &Method) -> MethodDesc {
        MethodDesc {
            name: method.name.inner().clone(),
            doc: doc(&method.doc),
            options: options(&method.options),
            method_id: method.id.as_ref().map(|id| *id.inner()),
            mode: method.mode,
            request: method.request.as_ref().map(|m| self.message(m)),
            reply: method.reply.as_ref().map(|m| self.message(m)),
        }
    }
}

fn doc(doc: &Doc) -> Option<DocDesc> {
    if doc.is_empty() {
        return None;
    }
    Some(DocDesc {
        doc: doc.lines.clone(),
        tail_doc: doc.tail.clone().unwrap_or_default(),
    })
}

fn options(options: &[OptionDecl]) -> OptionsDesc {
    options
        .iter()
        .map(|option| {
            let value = match &option.value {
                None => OptionValueDesc::Empty,
                Some(OptionValue::Int(value)) => OptionValueDesc::Int(*value),
                Some(OptionValue::Str(value)) => OptionValueDesc::Str(value.clone()),
            };
            (option.key.inner().clone(), value)
        })
        .collect()
}

fn enum_desc(def: &EnumDef) -> EnumDesc {
    EnumDesc {
        name: def.name.inner().clone(),
        doc: doc(&def.doc),
        options: options(&def.options),
        values: def
            .values
            .iter()
            .map(|value| EnumValueDesc {
                name: value.name.inner().clone(),
                value: value.value,
                doc: doc(&value.doc),
            })
            .collect(),
    }
}

fn project(project: &Project) -> ProjectDesc {
    ProjectDesc {
        name: project.name.inner().clone(),
        doc: doc(&project.doc),
        conf: project
            .areas
            .iter()
            .map(|(name, area)| (name.clone(), options(&area.options)))
            .collect::<IndexMap<_, _>>(),
    }
}
