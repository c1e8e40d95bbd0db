//! The built-in `toproto` generator: each program rendered as a proto3 file.
//!
//! Only what protobuf messages can express is written: the package, the
//! `go_package` option taken from `proto.gopkg`, imports, enums and messages
//! with their nested types. Services and projects are left out. Encoding
//! hints recorded by the `.proto` parser (`proto.signed`, `proto.fixed`)
//! select the matching protobuf scalar again.

use std::path::Path;

use log::warn;

use wctl_core::{
    ast::{BaseType, Program, ProgramLookup},
    desc::{DocDesc, EnumDesc, FieldDesc, FieldKind, FileDesc, MsgDesc, OptionValueDesc},
};

use crate::{
    WctlError,
    generator::{Generator, Output},
};

const GO_PACKAGE: &str = "proto.gopkg";
const SIGNED: &str = "proto.signed";
const FIXED: &str = "proto.fixed";
const INDENT: &str = "  ";

#[derive(Debug, Default)]
pub struct ToProto;

impl ToProto {
    pub const UNION: &'static str = "toproto";
}

impl Generator for ToProto {
    fn union(&self) -> &str {
        Self::UNION
    }

    fn generate(
        &self,
        program: &Program,
        lookup: &dyn ProgramLookup,
    ) -> Result<Vec<Output>, WctlError> {
        let desc = program.file_desc(lookup);
        if !desc.options.contains_key(GO_PACKAGE) {
            warn!(file = desc.file.as_str(); "No `proto.gopkg` option, `go_package` left out");
        }
        Ok(vec![Output::new(proto_file(&desc.file), render(desc))])
    }
}

/// `dir/user.wproto` becomes `dir/user.proto`.
fn proto_file(file: &str) -> String {
    Path::new(file)
        .with_extension("proto")
        .to_string_lossy()
        .into_owned()
}

fn render(desc: &FileDesc) -> String {
    let mut out = ProtoWriter::default();
    out.line("// Code generated by wctl. DO NOT EDIT.");
    out.line(&format!("// source: {}", desc.file));
    out.line("");
    out.line("syntax = \"proto3\";");
    out.line("");
    out.doc(desc.package.doc.as_ref());
    out.line(&format!("package {};", desc.package.package));
    if let Some(OptionValueDesc::Str(package)) = desc.options.get(GO_PACKAGE) {
        out.line(&format!("option go_package = {package:?};"));
    }

    if !desc.imports.is_empty() {
        out.line("");
    }
    for import in &desc.imports {
        out.doc(import.doc.as_ref());
        out.line(&format!("import \"{}\";", proto_file(&import.file)));
    }

    for def in &desc.enums {
        out.line("");
        out.enum_def(def);
    }
    for message in &desc.messages {
        out.line("");
        out.message(message);
    }
    out.text
}

#[derive(Default)]
struct ProtoWriter {
    text: String,
    depth: usize,
}

impl ProtoWriter {
    fn line(&mut self, line: &str) {
        if !line.is_empty() {
            self.text.push_str(&INDENT.repeat(self.depth));
            self.text.push_str(line);
        }
        self.text.push('\n');
    }

    fn doc(&mut self, doc: Option<&DocDesc>) {
        for line in doc.iter().flat_map(|doc| &doc.doc) {
            self.line(line);
        }
    }

    fn open(&mut self, header: &str) {
        self.line(&format!("{header} {{"));
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    fn enum_def(&mut self, def: &EnumDesc) {
        self.doc(def.doc.as_ref());
        self.open(&format!("enum {}", def.name));
        for value in &def.values {
            self.doc(value.doc.as_ref());
            self.line(&format!("{} = {};", value.name, value.value));
        }
        self.close();
    }

    fn message(&mut self, message: &MsgDesc) {
        self.doc(message.doc.as_ref());
        self.open(&format!("message {}", message.name));
        for def in &message.sub_enums {
            self.enum_def(def);
        }
        for sub in &message.sub_msgs {
            self.message(sub);
        }
        for field in &message.fields {
            self.doc(field.doc.as_ref());
            self.line(&format!("{} {} = {};", type_name(field), field.name, field.no));
        }
        self.close();
    }
}

fn type_name(field: &FieldDesc) -> String {
    let ty = &field.ty;
    let elem = |base: Option<BaseType>, name: &str| match base {
        Some(base) => scalar(
            base,
            field.options.contains_key(SIGNED),
            field.options.contains_key(FIXED),
        )
        .to_string(),
        None => name.to_string(),
    };

    match ty.kind {
        FieldKind::Base | FieldKind::Custom => elem(ty.key_base, &ty.key),
        FieldKind::List => format!("repeated {}", elem(ty.key_base, &ty.key)),
        FieldKind::Map => format!(
            "map<{}, {}>",
            elem(ty.key_base, &ty.key),
            elem(ty.value_base, &ty.value)
        ),
    }
}

/// The protobuf scalar for a base type. Narrow integers widen to 32 bits.
fn scalar(base: BaseType, signed: bool, fixed: bool) -> &'static str {
    match base {
        BaseType::Int8 | BaseType::Int16 | BaseType::Int32 => match (signed, fixed) {
            (_, true) => "sfixed32",
            (true, false) => "sint32",
            (false, false) => "int32",
        },
        BaseType::Int64 => match (signed, fixed) {
            (_, true) => "sfixed64",
            (true, false) => "sint64",
            (false, false) => "int64",
        },
        BaseType::Uint8 | BaseType::Uint16 | BaseType::Uint32 if fixed => "fixed32",
        BaseType::Uint8 | BaseType::Uint16 | BaseType::Uint32 => "uint32",
        BaseType::Uint64 if fixed => "fixed64",
        BaseType::Uint64 => "uint64",
        BaseType::String => "string",
        BaseType::Binary => "bytes",
        BaseType::Bool => "bool",
        BaseType::Float32 => "float",
        BaseType::Float64 => "double",
    }
}
