//! Generator-neutral descriptors of analysed programs.
//!
//! A [`FileDesc`] is a flat, owned copy of one resolved [`Program`]: options
//! collapse into ordered maps, and every resolved custom type embeds a copy
//! of the message it names, so consumers never have to resolve names
//! themselves. Descriptors are the payload handed to generator plugins and
//! are therefore plain serde data.
//!
//! Conversion is memoized on the program: [`Program::file_desc`] builds the
//! descriptor once and returns the cached value on every later call.

mod convert;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ast::{BaseType, CallMode, Program, ProgramLookup};

pub type OptionsDesc = IndexMap<String, OptionValueDesc>;

/// Option value as seen by generators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionValueDesc {
    /// A bare `key` without a value.
    #[default]
    Empty,
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocDesc {
    pub doc: Vec<String>,
    pub tail_doc: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDesc {
    pub file: String,
    pub package: PackageDesc,
    pub options: OptionsDesc,
    pub imports: Vec<ImportDesc>,
    pub enums: Vec<EnumDesc>,
    pub messages: Vec<MsgDesc>,
    pub services: Vec<ServiceDesc>,
    pub projects: Vec<ProjectDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDesc {
    pub package: String,
    pub doc: Option<DocDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDesc {
    /// Empty when the import has no alias.
    pub alias: String,
    pub file: String,
    pub doc: Option<DocDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDesc {
    pub name: String,
    pub doc: Option<DocDesc>,
    pub options: OptionsDesc,
    pub values: Vec<EnumValueDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueDesc {
    pub name: String,
    pub value: i64,
    pub doc: Option<DocDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MsgDesc {
    pub name: String,
    pub doc: Option<DocDesc>,
    pub options: OptionsDesc,
    pub fields: Vec<FieldDesc>,
    pub sub_msgs: Vec<MsgDesc>,
    pub sub_enums: Vec<EnumDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDesc {
    pub name: String,
    pub no: i64,
    pub ty: TypeDesc,
    pub options: OptionsDesc,
    pub doc: Option<DocDesc>,
}

/// Shape of a field type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    #[default]
    Base,
    Custom,
    List,
    Map,
}

/// A field type flattened for generators.
///
/// `key` names the base type, the custom type, the list element or the map
/// key; `value` names the map value. `msg` embeds the resolved message when
/// the (element or value) type is a custom message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDesc {
    pub kind: FieldKind,
    pub key: String,
    pub value: String,
    pub key_base: Option<BaseType>,
    pub value_base: Option<BaseType>,
    pub elem_custom: bool,
    pub msg: Option<Box<MsgDesc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDesc {
    pub name: String,
    pub doc: Option<DocDesc>,
    pub options: OptionsDesc,
    pub methods: Vec<MethodDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodDesc {
    pub name: String,
    pub doc: Option<DocDesc>,
    pub options: OptionsDesc,
    pub method_id: Option<i64>,
    pub mode: CallMode,
    pub request: Option<MsgDesc>,
    pub reply: Option<MsgDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDesc {
    pub name: String,
    pub doc: Option<DocDesc>,
    /// Options per area; the default area is `""`.
    pub conf: IndexMap<String, OptionsDesc>,
}

impl Program {
    /// The descriptor of this program, built on first use.
    ///
    /// `lookup` must contain every program reachable through this program's
    /// resolved references.
    pub fn file_desc(&self, lookup: &dyn ProgramLookup) -> &FileDesc {
        self.desc
            .get_or_init(|| convert::Converter::new(lookup).file(self))
    }

    /// Whether the descriptor has already been built.
    pub fn has_file_desc(&self) -> bool {
        self.desc.get().is_some()
    }

    /// The descriptors of this program and of every program it imports,
    /// transitively, keyed by file name. This program comes first.
    pub fn file_desc_with_imports(
        &self,
        lookup: &dyn ProgramLookup,
    ) -> IndexMap<String, FileDesc> {
        let mut descs = IndexMap::new();
        let mut pending = vec![self];

        while let Some(program) = pending.pop() {
            if descs.contains_key(&program.file) {
                continue;
            }
            descs.insert(program.file.clone(), program.file_desc(lookup).clone());
            pending.extend(
                program
                    .imports
                    .iter()
                    .rev()
                    .filter_map(|import| import.target())
                    .filter_map(|id| lookup.program(id)),
            );
        }
        descs
    }
}
