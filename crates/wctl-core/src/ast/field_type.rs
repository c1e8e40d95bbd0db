use std::{cell::OnceCell, fmt};

use serde::{Deserialize, Serialize};

use crate::{ast::TypeRef, span::Span, span::Spanned};

/// The fixed set of scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    String,
    Binary,
    Bool,
    Float32,
    Float64,
}

impl BaseType {
    pub const ALL: [BaseType; 13] = [
        BaseType::Int8,
        BaseType::Int16,
        BaseType::Int32,
        BaseType::Int64,
        BaseType::Uint8,
        BaseType::Uint16,
        BaseType::Uint32,
        BaseType::Uint64,
        BaseType::String,
        BaseType::Binary,
        BaseType::Bool,
        BaseType::Float32,
        BaseType::Float64,
    ];

    /// The canonical spelling.
    pub fn name(self) -> &'static str {
        match self {
            BaseType::Int8 => "int8",
            BaseType::Int16 => "int16",
            BaseType::Int32 => "int32",
            BaseType::Int64 => "int64",
            BaseType::Uint8 => "uint8",
            BaseType::Uint16 => "uint16",
            BaseType::Uint32 => "uint32",
            BaseType::Uint64 => "uint64",
            BaseType::String => "string",
            BaseType::Binary => "binary",
            BaseType::Bool => "bool",
            BaseType::Float32 => "float32",
            BaseType::Float64 => "float64",
        }
    }

    /// Look up a base type by its canonical name or one of its aliases
    /// (`bytes`, `[]byte`, `float`, `double`, `boolean`).
    pub fn from_name(name: &str) -> Option<Self> {
        let base = match name {
            "bytes" | "[]byte" => BaseType::Binary,
            "float" => BaseType::Float32,
            "double" => BaseType::Float64,
            "boolean" => BaseType::Bool,
            _ => return Self::ALL.into_iter().find(|base| base.name() == name),
        };
        Some(base)
    }

    /// Whether the type may be used as a map key.
    pub fn is_map_key(self) -> bool {
        self != BaseType::Binary
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A by-name reference to a message or enum.
///
/// The name is either `Type` or `ref.Type`. Reference resolution binds the
/// target exactly once; until then [`CustomType::target`] is `None`.
#[derive(Debug, Clone)]
pub struct CustomType {
    name: Spanned<String>,
    target: OnceCell<TypeRef>,
}

impl CustomType {
    pub fn new(name: Spanned<String>) -> Self {
        Self {
            name,
            target: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.inner()
    }

    pub fn span(&self) -> Span {
        self.name.span()
    }

    /// Split a qualified name at its last dot into the reference and type
    /// parts. A protobuf reference may itself be a dotted package name.
    pub fn qualified(&self) -> Option<(&str, &str)> {
        self.name.rsplit_once('.')
    }

    pub fn target(&self) -> Option<&TypeRef> {
        self.target.get()
    }

    /// Link the reference to its target. Returns `false` if it was already
    /// linked, leaving the first target in place.
    pub fn bind(&self, target: TypeRef) -> bool {
        self.target.set(target).is_ok()
    }
}

impl PartialEq for CustomType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Element type of a list, or value type of a map.
#[derive(Debug, Clone, PartialEq)]
pub enum ElemType {
    Base(BaseType),
    Custom(CustomType),
}

impl ElemType {
    pub fn name(&self) -> &str {
        match self {
            ElemType::Base(base) => base.name(),
            ElemType::Custom(custom) => custom.name(),
        }
    }
}

/// The type of a field. Containers cannot nest.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Base(BaseType),
    Custom(CustomType),
    List(ElemType),
    Map { key: BaseType, value: ElemType },
}

impl FieldType {
    /// The custom type this field depends on, wherever it sits.
    pub fn custom(&self) -> Option<&CustomType> {
        match self {
            FieldType::Custom(custom)
            | FieldType::List(ElemType::Custom(custom))
            | FieldType::Map {
                value: ElemType::Custom(custom),
                ..
            } => Some(custom),
            _ => None,
        }
    }
}

impl From<ElemType> for FieldType {
    fn from(elem: ElemType) -> Self {
        match elem {
            ElemType::Base(base) => FieldType::Base(base),
            ElemType::Custom(custom) => FieldType::Custom(custom),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Base(base) => write!(f, "{base}"),
            FieldType::Custom(custom) => f.write_str(custom.name()),
            FieldType::List(elem) => write!(f, "repeated {}", elem.name()),
            FieldType::Map { key, value } => write!(f, "map<{key}, {}>", value.name()),
        }
    }
}
