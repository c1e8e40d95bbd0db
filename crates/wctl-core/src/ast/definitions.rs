use std::cell::OnceCell;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    ast::{Doc, FieldType, MessageRef, OptionDecl},
    checker::UniqueChecker,
    span::Spanned,
};

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: Spanned<String>,
    pub value: i64,
    pub doc: Doc,
}

/// An enum definition with its values in declaration order.
#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: Spanned<String>,
    pub doc: Doc,
    pub values: Vec<EnumValue>,
    pub options: Vec<OptionDecl>,
    /// Value names and numbers defined so far.
    pub checker: UniqueChecker,
}

impl EnumDef {
    pub fn new(name: Spanned<String>) -> Self {
        Self {
            name,
            doc: Doc::default(),
            values: Vec::new(),
            options: Vec::new(),
            checker: UniqueChecker::new(),
        }
    }

    /// Append a value. Without an explicit number the value continues from
    /// the previous one, starting at 0.
    pub fn push_value(&mut self, name: Spanned<String>, value: Option<i64>, doc: Doc) {
        let value = value.unwrap_or_else(|| {
            self.values
                .last()
                .map_or(0, |last| last.value.wrapping_add(1))
        });
        self.values.push(EnumValue { name, value, doc });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Spanned<String>,
    pub tag: Spanned<i64>,
    pub ty: FieldType,
    pub options: Vec<OptionDecl>,
    pub doc: Doc,
}

/// A message definition.
///
/// `protobuf` marks a request/reply written as a bare message name in a
/// protobuf `rpc` signature. Such a message has no fields of its own; its
/// `alias` is bound to the declared message during reference resolution.
#[derive(Debug, Clone)]
pub struct Message {
    pub name: Spanned<String>,
    pub doc: Doc,
    pub fields: Vec<Field>,
    pub messages: Vec<Message>,
    pub enums: Vec<EnumDef>,
    pub options: Vec<OptionDecl>,
    pub protobuf: bool,
    /// Field names and tags defined so far.
    pub checker: UniqueChecker,
    pub alias: OnceCell<MessageRef>,
}

impl Message {
    pub fn new(name: Spanned<String>) -> Self {
        Self {
            name,
            doc: Doc::default(),
            fields: Vec::new(),
            messages: Vec::new(),
            enums: Vec::new(),
            options: Vec::new(),
            protobuf: false,
            checker: UniqueChecker::new(),
            alias: OnceCell::new(),
        }
    }

    /// A message standing for `name` in a protobuf `rpc` signature.
    pub fn protobuf_stub(name: Spanned<String>) -> Self {
        Self {
            protobuf: true,
            ..Self::new(name)
        }
    }

    pub fn sub_message(&self, name: &str) -> Option<(usize, &Message)> {
        self.messages
            .iter()
            .enumerate()
            .find(|(_, message)| message.name.inner() == name)
    }

    pub fn sub_enum(&self, name: &str) -> Option<(usize, &EnumDef)> {
        self.enums
            .iter()
            .enumerate()
            .find(|(_, def)| def.name.inner() == name)
    }
}

/// How a method is dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallMode {
    #[default]
    Call,
    Notify,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: Spanned<String>,
    pub doc: Doc,
    pub request: Option<Message>,
    pub reply: Option<Message>,
    /// Only kept when ID-based dispatch is enabled.
    pub id: Option<Spanned<i64>>,
    pub mode: CallMode,
    pub options: Vec<OptionDecl>,
}

impl Method {
    pub fn new(name: Spanned<String>) -> Self {
        Self {
            name,
            doc: Doc::default(),
            request: None,
            reply: None,
            id: None,
            mode: CallMode::default(),
            options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: Spanned<String>,
    pub doc: Doc,
    pub methods: Vec<Method>,
    pub options: Vec<OptionDecl>,
    /// Method names and ids defined so far.
    pub checker: UniqueChecker,
}

impl Service {
    pub fn new(name: Spanned<String>) -> Self {
        Self {
            name,
            doc: Doc::default(),
            methods: Vec::new(),
            options: Vec::new(),
            checker: UniqueChecker::new(),
        }
    }
}

/// One `area:` block of a project. The unnamed default area is `""`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectArea {
    pub name: Spanned<String>,
    pub options: Vec<OptionDecl>,
}

/// Deployment configuration, unrelated to the wire schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: Spanned<String>,
    pub doc: Doc,
    pub areas: IndexMap<String, ProjectArea>,
}

impl Project {
    pub fn new(name: Spanned<String>) -> Self {
        Self {
            name,
            doc: Doc::default(),
            areas: IndexMap::new(),
        }
    }

    /// The area called `name`, created on first use. Re-opening an area
    /// continues its option list.
    pub fn area_mut(&mut self, name: Spanned<String>) -> &mut ProjectArea {
        self.areas
            .entry(name.inner().clone())
            .or_insert_with(|| ProjectArea {
                name,
                options: Vec::new(),
            })
    }
}
