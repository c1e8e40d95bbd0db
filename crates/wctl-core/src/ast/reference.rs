//! Handles used to link resolved references between programs.
//!
//! Programs live in an arena owned by the caller (the warehouse). A resolved
//! custom type stores a [`TypeRef`] pointing into that arena instead of a
//! pointer to the target node, so programs stay plain owned trees.

use std::fmt;

use crate::ast::{EnumDef, Message, Program};

/// Index of a program in its owning arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProgramId(usize);

impl ProgramId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Location of a message inside one program: the index among the top-level
/// messages followed by one index per level of nesting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessagePath(Vec<usize>);

impl MessagePath {
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    /// The path of the `index`-th sub-message of this message.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

/// Location of an enum: top level, or nested in a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumPath {
    pub owner: Option<MessagePath>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub program: ProgramId,
    pub path: MessagePath,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumRef {
    pub program: ProgramId,
    pub path: EnumPath,
}

/// The resolved target of a custom type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Message(MessageRef),
    Enum(EnumRef),
}

/// Read access to analysed programs by id.
pub trait ProgramLookup {
    fn program(&self, id: ProgramId) -> Option<&Program>;

    fn message(&self, target: &MessageRef) -> Option<&Message> {
        self.program(target.program)?.message(&target.path)
    }

    fn enum_def(&self, target: &EnumRef) -> Option<&EnumDef> {
        self.program(target.program)?.enum_def(&target.path)
    }
}

impl ProgramLookup for [Program] {
    fn program(&self, id: ProgramId) -> Option<&Program> {
        self.get(id.index())
    }
}

impl ProgramLookup for Vec<Program> {
    fn program(&self, id: ProgramId) -> Option<&Program> {
        self.get(id.index())
    }
}
