//! The declaration tree of one schema file.
//!
//! Parsers build these nodes bottom-up; reference resolution then links
//! custom types and imports through handles ([`TypeRef`], [`ProgramId`])
//! without restructuring the tree.

mod definitions;
mod doc;
mod field_type;
mod options;
mod program;
mod reference;

pub use definitions::{
    CallMode, EnumDef, EnumValue, Field, Message, Method, Project, ProjectArea, Service,
};
pub use doc::Doc;
pub use field_type::{BaseType, CustomType, ElemType, FieldType};
pub use options::{CmdOption, CmdOptionError, OptionDecl, OptionValue, find_option};
pub use program::{Import, Package, Program, Symbols};
pub use reference::{
    EnumPath, EnumRef, MessagePath, MessageRef, ProgramId, ProgramLookup, TypeRef,
};
