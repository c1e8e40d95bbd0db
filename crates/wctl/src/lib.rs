//! # wctl
//!
//! Schema analysis and code generation for the wctl interface description
//! language.
//!
//! A [`Warehouse`] parses schema files, follows their imports and resolves
//! every type reference. Generators registered in a
//! [`Registry`](generator::Registry) then turn the analysed programs into
//! output files through a [`Build`].
//!
//! ## Usage
//!
//! ```no_run
//! # use wctl::{Build, Warehouse, WctlError, generator::Registry, printer::Printer};
//! # use wctl_parser::ParseConfig;
//! fn main() -> Result<(), WctlError> {
//!     let mut warehouse = Warehouse::new("schemas", ParseConfig::default());
//!     let id = warehouse.analyse("user.wproto")?;
//!
//!     let mut registry = Registry::new();
//!     registry.register(Box::new(Printer));
//!
//!     Build::new(&warehouse, &registry, "out").run(&[id])?;
//!     Ok(())
//! }
//! ```
//!
//! External generators are plain commands speaking the [`wire`] protocol,
//! wrapped in a [`CmdPlugin`](plugin::CmdPlugin).

pub mod build;
pub mod config;
pub mod generator;
pub mod plugin;
pub mod printer;
pub mod toproto;
pub mod warehouse;
pub mod wire;

mod error;

pub use build::Build;
pub use error::WctlError;
pub use warehouse::Warehouse;
