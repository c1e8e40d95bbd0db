//! Code generators and their registry.
//!
//! A generator turns one analysed [`Program`] into output files. It is known
//! by its union, a stable name used both to select it and to report which
//! generator produced a colliding output.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use wctl_core::ast::{Program, ProgramLookup};

use crate::WctlError;

/// One generated file, named relative to the output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub file: String,
    pub data: Vec<u8>,
}

impl Output {
    pub fn new(file: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file: file.into(),
            data: data.into(),
        }
    }
}

pub trait Generator {
    /// Stable identity of the generator.
    fn union(&self) -> &str;

    /// Produce the outputs for `program`. `lookup` reaches every program
    /// it imports.
    fn generate(
        &self,
        program: &Program,
        lookup: &dyn ProgramLookup,
    ) -> Result<Vec<Output>, WctlError>;
}

/// Generators keyed by union, in registration order.
#[derive(Default)]
pub struct Registry {
    generators: IndexMap<String, Box<dyn Generator>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `generator`, returning the one it replaces if its union was
    /// already taken.
    pub fn register(&mut self, generator: Box<dyn Generator>) -> Option<Box<dyn Generator>> {
        let union = generator.union().to_string();
        let replaced = self.generators.insert(union.clone(), generator);
        if replaced.is_some() {
            debug!(union = union.as_str(); "Replaced generator");
        }
        replaced
    }

    pub fn get(&self, union: &str) -> Option<&dyn Generator> {
        self.generators.get(union).map(|generator| generator.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Generator> {
        self.generators.values().map(|generator| generator.as_ref())
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, &'static str);

    impl Generator for Fixed {
        fn union(&self) -> &str {
            self.0
        }

        fn generate(&self, _: &Program, _: &dyn ProgramLookup) -> Result<Vec<Output>, WctlError> {
            Ok(vec![Output::new("out", self.1)])
        }
    }

    #[test]
    fn test_register_replaces_same_union() {
        let mut registry = Registry::new();
        assert!(registry.register(Box::new(Fixed("go", "first"))).is_none());
        assert!(registry.register(Box::new(Fixed("ts", "other"))).is_none());

        let replaced = registry.register(Box::new(Fixed("go", "second")));
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 2);

        let unions: Vec<_> = registry.iter().map(|g| g.union()).collect();
        assert_eq!(unions, vec!["go", "ts"]);
    }

    #[test]
    fn test_get_by_union() {
        let mut registry = Registry::new();
        registry.register(Box::new(Fixed("go", "data")));

        let program = wctl_parser::parse_native("package x1\n", &Default::default())
            .expect("valid source");
        let arena: Vec<Program> = Vec::new();
        let outputs = registry
            .get("go")
            .expect("registered")
            .generate(&program, &arena)
            .expect("generated");
        assert_eq!(outputs, vec![Output::new("out", "data")]);
        assert!(registry.get("ts").is_none());
    }
}
