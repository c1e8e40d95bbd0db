//! The built-in `printer` generator: a pretty JSON dump of each program's
//! descriptor, written next to the schema as `<file>.json`.

use wctl_core::ast::{Program, ProgramLookup};

use crate::{
    WctlError,
    generator::{Generator, Output},
};

#[derive(Debug, Default)]
pub struct Printer;

impl Printer {
    pub const UNION: &'static str = "printer";
}

impl Generator for Printer {
    fn union(&self) -> &str {
        Self::UNION
    }

    fn generate(
        &self,
        program: &Program,
        lookup: &dyn ProgramLookup,
    ) -> Result<Vec<Output>, WctlError> {
        let data = serde_json::to_vec_pretty(program.file_desc(lookup)).map_err(|err| {
            WctlError::Generate {
                generator: Self::UNION.to_string(),
                file: program.file.clone(),
                message: err.to_string(),
            }
        })?;
        Ok(vec![Output::new(format!("{}.json", program.file), data)])
    }
}
