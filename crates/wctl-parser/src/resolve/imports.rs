use indexmap::IndexMap;
use log::debug;

use wctl_core::{
    ast::{Program, ProgramId, ProgramLookup},
    checker::UniqueChecker,
};

use super::duplicate;
use crate::error::{Diagnostic, ErrorCode, Result};

/// Reject imports that repeat a file or an alias.
pub fn check_imports(program: &Program) -> Result<()> {
    let mut files = UniqueChecker::new();
    let mut aliases = UniqueChecker::new();

    for import in &program.imports {
        files
            .insert_name(import.file.inner(), import.file.span())
            .map_err(|first| {
                duplicate(
                    ErrorCode::E200,
                    format!("file `{}` is imported more than once", import.file.inner()),
                    import.file.span(),
                    first,
                )
            })?;

        if let Some(alias) = &import.alias {
            aliases
                .insert_name(alias.inner(), alias.span())
                .map_err(|first| {
                    duplicate(
                        ErrorCode::E201,
                        format!("import alias `{}` is used more than once", alias.inner()),
                        alias.span(),
                        first,
                    )
                })?;
        }
    }
    Ok(())
}

/// Build the reference-name map of `program` from its bound imports.
///
/// An import is referenced by its alias, or by the package name of the
/// imported program. Several files may share a reference name as long as
/// they declare the same package.
pub fn link_imports(program: &Program, lookup: &dyn ProgramLookup) -> Result<()> {
    let mut references: IndexMap<String, Vec<ProgramId>> = IndexMap::new();

    for import in &program.imports {
        let target = import.target().and_then(|id| Some((id, lookup.program(id)?)));
        let Some((id, imported)) = target else {
            return Err(Diagnostic::error(format!(
                "import `{}` has not been analysed",
                import.file.inner()
            ))
            .with_label(import.file.span(), "unbound import"));
        };

        let name = import
            .alias
            .as_ref()
            .map_or_else(|| imported.package_name(), |alias| alias.inner().as_str());
        let entry = references.entry(name.to_string()).or_default();

        if let Some(other) = entry
            .iter()
            .filter_map(|id| lookup.program(*id))
            .find(|other| other.package_name() != imported.package_name())
        {
            return Err(Diagnostic::error(format!(
                "`{name}` refers to both package `{}` ({}) and package `{}` ({})",
                other.package_name(),
                other.file,
                imported.package_name(),
                imported.file,
            ))
            .with_code(ErrorCode::E202)
            .with_label(import.file.span(), ErrorCode::E202.description())
            .with_help("files imported under one name must declare the same package"));
        }
        if !entry.contains(&id) {
            entry.push(id);
        }
    }

    debug!(file = program.file.as_str(), references = references.len(); "Linked imports");
    program.set_references(references);
    Ok(())
}
