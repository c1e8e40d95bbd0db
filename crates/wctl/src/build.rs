//! Running generators over analysed programs and writing their outputs.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use indexmap::IndexMap;
use log::{debug, info, warn};

use wctl_core::ast::{ProgramId, ProgramLookup};

use crate::{WctlError, generator::Registry, warehouse::Warehouse};

/// An output collected in memory, with where it came from.
#[derive(Debug)]
struct Pending {
    data: Vec<u8>,
    generator: String,
    file: String,
}

/// One generation run writing below an output directory.
pub struct Build<'a> {
    warehouse: &'a Warehouse,
    registry: &'a Registry,
    output_dir: PathBuf,
    merge_same_file: bool,
}

impl<'a> Build<'a> {
    pub fn new(
        warehouse: &'a Warehouse,
        registry: &'a Registry,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            warehouse,
            registry,
            output_dir: output_dir.into(),
            merge_same_file: false,
        }
    }

    /// Concatenate outputs that share a file name instead of rejecting them.
    pub fn merge_same_file(mut self, merge: bool) -> Self {
        self.merge_same_file = merge;
        self
    }

    /// Run every registered generator on every program and write the
    /// outputs. Returns the written paths in generation order.
    ///
    /// A failing generator/program pair does not stop the others: whatever
    /// was produced is still written, and the failures are returned
    /// together afterwards.
    pub fn run(&self, programs: &[ProgramId]) -> Result<Vec<PathBuf>, WctlError> {
        let mut errors = Vec::new();
        let outputs = self.generate(programs, &mut errors);

        let mut written = Vec::with_capacity(outputs.len());
        for (path, pending) in outputs {
            match write_output(path, &pending.data) {
                Ok(path) => {
                    debug!(
                        path = path.display().to_string(),
                        bytes = pending.data.len();
                        "Wrote output"
                    );
                    written.push(path);
                }
                Err(err) => errors.push(err),
            }
        }

        info!(outputs = written.len(), errors = errors.len(); "Build finished");
        WctlError::collect(errors).map(|()| written)
    }

    /// Collect every output keyed by the path it will be written to, so
    /// names that differ only lexically (`sub/../x`) still collide.
    fn generate(
        &self,
        programs: &[ProgramId],
        errors: &mut Vec<WctlError>,
    ) -> IndexMap<PathBuf, Pending> {
        let mut outputs: IndexMap<PathBuf, Pending> = IndexMap::new();

        for program in programs.iter().filter_map(|id| self.warehouse.program(*id)) {
            for generator in self.registry.iter() {
                let union = generator.union();
                info!(generator = union, file = program.file.as_str(); "Generating");

                let generated = match generator.generate(program, self.warehouse) {
                    Ok(generated) => generated,
                    Err(err) => {
                        warn!(generator = union, file = program.file.as_str(); "Generator failed");
                        errors.push(err);
                        continue;
                    }
                };

                for output in generated {
                    if output.file.is_empty() {
                        errors.push(WctlError::EmptyOutputName {
                            generator: union.to_string(),
                            file: program.file.clone(),
                        });
                        continue;
                    }

                    let path = clean(&self.output_dir.join(&output.file));
                    match outputs.get_mut(&path) {
                        Some(previous) if self.merge_same_file => {
                            debug!(
                                output = output.file.as_str(),
                                generator = union;
                                "Merging output"
                            );
                            previous.data.extend_from_slice(&output.data);
                        }
                        Some(previous) => errors.push(WctlError::Overwrite {
                            output: output.file,
                            generator: union.to_string(),
                            file: program.file.clone(),
                            previous_generator: previous.generator.clone(),
                            previous_file: previous.file.clone(),
                        }),
                        None => {
                            outputs.insert(
                                path,
                                Pending {
                                    data: output.data,
                                    generator: union.to_string(),
                                    file: program.file.clone(),
                                },
                            );
                        }
                    }
                }
            }
        }
        outputs
    }
}

/// Resolve `.` and `..` without touching the filesystem. `..` above the
/// start of a relative path is kept.
fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => cleaned.push(component),
            },
            other => cleaned.push(other),
        }
    }
    cleaned
}

fn write_output(path: PathBuf, data: &[u8]) -> Result<PathBuf, WctlError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| WctlError::io(parent, err))?;
    }
    fs::write(&path, data).map_err(|err| WctlError::io(&path, err))?;
    Ok(path)
}
