//! The parse cache and recursive analyser.
//!
//! A [`Warehouse`] owns every analysed [`Program`] in an arena and indexes
//! it by logical file name and by absolute path. Analysing a file parses it,
//! checks it, registers it, and only then follows its imports; an import
//! that leads back to a file in progress hits the cache, which is what makes
//! cyclic imports terminate.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::{debug, info, trace};
use walkdir::WalkDir;

use wctl_core::{
    ast::{CmdOption, Program, ProgramId, ProgramLookup},
    desc::FileDesc,
};
use wctl_parser::{ParseConfig, ParseFn, parse_native, parse_protobuf, resolve};

use crate::WctlError;

/// Suffix of native schema files.
pub const NATIVE_SUFFIX: &str = ".wproto";
/// Suffix of protobuf-compatible schema files.
pub const PROTOBUF_SUFFIX: &str = ".proto";

/// Cache of analysed programs for one compiler run.
pub struct Warehouse {
    base: PathBuf,
    config: ParseConfig,
    options: Vec<CmdOption>,
    parsers: IndexMap<String, ParseFn>,
    programs: Vec<Program>,
    by_file: HashMap<String, ProgramId>,
    by_path: HashMap<PathBuf, ProgramId>,
}

impl Warehouse {
    /// Create a warehouse resolving file names against `base`, with the
    /// native and protobuf parsers registered.
    pub fn new(base: impl Into<PathBuf>, config: ParseConfig) -> Self {
        let mut warehouse = Self {
            base: base.into(),
            config,
            options: Vec::new(),
            parsers: IndexMap::new(),
            programs: Vec::new(),
            by_file: HashMap::new(),
            by_path: HashMap::new(),
        };
        warehouse.register_parser(NATIVE_SUFFIX, parse_native);
        warehouse.register_parser(PROTOBUF_SUFFIX, parse_protobuf);
        warehouse
    }

    /// Options appended to every program analysed from now on.
    pub fn with_options(mut self, options: Vec<CmdOption>) -> Self {
        self.options = options;
        self
    }

    /// Parse files ending in `suffix` with `parse`, replacing any parser
    /// registered for the same suffix.
    pub fn register_parser(&mut self, suffix: impl Into<String>, parse: ParseFn) {
        self.parsers.insert(suffix.into(), parse);
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// All analysed programs, in analysis order.
    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    /// The id of an already analysed file.
    pub fn get(&self, file: &str) -> Option<ProgramId> {
        self.by_file.get(file).copied()
    }

    /// Analyse `file`, a path relative to the base directory, and every
    /// file it imports.
    ///
    /// # Errors
    ///
    /// Returns `WctlError` for:
    /// - files without a registered parser
    /// - unreadable files
    /// - diagnostics from parsing or any analysis pass
    /// - failures inside imported files, wrapped in [`WctlError::Import`]
    pub fn analyse(&mut self, file: &str) -> Result<ProgramId, WctlError> {
        if let Some(id) = self.get(file) {
            trace!(file; "Cache hit");
            return Ok(id);
        }

        let path = self.base.join(file);
        let absolute = fs::canonicalize(&path).map_err(|err| WctlError::io(&path, err))?;
        if let Some(id) = self.by_path.get(&absolute).copied() {
            trace!(file, path = absolute.display().to_string(); "Cache hit by path");
            self.by_file.insert(file.to_string(), id);
            return Ok(id);
        }

        let parse = self.parser_for(file)?;
        debug!(file; "Analysing file");

        let src = fs::read_to_string(&absolute).map_err(|err| WctlError::io(&path, err))?;
        let mut program =
            parse(&src, &self.config).map_err(|err| WctlError::new_parse_error(err, file, &*src))?;
        program.file = file.to_string();
        for option in &self.options {
            option.apply_to(&mut program.options);
        }

        resolve::check_imports(&program)
            .and_then(|()| resolve::check_repeated_definitions(&mut program, &self.config))
            .map_err(|err| WctlError::new_parse_error(err, file, &*src))?;

        let id = ProgramId::new(self.programs.len());
        self.programs.push(program);
        self.by_file.insert(file.to_string(), id);
        self.by_path.insert(absolute.clone(), id);

        if let Err(err) = self.link(id, &src) {
            self.evict_from(id);
            debug!(file; "Evicted after failed analysis");
            return Err(err);
        }

        info!(file, package = self.programs[id.index()].package_name(); "Analysed file");
        Ok(id)
    }

    /// Analyse every file ending in `suffix` below `dir`.
    ///
    /// Files are named by their path relative to the base directory and
    /// visited in name order within each directory.
    pub fn analyse_path(
        &mut self,
        dir: impl AsRef<Path>,
        suffix: &str,
    ) -> Result<Vec<ProgramId>, WctlError> {
        let dir = dir.as_ref();
        let mut ids = Vec::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(dir).to_path_buf();
                WctlError::io(path, err.into())
            })?;
            if !entry.file_type().is_file()
                || !entry.file_name().to_string_lossy().ends_with(suffix)
            {
                continue;
            }

            let path = entry.path();
            let file = path.strip_prefix(&self.base).unwrap_or(path);
            let id = self.analyse(&file.to_string_lossy())?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        debug!(dir = dir.display().to_string(), suffix, files = ids.len(); "Analysed directory");
        Ok(ids)
    }

    /// The descriptor of an analysed program.
    pub fn file_desc(&self, id: ProgramId) -> Option<&FileDesc> {
        self.program(id).map(|program| program.file_desc(self))
    }

    /// The descriptor of an analysed program together with those of every
    /// program it transitively imports, keyed by file name.
    pub fn file_desc_with_imports(&self, id: ProgramId) -> IndexMap<String, FileDesc> {
        self.program(id)
            .map(|program| program.file_desc_with_imports(self))
            .unwrap_or_default()
    }

    /// Forget `first` and every program registered after it. Those were
    /// all reached while analysing `first`, and an import cycle may have
    /// bound them to it.
    fn evict_from(&mut self, first: ProgramId) {
        let mark = first.index();
        self.by_file.retain(|_, id| id.index() < mark);
        self.by_path.retain(|_, id| id.index() < mark);
        self.programs.truncate(mark);
    }

    fn parser_for(&self, file: &str) -> Result<ParseFn, WctlError> {
        self.parsers
            .iter()
            .find(|(suffix, _)| file.ends_with(suffix.as_str()))
            .map(|(_, parse)| *parse)
            .ok_or_else(|| WctlError::UnsupportedFile(file.to_string()))
    }

    /// Analyse and bind the imports of a registered program, then run the
    /// passes that need them.
    fn link(&mut self, id: ProgramId, src: &str) -> Result<(), WctlError> {
        let program = &self.programs[id.index()];
        let importer = program.file.clone();
        let imports: Vec<String> = program
            .imports
            .iter()
            .map(|import| import.file.inner().clone())
            .collect();

        for (index, file) in imports.iter().enumerate() {
            let target = self.analyse(file).map_err(|source| WctlError::Import {
                file: file.clone(),
                importer: importer.clone(),
                source: Box::new(source),
            })?;
            self.programs[id.index()].imports[index].bind(target);
        }

        let lookup: &dyn ProgramLookup = &*self;
        resolve::link_imports(&self.programs[id.index()], lookup)
            .and_then(|()| resolve::fix_references(id, lookup))
            .map_err(|err| WctlError::new_parse_error(err, importer, src))
    }
}

impl ProgramLookup for Warehouse {
    fn program(&self, id: ProgramId) -> Option<&Program> {
        self.programs.get(id.index())
    }
}
