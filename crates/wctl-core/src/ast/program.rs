use std::cell::OnceCell;

use indexmap::IndexMap;

use crate::{
    ast::{
        Doc, EnumDef, EnumPath, Message, MessagePath, OptionDecl, ProgramId, Project, Service,
    },
    checker::UniqueChecker,
    desc::FileDesc,
    span::Spanned,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: Spanned<String>,
    pub doc: Doc,
}

/// An `import [alias] "file"` declaration.
#[derive(Debug, Clone)]
pub struct Import {
    pub file: Spanned<String>,
    pub alias: Option<Spanned<String>>,
    pub doc: Doc,
    target: OnceCell<ProgramId>,
}

impl Import {
    pub fn new(file: Spanned<String>, alias: Option<Spanned<String>>) -> Self {
        Self {
            file,
            alias,
            doc: Doc::default(),
            target: OnceCell::new(),
        }
    }

    /// The analysed program this import refers to, once bound.
    pub fn target(&self) -> Option<ProgramId> {
        self.target.get().copied()
    }

    /// Returns `false` if the import was already bound.
    pub fn bind(&self, target: ProgramId) -> bool {
        self.target.set(target).is_ok()
    }
}

/// Name tables of a program, filled while checking for repeated definitions.
///
/// Nested messages and enums are hoisted into the same tables as top-level
/// ones.
#[derive(Debug, Clone, Default)]
pub struct Symbols {
    pub messages: IndexMap<String, MessagePath>,
    pub enums: IndexMap<String, EnumPath>,
}

/// The root of one source file.
#[derive(Debug, Clone)]
pub struct Program {
    /// Logical file name, relative to the analysis base directory.
    pub file: String,
    pub package: Package,
    pub imports: Vec<Import>,
    pub options: Vec<OptionDecl>,
    pub enums: Vec<EnumDef>,
    pub messages: Vec<Message>,
    pub services: Vec<Service>,
    pub projects: Vec<Project>,
    /// Top-level symbol names, including hoisted nested types.
    pub checker: UniqueChecker,
    pub symbols: Symbols,
    references: OnceCell<IndexMap<String, Vec<ProgramId>>>,
    pub(crate) desc: OnceCell<FileDesc>,
}

impl Program {
    pub fn new(package: Package) -> Self {
        Self {
            file: String::new(),
            package,
            imports: Vec::new(),
            options: Vec::new(),
            enums: Vec::new(),
            messages: Vec::new(),
            services: Vec::new(),
            projects: Vec::new(),
            checker: UniqueChecker::new(),
            symbols: Symbols::default(),
            references: OnceCell::new(),
            desc: OnceCell::new(),
        }
    }

    pub fn package_name(&self) -> &str {
        self.package.name.inner()
    }

    pub fn message(&self, path: &MessagePath) -> Option<&Message> {
        let (first, rest) = path.indices().split_first()?;
        rest.iter()
            .try_fold(self.messages.get(*first)?, |message, index| {
                message.messages.get(*index)
            })
    }

    pub fn enum_def(&self, path: &EnumPath) -> Option<&EnumDef> {
        match &path.owner {
            Some(owner) => self.message(owner)?.enums.get(path.index),
            None => self.enums.get(path.index),
        }
    }

    /// Imported programs keyed by reference name (alias, or the imported
    /// package name). Available once imports are linked.
    pub fn references(&self) -> Option<&IndexMap<String, Vec<ProgramId>>> {
        self.references.get()
    }

    /// Returns `false` if the reference map was already set.
    pub fn set_references(&self, references: IndexMap<String, Vec<ProgramId>>) -> bool {
        self.references.set(references).is_ok()
    }
}
