//! Error types for wctl operations.
//!
//! This module provides the main error type [`WctlError`] which wraps the
//! failures of analysis, generation and plugin invocation.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use wctl_parser::error::ParseError;

/// The main error type for wctl operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries the diagnostics of one file together with the
/// file name and its source text, which is everything needed to render the
/// labelled spans. A failure inside an imported file is wrapped in `Import`
/// once per level of the import graph.
#[derive(Debug, Error)]
pub enum WctlError {
    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{file}: {err}")]
    Parse {
        err: ParseError,
        file: String,
        src: String,
    },

    #[error("failed to analyse `{file}` imported by `{importer}`")]
    Import {
        file: String,
        importer: String,
        #[source]
        source: Box<WctlError>,
    },

    #[error("no parser registered for file `{0}`")]
    UnsupportedFile(String),

    #[error("generator `{generator}` failed on `{file}`: {message}")]
    Generate {
        generator: String,
        file: String,
        message: String,
    },

    #[error(
        "output `{output}` of generator `{generator}` for `{file}` overwrites the output of generator `{previous_generator}` for `{previous_file}`"
    )]
    Overwrite {
        output: String,
        generator: String,
        file: String,
        previous_generator: String,
        previous_file: String,
    },

    #[error("generator `{generator}` produced an output without a file name for `{file}`")]
    EmptyOutputName { generator: String, file: String },

    #[error("plugin `{command}` failed: {message}")]
    Plugin { command: String, message: String },

    #[error("plugin wire format error: {0}")]
    Wire(#[from] bincode::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{}", MultipleDisplay(.0))]
    Multiple(Vec<WctlError>),
}

impl WctlError {
    /// Create a new `Parse` error with the associated file and source code.
    pub fn new_parse_error(
        err: impl Into<ParseError>,
        file: impl Into<String>,
        src: impl Into<String>,
    ) -> Self {
        Self::Parse {
            err: err.into(),
            file: file.into(),
            src: src.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Fold accumulated errors: none is success, one is returned as is.
    pub fn collect(mut errors: Vec<WctlError>) -> Result<(), WctlError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Multiple(errors)),
        }
    }

    /// Follow an import chain down to the error that started it.
    ///
    /// Returns that error and the `(file, importer)` pairs crossed on the
    /// way, innermost first.
    pub fn innermost(&self) -> (&WctlError, Vec<(&str, &str)>) {
        let mut trail = Vec::new();
        let mut current = self;
        while let Self::Import {
            file,
            importer,
            source,
        } = current
        {
            trail.push((file.as_str(), importer.as_str()));
            current = source;
        }
        trail.reverse();
        (current, trail)
    }
}

struct MultipleDisplay<'a>(&'a [WctlError]);

impl fmt::Display for MultipleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors occurred", self.0.len())?;
        for err in self.0 {
            write!(f, "\n  - {err}")?;
        }
        Ok(())
    }
}
