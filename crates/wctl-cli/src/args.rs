//! Command-line argument definitions for the wctl CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Flags given here take precedence over the configuration
//! file.

use clap::{Parser, Subcommand};

/// Command-line arguments for the wctl IDL compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse schema files and run generators over them
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct GenerateArgs {
    /// Schema files relative to the input directory; all files with the
    /// suffix are used when none is given
    pub files: Vec<String>,

    /// Input (base) directory
    #[arg(short, long, default_value = ".")]
    pub input: String,

    /// Output directory, defaults to the input directory
    #[arg(short, long)]
    pub output: Option<String>,

    /// Built-in generator to run (repeatable)
    #[arg(short, long)]
    pub lang: Vec<String>,

    /// Plugin command line to run as a generator (repeatable)
    #[arg(short = 'c', long = "cmd")]
    pub cmd: Vec<String>,

    /// Global option `key=value` added to every file (repeatable)
    #[arg(short = 'O', long = "option")]
    pub options: Vec<String>,

    /// Require an id on every method
    #[arg(long)]
    pub use_method_id: bool,

    /// Suffix of schema files when walking the input directory
    #[arg(long)]
    pub suffix: Option<String>,

    /// Concatenate outputs that share a file name
    #[arg(long)]
    pub merge_same_file: bool,
}
