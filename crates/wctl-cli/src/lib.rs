//! CLI logic for the wctl IDL compiler.
//!
//! This module contains the core CLI logic: it merges command-line flags
//! with the configuration file, analyses the selected schema files and runs
//! the selected generators over them.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command, GenerateArgs};

use std::path::PathBuf;

use log::info;

use wctl::{Build, Warehouse, WctlError, config::GenerateConfig};
use wctl_parser::ParseConfig;

/// Run the wctl CLI application
///
/// # Errors
///
/// Returns `WctlError` for:
/// - Configuration loading errors
/// - Analysis errors in any schema file or its imports
/// - Generator, plugin and output writing errors
pub fn run(args: &Args) -> Result<(), WctlError> {
    let app_config = config::load_config(args.config.as_ref())?;

    match &args.command {
        Command::Generate(generate_args) => {
            let written = generate(generate_args, app_config.generate())?;
            info!(outputs = written.len(); "Generation finished");
        }
    }
    Ok(())
}

/// Analyse the requested files and write the generated outputs.
///
/// Flags extend the configured generators and options, and override its
/// switches and suffix. Returns the written paths.
pub fn generate(args: &GenerateArgs, config: &GenerateConfig) -> Result<Vec<PathBuf>, WctlError> {
    let suffix = args.suffix.as_deref().unwrap_or(config.suffix());
    let parse_config = ParseConfig {
        use_method_id: args.use_method_id || config.use_method_id(),
    };
    let merge_same_file = args.merge_same_file || config.merge_same_file();

    let registry = wctl::config::registry(
        config.lang().iter().chain(&args.lang).map(String::as_str),
        config.plugins().iter().chain(&args.cmd).map(String::as_str),
    )?;
    if registry.is_empty() {
        return Err(WctlError::Config(
            "no generator selected, use --lang or --cmd".to_string(),
        ));
    }
    let options = wctl::config::parse_cmd_options(
        config.options().iter().chain(&args.options).map(String::as_str),
    );

    let input = PathBuf::from(&args.input);
    let output = args.output.as_ref().map_or_else(|| input.clone(), PathBuf::from);
    info!(
        input = input.display().to_string(),
        output = output.display().to_string(),
        generators = registry.len();
        "Generating"
    );

    let mut warehouse = Warehouse::new(&input, parse_config).with_options(options);
    let ids = if args.files.is_empty() {
        warehouse.analyse_path(&input, suffix)?
    } else {
        args.files
            .iter()
            .map(|file| warehouse.analyse(file))
            .collect::<Result<Vec<_>, _>>()?
    };

    Build::new(&warehouse, &registry, output)
        .merge_same_file(merge_same_file)
        .run(&ids)
}
