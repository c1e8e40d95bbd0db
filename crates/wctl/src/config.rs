//! Configuration types for wctl runs.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file; every field is optional.
//!
//! # Example
//!
//! ```
//! # use wctl::config::AppConfig;
//! let config: AppConfig = toml::from_str(
//!     r#"
//!     [generate]
//!     suffix = ".proto"
//!     lang = ["printer"]
//!     options = ["go.pkg=demo"]
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.generate().suffix(), ".proto");
//! assert!(!config.generate().use_method_id());
//! ```

use log::warn;
use serde::Deserialize;

use wctl_core::ast::CmdOption;

use crate::{
    WctlError,
    generator::Registry,
    plugin::CmdPlugin,
    printer::Printer,
    toproto::ToProto,
    warehouse::NATIVE_SUFFIX,
};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// The `[generate]` section.
    #[serde(default)]
    generate: GenerateConfig,
}

impl AppConfig {
    pub fn new(generate: GenerateConfig) -> Self {
        Self { generate }
    }

    /// Returns the generation settings.
    pub fn generate(&self) -> &GenerateConfig {
        &self.generate
    }
}

/// Settings of the `generate` command.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Suffix of the schema files picked up when walking a directory.
    suffix: String,
    /// Keep method ids and require them on every method.
    use_method_id: bool,
    /// Concatenate outputs that share a file name.
    merge_same_file: bool,
    /// Global `key=value` options appended to every program.
    options: Vec<String>,
    /// Unions of built-in generators to run.
    lang: Vec<String>,
    /// Command lines of plugin generators to run.
    plugins: Vec<String>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            suffix: NATIVE_SUFFIX.to_string(),
            use_method_id: false,
            merge_same_file: false,
            options: Vec::new(),
            lang: Vec::new(),
            plugins: Vec::new(),
        }
    }
}

impl GenerateConfig {
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn use_method_id(&self) -> bool {
        self.use_method_id
    }

    pub fn merge_same_file(&self) -> bool {
        self.merge_same_file
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn lang(&self) -> &[String] {
        &self.lang
    }

    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }
}

/// Parse global options, skipping and reporting the invalid ones.
pub fn parse_cmd_options<'a>(options: impl IntoIterator<Item = &'a str>) -> Vec<CmdOption> {
    options
        .into_iter()
        .filter_map(|option| match option.parse::<CmdOption>() {
            Ok(option) => Some(option),
            Err(err) => {
                warn!(option; "Skipping option: {err}");
                None
            }
        })
        .collect()
}

/// Build a registry from built-in generator unions and plugin commands.
///
/// # Errors
///
/// Returns `WctlError::Config` for an unknown built-in generator or an
/// empty plugin command.
pub fn registry<'a>(
    lang: impl IntoIterator<Item = &'a str>,
    plugins: impl IntoIterator<Item = &'a str>,
) -> Result<Registry, WctlError> {
    let mut registry = Registry::new();
    for union in lang {
        match union {
            Printer::UNION => registry.register(Box::new(Printer)),
            ToProto::UNION => registry.register(Box::new(ToProto)),
            other => return Err(WctlError::Config(format!("unknown generator `{other}`"))),
        };
    }
    for command in plugins {
        registry.register(Box::new(CmdPlugin::new(command)?));
    }
    Ok(registry)
}
