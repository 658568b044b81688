//! Config Command
//!
//! Manage postforge configuration.
//!
//! Usage:
//!   postforge config show [--format json]
//!   postforge config path
//!   postforge config init [--global] [--force]

use crate::cli::OutputFormat;
use crate::cli::ui::Output;
use crate::config::{Config, ConfigLoader};
use crate::types::Result;

/// Show the merged effective configuration
pub fn show(config: &Config, format: OutputFormat) -> Result<()> {
    ConfigLoader::show_config(config, format == OutputFormat::Json)
}

/// Show configuration and data paths
pub fn path(config: &Config) -> Result<()> {
    ConfigLoader::show_path(config);
    Ok(())
}

/// Write a starter config file
pub fn init(global: bool, force: bool) -> Result<()> {
    let out = Output::new();

    let path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(force)?
    };

    out.success(&format!(
        "Initialized {} configuration",
        if global { "global" } else { "project" }
    ));
    out.field("Config", path.display());
    Ok(())
}
