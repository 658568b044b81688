//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (platform config dir, e.g. ~/.config/postforge/config.toml)
//! 3. Project config (.postforge/config.toml)
//! 4. Environment variables (POSTFORGE_* prefix, `__` separates sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{ForgeError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Self::base();

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // POSTFORGE_OPENAI__TIMEOUT_SECS -> openai.timeout_secs
        figment = figment.merge(Env::prefixed("POSTFORGE_").split("__").lowercase(true));

        Self::extract(figment)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Self::extract(Self::base().merge(Toml::file(path)))
    }

    fn base() -> Figment {
        Figment::new().merge(Serialized::defaults(Config::default()))
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| ForgeError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory
    pub fn global_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "postforge").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".postforge")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path(config: &Config) {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:   {} {}", exists, global.display());
        } else {
            println!("  Global:   (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project:  {} {}", exists, project.display());

        let database = config.storage.database_path();
        let exists = if database.exists() { "✓" } else { "✗" };
        println!("  Database: {} {}", exists, database.display());

        if let Some(file) = &config.prompts.file {
            let exists = if file.exists() { "✓" } else { "✗" };
            println!("  Prompts:  {} {}", exists, file.display());
        }
    }

    /// Show current effective configuration
    pub fn show_config(config: &Config, as_json: bool) -> Result<()> {
        if as_json {
            println!("{}", serde_json::to_string_pretty(config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(config).map_err(|e| ForgeError::Config(e.to_string()))?
            );
        }

        let key_state = if config.openai.resolve_api_key().is_some() {
            "set"
        } else {
            "missing"
        };
        println!("# openai.api_key: {}", key_state);

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            ForgeError::Config("Cannot determine global config directory".to_string())
        })?;

        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        Self::write_config(&config_path, &Self::default_global_config(), force)?;

        Ok(config_path)
    }

    /// Initialize project configuration
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir();
        fs::create_dir_all(&project_dir)?;

        let config_path = project_dir.join("config.toml");
        Self::write_config(&config_path, &Self::default_project_config(), force)?;

        Ok(config_path)
    }

    fn write_config(path: &Path, content: &str, force: bool) -> Result<()> {
        if !path.exists() || force {
            fs::write(path, content)?;
            info!("Created config: {}", path.display());
        } else {
            info!("Config exists: {}", path.display());
        }
        Ok(())
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Generate default global config content (TOML)
    fn default_global_config() -> String {
        r#"# postforge Global Configuration
# User-wide defaults. Project settings in .postforge/config.toml override these.

version = "1.0"

[openai]
# api_key = "sk-..."   # or set OPENAI_API_KEY
api_base = "https://api.openai.com/v1"
timeout_secs = 180
image_model = "gpt-image-1"
image_size = "1024x1024"

[generation]
default_length = "medium"
auto_correct = true
max_corrections = 2

[prompts]
cache_ttl_secs = 86400
"#
        .to_string()
    }

    /// Generate default project config content (TOML)
    fn default_project_config() -> String {
        r#"# postforge Project Configuration
# Blog-specific settings that override global defaults.

version = "1.0"

[editorial]
editorial_line = ""
author_style = ""
target_audience = ""

# Word bands per length. max_tokens applies when the generation prompt sets none.
[lengths.short]
min_words = 300
max_words = 500
max_tokens = 1200

[lengths.medium]
min_words = 800
max_words = 1200
max_tokens = 2200

[lengths.long]
min_words = 1500
max_words = 2000
max_tokens = 3200

[lengths.verylong]
min_words = 2500
max_words = 3000
max_tokens = 4000

[storage]
# database = ".postforge/postforge.db"
"#
        .to_string()
    }
}
