//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (platform config dir) and project (.postforge/) level configuration.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{correction, image, network, prompts};
use crate::types::{ForgeError, LengthKey, LengthTable, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// OpenAI connection settings
    pub openai: OpenAiConfig,

    /// Generation defaults for the CLI
    pub generation: GenerationConfig,

    /// Editorial voice injected into the system prompt
    pub editorial: EditorialConfig,

    /// Word bands per length key
    pub lengths: LengthTable,

    /// Local persistence
    pub storage: StorageConfig,

    /// Prompt store settings
    pub prompts: PromptsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            openai: OpenAiConfig::default(),
            generation: GenerationConfig::default(),
            editorial: EditorialConfig::default(),
            lengths: LengthTable::default(),
            storage: StorageConfig::default(),
            prompts: PromptsConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ForgeError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.openai.timeout_secs == 0 {
            return Err(ForgeError::Config(
                "openai.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if let Err(e) = url::Url::parse(&self.openai.api_base) {
            return Err(ForgeError::Config(format!(
                "openai.api_base is not a valid URL ({}): {}",
                self.openai.api_base, e
            )));
        }

        if self.generation.max_corrections > correction::MAX_CORRECTIONS_LIMIT {
            return Err(ForgeError::Config(format!(
                "generation.max_corrections must be at most {}, got {}",
                correction::MAX_CORRECTIONS_LIMIT,
                self.generation.max_corrections
            )));
        }

        for key in LengthKey::ALL {
            let range = self.lengths.range(key);
            if range.min_words == 0 || range.min_words >= range.max_words {
                return Err(ForgeError::Config(format!(
                    "lengths.{}: min_words must be positive and below max_words, got {}",
                    key,
                    range.label()
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// OpenAI Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key; never serialized to output
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL
    pub api_base: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Model for featured images
    pub image_model: String,

    /// Image size, e.g. "1024x1024"
    pub image_size: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("image_model", &self.image_model)
            .field("image_size", &self.image_size)
            .finish()
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: network::DEFAULT_API_BASE.to_string(),
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            image_model: image::DEFAULT_MODEL.to_string(),
            image_size: image::DEFAULT_SIZE.to_string(),
        }
    }
}

impl OpenAiConfig {
    /// Configured key, falling back to `OPENAI_API_KEY`. Blank keys count as absent.
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from)
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub default_length: LengthKey,
    pub auto_correct: bool,
    pub max_corrections: u8,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_length: LengthKey::Medium,
            auto_correct: true,
            max_corrections: correction::DEFAULT_MAX_CORRECTIONS,
        }
    }
}

// =============================================================================
// Editorial Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorialConfig {
    pub editorial_line: String,
    pub author_style: String,
    pub target_audience: String,
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path; defaults to the platform data directory
    pub database: Option<PathBuf>,
}

impl StorageConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("", "", "postforge")
                .map(|dirs| dirs.data_dir().join("postforge.db"))
                .unwrap_or_else(|| PathBuf::from(".postforge").join("postforge.db"))
        })
    }
}

// =============================================================================
// Prompt Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Lifetime of cached prompt lookups in seconds
    pub cache_ttl_secs: u64,

    /// YAML prompt file used instead of the database when set
    pub file: Option<PathBuf>,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: prompts::CACHE_TTL_SECS,
            file: None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
