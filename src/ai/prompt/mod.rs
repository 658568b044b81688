//! Prompt Templates
//!
//! Stored prompt templates, their model settings, and the read-only
//! `PromptStore` interface the generation pipeline depends on.
//!
//! ## Resolution
//!
//! - Inactive or absent templates resolve to `ForgeError::PromptNotFound`.
//!   There is no built-in fallback text at lookup time.
//! - A template without variants serves its body for any variant.
//! - A template with variants must carry the requested key.

pub mod defaults;
mod memory;
mod template;

pub use defaults::{default_templates, seed_defaults};
pub use memory::{MemoryPromptStore, export_yaml};
pub use template::{Placeholder, PromptVars, render, unknown_placeholders};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use crate::ai::provider::ResponseFormat;
use crate::constants::{models, prompts};
use crate::types::{ForgeError, LengthKey, Result};

static JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bJSON\b").expect("json lint regex"));
static STRUCTURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)STRUCTURE|STRUKTUR").expect("structure lint regex"));

// =============================================================================
// Prompt Types
// =============================================================================

/// Role of a template in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    Generation,
    CorrectionExpand,
    CorrectionShorten,
    SystemGeneration,
    SystemCorrection,
    Image,
}

impl PromptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptType::Generation => "generation",
            PromptType::CorrectionExpand => "correction_expand",
            PromptType::CorrectionShorten => "correction_shorten",
            PromptType::SystemGeneration => "system_generation",
            PromptType::SystemCorrection => "system_correction",
            PromptType::Image => "image",
        }
    }

    /// Max tokens used when a template leaves it unset
    pub fn default_max_tokens(&self) -> u32 {
        match self {
            PromptType::Generation => 5000,
            PromptType::CorrectionExpand | PromptType::CorrectionShorten => 6000,
            PromptType::SystemGeneration | PromptType::SystemCorrection => 100,
            PromptType::Image => 1000,
        }
    }

    pub fn is_correction(&self) -> bool {
        matches!(self, PromptType::CorrectionExpand | PromptType::CorrectionShorten)
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "generation" => Ok(PromptType::Generation),
            "correction_expand" => Ok(PromptType::CorrectionExpand),
            "correction_shorten" => Ok(PromptType::CorrectionShorten),
            "system_generation" => Ok(PromptType::SystemGeneration),
            "system_correction" => Ok(PromptType::SystemCorrection),
            "image" => Ok(PromptType::Image),
            _ => Err(format!("Unknown prompt type: {}", s)),
        }
    }
}

// =============================================================================
// Model Configuration
// =============================================================================

/// Effective model parameters for one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_format: ResponseFormat,
}

/// Model parameters as stored; empty fields take per-type defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ModelSettings {
    pub fn new(
        model: &str,
        temperature: f32,
        max_tokens: Option<u32>,
        response_format: ResponseFormat,
    ) -> Self {
        Self {
            model: Some(model.to_string()),
            temperature: Some(temperature),
            max_tokens,
            response_format: Some(response_format),
        }
    }

    /// Fill empty fields with defaults for `prompt_type`
    pub fn resolve(&self, prompt_type: PromptType) -> ModelConfig {
        ModelConfig {
            model: self
                .model
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(models::DEFAULT_MODEL)
                .to_string(),
            temperature: self.temperature.unwrap_or(models::DEFAULT_TEMPERATURE),
            max_tokens: self
                .max_tokens
                .filter(|t| *t > 0)
                .unwrap_or_else(|| prompt_type.default_max_tokens()),
            response_format: self.response_format.unwrap_or_default(),
        }
    }
}

// =============================================================================
// Prompt Template
// =============================================================================

fn default_active() -> bool {
    true
}

/// A stored prompt template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub slug: String,
    pub title: String,
    pub prompt_type: PromptType,
    #[serde(default)]
    pub body: String,
    /// Length-keyed alternative bodies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl PromptTemplate {
    pub fn new(slug: &str, title: &str, prompt_type: PromptType, body: &str) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.to_string(),
            prompt_type,
            body: body.to_string(),
            variants: None,
            model: ModelSettings::default(),
            active: true,
        }
    }

    pub fn with_variants(mut self, variants: BTreeMap<String, String>) -> Self {
        self.variants = Some(variants);
        self
    }

    pub fn with_model(mut self, model: ModelSettings) -> Self {
        self.model = model;
        self
    }

    /// Effective model configuration
    pub fn model_config(&self) -> ModelConfig {
        self.model.resolve(self.prompt_type)
    }

    /// Text for a variant
    pub fn text_for(&self, variant: Option<&str>) -> Result<&str> {
        let not_found = || ForgeError::prompt_not_found(&self.slug, variant);

        let text = match (&self.variants, variant) {
            (Some(variants), Some(key)) => variants.get(key).map(String::as_str),
            _ => Some(self.body.as_str()),
        };

        text.filter(|t| !t.trim().is_empty()).ok_or_else(not_found)
    }

    /// Every text this template can render: body and variants
    fn texts(&self) -> Vec<(String, &str)> {
        let mut texts = Vec::new();
        if !self.body.trim().is_empty() {
            texts.push(("body".to_string(), self.body.as_str()));
        }
        if let Some(variants) = &self.variants {
            for (key, text) in variants {
                texts.push((format!("variant \"{}\"", key), text.as_str()));
            }
        }
        texts
    }

    /// Report missing required parts for this template's type
    pub fn lint(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let texts = self.texts();

        if texts.is_empty() {
            issues.push(format!("{}: template has no text", self.slug));
            return issues;
        }

        for (label, text) in &texts {
            for name in unknown_placeholders(text) {
                issues.push(format!("{} ({}): unknown placeholder {{{}}}", self.slug, label, name));
            }

            match self.prompt_type {
                PromptType::Generation => {
                    if !JSON_RE.is_match(text) {
                        issues.push(format!("{} ({}): no JSON format section", self.slug, label));
                    }
                    if !STRUCTURE_RE.is_match(text) {
                        issues.push(format!("{} ({}): no structure section", self.slug, label));
                    }
                }
                PromptType::SystemGeneration => {
                    if !JSON_RE.is_match(text) {
                        issues.push(format!("{} ({}): does not ask for JSON", self.slug, label));
                    }
                }
                PromptType::CorrectionExpand | PromptType::CorrectionShorten => {
                    if !text.contains("{min_words}") || !text.contains("{max_words}") {
                        issues.push(format!(
                            "{} ({}): must use both {{min_words}} and {{max_words}}",
                            self.slug, label
                        ));
                    }
                }
                PromptType::SystemCorrection | PromptType::Image => {}
            }
        }

        issues
    }
}

// =============================================================================
// Prompt Store
// =============================================================================

/// Read-through prompt lookup plus the writes needed for seeding and import
pub trait PromptStore: Send + Sync {
    /// Active template by slug
    fn get_template(&self, slug: &str) -> Result<Option<PromptTemplate>>;

    /// All templates, active or not, ordered by slug
    fn list_templates(&self) -> Result<Vec<PromptTemplate>>;

    /// Insert or replace a template by slug
    fn upsert(&self, template: PromptTemplate) -> Result<()>;

    /// Prompt text for a slug and optional variant
    fn get_prompt(&self, slug: &str, variant: Option<&str>) -> Result<String> {
        let template = self
            .get_template(slug)?
            .ok_or_else(|| ForgeError::prompt_not_found(slug, variant))?;
        template.text_for(variant).map(str::to_string)
    }

    /// Effective model configuration for a slug
    fn get_config(&self, slug: &str) -> Result<ModelConfig> {
        self.get_template(slug)?
            .map(|t| t.model_config())
            .ok_or_else(|| ForgeError::prompt_not_found(slug, None))
    }
}

pub type SharedPromptStore = Arc<dyn PromptStore>;

/// Required slugs (and generation variants) that do not resolve
pub fn missing_required_prompts(store: &dyn PromptStore) -> Result<Vec<String>> {
    let mut missing = Vec::new();

    for slug in prompts::REQUIRED_SLUGS {
        if *slug == prompts::POST_GENERATION {
            for key in LengthKey::ALL {
                match store.get_prompt(slug, Some(key.as_str())) {
                    Ok(_) => {}
                    Err(ForgeError::PromptNotFound { .. }) => {
                        missing.push(format!("{} (variant \"{}\")", slug, key));
                    }
                    Err(e) => return Err(e),
                }
            }
            continue;
        }

        match store.get_prompt(slug, None) {
            Ok(_) => {}
            Err(ForgeError::PromptNotFound { .. }) => missing.push(slug.to_string()),
            Err(e) => return Err(e),
        }
    }

    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("short".to_string(), "Short {post_title}".to_string()),
            ("long".to_string(), "Long {post_title}".to_string()),
        ])
    }

    #[test]
    fn test_model_settings_defaults() {
        let config = ModelSettings::default().resolve(PromptType::Generation);
        assert_eq!(config.model, "gpt-5-mini");
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.max_tokens, 5000);
        assert_eq!(config.response_format, ResponseFormat::Text);

        assert_eq!(ModelSettings::default().resolve(PromptType::CorrectionShorten).max_tokens, 6000);
        assert_eq!(ModelSettings::default().resolve(PromptType::SystemCorrection).max_tokens, 100);
        assert_eq!(ModelSettings::default().resolve(PromptType::Image).max_tokens, 1000);
    }

    #[test]
    fn test_model_settings_empty_values_fall_back() {
        let settings = ModelSettings {
            model: Some("  ".to_string()),
            temperature: Some(0.7),
            max_tokens: Some(0),
            response_format: Some(ResponseFormat::JsonObject),
        };
        let config = settings.resolve(PromptType::CorrectionExpand);
        assert_eq!(config.model, "gpt-5-mini");
        assert_eq!(config.max_tokens, 6000);
        assert_eq!(config.response_format, ResponseFormat::JsonObject);
    }

    #[test]
    fn test_variant_resolution() {
        let template = PromptTemplate::new("post-generation", "Post", PromptType::Generation, "")
            .with_variants(variants());

        assert_eq!(template.text_for(Some("short")).unwrap(), "Short {post_title}");
        assert!(matches!(
            template.text_for(Some("medium")),
            Err(ForgeError::PromptNotFound { .. })
        ));
        assert!(template.text_for(None).is_err());
    }

    #[test]
    fn test_body_serves_any_variant() {
        let template =
            PromptTemplate::new("system-correction", "Sys", PromptType::SystemCorrection, "Edit.");
        assert_eq!(template.text_for(Some("long")).unwrap(), "Edit.");
        assert_eq!(template.text_for(None).unwrap(), "Edit.");
    }

    #[test]
    fn test_lint_generation() {
        let good = PromptTemplate::new(
            "post-generation",
            "Post",
            PromptType::Generation,
            "STRUCTURE:\n1. Intro\n\nJSON format (only this): {\"content_html\": \"\"}",
        );
        assert!(good.lint().is_empty());

        let bad = PromptTemplate::new("post-generation", "Post", PromptType::Generation, "Write {post_tilte}");
        let issues = bad.lint();
        assert!(issues.iter().any(|i| i.contains("post_tilte")));
        assert!(issues.iter().any(|i| i.contains("JSON")));
        assert!(issues.iter().any(|i| i.contains("structure")));
    }

    #[test]
    fn test_lint_correction_needs_bounds() {
        let template = PromptTemplate::new(
            "correction-expand",
            "Expand",
            PromptType::CorrectionExpand,
            "Make {post_content} longer than {min_words}.",
        );
        assert_eq!(template.lint().len(), 1);
    }

    #[test]
    fn test_store_default_methods() {
        let store = MemoryPromptStore::new();
        store
            .upsert(
                PromptTemplate::new("correction-expand", "Expand", PromptType::CorrectionExpand, "Expand")
                    .with_model(ModelSettings::new("gpt-4o", 0.3, Some(6000), ResponseFormat::Text)),
            )
            .unwrap();

        assert_eq!(store.get_prompt("correction-expand", None).unwrap(), "Expand");
        assert_eq!(store.get_config("correction-expand").unwrap().model, "gpt-4o");
        assert!(matches!(
            store.get_config("correction-shorten"),
            Err(ForgeError::PromptNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_required_prompts() {
        let store = MemoryPromptStore::new();
        let missing = missing_required_prompts(&store).unwrap();
        assert_eq!(missing.len(), 5 + LengthKey::ALL.len());

        seed_defaults(&store).unwrap();
        assert!(missing_required_prompts(&store).unwrap().is_empty());
    }
}
