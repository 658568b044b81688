//! In-process prompt store
//!
//! Backs tests and the YAML import/export path. Lookups hand out clones, so
//! a caller can never mutate a template another run is reading.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::{PromptStore, PromptTemplate};
use crate::types::{Result, ResultExt};

/// YAML document layout for import/export
#[derive(Debug, Default, Serialize, Deserialize)]
struct PromptFile {
    #[serde(default)]
    prompts: Vec<PromptTemplate>,
}

#[derive(Debug, Default)]
pub struct MemoryPromptStore {
    templates: DashMap<String, PromptTemplate>,
}

impl MemoryPromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_templates(templates: impl IntoIterator<Item = PromptTemplate>) -> Self {
        let store = Self::new();
        for template in templates {
            store.templates.insert(template.slug.clone(), template);
        }
        store
    }

    /// Parse a YAML document with a top-level `prompts:` list
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: PromptFile = serde_yaml::from_str(yaml)?;
        Ok(Self::from_templates(file.prompts))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context_fn(|| format!("Failed to read prompt file {}", path.display()))?;
        let store = Self::from_yaml(&content)?;
        debug!("Loaded {} prompt(s) from {}", store.templates.len(), path.display());
        Ok(store)
    }

    /// Serialize every template (active or not) as YAML
    pub fn to_yaml(&self) -> Result<String> {
        export_yaml(&self.list_templates()?)
    }
}

/// Serialize templates in the import format
pub fn export_yaml(templates: &[PromptTemplate]) -> Result<String> {
    let file = PromptFile {
        prompts: templates.to_vec(),
    };
    Ok(serde_yaml::to_string(&file)?)
}

impl PromptStore for MemoryPromptStore {
    fn get_template(&self, slug: &str) -> Result<Option<PromptTemplate>> {
        Ok(self
            .templates
            .get(slug)
            .filter(|t| t.active)
            .map(|t| t.value().clone()))
    }

    fn list_templates(&self) -> Result<Vec<PromptTemplate>> {
        let mut templates: Vec<PromptTemplate> =
            self.templates.iter().map(|t| t.value().clone()).collect();
        templates.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(templates)
    }

    fn upsert(&self, template: PromptTemplate) -> Result<()> {
        self.templates.insert(template.slug.clone(), template);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::{PromptType, default_templates};
    use crate::types::ForgeError;

    #[test]
    fn test_inactive_template_is_invisible() {
        let mut template =
            PromptTemplate::new("system-correction", "Sys", PromptType::SystemCorrection, "Edit.");
        template.active = false;
        let store = MemoryPromptStore::from_templates([template]);

        assert!(store.get_template("system-correction").unwrap().is_none());
        assert!(matches!(
            store.get_prompt("system-correction", None),
            Err(ForgeError::PromptNotFound { .. })
        ));
        assert_eq!(store.list_templates().unwrap().len(), 1);
    }

    #[test]
    fn test_yaml_roundtrip_keeps_variants() {
        let store = MemoryPromptStore::from_templates(default_templates());
        let yaml = store.to_yaml().unwrap();

        let restored = MemoryPromptStore::from_yaml(&yaml).unwrap();
        assert_eq!(
            restored.get_prompt("post-generation", Some("short")).unwrap(),
            store.get_prompt("post-generation", Some("short")).unwrap()
        );
        assert_eq!(restored.list_templates().unwrap(), store.list_templates().unwrap());
    }

    #[test]
    fn test_yaml_minimal_entry() {
        let yaml = r#"
prompts:
  - slug: correction-expand
    title: Expand
    prompt_type: correction_expand
    body: "Expand to {min_words}-{max_words} words: {post_content}"
    model:
      model: gpt-4o
"#;
        let store = MemoryPromptStore::from_yaml(yaml).unwrap();
        let config = store.get_config("correction-expand").unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, 6000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.yaml");
        std::fs::write(&path, export_yaml(&default_templates()).unwrap()).unwrap();

        let store = MemoryPromptStore::load(&path).unwrap();
        assert_eq!(store.list_templates().unwrap().len(), default_templates().len());

        let err = MemoryPromptStore::load(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ForgeError::Storage(_)));
    }
}
