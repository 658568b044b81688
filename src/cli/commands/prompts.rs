//! Prompts Command
//!
//! Inspect and manage prompt templates.
//!
//! Usage:
//!   postforge prompts list
//!   postforge prompts show <slug> [--variant V]
//!   postforge prompts check
//!   postforge prompts seed
//!   postforge prompts import <file.yaml>
//!   postforge prompts export <file.yaml>
//!
//! `list`, `show` and `check` read the store used for generation; `seed`,
//! `import` and `export` always work on the database.

use std::path::Path;

use crate::ai::prompt::{
    MemoryPromptStore, PromptStore, export_yaml, missing_required_prompts, seed_defaults,
};
use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::types::{ForgeError, Result, ResultExt};

pub fn list(ctx: &CommandContext) -> Result<()> {
    let out = Output::new();
    let templates = ctx.store.list_templates()?;

    if templates.is_empty() {
        out.info("No prompts stored. Run 'postforge prompts seed' to install the defaults.");
        return Ok(());
    }

    out.header("Prompt templates");
    for template in templates {
        let config = template.model_config();
        let variants = template
            .variants
            .as_ref()
            .map(|v| v.keys().cloned().collect::<Vec<_>>().join(","))
            .unwrap_or_default();

        println!(
            "  {} {:<24} {:<20} {:<12} {}{}",
            if template.active { "●" } else { "○" },
            template.slug,
            template.prompt_type.as_str(),
            config.model,
            config.response_format.as_str(),
            if variants.is_empty() {
                String::new()
            } else {
                format!("  [{}]", variants)
            }
        );
    }
    Ok(())
}

pub fn show(ctx: &CommandContext, slug: &str, variant: Option<&str>) -> Result<()> {
    let out = Output::new();
    let template = ctx
        .store
        .get_template(slug)?
        .ok_or_else(|| ForgeError::prompt_not_found(slug, variant))?;
    let text = template.text_for(variant)?;
    let config = template.model_config();

    out.header(&template.title);
    out.field("Slug", &template.slug);
    out.field("Type", template.prompt_type);
    out.field("Model", &config.model);
    out.field("Temperature", config.temperature);
    out.field("Max tokens", config.max_tokens);
    out.field("Response format", config.response_format);

    out.section(variant.unwrap_or("body"));
    println!("{}", text);
    Ok(())
}

/// Report missing required prompts and lint findings; fails when any are missing
pub fn check(ctx: &CommandContext) -> Result<()> {
    let out = Output::new();
    let missing = missing_required_prompts(ctx.store.as_ref())?;

    for name in &missing {
        out.error(&format!("Missing prompt: {}", name));
    }

    let findings: Vec<String> = ctx
        .store
        .list_templates()?
        .iter()
        .filter(|t| t.active)
        .flat_map(|t| t.lint())
        .collect();
    for finding in &findings {
        out.warning(finding);
    }

    if !missing.is_empty() {
        return Err(ForgeError::Config(format!(
            "{} required prompt(s) missing",
            missing.len()
        )));
    }

    if findings.is_empty() {
        out.success("All required prompts present");
    } else {
        out.success(&format!(
            "All required prompts present ({} lint warning(s))",
            findings.len()
        ));
    }
    Ok(())
}

/// Install missing default prompts; returns how many were added
pub fn seed(ctx: &CommandContext) -> Result<usize> {
    let inserted = seed_defaults(ctx.sqlite_store())?;
    Output::new().success(&format!("Seeded {} prompt(s)", inserted));
    Ok(inserted)
}

/// Upsert every template from a YAML file into the database
pub fn import(ctx: &CommandContext, path: &Path) -> Result<usize> {
    let source = MemoryPromptStore::load(path)?;
    let store = ctx.sqlite_store();

    let templates = source.list_templates()?;
    let count = templates.len();
    for template in templates {
        store.upsert(template)?;
    }

    Output::new().success(&format!(
        "Imported {} prompt(s) from {}",
        count,
        path.display()
    ));
    Ok(count)
}

/// Write every database template to a YAML file
pub fn export(ctx: &CommandContext, path: &Path) -> Result<usize> {
    let templates = ctx.sqlite_store().list_templates()?;
    let yaml = export_yaml(&templates)?;

    std::fs::write(path, yaml)
        .with_context_fn(|| format!("Failed to write {}", path.display()))?;

    Output::new().success(&format!(
        "Exported {} prompt(s) to {}",
        templates.len(),
        path.display()
    ));
    Ok(templates.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::default_templates;
    use crate::config::Config;

    fn context(dir: &Path) -> CommandContext {
        let mut config = Config::default();
        config.storage.database = Some(dir.join("postforge.db"));
        CommandContext::from_config(config).unwrap()
    }

    #[test]
    fn test_seed_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        assert!(check(&ctx).is_err());
        assert_eq!(seed(&ctx).unwrap(), default_templates().len());
        assert_eq!(seed(&ctx).unwrap(), 0);
        assert!(check(&ctx).is_ok());
    }

    #[test]
    fn test_export_import_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prompts.yaml");

        let source = context(&dir.path().join("a"));
        seed(&source).unwrap();
        assert_eq!(export(&source, &file).unwrap(), default_templates().len());

        let target = context(&dir.path().join("b"));
        assert_eq!(import(&target, &file).unwrap(), default_templates().len());
        assert_eq!(
            target.sqlite_store().list_templates().unwrap(),
            source.sqlite_store().list_templates().unwrap()
        );
    }

    #[test]
    fn test_show_unknown_slug() {
        let dir = tempfile::tempdir().unwrap();
        let err = show(&context(dir.path()), "nope", None).unwrap_err();
        assert!(matches!(err, ForgeError::PromptNotFound { .. }));
    }
}
