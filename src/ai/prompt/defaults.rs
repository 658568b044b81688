//! Default prompt set
//!
//! Seeded on demand (`postforge prompts seed`). Seeding never overwrites an
//! existing slug, so operator edits survive.

use std::collections::BTreeMap;
use tracing::info;

use super::{ModelSettings, PromptStore, PromptTemplate, PromptType};
use crate::ai::provider::ResponseFormat;
use crate::constants::prompts;
use crate::types::{LengthKey, Result};

const SYSTEM_POST_GENERATION: &str = "You are a professional content writer for blog articles.

EDITORIAL LINE: {editorial_line}
WRITING STYLE: {author_style}
TARGET AUDIENCE: {target_audience}

You write articles that meet the word-count requirement EXACTLY. You ALWAYS write every section in full. You ALWAYS answer with valid JSON containing the fields content_html, category_name and tags.";

const SYSTEM_CORRECTION: &str = "You are a professional content editor. You adjust text length precisely without lowering quality. You answer ONLY with the adjusted HTML content.";

const JSON_FORMAT: &str = r#"JSON format (ONLY this):
{
  "content_html": "HTML article",
  "category_name": "fitting category",
  "tags": ["tag1", "tag2", "tag3", "tag4", "tag5", "tag6", "tag7"]
}"#;

const STYLE: &str = "STYLE:
- Informative and precise
- HTML: <h2> for sections, <p> for paragraphs
- No code examples";

const CORRECTION_EXPAND: &str = "The following article has only {current_words} words but needs {min_words}-{max_words} words.

IMPORTANT: Expand the content by:
1. Extending existing sections with more detail and examples
2. Adding deeper explanations
3. Keeping the structure and all HTML tags
4. NOT adding new sections

Current article:
{post_content}

Answer ONLY with the expanded HTML content (no JSON, no extra text). Target: {min_words}-{max_words} words.";

const CORRECTION_SHORTEN: &str = "The following article has {current_words} words but may only have {min_words}-{max_words} words.

IMPORTANT: Shorten the content by:
1. Removing redundant information
2. Phrasing paragraphs more concisely
3. Keeping the key statements and structure
4. Keeping the HTML structure

Current article:
{post_content}

Answer ONLY with the shortened HTML content (no JSON, no extra text). Target: {min_words}-{max_words} words.";

const IMAGE_GENERATION: &str = "Create a high-quality featured image for a blog post titled \"{post_title}\". The content is about: {post_excerpt}. Do not include any text, captions, labels, watermarks, typography, or logos in the image (text-free image).";

/// Section outline per length
fn structure(key: LengthKey) -> &'static str {
    match key {
        LengthKey::Short => "STRUCTURE (5 sections):
1. Introduction (~80 words)
2. What is [topic]? (~70 words)
3. Key features (~70 words)
4. Use cases and benefits (~70 words)
5. Conclusion (~60 words)",
        LengthKey::Medium => "STRUCTURE (7 sections):
1. Introduction (~150 words), 2-3 paragraphs
2. What is [topic]? Basics (~140 words)
3. Why does it matter? (~140 words)
4. Key features and functions (~150 words)
5. Benefits (~140 words)
6. Challenges and solutions (~140 words)
7. Conclusion and outlook (~140 words)",
        LengthKey::Long => "STRUCTURE (9 sections of ~200 words):
1. Introduction
2. Basics and definition
3. Significance and relevance
4. Key features in detail
5. Benefits and opportunities
6. Drawbacks and risks
7. Areas of application
8. Best practices
9. Conclusion",
        LengthKey::VeryLong => "STRUCTURE (11 sections of ~250 words):
1. Introduction
2. Basics and background
3. Relevance today
4. Key features in detail
5. Benefits and opportunities
6. Drawbacks and challenges
7. Applications and examples
8. Best practices and recommendations
9. Practical implementation
10. Future perspectives
11. Conclusion",
    }
}

fn post_generation_variant(key: LengthKey) -> String {
    format!(
        "Write an article on the topic: {{post_title}}

Context: {{post_excerpt}}

WORD COUNT REQUIREMENT:
- Target range: {{min_words}} to {{max_words}} words
- NOT fewer than {{min_words}} words
- NOT more than {{max_words}} words

{}

{}

{}",
        structure(key),
        STYLE,
        JSON_FORMAT
    )
}

/// The built-in template set
pub fn default_templates() -> Vec<PromptTemplate> {
    let variants: BTreeMap<String, String> = LengthKey::ALL
        .into_iter()
        .map(|key| (key.as_str().to_string(), post_generation_variant(key)))
        .collect();

    vec![
        PromptTemplate::new(
            prompts::SYSTEM_POST_GENERATION,
            "System: post generation",
            PromptType::SystemGeneration,
            SYSTEM_POST_GENERATION,
        )
        .with_model(ModelSettings::new("gpt-5-mini", 0.2, None, ResponseFormat::JsonObject)),
        PromptTemplate::new(
            prompts::SYSTEM_CORRECTION,
            "System: correction",
            PromptType::SystemCorrection,
            SYSTEM_CORRECTION,
        )
        .with_model(ModelSettings::new("gpt-5-mini", 0.3, Some(6000), ResponseFormat::Text)),
        PromptTemplate::new(
            prompts::POST_GENERATION,
            "Post generation (per length)",
            PromptType::Generation,
            "",
        )
        .with_variants(variants)
        .with_model(ModelSettings::new("gpt-5", 0.2, Some(10_000), ResponseFormat::JsonObject)),
        PromptTemplate::new(
            prompts::CORRECTION_EXPAND,
            "Correction: expand",
            PromptType::CorrectionExpand,
            CORRECTION_EXPAND,
        )
        .with_model(ModelSettings::new("gpt-5-mini", 0.3, Some(6000), ResponseFormat::Text)),
        PromptTemplate::new(
            prompts::CORRECTION_SHORTEN,
            "Correction: shorten",
            PromptType::CorrectionShorten,
            CORRECTION_SHORTEN,
        )
        .with_model(ModelSettings::new("gpt-5-mini", 0.3, Some(6000), ResponseFormat::Text)),
        PromptTemplate::new(
            prompts::IMAGE_GENERATION,
            "Image generation",
            PromptType::Image,
            IMAGE_GENERATION,
        )
        .with_model(ModelSettings::new("gpt-image-1", 0.7, None, ResponseFormat::Text)),
    ]
}

/// Insert every default template whose slug is not yet stored.
///
/// Returns the number of templates inserted.
pub fn seed_defaults(store: &dyn PromptStore) -> Result<usize> {
    let existing: Vec<String> = store
        .list_templates()?
        .into_iter()
        .map(|t| t.slug)
        .collect();

    let mut inserted = 0;
    for template in default_templates() {
        if existing.contains(&template.slug) {
            continue;
        }
        info!("Seeding prompt template: {}", template.slug);
        store.upsert(template)?;
        inserted += 1;
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::MemoryPromptStore;

    #[test]
    fn test_defaults_pass_lint() {
        for template in default_templates() {
            let issues = template.lint();
            assert!(issues.is_empty(), "{}: {:?}", template.slug, issues);
        }
    }

    #[test]
    fn test_defaults_cover_required_slugs() {
        let slugs: Vec<String> = default_templates().into_iter().map(|t| t.slug).collect();
        for required in prompts::REQUIRED_SLUGS {
            assert!(slugs.iter().any(|s| s == required), "missing {}", required);
        }
    }

    #[test]
    fn test_generation_defaults() {
        let templates = default_templates();
        let generation = templates
            .iter()
            .find(|t| t.slug == prompts::POST_GENERATION)
            .unwrap();
        let config = generation.model_config();
        assert_eq!(config.model, "gpt-5");
        assert_eq!(config.max_tokens, 10_000);
        assert_eq!(config.response_format, ResponseFormat::JsonObject);
        assert!(generation.text_for(Some("verylong")).unwrap().contains("11 sections"));
    }

    #[test]
    fn test_seed_never_overwrites() {
        let store = MemoryPromptStore::new();
        store
            .upsert(PromptTemplate::new(
                prompts::SYSTEM_CORRECTION,
                "Custom",
                PromptType::SystemCorrection,
                "My own editor prompt.",
            ))
            .unwrap();

        let inserted = seed_defaults(&store).unwrap();
        assert_eq!(inserted, default_templates().len() - 1);
        assert_eq!(
            store.get_prompt(prompts::SYSTEM_CORRECTION, None).unwrap(),
            "My own editor prompt."
        );

        assert_eq!(seed_defaults(&store).unwrap(), 0);
    }
}
