//! Image Command
//!
//! Generates featured images for a post and writes them to disk.
//!
//! Usage:
//!   postforge image --title T [--context C] [-n N] [--out DIR]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::prompt::{Placeholder, PromptVars, render};
use crate::ai::provider::{ImageClient, OpenAiClient};
use crate::ai::timeout::with_timeout;
use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::constants::prompts;
use crate::types::{ForgeError, PostKey, Result, ResultExt};

#[derive(Debug, Clone)]
pub struct ImageOptions {
    pub title: String,
    pub context: Option<String>,
    pub count: u8,
    pub out: PathBuf,
}

/// Render the image prompt for a post
pub fn image_prompt(template: &str, title: &str, context: &str) -> Result<String> {
    let vars = PromptVars::new()
        .set(Placeholder::PostTitle, title)
        .set(Placeholder::PostExcerpt, context);
    render(template, &vars)
}

pub fn decode_image(b64: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(b64.trim())
        .map_err(|e| ForgeError::Parse(format!("Invalid base64 image data: {}", e)))
}

pub fn image_path(dir: &Path, post_key: &PostKey, index: usize) -> PathBuf {
    dir.join(format!("{}-{}.png", post_key, index + 1))
}

pub async fn run(ctx: &CommandContext, options: ImageOptions) -> Result<()> {
    let out = Output::new();

    let template = ctx.store.get_prompt(prompts::IMAGE_GENERATION, None)?;
    let context = options
        .context
        .clone()
        .unwrap_or_else(|| options.title.clone());
    let prompt = image_prompt(&template, &options.title, &context)?;

    let client = OpenAiClient::from_config(&ctx.config.openai)?;
    let images = with_timeout(
        Duration::from_secs(ctx.config.openai.timeout_secs),
        client.generate_images(&prompt, options.count, &ctx.config.openai.image_size),
        "image generation",
    )
    .await?;

    std::fs::create_dir_all(&options.out)
        .with_context_fn(|| format!("Failed to create {}", options.out.display()))?;

    let post_key = PostKey::from_title(&options.title);
    for (index, image) in images.iter().enumerate() {
        if let Some(b64) = &image.b64_json {
            let path = image_path(&options.out, &post_key, index);
            std::fs::write(&path, decode_image(b64)?)
                .with_context_fn(|| format!("Failed to write {}", path.display()))?;
            out.success(&format!("Saved {}", path.display()));
        } else if let Some(url) = &image.url {
            out.success(&format!("Image URL: {}", url));
        }

        if let Some(revised) = &image.revised_prompt {
            out.field("Revised prompt", revised);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_prompt_renders_title_and_context() {
        let prompt = image_prompt(
            "Featured image for \"{post_title}\" about {post_excerpt}.",
            "Heat pumps",
            "retrofits",
        )
        .unwrap();
        assert_eq!(prompt, "Featured image for \"Heat pumps\" about retrofits.");
    }

    #[test]
    fn test_image_prompt_rejects_content_placeholder() {
        let err = image_prompt("{post_content}", "t", "c").unwrap_err();
        assert!(matches!(err, ForgeError::Template(_)));
    }

    #[test]
    fn test_decode_image() {
        assert_eq!(decode_image("aGVsbG8=\n").unwrap(), b"hello");
        assert!(matches!(decode_image("***"), Err(ForgeError::Parse(_))));
    }

    #[test]
    fn test_image_path() {
        let path = image_path(Path::new("out"), &PostKey::from_title("Heat Pumps"), 0);
        assert_eq!(path, Path::new("out").join("heat-pumps-1.png"));
    }
}
